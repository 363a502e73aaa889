use anyhow::Result;
use std::io::{self, Write};

use snmpdatad::AgentConfig;

use super::util::read_table;

pub fn exec(cfg: AgentConfig, json: bool) -> Result<()> {
    let (snapshot, _report) = read_table(&cfg.data_file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.records())?);
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    snapshot.dump(&mut out)?;
    out.flush()?;
    Ok(())
}
