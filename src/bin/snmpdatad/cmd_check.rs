use anyhow::Result;

use snmpdatad::AgentConfig;

use super::util::read_table;

pub fn exec(cfg: AgentConfig, json: bool) -> Result<()> {
    let (_snapshot, report) = read_table(&cfg.data_file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for r in &report.rejected {
        println!("line {}: {}", r.line, r.reason);
    }
    println!(
        "{}: {} line(s), {} record(s), {} rejected",
        cfg.data_file.display(),
        report.lines,
        report.records,
        report.rejected.len()
    );
    Ok(())
}
