use anyhow::Result;
use log::info;
use std::io::{self, BufRead, Write};

use snmpdatad::{format_oid, parse_oid, Agent, AgentConfig, Mode};

use super::util::format_response;

pub fn exec(cfg: AgentConfig, poll_ms: Option<u64>, force_after: Option<u32>) -> Result<()> {
    let mut cfg = cfg;
    if let Some(ms) = poll_ms {
        cfg = cfg.with_poll_interval_ms(ms);
    }
    if let Some(n) = force_after {
        cfg = cfg.with_force_reload_after_polls(n);
    }
    info!("{}", cfg);

    let agent = Agent::start(cfg)?;
    info!("snmpdatad is up and running");

    let stdin = io::stdin();
    let stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        let arg = parts.next();

        let mut out = stdout.lock();
        match cmd.to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "stats" => {
                writeln!(out, "{}", serde_json::to_string(&agent.metrics().snapshot())?)?;
            }
            "walk" => {
                let from = match arg {
                    Some(s) => parse_oid(s),
                    None => Ok(agent.base_oid().to_vec()),
                };
                match from {
                    Ok(from) => {
                        for (oid, value) in agent.walk(&from) {
                            writeln!(out, "{} = {}: {}", format_oid(&oid), value.type_name(), value)?;
                        }
                    }
                    Err(e) => writeln!(out, "ERR {:#}", e)?,
                }
            }
            other => {
                let mode = match other.parse::<Mode>() {
                    Ok(m) => m,
                    Err(_) => {
                        writeln!(out, "ERR unknown command: {}", other)?;
                        continue;
                    }
                };
                match arg.map(parse_oid) {
                    Some(Ok(oid)) => {
                        let resp = agent.handle(mode, &oid);
                        writeln!(out, "{}", format_response(&oid, &resp))?;
                    }
                    Some(Err(e)) => writeln!(out, "ERR {:#}", e)?,
                    None => writeln!(out, "ERR usage: {} <oid>", other)?,
                }
            }
        }
        out.flush()?;
    }

    agent.shutdown()?;
    info!("snmpdatad stopped");
    Ok(())
}
