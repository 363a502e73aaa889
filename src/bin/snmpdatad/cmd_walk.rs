use anyhow::Result;
use serde::Serialize;

use snmpdatad::{format_oid, parse_oid, Agent, AgentConfig, Value};

#[derive(Serialize)]
struct WalkItem<'a> {
    oid: String,
    #[serde(flatten)]
    value: &'a Value,
}

pub fn exec(cfg: AgentConfig, oid: Option<String>, json: bool) -> Result<()> {
    let agent = Agent::open(cfg)?;
    let from = match oid {
        Some(s) => parse_oid(&s)?,
        None => agent.base_oid().to_vec(),
    };

    let items: Vec<(Vec<u32>, Value)> = agent.walk(&from).collect();

    if json {
        let view: Vec<WalkItem<'_>> = items
            .iter()
            .map(|(oid, value)| WalkItem {
                oid: format_oid(oid),
                value,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if items.is_empty() {
        println!("(no items)");
    } else {
        for (oid, value) in &items {
            println!("{} = {}: {}", format_oid(oid), value.type_name(), value);
        }
        println!("({} item(s))", items.len());
    }
    agent.shutdown()
}
