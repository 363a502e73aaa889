use anyhow::Result;

use snmpdatad::{parse_oid, Agent, AgentConfig, Mode};

use super::util::format_response;

pub fn exec(cfg: AgentConfig, oid: String) -> Result<()> {
    let oid = parse_oid(&oid)?;
    let agent = Agent::open(cfg)?;
    let resp = agent.handle(Mode::Get, &oid);
    println!("{}", format_response(&oid, &resp));
    agent.shutdown()
}
