// tests/agent_queries.rs
//
// Query adapter over a real data file:
// - exact and successor lookups on keys relative to the base OID;
// - full-OID handling (prefix strip / re-add, before/after the subtree);
// - bad and duplicate lines do not stop a load;
// - unsupported modes are answered, not raised.

use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use snmpdatad::{
    Agent, AgentConfig, Counter64, Key, Lookup, Mode, NextLookup, Response, Value,
};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("snmpdatad-test-agent-{prefix}-{pid}-{t}-{id}"))
}

const BASE: &[u32] = &[1, 3, 6, 1, 4, 1, 8072, 2, 1, 2, 0];

fn full(suffix: &[u32]) -> Vec<u32> {
    let mut v = BASE.to_vec();
    v.extend_from_slice(suffix);
    v
}

fn open_with(prefix: &str, body: &str) -> Result<(Agent, PathBuf)> {
    let root = unique_root(prefix);
    fs::create_dir_all(&root)?;
    let file = root.join("snmp.data");
    fs::write(&file, body)?;
    let cfg = AgentConfig::default()
        .with_data_file(&file)
        .with_base_oid(BASE.to_vec());
    Ok((Agent::open(cfg)?, root))
}

const SAMPLE: &str = "\
1.2.3 INTEGER 42
1.2.4 STRING \"hello\"
1.3.0 COUNTER 7
";

#[test]
fn sample_table_exact_and_next() -> Result<()> {
    let (agent, root) = open_with("sample", SAMPLE)?;
    assert_eq!(agent.store().len(), 3);

    assert_eq!(
        agent.lookup_exact(&[1, 2, 4]),
        Lookup::Found(Value::OctetString(b"hello".to_vec()))
    );
    assert_eq!(agent.lookup_exact(&[1, 2]), Lookup::NotFound);

    assert_eq!(
        agent.lookup_next(&[1, 2, 3]),
        NextLookup::Found {
            key: Key::new(&[1, 2, 4]).unwrap(),
            value: Value::OctetString(b"hello".to_vec()),
        }
    );
    assert_eq!(agent.lookup_next(&[1, 3, 0]), NextLookup::EndOfView);

    agent.shutdown()?;
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn successor_chain_visits_every_key_once() -> Result<()> {
    let (agent, root) = open_with("chain", SAMPLE)?;

    let mut cursor: Vec<u32> = Vec::new();
    let mut seen = Vec::new();
    while let NextLookup::Found { key, .. } = agent.lookup_next(&cursor) {
        seen.push(key.to_string());
        cursor = key.as_slice().to_vec();
    }
    assert_eq!(seen, vec!["1.2.3", "1.2.4", "1.3.0"]);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn full_oid_get_and_getnext() -> Result<()> {
    let (agent, root) = open_with("full", SAMPLE)?;

    match agent.handle(Mode::Get, &full(&[1, 2, 3])) {
        Response::Value { oid, value } => {
            assert_eq!(oid, full(&[1, 2, 3]));
            assert_eq!(value, Value::Integer32(42));
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(agent.handle(Mode::Get, &full(&[9])), Response::NoSuchInstance);
    assert_eq!(agent.handle(Mode::Get, &[1, 2, 3]), Response::NoSuchInstance);

    // successor OID is reported with the base prefix re-added
    match agent.handle(Mode::GetNext, &full(&[1, 2, 3])) {
        Response::Value { oid, .. } => assert_eq!(oid, full(&[1, 2, 4])),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(agent.handle(Mode::GetNext, &full(&[1, 3, 0])), Response::EndOfView);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn getnext_outside_the_subtree() -> Result<()> {
    let (agent, root) = open_with("outside", SAMPLE)?;

    // the base itself and anything before it start at the first record
    for oid in [BASE.to_vec(), BASE[..7].to_vec(), vec![1, 3, 6, 1, 2, 1]] {
        match agent.handle(Mode::GetNext, &oid) {
            Response::Value { oid: got, .. } => assert_eq!(got, full(&[1, 2, 3])),
            other => panic!("unexpected {:?} for {:?}", other, oid),
        }
    }

    // past the subtree
    assert_eq!(
        agent.handle(Mode::GetNext, &[1, 3, 6, 1, 4, 1, 8072, 2, 1, 3]),
        Response::EndOfView
    );
    assert_eq!(agent.handle(Mode::GetNext, &[2]), Response::EndOfView);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn walk_from_base_returns_whole_table() -> Result<()> {
    let (agent, root) = open_with("walk", SAMPLE)?;
    let items: Vec<_> = agent.walk(BASE).collect();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].0, full(&[1, 2, 3]));
    assert_eq!(items[2], (full(&[1, 3, 0]), Value::Counter32(7)));

    // walking from the middle picks up after the cursor
    let tail: Vec<_> = agent.walk(&full(&[1, 2, 4])).collect();
    assert_eq!(tail.len(), 1);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn prefix_cursor_returns_first_key_under_prefix() -> Result<()> {
    let (agent, root) = open_with("prefix", "1.1 INTEGER 1\n2.7.1 INTEGER 2\n2.7.9 INTEGER 3\n3 INTEGER 4\n")?;
    match agent.lookup_next(&[2]) {
        NextLookup::Found { key, .. } => assert_eq!(key.as_slice(), &[2, 7, 1]),
        other => panic!("unexpected {:?}", other),
    }
    match agent.lookup_next(&[2, 7]) {
        NextLookup::Found { key, .. } => assert_eq!(key.as_slice(), &[2, 7, 1]),
        other => panic!("unexpected {:?}", other),
    }
    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn bad_lines_and_duplicates_are_skipped() -> Result<()> {
    let body = "\
# comment
1 INTEGER 1
9.9 STRING hello
5.0 COUNTER64 18446744073709551615
5.0 INTEGER 2
1.2.3.4 INTEGER 3
x.1 INTEGER 4
2 GAUGE 5

3 STRING \"ok\"
";
    let (agent, root) = open_with("bad", body)?;
    let snap = agent.store().snapshot();
    let keys: Vec<String> = snap.iter().map(|r| r.key.to_string()).collect();
    assert_eq!(keys, vec!["1", "3", "5.0"]);
    assert_eq!(
        agent.lookup_exact(&[5, 0]),
        Lookup::Found(Value::Counter64(Counter64 {
            low: u32::MAX,
            high: u32::MAX
        }))
    );
    assert_eq!(agent.lookup_exact(&[9, 9]), Lookup::NotFound);
    assert_eq!(agent.metrics().snapshot().lines_rejected, 5);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn unsupported_modes_are_answered() -> Result<()> {
    let (agent, root) = open_with("modes", SAMPLE)?;
    assert_eq!(
        agent.handle(Mode::Set, &full(&[1, 2, 3])),
        Response::Unsupported(Mode::Set)
    );
    assert_eq!(
        agent.handle(Mode::GetBulk, &full(&[1, 2, 3])),
        Response::Unsupported(Mode::GetBulk)
    );
    assert_eq!("getnext".parse::<Mode>()?, Mode::GetNext);
    assert!("walk".parse::<Mode>().is_err());

    let m = agent.metrics().snapshot();
    assert_eq!(m.queries_unsupported, 2);

    let _ = fs::remove_dir_all(&root);
    Ok(())
}

#[test]
fn startup_refuses_missing_source_and_bad_config() -> Result<()> {
    let root = unique_root("startup");
    fs::create_dir_all(&root)?;

    let missing = AgentConfig::default().with_data_file(root.join("nope.data"));
    let err = Agent::open(missing).unwrap_err();
    assert!(err.to_string().contains("not found"), "{err:#}");

    let file = root.join("snmp.data");
    fs::write(&file, SAMPLE)?;
    let short = AgentConfig::default()
        .with_data_file(&file)
        .with_base_oid(vec![1, 3, 6]);
    assert!(Agent::open(short).is_err());

    let _ = fs::remove_dir_all(&root);
    Ok(())
}
