use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use snmpdatad::{format_oid, load_snapshot, LoadReport, Response, Snapshot};

/// Load a data file without installing it anywhere.
pub fn read_table(path: &Path) -> Result<(Snapshot, LoadReport)> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    load_snapshot(BufReader::new(f), &path.display().to_string())
}

/// net-snmp style rendering of one answer.
pub fn format_response(request: &[u32], resp: &Response) -> String {
    match resp {
        Response::Value { oid, value } => format!(
            "{} = {}: {}",
            format_oid(oid),
            value.type_name(),
            value
        ),
        Response::NoSuchInstance => format!(
            "{} = No Such Instance currently exists at this OID",
            format_oid(request)
        ),
        Response::EndOfView => format!(
            "{} = No more variables left in this MIB View (It is past the end of the MIB tree)",
            format_oid(request)
        ),
        Response::Unsupported(mode) => format!("ERR unsupported request mode {}", mode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snmpdatad::{Mode, Value};

    #[test]
    fn renders_each_answer() {
        let r = Response::Value {
            oid: vec![1, 3, 6, 1, 2],
            value: Value::OctetString(b"up".to_vec()),
        };
        assert_eq!(format_response(&[1, 3, 6, 1, 1], &r), "1.3.6.1.2 = STRING: \"up\"");
        assert!(format_response(&[1, 3], &Response::EndOfView).starts_with("1.3 = No more variables"));
        assert!(format_response(&[1, 3], &Response::NoSuchInstance).contains("No Such Instance"));
        assert_eq!(
            format_response(&[1], &Response::Unsupported(Mode::Set)),
            "ERR unsupported request mode SET"
        );
    }
}
