//! Reading bodies, data and schema files.
//!
//! Files may hold JSON or YAML. The path `-` reads standard input.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use oat_schema::yaml_to_json;
use serde_json::Value;

/// Path that selects standard input.
pub const STDIN: &str = "-";

/// Read and parse a JSON or YAML file, or stdin for `-`.
pub fn read_value(path: &Path) -> Result<Value> {
    let text = if path == Path::new(STDIN) {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("cannot read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?
    };
    parse_value(&text).with_context(|| format!("cannot parse {}", path.display()))
}

/// Parse JSON, falling back to YAML. Blank input is `null`.
pub fn parse_value(text: &str) -> Result<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(text)?;
    Ok(yaml_to_json(yaml))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_json_and_yaml() {
        assert_eq!(parse_value(r#"{"a": [1, 2.5]}"#).unwrap(), json!({"a": [1, 2.5]}));
        assert_eq!(parse_value("a:\n  - 1\n  - x\n").unwrap(), json!({"a": [1, "x"]}));
    }

    #[test]
    fn blank_input_is_null() {
        assert_eq!(parse_value(" \n").unwrap(), Value::Null);
    }

    #[test]
    fn unparsable_input_is_an_error() {
        assert!(parse_value("{unclosed: [").is_err());
    }

    #[test]
    fn reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, r#"{"ok": true}"#).unwrap();
        assert_eq!(read_value(&path).unwrap(), json!({"ok": true}));
        assert!(read_value(&dir.path().join("missing.json")).is_err());
    }
}
