use serde::Serialize;
use std::io::Write;

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.map_err(|e| format!("JSON serialization failed: {}", e))
}

/// Print a JSON document followed by a newline on stdout.
pub fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<(), String> {
    let json = to_json(value, compact)?;
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(json.as_bytes())
        .and_then(|_| handle.write_all(b"\n"))
        .map_err(|e| format!("Failed to write to stdout: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_and_pretty() {
        let value = serde_json::json!({ "sfreq": 64.0 });
        assert_eq!(to_json(&value, true).unwrap(), r#"{"sfreq":64.0}"#);
        assert!(to_json(&value, false).unwrap().contains('\n'));
    }
}
