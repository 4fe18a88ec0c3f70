use std::collections::BTreeMap;

use crate::error::{PunchError, Result};

/// Parses a `key=value,key2=value2` option string.
///
/// Whitespace around keys and values is trimmed and empty items are skipped,
/// so an empty string gives an empty map. A later key overrides an earlier one.
///
/// # Arguments
/// * `options` - The option string given on the command line
///
/// # Returns
/// * `Ok(BTreeMap)` - The parsed options
/// * `Err(PunchError::Validation)` - If an item has no `=` or an empty key
pub fn parse_option_string(options: &str) -> Result<BTreeMap<String, String>> {
    let mut parsed = BTreeMap::new();

    for item in options.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        let (key, value) = item.split_once('=').ok_or_else(|| {
            PunchError::validation(format!("invalid option '{}', expected key=value", item))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(PunchError::validation(format!(
                "invalid option '{}', the key is empty",
                item
            )));
        }
        parsed.insert(key.to_string(), value.trim().to_string());
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_option() {
        let options = parse_option_string("part=minor").unwrap();
        assert_eq!(options.get("part").map(String::as_str), Some("minor"));
        assert_eq!(options.len(), 1);
    }

    #[test]
    fn test_parse_several_options_with_spaces() {
        let options = parse_option_string("major = 2, minor=0 ,").unwrap();
        assert_eq!(options.get("major").map(String::as_str), Some("2"));
        assert_eq!(options.get("minor").map(String::as_str), Some("0"));
    }

    #[test]
    fn test_parse_empty_string() {
        assert!(parse_option_string("").unwrap().is_empty());
    }

    #[test]
    fn test_value_may_contain_equals() {
        let options = parse_option_string("label=a=b").unwrap();
        assert_eq!(options.get("label").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_missing_equals_is_rejected() {
        let err = parse_option_string("major").unwrap_err();
        assert!(matches!(err, PunchError::Validation(_)));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(parse_option_string("=3").is_err());
    }
}
