use std::fmt;

use serde::Deserialize;

use crate::error::{PunchError, Result};

/// Largest integer part value; the version file stores TOML integers (`i64`).
pub const MAX_INTEGER: u64 = i64::MAX as u64;

/// Declared kind of a version part.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PartKind {
    /// Non-negative counter, the default.
    #[default]
    Integer,
    /// Free text. Can be set but not increased.
    String,
    /// Text restricted to an ordered list; increasing moves to the next
    /// value and wraps around after the last one.
    ValueList { allowed_values: Vec<String> },
}

/// A version part as declared in the configuration.
///
/// In `punch.toml` a part is either a bare name (an integer part) or a table:
///
/// ```toml
/// version = ["major", "minor", { name = "stage", type = "value_list", allowed_values = ["alpha", "beta"] }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawPartConfig")]
pub struct PartConfig {
    pub name: String,
    pub kind: PartKind,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPartConfig {
    Name(String),
    Table {
        name: String,
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        allowed_values: Option<Vec<String>>,
    },
}

impl TryFrom<RawPartConfig> for PartConfig {
    type Error = String;

    fn try_from(raw: RawPartConfig) -> std::result::Result<Self, Self::Error> {
        match raw {
            RawPartConfig::Name(name) => Ok(PartConfig::integer(name)),
            RawPartConfig::Table {
                name,
                kind,
                allowed_values,
            } => {
                let kind = match kind.as_deref() {
                    None | Some("integer") => PartKind::Integer,
                    Some("string") => PartKind::String,
                    Some("value_list") => {
                        let allowed_values = allowed_values.unwrap_or_default();
                        if allowed_values.is_empty() {
                            return Err(format!(
                                "part '{}' of type value_list needs a non-empty allowed_values list",
                                name
                            ));
                        }
                        PartKind::ValueList { allowed_values }
                    }
                    Some(other) => {
                        return Err(format!("part '{}' has unknown type '{}'", name, other))
                    }
                };
                Ok(PartConfig { name, kind })
            }
        }
    }
}

impl PartConfig {
    pub fn integer(name: impl Into<String>) -> Self {
        PartConfig {
            name: name.into(),
            kind: PartKind::Integer,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        PartConfig {
            name: name.into(),
            kind: PartKind::String,
        }
    }

    pub fn value_list(name: impl Into<String>, allowed_values: &[&str]) -> Self {
        PartConfig {
            name: name.into(),
            kind: PartKind::ValueList {
                allowed_values: allowed_values.iter().map(|v| v.to_string()).collect(),
            },
        }
    }
}

/// Value held by a version part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartValue {
    Integer(u64),
    Text(String),
}

impl fmt::Display for PartValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartValue::Integer(n) => write!(f, "{}", n),
            PartValue::Text(s) => f.write_str(s),
        }
    }
}

/// One named, ordered component of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPart {
    pub name: String,
    pub kind: PartKind,
    pub value: PartValue,
}

impl VersionPart {
    /// Creates a part holding the zero value of its kind.
    pub fn zero(config: &PartConfig) -> Self {
        VersionPart {
            name: config.name.clone(),
            kind: config.kind.clone(),
            value: zero_value(&config.kind),
        }
    }

    /// Creates a part, checking that `value` fits the declared kind.
    pub fn new(config: &PartConfig, value: PartValue) -> Result<Self> {
        check_value(&config.name, &config.kind, &value)?;
        Ok(VersionPart {
            name: config.name.clone(),
            kind: config.kind.clone(),
            value,
        })
    }

    /// Value following the current one.
    pub fn next_value(&self) -> Result<PartValue> {
        match (&self.kind, &self.value) {
            (PartKind::Integer, PartValue::Integer(n)) => n
                .checked_add(1)
                .filter(|next| *next <= MAX_INTEGER)
                .map(PartValue::Integer)
                .ok_or_else(|| PunchError::validation(format!("part '{}' overflowed", self.name))),
            (PartKind::ValueList { allowed_values }, PartValue::Text(current))
                if !allowed_values.is_empty() =>
            {
                let position = allowed_values
                    .iter()
                    .position(|v| v == current)
                    .unwrap_or(0);
                let next = &allowed_values[(position + 1) % allowed_values.len()];
                Ok(PartValue::Text(next.clone()))
            }
            _ => Err(PunchError::validation(format!(
                "part '{}' cannot be increased",
                self.name
            ))),
        }
    }

    /// Zero value of this part's kind.
    pub fn zero_value(&self) -> PartValue {
        zero_value(&self.kind)
    }

    /// Converts user supplied text into a value of this part's kind.
    pub fn coerce(&self, raw: &str) -> Result<PartValue> {
        let value = match self.kind {
            PartKind::Integer => raw.trim().parse::<u64>().map(PartValue::Integer).map_err(|_| {
                PunchError::validation(format!(
                    "part '{}' is an integer, cannot set it to '{}'",
                    self.name, raw
                ))
            })?,
            PartKind::String | PartKind::ValueList { .. } => PartValue::Text(raw.to_string()),
        };
        check_value(&self.name, &self.kind, &value)?;
        Ok(value)
    }
}

fn zero_value(kind: &PartKind) -> PartValue {
    match kind {
        PartKind::Integer => PartValue::Integer(0),
        PartKind::String => PartValue::Text(String::new()),
        PartKind::ValueList { allowed_values } => {
            PartValue::Text(allowed_values.first().cloned().unwrap_or_default())
        }
    }
}

fn check_value(name: &str, kind: &PartKind, value: &PartValue) -> Result<()> {
    match (kind, value) {
        (PartKind::Integer, PartValue::Integer(n)) if *n > MAX_INTEGER => {
            Err(PunchError::validation(format!(
                "part '{}' cannot be larger than {}",
                name, MAX_INTEGER
            )))
        }
        (PartKind::Integer, PartValue::Integer(_)) | (PartKind::String, PartValue::Text(_)) => {
            Ok(())
        }
        (PartKind::ValueList { allowed_values }, PartValue::Text(text)) => {
            if allowed_values.iter().any(|v| v == text) {
                Ok(())
            } else {
                Err(PunchError::validation(format!(
                    "'{}' is not an allowed value for part '{}' (allowed: {})",
                    text,
                    name,
                    allowed_values.join(", ")
                )))
            }
        }
        _ => Err(PunchError::validation(format!(
            "value '{}' does not match the declared kind of part '{}'",
            value, name
        ))),
    }
}
