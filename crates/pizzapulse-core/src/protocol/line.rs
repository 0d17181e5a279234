//! Outbound metric line (one measurement per push).
//!
//! Wire shape: `<prefix>,source=<id>,<key>=<value> <field>=<value>`.
//!
//! Serialization is deterministic and newline-free:
//! - `,`, `=` and space are backslash-escaped in names and tag values
//!   (prefix only escapes `,` and space).
//! - CR/LF never reach the wire; they are replaced by a space first.

use std::fmt;

/// Numeric field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Int(i64),
    /// Printed in shortest round-trip form (`20`, `12.5`).
    Float(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

/// Immutable metric line.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricLine {
    prefix: String,
    tags: Vec<(String, String)>,
    field: String,
    value: FieldValue,
}

impl MetricLine {
    /// Build a line whose tags are `source=<source>` followed by `<key>=<value>`.
    pub fn new(
        prefix: impl Into<String>,
        source: &str,
        tag: (&str, &str),
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            tags: vec![
                ("source".to_string(), source.to_string()),
                (tag.0.to_string(), tag.1.to_string()),
            ],
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tags in wire order (`source` first).
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Value of the first tag with this key.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn value(&self) -> FieldValue {
        self.value
    }

    /// Serialize to the single-line wire form.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MetricLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_escaped(f, &self.prefix, &[',', ' '])?;
        for (k, v) in &self.tags {
            f.write_str(",")?;
            write_escaped(f, k, &[',', '=', ' '])?;
            f.write_str("=")?;
            write_escaped(f, v, &[',', '=', ' '])?;
        }
        f.write_str(" ")?;
        write_escaped(f, &self.field, &[',', '=', ' '])?;
        write!(f, "={}", self.value)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, special: &[char]) -> fmt::Result {
    use fmt::Write;

    for c in s.chars() {
        let c = if c == '\n' || c == '\r' { ' ' } else { c };
        if c == '\\' || special.contains(&c) {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}
