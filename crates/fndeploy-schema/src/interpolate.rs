//! `${VAR}` / `$VAR` substitution for manifest values.

use serde_yaml::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Resolves variable references against an explicit overlay and, optionally,
/// the process environment.
///
/// The overlay always wins. Unset variables expand to the empty string.
#[derive(Debug, Clone, Default)]
pub struct Interpolator {
    vars: BTreeMap<String, String>,
    process_env: bool,
}

impl Interpolator {
    /// Read from the process environment only.
    pub fn from_env() -> Self {
        Self {
            vars: BTreeMap::new(),
            process_env: true,
        }
    }

    /// Read from `vars` and nothing else.
    pub fn isolated(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars,
            process_env: false,
        }
    }

    #[must_use]
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        if let Some(v) = self.vars.get(name) {
            return Some(v.clone());
        }
        if self.process_env {
            return std::env::var(name).ok();
        }
        None
    }

    pub fn interpolate_str(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;
        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let candidate = &rest[pos..];
            match parse_reference(candidate) {
                Some((name, consumed)) => {
                    let value = self.lookup(name).unwrap_or_else(|| {
                        debug!("variable '{name}' is not set, substituting empty string");
                        String::new()
                    });
                    out.push_str(&value);
                    rest = &candidate[consumed..];
                }
                None => {
                    out.push('$');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Substitute every string inside `value`, descending into sequences and
    /// mapping values. Keys are left untouched.
    pub fn interpolate_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.interpolate_str(s)),
            Value::Sequence(items) => {
                Value::Sequence(items.iter().map(|v| self.interpolate_value(v)).collect())
            }
            Value::Mapping(map) => Value::Mapping(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.interpolate_value(v)))
                    .collect(),
            ),
            Value::Tagged(tagged) => self.interpolate_value(&tagged.value),
            other => other.clone(),
        }
    }
}

/// Parse a reference at the start of `input` (which begins with `$`).
/// Returns the variable name and the number of bytes consumed.
fn parse_reference(input: &str) -> Option<(&str, usize)> {
    let body = input.strip_prefix('$')?;
    if let Some(braced) = body.strip_prefix('{') {
        let end = braced.find('}')?;
        let name = &braced[..end];
        return is_identifier(name).then_some((name, end + 3));
    }
    let len: usize = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();
    if len == 0 {
        return None;
    }
    let name = &body[..len];
    is_identifier(name).then_some((name, len + 1))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
