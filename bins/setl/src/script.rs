//! Call scripts
//!
//! One call per line: `<accountID> <role> <operation> [args...]`, separated
//! by whitespace. Blank lines and lines starting with `#` are skipped.

use anyhow::{bail, Result};

/// One scripted call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub line: usize,
    pub account_id: String,
    pub role: String,
    pub operation: String,
    pub args: Vec<String>,
}

pub fn parse_script(text: &str) -> Result<Vec<Call>> {
    let mut calls = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace().map(str::to_string);
        let (Some(account_id), Some(role), Some(operation)) =
            (fields.next(), fields.next(), fields.next())
        else {
            bail!(
                "line {}: expected `<accountID> <role> <operation> [args...]`, got {:?}",
                index + 1,
                line
            );
        };

        calls.push(Call {
            line: index + 1,
            account_id,
            role,
            operation,
            args: fields.collect(),
        });
    }
    Ok(calls)
}
