use anyhow::Result;
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
///
/// Full-line YAML comments are left as written.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(ENV_VAR_PATTERN)?;
    let mut missing_vars = Vec::new();

    let lines: Vec<String> = content
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |caps: &Captures| {
                let placeholder = &caps[0];
                let Some(var) = caps.get(1).or_else(|| caps.get(2)) else {
                    return placeholder.to_string();
                };
                let var_name = var.as_str();

                match env::var(var_name) {
                    Ok(value) => {
                        debug!("Substituting environment variable: {} = \"{}\"", var_name, value);
                        value
                    }
                    Err(_) => {
                        warn!("Environment variable '{}' not set", var_name);
                        // Keep the placeholder; the validator reports it
                        missing_vars.push(var_name.to_string());
                        placeholder.to_string()
                    }
                }
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may fail validation): {:?}",
            missing_vars
        );
    }

    Ok(lines.concat())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    Regex::new(ENV_VAR_PATTERN)
        .map(|re| re.is_match(content))
        .unwrap_or(false)
}
