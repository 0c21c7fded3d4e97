use std::{fmt::Write, path::Path, str::FromStr, time::Duration};

use anyhow::bail;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::Config;

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    parse(&content)
}

pub(crate) fn parse(content: &str) -> anyhow::Result<Config> {
    let mut raw_config: Value = toml::from_str(content)?;
    expand_dynamic_strings(&mut Vec::new(), &mut raw_config)?;

    let config = Config::deserialize(raw_config)?;

    for warning in validate_rate_limit(&config) {
        log::warn!("{warning}");
    }

    Ok(config)
}

/// Expands `{{ env.VAR }}` placeholders in every string of the document.
fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]")?,
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                bail!("Failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}

/// Settings that load fine but are probably not what the operator wants.
pub(crate) fn validate_rate_limit(config: &Config) -> Vec<String> {
    let rate_limit = &config.server.rate_limit;
    let mut warnings = Vec::new();

    if !rate_limit.enabled {
        warnings.push("Rate limiting is disabled, every request will be admitted".to_string());
        return warnings;
    }

    if rate_limit.refill_interval > Duration::from_secs(3600) {
        warnings.push(format!(
            "Rate limit refills one token every {:?}, the bucket will effectively never refill",
            rate_limit.refill_interval
        ));
    }

    warnings
}
