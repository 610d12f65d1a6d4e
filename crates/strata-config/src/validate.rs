//! Checks applied to a resolved configuration before it is emitted.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::ConfigurationError;
use crate::model::{BuildConfig, CacheGroupEntry, Devtool, MODELLED_KEYS};

fn devtool_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:eval|(?:inline-|hidden-|eval-)?(?:nosources-)?(?:cheap-(?:module-)?)?source-map)$")
            .expect("devtool pattern is valid")
    })
}

fn check_pattern(key: String, pattern: &str) -> Result<(), ConfigurationError> {
    Regex::new(pattern)
        .map(|_| ())
        .map_err(|e| ConfigurationError::InvalidPattern {
            key,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

/// Validate a resolved configuration.
pub fn validate(config: &BuildConfig) -> Result<(), ConfigurationError> {
    if config.entry.is_empty() {
        return Err(ConfigurationError::malformed(
            "entry",
            "at least one entry point is required",
        ));
    }

    if let Devtool::Strategy(name) = &config.devtool {
        if !devtool_pattern().is_match(name) {
            return Err(ConfigurationError::malformed(
                "devtool",
                format!("'{}' is not a source map strategy", name),
            ));
        }
    }

    if let Some(rules) = &config.module.rules {
        for (index, rule) in rules.iter().enumerate() {
            check_pattern(format!("module.rules[{}].test", index), rule.test.as_str())?;
            if rule.loaders.is_empty() {
                return Err(ConfigurationError::malformed(
                    format!("module.rules[{}].use", index),
                    "a rule needs at least one loader",
                ));
            }
        }
    }

    if let Some(split) = &config.optimization.split_chunks {
        for (name, entry) in &split.cache_groups {
            if let CacheGroupEntry::Group(group) = entry {
                if let Some(test) = &group.test {
                    check_pattern(
                        format!("optimization.splitChunks.cacheGroups.{}.test", name),
                        test.as_str(),
                    )?;
                }
            }
        }
    }

    for key in config.passthrough.keys() {
        if MODELLED_KEYS.contains(&key.as_str()) {
            return Err(ConfigurationError::malformed(
                format!("passthrough.{}", key),
                "key is modelled by the configuration and must be set directly",
            ));
        }
    }

    Ok(())
}
