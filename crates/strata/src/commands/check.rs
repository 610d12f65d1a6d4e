//! Check command.

use std::path::Path;

use anyhow::{Context, Result};
use strata_config::Project;

/// Resolve every variant and report the outcome of each.
pub fn run(config_path: &Path) -> Result<()> {
    let project = Project::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let variants = project.variants();
    if variants.is_empty() {
        anyhow::bail!("{} defines no variants", config_path.display());
    }

    let mut failures = 0;
    for variant in variants {
        match project.resolve(variant.as_str()) {
            Ok(config) => tracing::info!(
                "{}: ok ({} entries, {} rules, {} plugins)",
                variant,
                config.entry.len(),
                config.module.rules.as_ref().map_or(0, Vec::len),
                config.plugins.len()
            ),
            Err(e) => {
                tracing::error!("{}: {}", variant, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} variant(s) failed to resolve", failures);
    }

    tracing::info!("All variants resolve cleanly");
    Ok(())
}
