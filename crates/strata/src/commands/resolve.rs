//! Resolve command.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use strata_config::{BuildConfig, Project};

use crate::OutputFormat;

/// Serialize a resolved configuration.
pub fn render(config: &BuildConfig, format: OutputFormat) -> Result<String> {
    let text = match format {
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(config)?;
            json.push('\n');
            json
        }
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(text)
}

/// Run the resolve command.
pub fn run(config_path: &Path, variant: &str, out: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    let project = Project::load(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let config = project
        .resolve(variant)
        .with_context(|| format!("Failed to resolve variant '{}'", variant))?;

    let text = render(&config, format)?;

    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} configuration to {}", variant, path.display());
        }
        None => print!("{}", text),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::tempdir;

    fn project(dir: &Path) -> PathBuf {
        let path = dir.join("strata.toml");
        fs::write(&path, "[common.entry]\nmain = \"src/index.js\"\n").unwrap();
        path
    }

    #[test]
    fn writes_json_output_file() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());
        let out = temp.path().join("dist/webpack.production.json");

        run(&config, "production", Some(out.clone()), OutputFormat::Json).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(written["mode"], "production");
        assert_eq!(written["devtool"], "source-map");
        assert_eq!(written["watch"], false);
    }

    #[test]
    fn emits_tagged_test_patterns() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("strata.toml");
        fs::write(
            &config,
            r#"
[common.entry]
main = "src/index.js"

[[common.module.rules]]
test = '\.css$'
use = ["css-loader"]

[common.optimization.splitChunks.cacheGroups.vendors]
test = '[\\/]node_modules[\\/]'
name = "vendors"
"#,
        )
        .unwrap();
        let out = temp.path().join("webpack.json");

        run(&config, "production", Some(out.clone()), OutputFormat::Json).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(
            written["module"]["rules"][0]["test"],
            serde_json::json!({ "regex": r"\.css$" })
        );
        assert_eq!(
            written["optimization"]["splitChunks"]["cacheGroups"]["vendors"]["test"],
            serde_json::json!({ "regex": r"[\\/]node_modules[\\/]" })
        );
    }

    #[test]
    fn renders_yaml() {
        let temp = tempdir().unwrap();
        let project = Project::load(&project(temp.path())).unwrap();
        let config = project.resolve("development").unwrap();

        let yaml = render(&config, OutputFormat::Yaml).unwrap();

        assert!(yaml.contains("mode: development"));
        assert!(yaml.contains("watch: true"));
    }

    #[test]
    fn unknown_variant_fails() {
        let temp = tempdir().unwrap();
        let config = project(temp.path());

        let err = run(&config, "staging", None, OutputFormat::Json).unwrap_err();

        assert!(format!("{:#}", err).contains("Unknown variant 'staging'"));
    }
}
