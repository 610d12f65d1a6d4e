//! Project file loading.
//!
//! A project file holds a `common` table and, optionally, a `variants` table
//! with one overlay per variant:
//!
//! ```toml
//! [common.entry]
//! main = "src/index.js"
//!
//! [variants.production]
//! mode = "production"
//! devtool = "source-map"
//! ```
//!
//! TOML, YAML and JSON are accepted; the format follows the file extension.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::ConfigurationError;
use crate::merge;
use crate::model::{BuildConfig, CommonConfig, VARIANT_KEYS};
use crate::overlay::{Overlay, OverlaySet, Variant};
use crate::template::{resolve_paths, PackageInfo, TemplateContext, TemplateRenderer};
use crate::validate::validate;

/// Default project file name.
pub const DEFAULT_CONFIG_FILE: &str = "strata.toml";

/// Supported project file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
    Json,
}

impl Format {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigurationError> {
        match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
            "toml" => Ok(Format::Toml),
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            other => Err(ConfigurationError::UnsupportedFormat(format!(
                "{} (extension '{}')",
                path.display(),
                other
            ))),
        }
    }

    fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        }
    }
}

/// A loaded project: common configuration, overlays, and template context.
#[derive(Debug, Clone)]
pub struct Project {
    pub common: CommonConfig,
    pub overlays: OverlaySet,
    pub root: PathBuf,
    pub package: PackageInfo,
}

impl Project {
    /// Load a project file and the `package.json` next to it.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let format = Format::from_path(path)?;
        let content = fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let root = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let root = root.canonicalize().unwrap_or(root);

        let package = PackageInfo::read(&root)?;
        let (common, overlays) = parse_project(&content, format).map_err(|e| match e {
            ParseFailure::Syntax(message) => ConfigurationError::Parse {
                path: path.to_path_buf(),
                message,
            },
            ParseFailure::Config(err) => err,
        })?;

        tracing::info!(
            "Loaded {} ({} variants) for package '{}'",
            path.display(),
            overlays.variants().count(),
            package.name
        );

        Ok(Self {
            common,
            overlays,
            root,
            package,
        })
    }

    /// Variants this project can be resolved for.
    pub fn variants(&self) -> Vec<Variant> {
        self.overlays.variants().collect()
    }

    /// Resolve the configuration for a variant.
    ///
    /// Merges the overlay onto the common configuration, renders templates,
    /// anchors relative paths at the project root and validates the result.
    pub fn resolve(&self, variant: &str) -> Result<BuildConfig, ConfigurationError> {
        let (variant, mut config) = merge::resolve(&self.common, &self.overlays, variant)?;

        let renderer = TemplateRenderer::new(TemplateContext::new(self.package.clone(), &self.root));
        renderer.render_config(&mut config)?;
        resolve_paths(&mut config, &self.root);
        validate(&config)?;

        tracing::debug!(
            variant = %variant,
            mode = ?config.mode,
            watch = config.watch,
            "Resolved configuration"
        );

        Ok(config)
    }
}

enum ParseFailure {
    Syntax(String),
    Config(ConfigurationError),
}

impl From<ConfigurationError> for ParseFailure {
    fn from(err: ConfigurationError) -> Self {
        ParseFailure::Config(err)
    }
}

/// Parse project file content into the common configuration and overlays.
fn parse_project(
    content: &str,
    format: Format,
) -> Result<(CommonConfig, OverlaySet), ParseFailure> {
    let value = format.parse(content).map_err(ParseFailure::Syntax)?;
    let Value::Object(mut root) = value else {
        return Err(ConfigurationError::malformed("<root>", "expected a table").into());
    };

    let common_value = root
        .remove("common")
        .ok_or_else(|| ConfigurationError::malformed("common", "missing [common] table"))?;
    let variants_value = root.remove("variants");

    if let Some(key) = root.keys().next() {
        return Err(ConfigurationError::malformed(key.clone(), "unknown top-level key").into());
    }

    if let Value::Object(table) = &common_value {
        if let Some(key) = VARIANT_KEYS.iter().find(|k| table.contains_key(**k)) {
            return Err(ConfigurationError::VariantKeyInCommon(key.to_string()).into());
        }
    }
    let common: CommonConfig = serde_json::from_value(common_value)
        .map_err(|e| ConfigurationError::malformed("common", e))?;

    let overlays = match variants_value {
        None => OverlaySet::builtin(),
        Some(value) => {
            let tables: BTreeMap<String, Value> = serde_json::from_value(value)
                .map_err(|e| ConfigurationError::malformed("variants", e))?;
            let mut set = OverlaySet::new();
            for (name, table) in tables {
                let variant = name.parse::<Variant>()?;
                let overlay: Overlay = serde_json::from_value(table)
                    .map_err(|e| ConfigurationError::malformed(format!("variants.{}", name), e))?;
                set.insert(variant, overlay);
            }
            set
        }
    };

    Ok((common, overlays))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Devtool, Mode};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const PROJECT: &str = r#"
[common]
target = "web"

[common.entry]
main = "src/index.js"

[common.output]
filename = "{{ package.name }}.[name].[contenthash].js"
path = "build"

[common.resolve]
modules = ["node_modules", "src"]

[common.resolve.alias]
core-js = "core-js-pure"

[[common.module.rules]]
test = '\.css$'
include = ["src"]
use = ["style-loader", "css-loader"]

[[common.plugins]]
plugin = "clean-webpack-plugin"

[variants.development]
mode = "development"
devtool = "eval-source-map"
watch = true

[variants.production]
mode = "production"
devtool = "source-map"

[variants.production.resolve.alias]
extra = "x"
"#;

    fn write_project(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        fs::write(
            dir.join("package.json"),
            r#"{ "name": "shop", "version": "1.0.0" }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn loads_and_resolves_toml_project() {
        let temp = tempdir().unwrap();
        let path = write_project(temp.path(), "strata.toml", PROJECT);

        let project = Project::load(&path).unwrap();
        let config = project.resolve("production").unwrap();

        assert_eq!(project.variants(), vec![Variant::Development, Variant::Production]);
        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.devtool, Devtool::Strategy("source-map".into()));
        assert!(!config.watch);
        assert_eq!(
            config.output.filename.as_deref(),
            Some("shop.[name].[contenthash].js")
        );
        assert_eq!(config.output.path, Some(project.root.join("build")));
        assert_eq!(config.entry["main"], project.root.join("src/index.js"));
        assert_eq!(config.resolve.alias.len(), 2);
        assert_eq!(
            config.resolve.modules,
            Some(vec!["node_modules".to_string(), "src".to_string()])
        );
    }

    #[test]
    fn development_watches() {
        let temp = tempdir().unwrap();
        let path = write_project(temp.path(), "strata.toml", PROJECT);

        let config = Project::load(&path).unwrap().resolve("development").unwrap();

        assert!(config.watch);
        assert_eq!(config.devtool, Devtool::Strategy("eval-source-map".into()));
        assert_eq!(config.resolve.alias.len(), 1);
    }

    #[test]
    fn unknown_variant_fails() {
        let temp = tempdir().unwrap();
        let path = write_project(temp.path(), "strata.toml", PROJECT);

        let result = Project::load(&path).unwrap().resolve("staging");

        assert!(matches!(result, Err(ConfigurationError::UnknownVariant(_))));
    }

    #[test]
    fn uses_builtin_overlays_without_variants_table() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common.entry]\nmain = \"src/index.js\"\n",
        );

        let project = Project::load(&path).unwrap();
        let config = project.resolve("development").unwrap();

        assert_eq!(config.mode, Mode::Development);
        assert!(config.watch);
    }

    #[test]
    fn defined_variants_replace_builtins() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common.entry]\nmain = \"a.js\"\n\n[variants.production]\nmode = \"production\"\n",
        );

        let result = Project::load(&path).unwrap().resolve("development");

        assert!(matches!(
            result,
            Err(ConfigurationError::MissingOverlay(Variant::Development))
        ));
    }

    #[test]
    fn rejects_variant_keys_in_common() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common]\nmode = \"production\"\n\n[common.entry]\nmain = \"a.js\"\n",
        );

        let result = Project::load(&path);

        assert!(matches!(
            result,
            Err(ConfigurationError::VariantKeyInCommon(key)) if key == "mode"
        ));
    }

    #[test]
    fn rejects_unknown_variant_table() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common.entry]\nmain = \"a.js\"\n\n[variants.staging]\nmode = \"production\"\n",
        );

        let result = Project::load(&path);

        assert!(matches!(result, Err(ConfigurationError::UnknownVariant(name)) if name == "staging"));
    }

    #[test]
    fn reports_malformed_overlay_key() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common.entry]\nmain = \"a.js\"\n\n[variants.production]\nmode = \"fastest\"\n",
        );

        let result = Project::load(&path);

        assert!(matches!(
            result,
            Err(ConfigurationError::Malformed { key, .. }) if key == "variants.production"
        ));
    }

    #[test]
    fn rejects_enabled_cache_group_flag() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.toml",
            "[common.entry]\nmain = \"a.js\"\n\n[common.optimization.splitChunks.cacheGroups]\nvendors = true\n",
        );

        let result = Project::load(&path);

        assert!(matches!(
            result,
            Err(ConfigurationError::Malformed { key, .. }) if key == "common"
        ));
    }

    #[test]
    fn loads_yaml_project() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.yaml",
            "common:\n  entry:\n    main: src/index.js\nvariants:\n  production:\n    mode: production\n    devtool: false\n",
        );

        let config = Project::load(&path).unwrap().resolve("production").unwrap();

        assert_eq!(config.mode, Mode::Production);
        assert_eq!(config.devtool, Devtool::Disabled);
    }

    #[test]
    fn loads_json_project() {
        let temp = tempdir().unwrap();
        let path = write_project(
            temp.path(),
            "strata.json",
            r#"{ "common": { "entry": { "main": "src/index.js" } } }"#,
        );

        let config = Project::load(&path).unwrap().resolve("production").unwrap();

        assert_eq!(config.mode, Mode::Production);
    }

    #[test]
    fn rejects_unsupported_extension() {
        let result = Format::from_path(Path::new("webpack.config.js"));
        assert!(matches!(result, Err(ConfigurationError::UnsupportedFormat(_))));
    }

    #[test]
    fn syntax_errors_name_the_file() {
        let temp = tempdir().unwrap();
        let path = write_project(temp.path(), "strata.toml", "[common\nentry = ");

        let result = Project::load(&path);

        assert!(matches!(result, Err(ConfigurationError::Parse { path: p, .. }) if p == path));
    }
}
