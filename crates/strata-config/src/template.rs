//! Template rendering and path resolution for resolved configurations.
//!
//! String values may reference `{{ package.name }}`, `{{ package.version }}`
//! and `{{ root }}`. Bundler placeholders such as `[name]` or
//! `[contenthash]` are left untouched.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigurationError;
use crate::model::BuildConfig;

/// Package metadata read from `package.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
}

fn default_version() -> String {
    "0.0.0".to_string()
}

impl PackageInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Read `package.json` from `root`.
    ///
    /// Without a manifest, or without a `name` in it, the package is named
    /// after the directory.
    pub fn read(root: &Path) -> Result<Self, ConfigurationError> {
        let path = root.join("package.json");
        if !path.exists() {
            let name = directory_name(root);
            tracing::debug!("No package.json in {}, using name '{}'", root.display(), name);
            return Ok(Self::new(name, default_version()));
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigurationError::Read {
            path: path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(|e| ConfigurationError::Parse {
                path,
                message: e.to_string(),
            })?;

        let name = manifest.name.unwrap_or_else(|| {
            let name = directory_name(root);
            tracing::debug!("package.json has no name, using '{}'", name);
            name
        });
        Ok(Self::new(name, manifest.version.unwrap_or_else(default_version)))
    }
}

/// The fields of `package.json` used for templates. npm only requires them
/// for published packages.
#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    version: Option<String>,
}

fn directory_name(root: &Path) -> String {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "app".to_string())
}

/// Values available to templates.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    pub package: PackageInfo,
    pub root: String,
}

impl TemplateContext {
    pub fn new(package: PackageInfo, root: &Path) -> Self {
        Self {
            package,
            root: root.display().to_string(),
        }
    }
}

/// Renders template strings with strict handling of undefined variables.
pub struct TemplateRenderer {
    env: Environment<'static>,
    ctx: TemplateContext,
}

impl TemplateRenderer {
    pub fn new(ctx: TemplateContext) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env, ctx }
    }

    /// Render one string. Strings without template syntax are returned as-is.
    pub fn render(&self, source: &str) -> Result<String, ConfigurationError> {
        if !source.contains("{{") && !source.contains("{%") {
            return Ok(source.to_string());
        }
        self.env
            .render_str(source, &self.ctx)
            .map_err(|e| ConfigurationError::Template {
                template: source.to_string(),
                message: e.to_string(),
            })
    }

    fn render_in_place(&self, value: &mut String) -> Result<(), ConfigurationError> {
        *value = self.render(value)?;
        Ok(())
    }

    fn render_path(&self, path: &mut PathBuf) -> Result<(), ConfigurationError> {
        let rendered = self.render(&path.to_string_lossy())?;
        *path = PathBuf::from(rendered);
        Ok(())
    }

    fn render_value(&self, value: &mut Value) -> Result<(), ConfigurationError> {
        match value {
            Value::String(s) => self.render_in_place(s),
            Value::Array(items) => items.iter_mut().try_for_each(|v| self.render_value(v)),
            Value::Object(map) => map.values_mut().try_for_each(|v| self.render_value(v)),
            _ => Ok(()),
        }
    }

    /// Render every templated string in a resolved configuration.
    pub fn render_config(&self, config: &mut BuildConfig) -> Result<(), ConfigurationError> {
        if let Some(context) = config.context.as_mut() {
            self.render_path(context)?;
        }
        for path in config.entry.values_mut() {
            self.render_path(path)?;
        }

        let output = &mut config.output;
        for field in [
            &mut output.filename,
            &mut output.chunk_filename,
            &mut output.public_path,
        ]
        .into_iter()
        .flatten()
        {
            self.render_in_place(field)?;
        }
        if let Some(path) = output.path.as_mut() {
            self.render_path(path)?;
        }

        for target in config.resolve.alias.values_mut() {
            self.render_in_place(target)?;
        }
        for dir in config.resolve.modules.iter_mut().flatten() {
            self.render_in_place(dir)?;
        }

        for rule in config.module.rules.iter_mut().flatten() {
            for path in rule.include.iter_mut().chain(rule.exclude.iter_mut()) {
                self.render_path(path)?;
            }
            for loader in &mut rule.loaders {
                if let Some(options) = loader.options.as_mut() {
                    self.render_value(options)?;
                }
            }
        }

        for plugin in &mut config.plugins {
            self.render_value(&mut plugin.options)?;
        }
        for value in config.passthrough.values_mut() {
            self.render_value(value)?;
        }

        Ok(())
    }
}

/// Make relative paths absolute against the project root.
///
/// Entry points resolve against `context`, which itself defaults to `root`.
pub fn resolve_paths(config: &mut BuildConfig, root: &Path) {
    let context = match config.context.take() {
        Some(dir) if dir.is_relative() => root.join(dir),
        Some(dir) => dir,
        None => root.to_path_buf(),
    };

    for path in config.entry.values_mut() {
        if path.is_relative() {
            *path = context.join(&*path);
        }
    }

    if let Some(path) = config.output.path.as_mut() {
        if path.is_relative() {
            *path = root.join(&*path);
        }
    }

    for rule in config.module.rules.iter_mut().flatten() {
        for path in rule.include.iter_mut().chain(rule.exclude.iter_mut()) {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
    }

    config.context = Some(context);
}
