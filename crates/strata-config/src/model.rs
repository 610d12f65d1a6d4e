//! Typed build configuration.
//!
//! Field names serialize in the bundler's camelCase schema so the resolved
//! document can be handed to it unchanged. Section types use optional fields
//! throughout, which lets the same type describe both a full section and an
//! overlay's partial patch of it.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level keys modelled by [`BuildConfig`]. Passthrough keys may not use them.
pub const MODELLED_KEYS: &[&str] = &[
    "context",
    "entry",
    "output",
    "target",
    "mode",
    "devtool",
    "watch",
    "optimization",
    "resolve",
    "module",
    "plugins",
];

/// Keys that only a variant overlay may set.
pub const VARIANT_KEYS: &[&str] = &["mode", "devtool", "watch"];

/// Optimization level passed to the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    None,
    Development,
    Production,
}

/// Source map strategy.
///
/// Serializes as `false` when disabled, otherwise as the strategy name
/// (e.g. `"eval-source-map"`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "DevtoolRepr", into = "DevtoolRepr")]
pub enum Devtool {
    #[default]
    Disabled,
    Strategy(String),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DevtoolRepr {
    Flag(bool),
    Name(String),
}

impl TryFrom<DevtoolRepr> for Devtool {
    type Error = String;

    fn try_from(repr: DevtoolRepr) -> Result<Self, Self::Error> {
        match repr {
            DevtoolRepr::Flag(false) => Ok(Devtool::Disabled),
            DevtoolRepr::Flag(true) => {
                Err("devtool must be false or a source map strategy name".to_string())
            }
            DevtoolRepr::Name(name) => Ok(Devtool::Strategy(name)),
        }
    }
}

impl From<Devtool> for DevtoolRepr {
    fn from(devtool: Devtool) -> Self {
        match devtool {
            Devtool::Disabled => DevtoolRepr::Flag(false),
            Devtool::Strategy(name) => DevtoolRepr::Name(name),
        }
    }
}

/// Naming and location of emitted bundles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Output {
    /// Template for entry point bundles, e.g. `app.[name].[contenthash].js`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Template for split and lazily loaded chunks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_filename: Option<String>,

    /// Output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
}

/// Bundle optimization settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Optimization {
    /// Runtime chunk strategy (`"single"`, `"multiple"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_chunk: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_chunks: Option<SplitChunks>,
}

/// Shared chunk extraction settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SplitChunks {
    /// Which chunks to consider (`"all"`, `"async"`, `"initial"`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunks: Option<String>,

    /// Minimum number of chunks that must share a module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_chunks: Option<u32>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub cache_groups: BTreeMap<String, CacheGroupEntry>,
}

/// A cache group, or `false` to disable a built-in group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CacheGroupRepr", into = "CacheGroupRepr")]
pub enum CacheGroupEntry {
    Disabled,
    Group(CacheGroup),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CacheGroupRepr {
    Flag(bool),
    Group(CacheGroup),
}

impl TryFrom<CacheGroupRepr> for CacheGroupEntry {
    type Error = String;

    fn try_from(repr: CacheGroupRepr) -> Result<Self, Self::Error> {
        match repr {
            CacheGroupRepr::Flag(false) => Ok(CacheGroupEntry::Disabled),
            CacheGroupRepr::Flag(true) => {
                Err("a cache group must be false or a table of settings".to_string())
            }
            CacheGroupRepr::Group(group) => Ok(CacheGroupEntry::Group(group)),
        }
    }
}

impl From<CacheGroupEntry> for CacheGroupRepr {
    fn from(entry: CacheGroupEntry) -> Self {
        match entry {
            CacheGroupEntry::Disabled => CacheGroupRepr::Flag(false),
            CacheGroupEntry::Group(group) => CacheGroupRepr::Group(group),
        }
    }
}

/// Settings for one cache group.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CacheGroup {
    /// Regular expression matched against module paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<Pattern>,

    /// Chunk name, substituted for `[name]` in `output.chunkFilename`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    /// Reuse an already split chunk instead of emitting a new one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_existing_chunk: Option<bool>,

    /// Create this chunk regardless of size and count limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce: Option<bool>,
}

/// Module resolution rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Resolve {
    /// Import specifier aliases
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, String>,

    /// Directories searched for bare imports, in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

/// Per-file-type processing rules.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
}

/// A file pattern and the loader pipeline applied to matching files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Regular expression matched against file paths
    pub test: Pattern,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,

    /// Loaders in bundler order (applied last to first)
    #[serde(rename = "use")]
    pub loaders: Vec<LoaderRef>,
}

/// Regular expression source for a `test` condition.
///
/// Written as a plain string in project files. Emitted as `{"regex": "..."}`
/// because a bare string `test` means an absolute path prefix to the bundler;
/// the loader shim builds a `RegExp` from the tagged form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PatternRepr")]
pub struct Pattern {
    regex: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PatternRepr {
    Source(String),
    Tagged { regex: String },
}

impl From<PatternRepr> for Pattern {
    fn from(repr: PatternRepr) -> Self {
        match repr {
            PatternRepr::Source(regex) | PatternRepr::Tagged { regex } => Pattern { regex },
        }
    }
}

impl Pattern {
    pub fn new(regex: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.regex
    }
}

impl From<&str> for Pattern {
    fn from(regex: &str) -> Self {
        Self::new(regex)
    }
}

/// Reference to an external loader.
///
/// Accepts either a bare name or a `{ loader, options }` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LoaderRepr")]
pub struct LoaderRef {
    pub loader: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LoaderRepr {
    Name(String),
    Full {
        loader: String,
        #[serde(default)]
        options: Option<Value>,
    },
}

impl From<LoaderRepr> for LoaderRef {
    fn from(repr: LoaderRepr) -> Self {
        match repr {
            LoaderRepr::Name(loader) => LoaderRef {
                loader,
                options: None,
            },
            LoaderRepr::Full { loader, options } => LoaderRef { loader, options },
        }
    }
}

impl LoaderRef {
    pub fn named(loader: impl Into<String>) -> Self {
        Self {
            loader: loader.into(),
            options: None,
        }
    }
}

/// Reference to an external whole-build plugin and its constructor options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plugin {
    /// Module that exports the plugin (e.g. `html-webpack-plugin`)
    pub plugin: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub options: Value,
}

impl Plugin {
    pub fn new(plugin: impl Into<String>, options: Value) -> Self {
        Self {
            plugin: plugin.into(),
            options,
        }
    }
}

/// Variant-independent configuration, as written in `[common]`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommonConfig {
    /// Base directory for entry points and loaders (defaults to the project root)
    #[serde(default)]
    pub context: Option<PathBuf>,

    #[serde(default)]
    pub entry: BTreeMap<String, PathBuf>,

    #[serde(default)]
    pub output: Output,

    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub optimization: Optimization,

    #[serde(default)]
    pub resolve: Resolve,

    #[serde(default)]
    pub module: ModuleOptions,

    #[serde(default)]
    pub plugins: Vec<Plugin>,

    /// Bundler keys without a typed field, emitted as-is
    #[serde(default)]
    pub passthrough: Map<String, Value>,
}

/// A fully resolved configuration, ready for the bundler.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BuildConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PathBuf>,

    pub entry: BTreeMap<String, PathBuf>,

    pub output: Output,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    pub mode: Mode,

    pub devtool: Devtool,

    pub watch: bool,

    pub optimization: Optimization,

    pub resolve: Resolve,

    pub module: ModuleOptions,

    pub plugins: Vec<Plugin>,

    #[serde(flatten)]
    pub passthrough: Map<String, Value>,
}

impl From<CommonConfig> for BuildConfig {
    fn from(common: CommonConfig) -> Self {
        Self {
            context: common.context,
            entry: common.entry,
            output: common.output,
            target: common.target,
            mode: Mode::None,
            devtool: Devtool::Disabled,
            watch: false,
            optimization: common.optimization,
            resolve: common.resolve,
            module: common.module,
            plugins: common.plugins,
            passthrough: common.passthrough,
        }
    }
}
