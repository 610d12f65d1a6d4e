//! Build variants and their configuration overlays.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::model::{Devtool, Mode, ModuleOptions, Optimization, Output, Plugin, Resolve};

/// A named build mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variant {
    Development,
    Production,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Development, Variant::Production];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Development => "development",
            Variant::Production => "production",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "development" => Ok(Variant::Development),
            "production" => Ok(Variant::Production),
            other => Err(ConfigurationError::UnknownVariant(other.to_string())),
        }
    }
}

/// How an overlay combines with sequences it redefines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencePolicy {
    /// The overlay's sequence replaces the common one.
    #[default]
    Replace,
    /// The overlay's elements are appended after the common ones.
    Append,
}

/// Partial configuration holding the fields a variant overrides.
///
/// Absent fields keep the common value. Section tables merge key by key.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Overlay {
    #[serde(default)]
    pub sequences: SequencePolicy,

    #[serde(default)]
    pub mode: Option<Mode>,

    #[serde(default)]
    pub devtool: Option<Devtool>,

    /// Keep the bundler resident and rebuild on input changes
    #[serde(default)]
    pub watch: Option<bool>,

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
    pub plugins: Option<Vec<Plugin>>,

    #[serde(default)]
    pub passthrough: Map<String, Value>,
}

impl Overlay {
    /// Overlay used for development builds when the project defines none.
    pub fn development() -> Self {
        Self {
            mode: Some(Mode::Development),
            devtool: Some(Devtool::Strategy("eval-source-map".to_string())),
            watch: Some(true),
            ..Default::default()
        }
    }

    /// Overlay used for production builds when the project defines none.
    pub fn production() -> Self {
        Self {
            mode: Some(Mode::Production),
            devtool: Some(Devtool::Strategy("source-map".to_string())),
            ..Default::default()
        }
    }
}

/// The overlays available to a project, keyed by variant.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlaySet {
    overlays: BTreeMap<Variant, Overlay>,
}

impl OverlaySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Development and production overlays with the default settings.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.insert(Variant::Development, Overlay::development());
        set.insert(Variant::Production, Overlay::production());
        set
    }

    pub fn insert(&mut self, variant: Variant, overlay: Overlay) {
        self.overlays.insert(variant, overlay);
    }

    /// Look up the overlay for a variant.
    pub fn get(&self, variant: Variant) -> Result<&Overlay, ConfigurationError> {
        self.overlays
            .get(&variant)
            .ok_or(ConfigurationError::MissingOverlay(variant))
    }

    /// Look up the overlay for a variant given by name.
    pub fn select(&self, name: &str) -> Result<(Variant, &Overlay), ConfigurationError> {
        let variant = name.parse::<Variant>()?;
        Ok((variant, self.get(variant)?))
    }

    /// Variants that have an overlay, in declaration order of [`Variant`].
    pub fn variants(&self) -> impl Iterator<Item = Variant> + '_ {
        self.overlays.keys().copied()
    }
}
