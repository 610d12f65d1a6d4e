//! Typed bundler configuration with development and production overlays.
//!
//! A project describes its build once in a common configuration and keeps the
//! few settings that differ per build variant in small overlays. Resolving a
//! variant deep-merges its overlay onto the common configuration and yields a
//! document in the bundler's own schema.

pub mod error;
pub mod loader;
pub mod merge;
pub mod model;
pub mod overlay;
pub mod template;
pub mod validate;

pub use error::ConfigurationError;
pub use loader::{Format, Project, DEFAULT_CONFIG_FILE};
pub use merge::{apply_overlay, merge_value, resolve, Merge};
pub use model::{
    BuildConfig, CacheGroup, CacheGroupEntry, CommonConfig, Devtool, LoaderRef, Mode,
    ModuleOptions, Optimization, Output, Pattern, Plugin, Resolve, Rule, SplitChunks,
};
pub use overlay::{Overlay, OverlaySet, SequencePolicy, Variant};
pub use template::{PackageInfo, TemplateContext, TemplateRenderer};
pub use validate::validate;
