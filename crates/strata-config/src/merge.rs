//! Deep merge of an overlay onto the common configuration.
//!
//! Scalars are replaced, tables merge key by key, and sequences follow the
//! overlay's [`SequencePolicy`]: replaced wholesale by default, appended only
//! when the overlay asks for it. Sequences the overlay does not define are
//! kept verbatim.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::ConfigurationError;
use crate::model::{
    BuildConfig, CacheGroup, CacheGroupEntry, CommonConfig, ModuleOptions, Optimization, Output,
    Resolve, SplitChunks,
};
use crate::overlay::{Overlay, OverlaySet, SequencePolicy, Variant};

/// A configuration section that can absorb a partial copy of itself.
pub trait Merge {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy);
}

fn merge_scalar<T>(base: &mut Option<T>, overlay: Option<T>) {
    if overlay.is_some() {
        *base = overlay;
    }
}

fn merge_sequence<T>(base: &mut Vec<T>, overlay: Option<Vec<T>>, policy: SequencePolicy) {
    let Some(items) = overlay else {
        return;
    };
    match policy {
        SequencePolicy::Replace => *base = items,
        SequencePolicy::Append => base.extend(items),
    }
}

fn merge_optional_sequence<T>(
    base: &mut Option<Vec<T>>,
    overlay: Option<Vec<T>>,
    policy: SequencePolicy,
) {
    match base {
        Some(existing) => merge_sequence(existing, overlay, policy),
        None => *base = overlay,
    }
}

/// Merge two tables whose values are replaced, not merged.
fn merge_table<V>(base: &mut BTreeMap<String, V>, overlay: BTreeMap<String, V>) {
    base.extend(overlay);
}

impl<T: Merge> Merge for Option<T> {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        let Some(patch) = overlay else {
            return;
        };
        match self {
            Some(base) => base.merge(patch, policy),
            None => *self = Some(patch),
        }
    }
}

impl Merge for Output {
    fn merge(&mut self, overlay: Self, _policy: SequencePolicy) {
        merge_scalar(&mut self.filename, overlay.filename);
        merge_scalar(&mut self.chunk_filename, overlay.chunk_filename);
        merge_scalar(&mut self.path, overlay.path);
        merge_scalar(&mut self.public_path, overlay.public_path);
    }
}

impl Merge for Optimization {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        merge_scalar(&mut self.runtime_chunk, overlay.runtime_chunk);
        merge_scalar(&mut self.minimize, overlay.minimize);
        self.split_chunks.merge(overlay.split_chunks, policy);
    }
}

impl Merge for SplitChunks {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        merge_scalar(&mut self.chunks, overlay.chunks);
        merge_scalar(&mut self.min_chunks, overlay.min_chunks);
        for (name, entry) in overlay.cache_groups {
            match self.cache_groups.get_mut(&name) {
                Some(existing) => existing.merge(entry, policy),
                None => {
                    self.cache_groups.insert(name, entry);
                }
            }
        }
    }
}

impl Merge for CacheGroupEntry {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        match (self, overlay) {
            (CacheGroupEntry::Group(base), CacheGroupEntry::Group(patch)) => {
                base.merge(patch, policy)
            }
            (this, patch) => *this = patch,
        }
    }
}

impl Merge for CacheGroup {
    fn merge(&mut self, overlay: Self, _policy: SequencePolicy) {
        merge_scalar(&mut self.test, overlay.test);
        merge_scalar(&mut self.name, overlay.name);
        merge_scalar(&mut self.priority, overlay.priority);
        merge_scalar(&mut self.reuse_existing_chunk, overlay.reuse_existing_chunk);
        merge_scalar(&mut self.enforce, overlay.enforce);
    }
}

impl Merge for Resolve {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        merge_table(&mut self.alias, overlay.alias);
        merge_optional_sequence(&mut self.modules, overlay.modules, policy);
        merge_optional_sequence(&mut self.extensions, overlay.extensions, policy);
    }
}

impl Merge for ModuleOptions {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        merge_optional_sequence(&mut self.rules, overlay.rules, policy);
    }
}

impl Merge for Value {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        merge_value(self, overlay, policy);
    }
}

impl Merge for Map<String, Value> {
    fn merge(&mut self, overlay: Self, policy: SequencePolicy) {
        for (key, value) in overlay {
            match self.get_mut(&key) {
                Some(existing) => merge_value(existing, value, policy),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

/// Merge untyped values, used for passthrough keys.
///
/// Objects merge key by key; arrays follow `policy`; anything else is
/// replaced by the overlay.
pub fn merge_value(base: &mut Value, overlay: Value, policy: SequencePolicy) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(patch)) => base.merge(patch, policy),
        (Value::Array(base), Value::Array(items)) if policy == SequencePolicy::Append => {
            base.extend(items)
        }
        (base, patch) => *base = patch,
    }
}

/// Apply an overlay to a base configuration.
pub fn apply_overlay(mut base: BuildConfig, overlay: Overlay) -> BuildConfig {
    let policy = overlay.sequences;

    if let Some(mode) = overlay.mode {
        base.mode = mode;
    }
    if let Some(devtool) = overlay.devtool {
        base.devtool = devtool;
    }
    if let Some(watch) = overlay.watch {
        base.watch = watch;
    }
    merge_scalar(&mut base.context, overlay.context);
    merge_scalar(&mut base.target, overlay.target);
    merge_table(&mut base.entry, overlay.entry);

    base.output.merge(overlay.output, policy);
    base.optimization.merge(overlay.optimization, policy);
    base.resolve.merge(overlay.resolve, policy);
    base.module.merge(overlay.module, policy);
    merge_sequence(&mut base.plugins, overlay.plugins, policy);
    base.passthrough.merge(overlay.passthrough, policy);

    base
}

/// Select the overlay for `variant` and merge it onto `common`.
pub fn resolve(
    common: &CommonConfig,
    overlays: &OverlaySet,
    variant: &str,
) -> Result<(Variant, BuildConfig), ConfigurationError> {
    let (variant, overlay) = overlays.select(variant)?;

    tracing::debug!(
        variant = %variant,
        sequences = ?overlay.sequences,
        "Merging overlay onto common configuration"
    );

    let resolved = apply_overlay(BuildConfig::from(common.clone()), overlay.clone());
    Ok((variant, resolved))
}
