//! Initialize a project file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Run the init command.
pub fn run(config_path: &Path, yes: bool) -> Result<()> {
    tracing::info!("Initializing strata...");

    if config_path.exists() && !yes {
        tracing::warn!(
            "{} already exists. Use --yes to overwrite.",
            config_path.display()
        );
        return Ok(());
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    tracing::info!("Created {}", config_path.display());
    tracing::info!("Run 'strata resolve development' to print the development configuration.");

    Ok(())
}

const DEFAULT_CONFIG: &str = r##"# Strata project configuration
#
# [common] describes the build for every variant. Overlays under [variants]
# hold what differs between development and production builds.
# Strings may use {{ package.name }}, {{ package.version }} and {{ root }}.

[common]
target = "web"

# One entry point per HTML page
[common.entry]
main = "src/webpack.init.js"

[common.output]
filename = "{{ package.name }}.[name].[contenthash].js"
chunkFilename = "app/[name]/{{ package.name }}.[name].[contenthash].chunk.js"
path = "build"

[common.optimization]
runtimeChunk = "single"

[common.optimization.splitChunks]
chunks = "all"
minChunks = 2

[common.optimization.splitChunks.cacheGroups]
default = false

[common.optimization.splitChunks.cacheGroups.vendors]
test = '[\\/]node_modules[\\/]'
name = "vendors"

[common.optimization.splitChunks.cacheGroups.common]
test = '[\\/]src[\\/]app[\\/]common[\\/]'
name = "common"
reuseExistingChunk = true
enforce = true

[common.resolve]
modules = ["node_modules", "{{ root }}/src"]

[common.resolve.alias]
# Keeps core-js and core-js-pure from both landing in the bundle
core-js = "core-js-pure"

[[common.module.rules]]
test = '\.js$'
include = ["src"]

[[common.module.rules.use]]
loader = "babel-loader"

[common.module.rules.use.options]
plugins = [
    ["@babel/plugin-transform-runtime", { corejs = 3, helpers = true, regenerator = true, useESModules = true }],
    "@babel/plugin-syntax-dynamic-import",
]
presets = [
    ["@babel/preset-env", { corejs = 3.1, debug = true, modules = false, targets = "defaults", useBuiltIns = "usage" }],
]

[[common.module.rules]]
test = '\.html$'
include = ["src"]
use = [{ loader = "html-loader", options = { minimize = true } }]

[[common.module.rules]]
test = '\.css$'
include = ["src"]
use = ["style-loader", "mini-css-extract-plugin/loader", "css-loader"]

[[common.module.rules]]
test = '\.(png|svg|jpg|gif)$'
include = ["src"]
use = [{ loader = "file-loader", options = { name = "assets/[folder]/[name].[contenthash].[ext]", publicPath = "/" } }]

[[common.module.rules]]
test = '\.(woff|woff2|eot|ttf|otf)$'
include = ["src"]
use = [{ loader = "file-loader", options = { name = "assets/[folder]/[name].[contenthash].[ext]", publicPath = "/" } }]

[[common.plugins]]
plugin = "clean-webpack-plugin"

[[common.plugins]]
plugin = "html-webpack-plugin"
options = { template = "{{ root }}/src/index.html", filename = "index.html" }

# Strips hand-written script and link tags; the generated bundles replace them
[[common.plugins]]
plugin = "html-replace-webpack-plugin"
options = [{ pattern = '''(?<!\;)<\/?(script|link)(?!\sdata-env-vars)(\s?[\w\d\/\?\#\-\=(\"|\')\.]+)*>?''', flags = "g", replacement = "" }]

[[common.plugins]]
plugin = "mini-css-extract-plugin"
options = { filename = "{{ package.name }}.[name].[contenthash].css", chunkFilename = "app/[name]/{{ package.name }}.[name].[contenthash].chunk.css" }

[[common.plugins]]
plugin = "webpack/HashedModuleIdsPlugin"

[[common.plugins]]
plugin = "webpack-manifest-plugin"
options = { fileName = "{{ package.name }}.manifest.json" }

[[common.plugins]]
plugin = "webpack-bundle-analyzer/BundleAnalyzerPlugin"
options = { analyzerMode = "static", openAnalyzer = false, reportFilename = "{{ root }}/build/bundle-analyzer/index.html" }

[variants.development]
mode = "development"
devtool = "eval-source-map"
watch = true

[variants.production]
mode = "production"
devtool = "source-map"
"##;
