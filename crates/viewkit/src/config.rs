//! Renderer configuration.
//!
//! A [`RenderConfig`] is assembled once, by chaining builder methods or by
//! applying [`RenderOptions`] in order, and is then frozen inside a
//! [`PageRenderer`](crate::PageRenderer).
//!
//! Composition rules:
//!
//! - scalar settings (roots, cache flag, extension, modes): the last value
//!   applied wins
//! - functions: registries are merged, so later registrations replace
//!   same-named functions and everything else is kept
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | `fragments_root` | `templates` |
//! | `pages_root` | `templates/pages` |
//! | `cache_enabled` | `false` |
//! | `extension` | `.html` |
//! | `functions` | [`FunctionRegistry::with_defaults`] |
//! | `undefined` | [`UndefinedMode::Strict`] |
//! | `collisions` | [`CollisionPolicy::Overwrite`] |
//!
//! # Options from YAML
//!
//! ```rust
//! use viewkit::{RenderConfig, RenderOptions};
//!
//! let options = RenderOptions::from_yaml(r#"
//! pages_root: site/pages
//! fragments_root: site/partials
//! cache_enabled: true
//! "#).unwrap();
//!
//! let config = RenderConfig::new().apply(options);
//! assert!(config.cache_enabled());
//! assert_eq!(config.pages_root(), std::path::Path::new("site/pages"));
//! ```

use std::path::{Path, PathBuf};

use minijinja::functions::Function;
use minijinja::value::{FunctionArgs, FunctionResult};
use minijinja::UndefinedBehavior;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::functions::FunctionRegistry;

pub const DEFAULT_FRAGMENTS_ROOT: &str = "templates";
pub const DEFAULT_PAGES_ROOT: &str = "templates/pages";
pub const DEFAULT_EXTENSION: &str = ".html";

/// How a bundle treats references to missing values during execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedMode {
    /// Missing values render as empty and are falsy.
    Lenient,
    /// Like lenient, but attribute access on a missing value also yields
    /// a missing value instead of failing.
    Chainable,
    /// Printing, iterating or testing a missing value fails the render.
    /// `is defined` and the `default` filter still work.
    #[default]
    Strict,
}

impl From<UndefinedMode> for UndefinedBehavior {
    fn from(mode: UndefinedMode) -> Self {
        match mode {
            UndefinedMode::Lenient => UndefinedBehavior::Lenient,
            UndefinedMode::Chainable => UndefinedBehavior::Chainable,
            UndefinedMode::Strict => UndefinedBehavior::Strict,
        }
    }
}

/// What to do when two page files share a base name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// The page discovered later replaces the earlier one. Discovery is
    /// sorted by file name, so the winner is stable across runs.
    #[default]
    Overwrite,
    /// Fail the build.
    Reject,
}

/// Frozen settings for a [`PageRenderer`](crate::PageRenderer).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    cache_enabled: bool,
    fragments_root: PathBuf,
    pages_root: PathBuf,
    extension: String,
    functions: FunctionRegistry,
    undefined: UndefinedMode,
    collisions: CollisionPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            fragments_root: PathBuf::from(DEFAULT_FRAGMENTS_ROOT),
            pages_root: PathBuf::from(DEFAULT_PAGES_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            functions: FunctionRegistry::with_defaults(),
            undefined: UndefinedMode::default(),
            collisions: CollisionPolicy::default(),
        }
    }
}

impl RenderConfig {
    /// Creates a configuration holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the shared fragments compiled into every bundle.
    pub fn with_fragments_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.fragments_root = path.into();
        self
    }

    /// Directory holding the page templates; one bundle is built per page.
    pub fn with_pages_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.pages_root = path.into();
        self
    }

    /// Builds bundles once and reuses them, instead of rebuilding on every
    /// render.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// File name suffix that marks a template, including the dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Registers a single function.
    pub fn with_function<F, Rv, Args>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a, Output = Args>,
    {
        self.functions.insert(name, f);
        self
    }

    /// Merges `functions` into the registry.
    pub fn with_functions(mut self, functions: &FunctionRegistry) -> Self {
        self.functions.merge(functions);
        self
    }

    pub fn with_undefined(mut self, mode: UndefinedMode) -> Self {
        self.undefined = mode;
        self
    }

    pub fn with_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = policy;
        self
    }

    /// Applies a set of options on top of this configuration.
    pub fn apply(mut self, options: RenderOptions) -> Self {
        if let Some(path) = options.fragments_root {
            self.fragments_root = path;
        }
        if let Some(path) = options.pages_root {
            self.pages_root = path;
        }
        if let Some(enabled) = options.cache_enabled {
            self.cache_enabled = enabled;
        }
        if let Some(extension) = options.extension {
            self.extension = extension;
        }
        if let Some(mode) = options.undefined {
            self.undefined = mode;
        }
        if let Some(policy) = options.collisions {
            self.collisions = policy;
        }
        self.functions.merge(&options.functions);
        self
    }

    /// Applies several option sets in order.
    pub fn apply_all(self, options: impl IntoIterator<Item = RenderOptions>) -> Self {
        options
            .into_iter()
            .fold(self, |config, options| config.apply(options))
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    pub fn fragments_root(&self) -> &Path {
        &self.fragments_root
    }

    pub fn pages_root(&self) -> &Path {
        &self.pages_root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn undefined(&self) -> UndefinedMode {
        self.undefined
    }

    pub fn collisions(&self) -> CollisionPolicy {
        self.collisions
    }
}

/// A partial configuration. Unset fields leave the target untouched.
///
/// Everything except `functions` can be deserialized, so the options can live
/// in an application's config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    pub fragments_root: Option<PathBuf>,
    pub pages_root: Option<PathBuf>,
    pub cache_enabled: Option<bool>,
    pub extension: Option<String>,
    pub undefined: Option<UndefinedMode>,
    pub collisions: Option<CollisionPolicy>,
    #[serde(skip)]
    pub functions: FunctionRegistry,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a YAML options file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    pub fn with_fragments_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.fragments_root = Some(path.into());
        self
    }

    pub fn with_pages_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.pages_root = Some(path.into());
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn with_undefined(mut self, mode: UndefinedMode) -> Self {
        self.undefined = Some(mode);
        self
    }

    pub fn with_collisions(mut self, policy: CollisionPolicy) -> Self {
        self.collisions = Some(policy);
        self
    }

    pub fn with_function<F, Rv, Args>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Function<Rv, Args>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a, Output = Args>,
    {
        self.functions.insert(name, f);
        self
    }
}
