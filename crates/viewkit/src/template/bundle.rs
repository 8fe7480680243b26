//! Bundle compilation.
//!
//! A bundle is one page template compiled together with every shared
//! fragment and every registered function. Each bundle owns its own
//! [`minijinja::Environment`], so a page resolves its `extends`, `include`
//! and `import` references against the fragments without touching any other
//! bundle.
//!
//! ```text
//! fragments/layout.html ─┐
//! fragments/nav.html ────┼─► bundle "home.html"
//! pages/home.html ───────┘
//!
//! fragments/layout.html ─┐
//! fragments/nav.html ────┼─► bundle "about.html"
//! pages/about.html ──────┘
//! ```
//!
//! Fragments are registered under their path relative to the fragments root
//! (`layout.html`, `partials/nav.html`). The page is registered last, under
//! its base file name, which is also the bundle name.
//!
//! # Function checking
//!
//! After compiling, every template in the bundle is checked for calls to
//! functions that nothing provides. A top-level name used as `name(...)` must
//! be a [`ViewData`](crate::ViewData) field, a registered function, an engine
//! builtin, or something the template declares itself (a macro, an import, a
//! `set`); anything else fails the build with [`BuildError::UnresolvedName`].
//! A misspelled function therefore fails at startup instead of on the first
//! request that hits it.
//!
//! Names that are only read, never called, are left alone: an included
//! fragment may read loop variables of the page that includes it, and a
//! missing value is handled at render time according to the configured
//! [`UndefinedMode`](crate::UndefinedMode).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use minijinja::Environment;
use serde::Serialize;

use super::discover::{walk_template_dir, TemplateFile};
use crate::config::{CollisionPolicy, RenderConfig};
use crate::error::BuildError;
use crate::view::VIEW_FIELDS;

/// Names the template engine provides without registration.
const ENGINE_GLOBALS: &[&str] = &[
    "range",
    "dict",
    "debug",
    "namespace",
    "loop",
    "self",
    "super",
    "caller",
    "varargs",
    "kwargs",
];

/// A compiled, render-ready page.
pub struct CompiledBundle {
    name: String,
    page: PathBuf,
    env: Environment<'static>,
}

impl CompiledBundle {
    /// The bundle name: the page's base file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the page file this bundle was built from.
    pub fn page_path(&self) -> &Path {
        &self.page
    }

    /// Names of every template compiled into the bundle, fragments included.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.env.templates().map(|(name, _)| name)
    }

    /// Renders the page into `out`.
    ///
    /// On error `out` may hold partial output; callers stage into a buffer
    /// they can discard.
    pub fn execute<S: Serialize, W: Write>(&self, ctx: S, out: W) -> Result<(), minijinja::Error> {
        let template = self.env.get_template(&self.name)?;
        template.render_to_write(ctx, out)?;
        Ok(())
    }
}

impl fmt::Debug for CompiledBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBundle")
            .field("name", &self.name)
            .field("page", &self.page)
            .field("templates", &self.template_names().collect::<Vec<_>>())
            .finish()
    }
}

/// All bundles of one build, keyed by bundle name.
#[derive(Debug, Default)]
pub struct BundleCache {
    bundles: BTreeMap<String, CompiledBundle>,
}

impl BundleCache {
    pub fn get(&self, name: &str) -> Option<&CompiledBundle> {
        self.bundles.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Bundle names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.keys().map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledBundle> {
        self.bundles.values()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Builds a [`BundleCache`] from a configuration.
#[derive(Debug, Clone, Copy)]
pub struct BundleBuilder<'a> {
    config: &'a RenderConfig,
}

impl<'a> BundleBuilder<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Discovers pages and fragments and compiles one bundle per page.
    ///
    /// # Errors
    ///
    /// Fails on the first discovery, read, compile, name-check or (with
    /// [`CollisionPolicy::Reject`]) collision error. Nothing built so far is
    /// returned.
    pub fn build(&self) -> Result<BundleCache, BuildError> {
        let start = Instant::now();
        let extension = self.config.extension();

        let pages = walk_template_dir(self.config.pages_root(), extension)?;
        let fragments = walk_template_dir(self.config.fragments_root(), extension)?
            .into_iter()
            .map(|file| read_source(&file.path).map(|source| (file, source)))
            .collect::<Result<Vec<_>, _>>()?;

        for function in self.config.functions().names() {
            tracing::debug!(function, "Function registered");
        }

        let mut bundles: BTreeMap<String, CompiledBundle> = BTreeMap::new();
        for page in pages {
            let bundle = self.compile(&page, &fragments)?;

            if let Some(existing) = bundles.get(&page.name) {
                match self.config.collisions() {
                    CollisionPolicy::Reject => {
                        return Err(BuildError::Collision {
                            name: page.name,
                            existing: existing.page.clone(),
                            conflicting: page.path,
                        });
                    }
                    CollisionPolicy::Overwrite => {
                        tracing::warn!(
                            bundle = %page.name,
                            replaced = %existing.page.display(),
                            with = %page.path.display(),
                            "Duplicate page name, later file wins"
                        );
                    }
                }
            }

            bundles.insert(page.name, bundle);
        }

        tracing::info!(
            bundles = bundles.len(),
            fragments = fragments.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Bundle cache built"
        );

        Ok(BundleCache { bundles })
    }

    fn compile(
        &self,
        page: &TemplateFile,
        fragments: &[(TemplateFile, String)],
    ) -> Result<CompiledBundle, BuildError> {
        let compile_error = |source| BuildError::Compile {
            page: page.path.clone(),
            source,
        };

        let mut env = Environment::new();
        env.set_undefined_behavior(self.config.undefined().into());
        self.config.functions().register(&mut env);

        for (fragment, source) in fragments {
            env.add_template_owned(fragment.relative_name.clone(), source.clone())
                .map_err(compile_error)?;
        }
        env.add_template_owned(page.name.clone(), read_source(&page.path)?)
            .map_err(compile_error)?;

        self.check_names(page, &env)?;

        tracing::debug!(
            bundle = %page.name,
            page = %page.path.display(),
            templates = fragments.len() + 1,
            "Bundle compiled"
        );

        Ok(CompiledBundle {
            name: page.name.clone(),
            page: page.path.clone(),
            env,
        })
    }

    /// Rejects calls to top-level names that no view field, function or
    /// builtin provides.
    fn check_names(&self, page: &TemplateFile, env: &Environment<'static>) -> Result<(), BuildError> {
        let functions = self.config.functions();

        for (template_name, template) in env.templates() {
            let called = called_names(template.source());
            let unresolved: BTreeSet<String> = template
                .undeclared_variables(false)
                .into_iter()
                .filter(|name| {
                    called.contains(name.as_str())
                        && !VIEW_FIELDS.contains(&name.as_str())
                        && !ENGINE_GLOBALS.contains(&name.as_str())
                        && !functions.contains(name)
                })
                .collect();

            if !unresolved.is_empty() {
                return Err(BuildError::UnresolvedName {
                    page: page.path.clone(),
                    template: template_name.to_string(),
                    names: unresolved.into_iter().collect(),
                });
            }
        }

        Ok(())
    }
}

/// Identifiers written in call position (`name(`) inside `{{ }}` and
/// `{% %}` tags. Method calls (`x.name(`) and filters (`| name(`) are
/// skipped, as are string literals.
fn called_names(source: &str) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = match after.as_bytes().first() {
            Some(b'{') => "}}",
            Some(b'%') => "%}",
            _ => {
                rest = after;
                continue;
            }
        };
        let body = &after[1..];
        let end = body.find(close).unwrap_or(body.len());
        collect_calls(&body[..end], &mut names);
        rest = &body[end..];
    }

    names
}

fn collect_calls<'s>(expr: &'s str, names: &mut BTreeSet<&'s str>) {
    let bytes = expr.as_bytes();
    let mut prev = b' ';
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            prev = b;
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let mut next = i;
            while next < bytes.len() && bytes[next].is_ascii_whitespace() {
                next += 1;
            }
            if bytes.get(next) == Some(&b'(') && prev != b'.' && prev != b'|' {
                names.insert(&expr[start..i]);
            }
            prev = b'a';
        } else {
            if !b.is_ascii_whitespace() {
                prev = b;
            }
            i += 1;
        }
    }
}

fn read_source(path: &Path) -> Result<String, BuildError> {
    std::fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })
}
