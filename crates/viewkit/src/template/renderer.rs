//! Per-request rendering.
//!
//! [`PageRenderer`] ties a frozen [`RenderConfig`] to a [`TokenSource`] and
//! renders bundles for individual requests.
//!
//! # Pipeline
//!
//! Every [`render`](PageRenderer::render) call runs the same steps, and any
//! failure ends the call without retrying:
//!
//! 1. Resolve: use the cached bundles (cache enabled) or build a fresh set
//!    that is dropped after the call (cache disabled).
//! 2. Look up the bundle by name.
//! 3. Ask the token source for the request's anti-forgery token and store it
//!    in [`ViewData::csrf_token`].
//! 4. Execute the bundle into an in-memory buffer.
//! 5. Write the buffer to the sink.
//!
//! Output only reaches the sink in step 5, so a failed render leaves the sink
//! untouched and the caller can still send an error page.
//!
//! # Caching
//!
//! With caching enabled the bundles are built once and published to every
//! thread at the same time. Call [`warm`](PageRenderer::warm) at startup to
//! build them eagerly and surface template errors before serving; otherwise
//! the first render builds them. A failed build is not stored, the next call
//! tries again.
//!
//! # Example
//!
//! ```rust,no_run
//! use viewkit::{FixedToken, PageRenderer, RenderConfig, ViewData};
//!
//! let config = RenderConfig::new()
//!     .with_pages_root("templates/pages")
//!     .with_fragments_root("templates/fragments")
//!     .with_cache(true);
//! let renderer = PageRenderer::new(config, FixedToken::new("token"));
//! renderer.warm()?;
//!
//! let mut view = ViewData::new().with_page("home");
//! let mut body = Vec::new();
//! renderer.render(&mut body, &(), "home.html", &mut view)?;
//! # Ok::<(), viewkit::RenderError>(())
//! ```

use std::io::Write;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;

use super::bundle::{BundleBuilder, BundleCache};
use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::token::TokenSource;
use crate::view::ViewData;

/// Renders named bundles against per-request view data.
///
/// `PageRenderer` is `Send + Sync` whenever its token source is, so one
/// instance can serve every request thread.
pub struct PageRenderer<T> {
    config: RenderConfig,
    tokens: T,
    cache: OnceCell<BundleCache>,
    builds: AtomicUsize,
}

impl<T> PageRenderer<T> {
    /// Creates a renderer. No templates are read until the first render or
    /// [`warm`](Self::warm).
    pub fn new(config: RenderConfig, tokens: T) -> Self {
        Self {
            config,
            tokens,
            cache: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Number of completed bundle builds so far.
    ///
    /// With caching enabled this stays at one after the first successful
    /// build; without caching it grows by one per render.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Builds the bundles now.
    ///
    /// With caching enabled the result is kept for every later render. With
    /// caching disabled the bundles are built once to validate the templates
    /// and then dropped. Returns the number of bundles.
    pub fn warm(&self) -> Result<usize, RenderError> {
        let bundles = self.bundles()?;
        Ok(bundles.len())
    }

    /// Names of the bundles that a render can currently resolve, sorted.
    pub fn bundle_names(&self) -> Result<Vec<String>, RenderError> {
        let bundles = self.bundles()?;
        Ok(bundles.names().map(str::to_string).collect())
    }

    /// Renders bundle `name` for `request` and writes it to `sink`.
    ///
    /// On success `view.csrf_token` holds the token issued for `request`.
    ///
    /// # Errors
    ///
    /// - [`RenderError::Build`]: the bundles could not be built
    /// - [`RenderError::NotFound`]: no bundle is called `name`
    /// - [`RenderError::Execution`]: the bundle failed while rendering
    /// - [`RenderError::Io`]: writing to `sink` failed
    ///
    /// Only the `Io` case can leave bytes in `sink`, and only if the sink
    /// accepted part of the output before failing.
    pub fn render<Req, W>(
        &self,
        sink: &mut W,
        request: &Req,
        name: &str,
        view: &mut ViewData,
    ) -> Result<(), RenderError>
    where
        Req: ?Sized,
        T: TokenSource<Req>,
        W: Write + ?Sized,
    {
        let buffer = self.render_to_vec(request, name, view)?;

        sink.write_all(&buffer)
            .and_then(|()| sink.flush())
            .map_err(|e| {
                tracing::error!(bundle = name, error = %e, "Failed to write rendered output");
                RenderError::Io(e)
            })
    }

    /// Renders bundle `name` and returns the output as a string.
    pub fn render_to_string<Req>(
        &self,
        request: &Req,
        name: &str,
        view: &mut ViewData,
    ) -> Result<String, RenderError>
    where
        Req: ?Sized,
        T: TokenSource<Req>,
    {
        let buffer = self.render_to_vec(request, name, view)?;
        // minijinja only writes UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Resolves, injects the token and executes into a staging buffer.
    fn render_to_vec<Req>(
        &self,
        request: &Req,
        name: &str,
        view: &mut ViewData,
    ) -> Result<Vec<u8>, RenderError>
    where
        Req: ?Sized,
        T: TokenSource<Req>,
    {
        let bundles = self.bundles()?;

        let Some(bundle) = bundles.get(name) else {
            tracing::warn!(bundle = name, "Bundle not found");
            return Err(RenderError::NotFound {
                name: name.to_string(),
            });
        };

        view.csrf_token = self.tokens.issue_token(request);

        let mut buffer = Vec::new();
        bundle.execute(&*view, &mut buffer).map_err(|source| {
            tracing::error!(bundle = name, error = %source, "Failed to execute bundle");
            RenderError::Execution {
                name: name.to_string(),
                source,
            }
        })?;

        Ok(buffer)
    }

    /// The bundle set for one render: shared when cached, owned otherwise.
    fn bundles(&self) -> Result<Bundles<'_>, RenderError> {
        if self.config.cache_enabled() {
            let cache = self.cache.get_or_try_init(|| self.build())?;
            Ok(Bundles::Shared(cache))
        } else {
            Ok(Bundles::Transient(self.build()?))
        }
    }

    fn build(&self) -> Result<BundleCache, RenderError> {
        let cache = BundleBuilder::new(&self.config).build().map_err(|e| {
            tracing::error!(error = %e, "Failed to build bundle cache");
            RenderError::Build(e)
        })?;
        self.builds.fetch_add(1, Ordering::Relaxed);
        Ok(cache)
    }
}

/// Bundles resolved for a single render call.
enum Bundles<'a> {
    Shared(&'a BundleCache),
    Transient(BundleCache),
}

impl Deref for Bundles<'_> {
    type Target = BundleCache;

    fn deref(&self) -> &BundleCache {
        match self {
            Bundles::Shared(cache) => cache,
            Bundles::Transient(cache) => cache,
        }
    }
}

impl<T> std::fmt::Debug for PageRenderer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRenderer")
            .field("config", &self.config)
            .field("cached", &self.cache.get().map(BundleCache::len))
            .field("builds", &self.build_count())
            .finish()
    }
}
