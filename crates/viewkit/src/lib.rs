//! # viewkit - Page Bundles for Server-Side Templates
//!
//! `viewkit` compiles page templates together with shared fragment templates
//! into render-ready bundles, and renders those bundles for individual
//! requests with session data, feedback messages, form state and an
//! anti-forgery token injected.
//!
//! Templates use Jinja2 syntax, as implemented by [`minijinja`].
//!
//! ## Core Concepts
//!
//! - [`RenderConfig`]: template roots, caching, functions; frozen once built
//! - [`FunctionRegistry`]: named functions callable from templates
//! - [`CompiledBundle`]: one page compiled with every fragment
//! - [`BundleCache`]: all bundles of a build, keyed by page file name
//! - [`PageRenderer`]: per-request pipeline with all-or-nothing output
//! - [`ViewData`]: the per-request template context
//! - [`TokenSource`]: where anti-forgery tokens come from
//!
//! ## Quick Start
//!
//! ```rust
//! use std::fs;
//! use viewkit::{PageRenderer, RenderConfig, ViewData};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let pages = dir.path().join("pages");
//! let fragments = dir.path().join("frag");
//! fs::create_dir_all(&pages).unwrap();
//! fs::create_dir_all(&fragments).unwrap();
//! fs::write(
//!     fragments.join("layout.html"),
//!     "<body>{% block content %}{% endblock %}</body>",
//! ).unwrap();
//! fs::write(
//!     pages.join("home.html"),
//!     "{% extends 'layout.html' %}{% block content %}Hi {{ data.name }}{% endblock %}",
//! ).unwrap();
//!
//! let config = RenderConfig::new()
//!     .with_pages_root(&pages)
//!     .with_fragments_root(&fragments)
//!     .with_cache(true);
//! let renderer = PageRenderer::new(config, |_req: &()| "token-1".to_string());
//! renderer.warm().unwrap();
//!
//! let mut view = ViewData::new().with_data("name", "Ada");
//! let mut response = Vec::new();
//! renderer.render(&mut response, &(), "home.html", &mut view).unwrap();
//!
//! assert_eq!(response, b"<body>Hi Ada</body>");
//! assert_eq!(view.csrf_token, "token-1");
//! ```
//!
//! ## Caching
//!
//! With `cache(true)` bundles are built once (at [`PageRenderer::warm`] or on
//! the first render) and shared by every request. With caching off, every
//! render rebuilds all bundles from disk, so template edits show up on the
//! next request.
//!
//! ## Errors
//!
//! A render either writes the full page to the sink or nothing at all. Build
//! failures, unknown bundle names and execution failures are reported as
//! [`RenderError`] before a single byte is written, so the caller can still
//! answer with an error page.

pub mod config;
mod error;
pub mod functions;
pub mod prelude;
pub mod template;
pub mod token;
pub mod view;

// Error types
pub use error::{BuildError, ConfigError, DiscoveryError, RenderError};

// Configuration
pub use config::{CollisionPolicy, RenderConfig, RenderOptions, UndefinedMode};

// Functions
pub use functions::FunctionRegistry;

// Templates
pub use template::{
    discover, walk_template_dir, BundleBuilder, BundleCache, CompiledBundle, PageRenderer,
    TemplateFile,
};

// Request data
pub use token::{FixedToken, TokenSource};
pub use view::{FormState, Page, ViewData};

// Re-exported so callers can register functions without a direct dependency.
pub use minijinja;
