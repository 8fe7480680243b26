//! Template discovery, bundle compilation and rendering.
//!
//! ## Layout
//!
//! Two directory trees feed the builder:
//!
//! ```text
//! templates/
//!   layout.html          fragment, compiled into every bundle
//!   partials/nav.html    fragment
//!   pages/
//!     home.html          page -> bundle "home.html"
//!     account/login.html page -> bundle "login.html"
//! ```
//!
//! Both roots are walked recursively for files with the configured extension.
//! Pages are named by base file name, so two pages with the same file name in
//! different subdirectories collide (see
//! [`CollisionPolicy`](crate::CollisionPolicy)).
//!
//! ## Key Types
//!
//! - [`BundleBuilder`]: turns a configuration into a [`BundleCache`]
//! - [`CompiledBundle`]: one page plus all fragments, ready to execute
//! - [`PageRenderer`]: the per-request pipeline
//!
//! ## See Also
//!
//! - [`crate::config`]: roots, caching and functions
//! - [`crate::view`]: the data a bundle renders

pub mod bundle;
pub mod discover;
mod renderer;

pub use bundle::{BundleBuilder, BundleCache, CompiledBundle};
pub use discover::{discover, walk_template_dir, TemplateFile};
pub use renderer::PageRenderer;
