//! Common imports for rendering pages.
//!
//! ```rust,ignore
//! use viewkit::prelude::*;
//!
//! let renderer = PageRenderer::new(RenderConfig::new().with_cache(true), FixedToken::new("t"));
//! let mut view = ViewData::new().with_page("home");
//! renderer.render(&mut response, &request, "home.html", &mut view)?;
//! ```

pub use crate::config::{RenderConfig, RenderOptions};
pub use crate::error::RenderError;
pub use crate::template::PageRenderer;
pub use crate::token::{FixedToken, TokenSource};
pub use crate::view::{FormState, Page, ViewData};
