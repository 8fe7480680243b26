//! Anti-forgery token capability.
//!
//! The render pipeline does not generate tokens itself. It asks a
//! [`TokenSource`] for the token belonging to the current request and injects
//! it into [`ViewData::csrf_token`](crate::ViewData::csrf_token).
//!
//! The request type is left to the caller, so any HTTP stack can plug in:
//!
//! ```rust
//! use viewkit::TokenSource;
//!
//! struct Request {
//!     session_token: String,
//! }
//!
//! let source = |req: &Request| req.session_token.clone();
//! let req = Request { session_token: "abc123".into() };
//! assert_eq!(source.issue_token(&req), "abc123");
//! ```

/// Yields the anti-forgery token for a request.
pub trait TokenSource<Req: ?Sized> {
    fn issue_token(&self, request: &Req) -> String;
}

/// Blanket implementation for closures taking the request.
impl<Req, F> TokenSource<Req> for F
where
    Req: ?Sized,
    F: Fn(&Req) -> String,
{
    fn issue_token(&self, request: &Req) -> String {
        (self)(request)
    }
}

/// A token source that returns the same token for every request.
///
/// Useful for rendering outside a request (emails, error pages) and in tests.
#[derive(Debug, Clone, Default)]
pub struct FixedToken {
    token: String,
}

impl FixedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl<Req: ?Sized> TokenSource<Req> for FixedToken {
    fn issue_token(&self, _request: &Req) -> String {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_token_ignores_request() {
        let source = FixedToken::new("static");
        assert_eq!(TokenSource::<str>::issue_token(&source, "a"), "static");
        assert_eq!(TokenSource::<u32>::issue_token(&source, &7), "static");
    }

    #[test]
    fn closure_source_uses_request() {
        let source = |id: &u32| format!("token-{}", id);
        assert_eq!(source.issue_token(&1u32), "token-1");
        assert_eq!(source.issue_token(&2u32), "token-2");
    }
}
