//! Per-request data handed to a bundle.
//!
//! [`ViewData`] is the template context root. Its fields are exposed to
//! templates under their snake_case names:
//!
//! | Field | Template name | Contents |
//! |-------|---------------|----------|
//! | `data` | `data` | page-specific values |
//! | `session_data` | `session_data` | the session payload, passed through |
//! | `feedback_data` | `feedback_data` | info/warning/success/error messages |
//! | `form_data` | `form_data` | field errors and resubmitted values |
//! | `csrf_token` | `csrf_token` | set by the render pipeline |
//! | `page` | `page` | the current page discriminator |
//!
//! ```jinja
//! <form method="post">
//!   <input type="hidden" name="csrf_token" value="{{ csrf_token }}">
//!   <input name="email" value="{{ form_data.values.email | default('') }}">
//!   {% if contains_errors(form_data.errors, 'email') %}
//!     <p class="error">{{ form_data.errors.email }}</p>
//!   {% endif %}
//! </form>
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Top-level names every bundle may reference.
pub(crate) const VIEW_FIELDS: &[&str] = &[
    "data",
    "session_data",
    "feedback_data",
    "form_data",
    "csrf_token",
    "page",
];

/// The context a bundle is executed against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewData {
    pub data: Map<String, Value>,
    pub session_data: Value,
    pub feedback_data: BTreeMap<String, String>,
    pub form_data: FormState,
    /// Overwritten by the render pipeline with a token issued for the request.
    pub csrf_token: String,
    pub page: Page,
}

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page discriminator.
    pub fn with_page(mut self, page: impl Into<Page>) -> Self {
        self.page = page.into();
        self
    }

    /// Adds a page-specific value.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Sets the session payload.
    pub fn with_session(mut self, session: impl Into<Value>) -> Self {
        self.session_data = session.into();
        self
    }

    /// Adds a feedback message, e.g. `("success", "Saved")`.
    pub fn with_feedback(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.feedback_data.insert(kind.into(), message.into());
        self
    }

    pub fn with_form(mut self, form: FormState) -> Self {
        self.form_data = form;
        self
    }
}

/// Form validation state: per-field errors plus the values the user submitted,
/// so a rejected form can be re-rendered with its input intact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub errors: BTreeMap<String, String>,
    pub values: BTreeMap<String, String>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error for `field`, replacing an earlier one.
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(field.into(), message.into());
    }

    /// Records a submitted value for `field`.
    pub fn set_value(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(|s| s.as_str())
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(|s| s.as_str())
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Identifies which page is being rendered, e.g. for highlighting the active
/// navigation entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(String);

impl Page {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Page {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Page {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
