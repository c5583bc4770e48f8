//! User types for authentication

use serde::{Deserialize, Serialize};

/// An authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// Sign-in provider account ID
    pub id: String,

    /// Email address (if available)
    pub email: Option<String>,

    /// Display name (if available)
    pub name: Option<String>,

    /// Avatar URL (if available)
    pub image: Option<String>,
}

impl AuthenticatedUser {
    /// Creates a new authenticated user
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
            image: None,
        }
    }

    /// Sets the email
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the avatar URL
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Email addresses allowed to use administrative endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: Vec<String>,
}

impl AdminAllowList {
    /// Creates an allow-list from exact email addresses.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a comma-separated list, ignoring blank entries.
    pub fn parse(value: &str) -> Self {
        Self::new(
            value
                .split(',')
                .map(str::trim)
                .filter(|email| !email.is_empty()),
        )
    }

    /// Exact, case-sensitive match against the session email.
    pub fn allows(&self, user: &AuthenticatedUser) -> bool {
        user.email
            .as_deref()
            .is_some_and(|email| self.emails.iter().any(|allowed| allowed == email))
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
