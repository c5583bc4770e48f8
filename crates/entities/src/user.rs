//! User-related entity definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed identifier of the shared guest row that anonymous deals point at.
pub const GUEST_USER_ID: &str = "guest";

/// Placeholder email stored on the guest row.
pub const GUEST_USER_EMAIL: &str = "guest@anon.local";

/// A user record. The id is the sign-in provider's account id, or
/// [`GUEST_USER_ID`] for the shared guest row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier.
    pub id: String,
    /// Email address, unique when present.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Avatar URL.
    pub image: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
    /// When this record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with the given account id.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            email: None,
            name: None,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the shared guest row.
    pub fn guest() -> Self {
        Self::new(GUEST_USER_ID)
            .with_email(GUEST_USER_EMAIL)
            .with_name("Guest")
    }

    /// Sets the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the avatar URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Returns true for the shared guest row.
    pub fn is_guest(&self) -> bool {
        self.id == GUEST_USER_ID
    }

    /// Returns the public summary embedded in deal views.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// The user fields embedded in a deal view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}
