//! Who is submitting: a signed-in user or an anonymous guest.

use entities::GUEST_USER_ID;

use crate::{AddressHasher, AuthenticatedUser, is_valid_device_token, mint_device_token};

/// Attribution for an anonymous submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestIdentity {
    /// Device token from the guest cookie.
    pub device_token: String,
    /// Salted hash of the client address, when one was available.
    pub ip_hash: Option<String>,
    /// True when the token was generated for this request and must be sent
    /// back to the client.
    pub minted: bool,
}

impl GuestIdentity {
    /// Reuses a well-formed cookie token or mints a fresh one. A missing
    /// address yields no hash.
    pub fn resolve(cookie: Option<&str>, address: Option<&str>, hasher: &AddressHasher) -> Self {
        let (device_token, minted) = match cookie.filter(|token| is_valid_device_token(token)) {
            Some(token) => (token.to_string(), false),
            None => (mint_device_token(), true),
        };
        let ip_hash = address.map(|address| hasher.hash(address));
        tracing::debug!(minted, hashed_address = ip_hash.is_some(), "Resolved guest identity");

        Self {
            device_token,
            ip_hash,
            minted,
        }
    }
}

/// The identity a deal is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Authenticated(AuthenticatedUser),
    Guest(GuestIdentity),
}

impl Identity {
    /// Owner ID recorded on the deal.
    pub fn user_id(&self) -> &str {
        match self {
            Self::Authenticated(user) => &user.id,
            Self::Guest(_) => GUEST_USER_ID,
        }
    }

    /// Guest details when the submitter is anonymous.
    pub fn guest(&self) -> Option<&GuestIdentity> {
        match self {
            Self::Guest(guest) => Some(guest),
            Self::Authenticated(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_reuses_valid_cookie() {
        let hasher = AddressHasher::new("salt");
        let guest = GuestIdentity::resolve(Some("existing_token"), Some("203.0.113.7"), &hasher);
        assert_eq!(guest.device_token, "existing_token");
        assert!(!guest.minted);
        assert_eq!(guest.ip_hash, Some(hasher.hash("203.0.113.7")));
    }

    #[test]
    fn test_guest_mints_on_missing_or_bad_cookie() {
        let hasher = AddressHasher::new("salt");
        let missing = GuestIdentity::resolve(None, None, &hasher);
        assert!(missing.minted);
        assert!(missing.ip_hash.is_none());

        let garbage = GuestIdentity::resolve(Some("not a token;"), None, &hasher);
        assert!(garbage.minted);
        assert_ne!(garbage.device_token, "not a token;");
    }

    #[test]
    fn test_identity_user_id() {
        let user = Identity::Authenticated(AuthenticatedUser::new("acct-1"));
        assert_eq!(user.user_id(), "acct-1");
        assert!(user.guest().is_none());

        let guest = Identity::Guest(GuestIdentity::resolve(None, None, &AddressHasher::new("s")));
        assert_eq!(guest.user_id(), GUEST_USER_ID);
        assert!(guest.guest().is_some());
    }
}
