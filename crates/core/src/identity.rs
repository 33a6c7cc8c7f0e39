//! Opaque user identity consumed from the external identity provider.

/// Sentinel owner id used while no authenticated session exists.
///
/// Rows written under this id stay device-local until the user signs in.
pub const OFFLINE_USER_ID: &str = "offline-user";

/// Owner identity used for row scoping, locally and on the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: String,
}

impl UserIdentity {
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn offline() -> Self {
        Self {
            user_id: OFFLINE_USER_ID.to_string(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.user_id == OFFLINE_USER_ID
    }
}
