//! Identity collaborator: who, if anyone, is signed in.

use std::sync::RwLock;

/// Source of the current user identifier.
///
/// Out-of-band callbacks consult this at invocation time; `None` means no session
/// is available and the caller must skip any write.
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<String>;
}

/// Session held in memory, switchable at runtime.
#[derive(Debug, Default)]
pub struct StaticSession {
    user: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        if let Ok(mut user) = self.user.write() {
            *user = Some(user_id.into());
        }
    }

    pub fn sign_out(&self) {
        if let Ok(mut user) = self.user.write() {
            *user = None;
        }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<String> {
        self.user.read().ok().and_then(|u| u.clone())
    }
}
