//! Identity of the caller.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// Who is making a request.
///
/// Authentication happens outside this crate; every operation receives the
/// result explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Identity {
    /// A logged-in user.
    User(UserId),
    /// A visitor without a session.
    #[default]
    Anonymous,
}

impl Identity {
    /// Returns the user, if any.
    pub fn user(&self) -> Option<UserId> {
        match self {
            Identity::User(user) => Some(*user),
            Identity::Anonymous => None,
        }
    }

    /// Returns the user or [`CheckoutError::AuthenticationRequired`].
    pub fn require_user(&self) -> Result<UserId, CheckoutError> {
        self.user().ok_or(CheckoutError::AuthenticationRequired)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }
}

impl From<UserId> for Identity {
    fn from(user: UserId) -> Self {
        Identity::User(user)
    }
}

impl From<Option<UserId>> for Identity {
    fn from(user: Option<UserId>) -> Self {
        user.map_or(Identity::Anonymous, Identity::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_requires_login() {
        assert!(Identity::Anonymous.is_anonymous());
        assert!(matches!(
            Identity::Anonymous.require_user(),
            Err(CheckoutError::AuthenticationRequired)
        ));
    }

    #[test]
    fn user_identity() {
        let user = UserId::new();
        let identity = Identity::from(Some(user));
        assert_eq!(identity.user(), Some(user));
        assert_eq!(identity.require_user().unwrap(), user);
        assert_eq!(Identity::from(None), Identity::Anonymous);
    }
}
