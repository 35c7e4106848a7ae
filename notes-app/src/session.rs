//! Explicit credential handed to every record and blob store call.
//!
//! Token issuance happens elsewhere; this only carries what the identity
//! provider gave us.

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Owner identity (user pool subject or local user name)
    pub user: String,
    /// Bearer token (id token for the managed GraphQL API)
    pub token: String,
}

impl Session {
    pub fn new(user: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            token: token.into(),
        }
    }
}

// Tokens never end up in logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("alice", "secret-id-token");
        let shown = format!("{:?}", session);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("secret-id-token"));
    }
}
