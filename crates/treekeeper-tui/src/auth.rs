/// Capability handed to the app in place of ambient auth state.
///
/// Unauthenticated sessions get a read-only view; edit entry points consult
/// this before switching modes, and the maintenance form uses the current
/// user as the default volunteer name.
pub trait AuthContext {
    fn is_authenticated(&self) -> bool;

    /// Display name for attribution, if known.
    fn current_user(&self) -> Option<&str>;

    /// The terminal analog of a login redirect: the message telling the
    /// user how to authenticate this session.
    fn trigger_login(&self) -> String;
}

/// Presence of an API key is what authenticates a CLI session.
pub struct ApiKeyAuth {
    authenticated: bool,
    user: Option<String>,
}

impl ApiKeyAuth {
    pub fn new(api_key: Option<&str>, user: Option<String>) -> Self {
        Self {
            authenticated: api_key.is_some_and(|k| !k.is_empty()),
            user,
        }
    }
}

impl AuthContext for ApiKeyAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn trigger_login(&self) -> String {
        "sign in required: pass --api-key or set TREEKEEPER_API_KEY".into()
    }
}

/// Fixed auth state, for tests and local demo runs against the bundled
/// server (which performs no authentication of its own).
pub struct StaticAuth {
    pub authenticated: bool,
    pub user: Option<String>,
}

impl AuthContext for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn current_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn trigger_login(&self) -> String {
        "sign in required".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_presence_authenticates() {
        assert!(ApiKeyAuth::new(Some("key"), None).is_authenticated());
        assert!(!ApiKeyAuth::new(None, None).is_authenticated());
        assert!(!ApiKeyAuth::new(Some(""), None).is_authenticated());
    }

    #[test]
    fn current_user_passthrough() {
        let auth = ApiKeyAuth::new(Some("key"), Some("Sam".into()));
        assert_eq!(auth.current_user(), Some("Sam"));
    }
}
