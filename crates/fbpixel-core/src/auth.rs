/// External authentication collaborator. The facade only ever asks it for
/// the signed-in user's email, to populate advanced matching.
pub trait AuthSource: Send + Sync {
    /// Email of the currently authenticated user, if any.
    fn current_user_email(&self) -> Option<String>;
}

/// Fixed auth state, for apps that resolve the user up front (and for tests).
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    email: Option<String>,
}

impl StaticAuth {
    pub fn authenticated(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    pub fn guest() -> Self {
        Self::default()
    }
}

impl AuthSource for StaticAuth {
    fn current_user_email(&self) -> Option<String> {
        self.email.clone()
    }
}
