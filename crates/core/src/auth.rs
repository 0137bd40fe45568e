use serde::{Deserialize, Serialize};

/// User information resolved for the current request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    is_superuser: bool,
    is_staff: bool,
}

impl UserIdentity {
    /// Creates a regular user identity without administrative overrides.
    #[must_use]
    pub fn new(subject: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            is_superuser: false,
            is_staff: false,
        }
    }

    /// Marks the identity as a superuser.
    #[must_use]
    pub fn with_superuser(mut self, is_superuser: bool) -> Self {
        self.is_superuser = is_superuser;
        self
    }

    /// Marks the identity as staff.
    #[must_use]
    pub fn with_staff(mut self, is_staff: bool) -> Self {
        self.is_staff = is_staff;
        self
    }

    /// Returns the stable subject used for group membership.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns whether the user bypasses every permission check.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// Returns whether the user is flagged as staff.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.is_staff
    }
}
