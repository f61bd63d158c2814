//! Session value types.

use serde::{Deserialize, Serialize};

/// Opaque, stable subject identifier issued by the identity provider.
///
/// Guaranteed non-empty by construction, so a `Session` is either fully
/// present or modeled as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubjectId(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subject id must not be empty")]
pub struct EmptySubjectId;

impl SubjectId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubjectId {
    type Error = EmptySubjectId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().is_empty() { Err(EmptySubjectId) } else { Ok(Self(s)) }
    }
}

impl TryFrom<&str> for SubjectId {
    type Error = EmptySubjectId;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_from(s.to_owned())
    }
}

impl From<SubjectId> for String {
    fn from(id: SubjectId) -> Self {
        id.0
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// The authenticated identity for the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: SubjectId,
    pub display_email: Option<String>,
}

impl Session {
    /// Build a session. A blank email is treated as absent.
    #[must_use]
    pub fn new(subject_id: SubjectId, display_email: Option<String>) -> Self {
        let display_email = display_email.filter(|email| !email.trim().is_empty());
        Self { subject_id, display_email }
    }
}

// =============================================================================
// AUTH SNAPSHOT
// =============================================================================

/// Point-in-time view of the session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    /// Current session; `None` means signed out.
    pub session: Option<Session>,
    /// True until the identity client delivered its first notification.
    pub initializing: bool,
}

impl AuthSnapshot {
    /// State at process start: no session, still initializing.
    #[must_use]
    pub fn initial() -> Self {
        Self { session: None, initializing: true }
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
