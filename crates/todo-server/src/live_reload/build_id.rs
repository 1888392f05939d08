//! Build identity of the running server process.

use std::fmt;

use uuid::Uuid;

/// Random token generated once per process.
///
/// Clients present the token they last saw when they open a live reload
/// channel; any other value means their code predates this process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildId(Uuid);

impl BuildId {
    /// Generate a new random identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Whether a client-supplied tag identifies this process.
    pub fn matches(&self, client_tag: &str) -> bool {
        Uuid::parse_str(client_tag).is_ok_and(|tag| tag == self.0)
    }
}

impl From<Uuid> for BuildId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_own_string_form() {
        let id = BuildId::generate();
        assert!(id.matches(&id.to_string()));
    }

    #[test]
    fn test_other_ids_do_not_match() {
        let id = BuildId::generate();
        let other = BuildId::generate();

        assert_ne!(id, other);
        assert!(!id.matches(&other.to_string()));
        assert!(!id.matches(""));
        assert!(!id.matches("undefined"));
    }
}
