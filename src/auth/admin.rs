//! Admin registry
//!
//! Fixed email → admin mapping, loaded once at startup.

use std::collections::HashMap;

/// Read-only mapping of emails with elevated privileges
///
/// Absence from the mapping is the same as `false`.
#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    entries: HashMap<String, bool>,
}

impl AdminRegistry {
    pub fn new(entries: HashMap<String, bool>) -> Self {
        Self { entries }
    }

    /// Registry where every listed email is an admin
    pub fn from_emails<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: emails.into_iter().map(|e| (e.into(), true)).collect(),
        }
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.entries.get(email).copied().unwrap_or(false)
    }

    /// Number of emails currently granted admin
    pub fn admin_count(&self) -> usize {
        self.entries.values().filter(|v| **v).count()
    }
}
