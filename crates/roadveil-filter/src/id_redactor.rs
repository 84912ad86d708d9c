//! Vehicle-ID redaction.

use roadveil_core::config::{IdRedactionPolicy, PrivacyConfig};

/// Decides whether a vehicle ID should be replaced, and with what.
///
/// In wildcard mode every ID is replaced; in inclusion mode only the
/// configured literals are. The replacement is a fixed configured string,
/// so the original ID never survives into the output once it matched.
#[derive(Debug, Clone)]
pub struct IdRedactor {
    policy: IdRedactionPolicy,
    replacement: String,
}

impl IdRedactor {
    /// Builds a redactor from the privacy configuration.
    pub fn from_config(config: &PrivacyConfig) -> Self {
        Self {
            policy: config.id_redaction.clone(),
            replacement: config.id_replacement.clone(),
        }
    }

    /// Returns true if this ID matches the redaction predicate.
    pub fn should_redact(&self, id: &str) -> bool {
        match &self.policy {
            IdRedactionPolicy::Off => false,
            IdRedactionPolicy::All => true,
            IdRedactionPolicy::Inclusion(ids) => ids.contains(id),
        }
    }

    /// The replacement for a matching ID, or `None` for passthrough.
    pub fn redact(&self, id: &str) -> Option<&str> {
        self.should_redact(id).then_some(self.replacement.as_str())
    }

    /// The configured replacement value.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}
