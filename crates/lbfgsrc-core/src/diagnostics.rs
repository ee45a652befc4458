//! Append-only log of human-readable optimizer warnings.

/// Diagnostic messages accumulated over the lifetime of an optimizer.
///
/// Every message is also forwarded to the `log` facade at warning level, so
/// applications that install a logger see the same text without polling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticLog {
    entries: Vec<String>,
}

impl DiagnosticLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn warn<S: Into<String>>(&mut self, message: S) {
        let message = message.into();
        log::warn!("{message}");
        self.entries.push(message);
    }

    /// All messages in the order they were recorded.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// The most recent message, if any.
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_log_is_append_only() {
        let mut log = DiagnosticLog::new();
        assert!(log.is_empty());

        log.warn("first");
        log.warn(String::from("second"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries(), &["first".to_string(), "second".to_string()]);
        assert_eq!(log.last(), Some("second"));
        assert!(log.contains("sec"));
        assert!(!log.contains("third"));
    }
}
