//! User-visible notifications
//!
//! Service outcomes are reported as notifications instead of propagating
//! backend failures to the caller.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Level::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message)
    }

    fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of a service call as seen by the user: the payload on success,
/// plus whatever should be shown.
#[derive(Debug)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub notification: Option<Notification>,
}

impl<T> Outcome<T> {
    /// Turn a service result into an outcome.
    ///
    /// Failures become `Error <action>: <cause>` notifications; `on_success`
    /// decides what, if anything, to report for a successful call.
    pub fn from_result<E: fmt::Display>(
        action: &str,
        result: Result<T, E>,
        on_success: impl FnOnce(&T) -> Option<String>,
    ) -> Self {
        match result {
            Ok(value) => {
                let notification = on_success(&value).map(Notification::success);
                Self {
                    value: Some(value),
                    notification,
                }
            }
            Err(e) => {
                tracing::debug!("{} failed: {}", action, e);
                Self {
                    value: None,
                    notification: Some(Notification::error(format!("Error {}: {}", action, e))),
                }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        self.value.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_becomes_error_notification() {
        let outcome: Outcome<()> =
            Outcome::from_result("fetching rules", Err("connection refused"), |_| None);
        assert!(!outcome.is_ok());
        let note = outcome.notification.unwrap();
        assert!(note.is_error());
        assert_eq!(note.message, "Error fetching rules: connection refused");
    }

    #[test]
    fn test_success_message_is_optional() {
        let quiet = Outcome::from_result("listing", Ok::<u8, String>(3), |_| None);
        assert_eq!(quiet.value, Some(3));
        assert!(quiet.notification.is_none());

        let loud = Outcome::from_result("adding rule", Ok::<_, String>("r1"), |name| {
            Some(format!("Rule \"{}\" added successfully", name))
        });
        assert_eq!(loud.notification.unwrap().level, Level::Success);
    }
}
