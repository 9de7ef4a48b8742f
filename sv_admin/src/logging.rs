//! Structured logging for the operator CLI.
//!
//! Records from the library's `log` facade are bridged into the tracing
//! subscriber, so one `RUST_LOG` filter controls both.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels come from the `RUST_LOG` env var (default `info`). Output
/// goes to stderr so command output on stdout stays machine-readable.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,redis=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Structured logging initialized");
}

/// Log an administrative security action with structured fields
///
/// # Arguments
///
/// * `event_type` - Kind of action (`ban`, `revoke_all`, `unlock`, ...)
/// * `user_id` - Affected user, if the action targets one
/// * `subject` - Other target (session id, login identifier)
/// * `message` - Human-readable summary
///
/// # Example
///
/// ```ignore
/// log_security_event("ban", Some("user-42"), None, "Banned 3 session(s)");
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<&str>,
    subject: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        subject = subject,
        "SECURITY: {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_security_event() {
        // No subscriber installed; must not panic
        log_security_event("ban", Some("user-1"), None, "Banned 2 session(s)");
        log_security_event("unlock", None, Some("alice@example.com"), "Cleared lockout");
    }
}
