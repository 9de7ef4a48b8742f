//! Operator commands, each mapping onto one library operation.

use crate::logging::log_security_event;
use anyhow::{Context, Result, bail};
use chrono::SecondsFormat;
use pico_args::Arguments;
use session_vault::{SessionVault, auth::SessionEntry, security::LockoutStatus};

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List a user's live sessions
    Sessions { user_id: String, json: bool },
    /// Destroy one session
    Revoke { session_id: String },
    /// Destroy every session of a user
    RevokeAll { user_id: String },
    /// Mark every session of a user as banned
    Ban {
        user_id: String,
        reason: Option<String>,
    },
    /// Clear the ban flag on every session of a user
    Unban { user_id: String },
    /// Show the lockout status of a login identifier
    Lockout { identifier: String },
    /// Reset the failed-login counter of a login identifier
    Unlock { identifier: String },
}

impl Command {
    /// Parse a command from the remaining CLI arguments
    ///
    /// Global options must already be consumed.
    pub fn parse(mut pargs: Arguments) -> Result<Self> {
        let json = pargs.contains("--json");
        let Some(name) = pargs.subcommand()? else {
            bail!("No command given (see --help)");
        };

        let command = match name.as_str() {
            "sessions" => Command::Sessions {
                user_id: pargs.free_from_str().context("Missing <user_id>")?,
                json,
            },
            "revoke" => Command::Revoke {
                session_id: pargs.free_from_str().context("Missing <session_id>")?,
            },
            "revoke-all" => Command::RevokeAll {
                user_id: pargs.free_from_str().context("Missing <user_id>")?,
            },
            "ban" => Command::Ban {
                user_id: pargs.free_from_str().context("Missing <user_id>")?,
                reason: pargs.opt_free_from_str()?,
            },
            "unban" => Command::Unban {
                user_id: pargs.free_from_str().context("Missing <user_id>")?,
            },
            "lockout" => Command::Lockout {
                identifier: pargs.free_from_str().context("Missing <identifier>")?,
            },
            "unlock" => Command::Unlock {
                identifier: pargs.free_from_str().context("Missing <identifier>")?,
            },
            other => bail!("Unknown command: {other}"),
        };

        let rest = pargs.finish();
        if !rest.is_empty() {
            bail!("Unexpected arguments: {rest:?}");
        }

        Ok(command)
    }
}

/// Run a command and return its stdout text
pub async fn run(vault: &SessionVault, command: Command) -> Result<String> {
    match command {
        Command::Sessions { user_id, json } => {
            let sessions = vault.sessions.list_user_sessions(&user_id).await?;
            if json {
                Ok(serde_json::to_string_pretty(&sessions_json(&sessions))?)
            } else {
                Ok(sessions_table(&user_id, &sessions))
            }
        }
        Command::Revoke { session_id } => {
            let owner = vault
                .sessions
                .get_session(&session_id)
                .await?
                .map(|session| session.user_id);
            vault.sessions.destroy_session(&session_id).await?;

            log_security_event("revoke", owner.as_deref(), Some(&session_id), "Session revoked");
            Ok(match owner {
                Some(user_id) => format!("Revoked session {session_id} of {user_id}"),
                None => format!("Session {session_id} was already gone"),
            })
        }
        Command::RevokeAll { user_id } => {
            let count = vault.sessions.destroy_all_sessions(&user_id).await?;

            log_security_event(
                "revoke_all",
                Some(&user_id),
                None,
                &format!("Destroyed {count} session(s)"),
            );
            Ok(format!("Destroyed {count} session(s) of {user_id}"))
        }
        Command::Ban { user_id, reason } => {
            let count = vault
                .sessions
                .propagate_ban(&user_id, true, reason.as_deref())
                .await?;

            log_security_event(
                "ban",
                Some(&user_id),
                None,
                &format!("Banned {count} session(s)"),
            );
            Ok(format!("Banned {count} session(s) of {user_id}"))
        }
        Command::Unban { user_id } => {
            let count = vault.sessions.propagate_ban(&user_id, false, None).await?;

            log_security_event(
                "unban",
                Some(&user_id),
                None,
                &format!("Unbanned {count} session(s)"),
            );
            Ok(format!("Unbanned {count} session(s) of {user_id}"))
        }
        Command::Lockout { identifier } => {
            Ok(match vault.login_guard.is_locked_out(&identifier).await? {
                LockoutStatus::Unlocked => format!("{identifier} is not locked out"),
                LockoutStatus::Locked {
                    remaining_secs: Some(secs),
                } => format!("{identifier} is locked out for another {secs}s"),
                LockoutStatus::Locked {
                    remaining_secs: None,
                } => format!("{identifier} is locked out"),
            })
        }
        Command::Unlock { identifier } => {
            vault.login_guard.clear_failed_logins(&identifier).await?;

            log_security_event("unlock", None, Some(&identifier), "Cleared failed logins");
            Ok(format!("Cleared failed logins for {identifier}"))
        }
    }
}

fn sessions_json(sessions: &[SessionEntry]) -> serde_json::Value {
    serde_json::Value::Array(
        sessions
            .iter()
            .map(|entry| {
                let s = &entry.session;
                serde_json::json!({
                    "sessionId": entry.session_id,
                    "userId": s.user_id,
                    "deviceName": s.device_name,
                    "deviceType": s.device_type,
                    "ipAddress": s.ip_address,
                    "createdAt": s.created_at,
                    "lastActiveAt": s.last_active_at,
                    "expiresAt": s.expires_at,
                    "isBanned": s.is_banned,
                    "banReason": s.ban_reason,
                })
            })
            .collect(),
    )
}

fn sessions_table(user_id: &str, sessions: &[SessionEntry]) -> String {
    if sessions.is_empty() {
        return format!("No live sessions for {user_id}");
    }

    let mut out = format!("{} session(s) for {}\n", sessions.len(), user_id);
    for entry in sessions {
        let s = &entry.session;
        out.push_str(&format!(
            "{}  {:<28}  last active {}  expires {}{}\n",
            entry.session_id,
            s.device_name.as_deref().unwrap_or("Unknown Device"),
            s.last_active_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            s.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            if s.is_banned { "  [banned]" } else { "" },
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_vault::{
        auth::{BanState, DeviceInfo},
        config::SessionConfig,
        store::MemoryStore,
    };
    use std::{ffi::OsString, sync::Arc};

    fn args(list: &[&str]) -> Arguments {
        Arguments::from_vec(list.iter().map(OsString::from).collect())
    }

    fn vault() -> SessionVault {
        SessionVault::new(Arc::new(MemoryStore::new()), SessionConfig::development()).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse(args(&["sessions", "alice", "--json"])).unwrap(),
            Command::Sessions {
                user_id: "alice".to_string(),
                json: true
            }
        );
        assert_eq!(
            Command::parse(args(&["ban", "bob", "spam"])).unwrap(),
            Command::Ban {
                user_id: "bob".to_string(),
                reason: Some("spam".to_string())
            }
        );
        assert_eq!(
            Command::parse(args(&["ban", "bob"])).unwrap(),
            Command::Ban {
                user_id: "bob".to_string(),
                reason: None
            }
        );
        assert_eq!(
            Command::parse(args(&["unlock", "1.2.3.4"])).unwrap(),
            Command::Unlock {
                identifier: "1.2.3.4".to_string()
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse(args(&[])).is_err());
        assert!(Command::parse(args(&["explode"])).is_err());
        assert!(Command::parse(args(&["revoke"])).is_err());
        assert!(Command::parse(args(&["unban", "alice", "extra"])).is_err());
    }

    #[tokio::test]
    async fn test_ban_then_list() {
        let vault = vault();
        let user = "alice".to_string();
        vault
            .sessions
            .issue_session(&user, &DeviceInfo::default(), &BanState::active())
            .await
            .unwrap();

        let out = run(
            &vault,
            Command::Ban {
                user_id: user.clone(),
                reason: Some("spam".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "Banned 1 session(s) of alice");

        let listed = run(
            &vault,
            Command::Sessions {
                user_id: user.clone(),
                json: true,
            },
        )
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&listed).unwrap();
        assert_eq!(value[0]["isBanned"], true);
        assert_eq!(value[0]["banReason"], "spam");
        assert!(value[0].get("refreshTokenHash").is_none());
    }

    #[tokio::test]
    async fn test_revoke_all_and_empty_listing() {
        let vault = vault();
        let user = "bob".to_string();
        for _ in 0..2 {
            vault
                .sessions
                .issue_session(&user, &DeviceInfo::default(), &BanState::active())
                .await
                .unwrap();
        }

        let out = run(&vault, Command::RevokeAll { user_id: user.clone() })
            .await
            .unwrap();
        assert_eq!(out, "Destroyed 2 session(s) of bob");

        let listed = run(
            &vault,
            Command::Sessions {
                user_id: user,
                json: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(listed, "No live sessions for bob");
    }

    #[tokio::test]
    async fn test_revoke_unknown_session() {
        let vault = vault();
        let out = run(
            &vault,
            Command::Revoke {
                session_id: "0".repeat(32),
            },
        )
        .await
        .unwrap();
        assert!(out.contains("already gone"));
    }

    #[tokio::test]
    async fn test_lockout_and_unlock() {
        let vault = vault();
        for _ in 0..5 {
            vault.login_guard.record_failure("carol").await.unwrap();
        }

        let status = run(&vault, Command::Lockout { identifier: "carol".to_string() })
            .await
            .unwrap();
        assert!(status.starts_with("carol is locked out"));

        run(&vault, Command::Unlock { identifier: "carol".to_string() })
            .await
            .unwrap();
        let status = run(&vault, Command::Lockout { identifier: "carol".to_string() })
            .await
            .unwrap();
        assert_eq!(status, "carol is not locked out");
    }
}
