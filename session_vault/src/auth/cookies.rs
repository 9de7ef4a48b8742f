//! Multi-session cookies: several signed-in accounts in one browser.
//!
//! Each session has a cookie `session_<id>` whose value is the device's
//! binding token; `active_session` names the current one. Browsers still
//! carrying the older `sessionId` + `refreshToken` pair are migrated once.

use super::{
    errors::AuthResult,
    manager::SessionManager,
    models::{Session, SessionEntry, SessionId, UserId},
    tokens::hash_token,
};
use crate::{config::CookieConfig, store::sessions::short_id};
use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// A `session_<id>` cookie as presented by the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub session_id: SessionId,
    pub binding_token: String,
}

/// The session the request acts as
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub session_id: SessionId,
    pub binding_token: String,
    pub session: Session,
}

/// Result of a legacy cookie migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub migrated: bool,
    pub session_id: Option<SessionId>,
    pub binding_token: Option<String>,
}

/// Destination for cookie writes produced by the resolver
pub trait CookieSink {
    fn set_cookie(&mut self, name: &str, value: &str, max_age_secs: Option<u64>);
    fn clear_cookie(&mut self, name: &str);
}

/// A single recorded cookie write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieOp {
    Set {
        name: String,
        value: String,
        max_age_secs: Option<u64>,
    },
    Clear {
        name: String,
    },
}

/// Cookie writes recorded for the HTTP layer to replay onto the response
#[derive(Debug, Clone, Default)]
pub struct CookieChanges {
    ops: Vec<CookieOp>,
}

impl CookieChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[CookieOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<CookieOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl CookieSink for CookieChanges {
    fn set_cookie(&mut self, name: &str, value: &str, max_age_secs: Option<u64>) {
        self.ops.push(CookieOp::Set {
            name: name.to_string(),
            value: value.to_string(),
            max_age_secs,
        });
    }

    fn clear_cookie(&mut self, name: &str) {
        self.ops.push(CookieOp::Clear {
            name: name.to_string(),
        });
    }
}

/// Compare a presented binding token with its stored hash
///
/// Constant-time; undecodable hex or a length mismatch is a failed match.
pub fn resolve_binding(binding_token: &str, stored_hash: &str) -> bool {
    let (Ok(presented), Ok(stored)) = (hex::decode(hash_token(binding_token)), hex::decode(stored_hash))
    else {
        return false;
    };

    presented.ct_eq(&stored).into()
}

/// Resolves sessions from a browser's cookie jar
#[derive(Clone)]
pub struct CookieResolver {
    manager: SessionManager,
    cookies: CookieConfig,
}

impl CookieResolver {
    /// Create a resolver using the manager's cookie configuration
    pub fn new(manager: SessionManager) -> Self {
        let cookies = manager.config().cookies.clone();
        Self { manager, cookies }
    }

    /// Name of the per-session cookie for `session_id`
    pub fn session_cookie_name(&self, session_id: &str) -> String {
        format!("{}{}", self.cookies.session_prefix, session_id)
    }

    /// Collect well-formed `session_<id>` cookies
    ///
    /// Names whose id is shorter than the configured minimum are ignored.
    /// Tokens are not checked here.
    pub fn parse_cookies(&self, jar: &HashMap<String, String>) -> Vec<SessionCookie> {
        jar.iter()
            .filter_map(|(name, value)| {
                let session_id = name.strip_prefix(&self.cookies.session_prefix)?;
                (session_id.len() >= self.cookies.min_session_id_len).then(|| SessionCookie {
                    session_id: session_id.to_string(),
                    binding_token: value.clone(),
                })
            })
            .collect()
    }

    /// Load a cookie's session if it is usable and its binding checks out
    ///
    /// Sessions without a stored binding hash predate binding tokens and
    /// are accepted as is.
    async fn load_bound(&self, cookie: &SessionCookie) -> AuthResult<Option<Session>> {
        let Some(session) = self.manager.get_session(&cookie.session_id).await? else {
            return Ok(None);
        };
        if session.refresh_token_hash.is_empty() {
            return Ok(None);
        }

        match self.manager.store().binding(&cookie.session_id).await? {
            None => Ok(Some(session)),
            Some(stored_hash) if resolve_binding(&cookie.binding_token, &stored_hash) => {
                Ok(Some(session))
            }
            Some(_) => {
                log::warn!(
                    "SECURITY: binding token mismatch for session {}",
                    short_id(&cookie.session_id)
                );
                Ok(None)
            }
        }
    }

    /// Resolve the session this request acts as
    ///
    /// Prefers the session named by `active_session`; otherwise the first
    /// other cookie that resolves.
    pub async fn get_active_session(
        &self,
        jar: &HashMap<String, String>,
    ) -> AuthResult<Option<ActiveSession>> {
        let parsed = self.parse_cookies(jar);
        let active_id = jar.get(&self.cookies.active_session);

        let preferred = active_id.and_then(|id| parsed.iter().find(|c| &c.session_id == id));
        if let Some(cookie) = preferred
            && let Some(session) = self.load_bound(cookie).await?
        {
            return Ok(Some(ActiveSession {
                session_id: cookie.session_id.clone(),
                binding_token: cookie.binding_token.clone(),
                session,
            }));
        }

        for cookie in parsed.iter().filter(|c| Some(&c.session_id) != active_id) {
            if let Some(session) = self.load_bound(cookie).await? {
                return Ok(Some(ActiveSession {
                    session_id: cookie.session_id.clone(),
                    binding_token: cookie.binding_token.clone(),
                    session,
                }));
            }
        }

        Ok(None)
    }

    /// Every session in the jar that resolves
    pub async fn get_all_valid(&self, jar: &HashMap<String, String>) -> AuthResult<Vec<SessionEntry>> {
        let mut valid = Vec::new();
        for cookie in self.parse_cookies(jar) {
            if let Some(session) = self.load_bound(&cookie).await? {
                valid.push(SessionEntry {
                    session_id: cookie.session_id,
                    session,
                });
            }
        }
        Ok(valid)
    }

    /// A resolving session in the jar that belongs to `user_id`
    pub async fn find_session_for_user(
        &self,
        jar: &HashMap<String, String>,
        user_id: &UserId,
    ) -> AuthResult<Option<SessionEntry>> {
        Ok(self
            .get_all_valid(jar)
            .await?
            .into_iter()
            .find(|entry| &entry.session.user_id == user_id))
    }

    /// Convert a legacy `sessionId` + `refreshToken` pair into a bound session cookie
    ///
    /// Runs at most once per browser: the flag cookie short-circuits later
    /// calls, and it is set even when no legacy session was usable. Banned
    /// sessions are never migrated. The legacy cookies are always cleared.
    pub async fn migrate_legacy(
        &self,
        jar: &HashMap<String, String>,
        sink: &mut impl CookieSink,
    ) -> AuthResult<MigrationOutcome> {
        if jar.contains_key(&self.cookies.migration_flag) {
            return Ok(MigrationOutcome::default());
        }

        let mut outcome = MigrationOutcome::default();

        let legacy_id = jar.get(&self.cookies.legacy_session_id);
        let legacy_token = jar.get(&self.cookies.legacy_refresh_token);
        if let (Some(session_id), Some(refresh_token)) = (legacy_id, legacy_token)
            && let Some(session) = self
                .manager
                .validate_refresh_token(session_id, refresh_token)
                .await?
        {
            // Banned sessions validate without a token check; never bind them
            if session.is_banned {
                log::warn!(
                    "SECURITY: refusing to migrate banned session {}",
                    short_id(session_id)
                );
            } else if let Some(grant) = self.manager.attach_binding(session_id).await? {
                sink.set_cookie(
                    &self.session_cookie_name(session_id),
                    &grant.token,
                    Some(grant.ttl_secs),
                );
                sink.set_cookie(&self.cookies.active_session, session_id, Some(grant.ttl_secs));

                log::info!("Migrated legacy session cookie {}", short_id(session_id));
                outcome = MigrationOutcome {
                    migrated: true,
                    session_id: Some(session_id.clone()),
                    binding_token: Some(grant.token),
                };
            }
        }

        sink.clear_cookie(&self.cookies.legacy_session_id);
        sink.clear_cookie(&self.cookies.legacy_refresh_token);
        sink.set_cookie(
            &self.cookies.migration_flag,
            "1",
            Some(self.cookies.migration_flag_max_age_secs),
        );

        Ok(outcome)
    }
}
