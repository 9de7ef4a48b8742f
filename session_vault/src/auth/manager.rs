//! Session lifecycle: creation, refresh-token rotation, ban propagation and teardown.

use super::{
    access::AccessTokenCodec,
    errors::{AuthError, AuthResult},
    models::{
        AccessTokenClaims, BanState, BindingGrant, DeviceInfo, IssuedSession, RotatedTokens,
        Session, SessionEntry, SessionId, UserId,
    },
    tokens::{
        BINDING_TOKEN_BYTES, REFRESH_TOKEN_BYTES, SESSION_ID_BYTES, generate_secure_token,
        hash_token,
    },
};
use crate::{
    config::SessionConfig,
    store::{KeyValueStore, SessionStore, sessions::short_id},
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Session lifecycle manager
///
/// Read-modify-write sequences (`rotate_*`, `touch_session`, `propagate_ban`)
/// are not atomic against the store. Two concurrent rotations of one session
/// both succeed and the last write wins; the refresh token handed to the
/// losing request fails on its next use.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    codec: AccessTokenCodec,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `kv` - Key-value backend shared with the other components
    /// * `config` - Session configuration
    pub fn new(kv: Arc<dyn KeyValueStore>, config: Arc<SessionConfig>) -> Self {
        Self {
            store: SessionStore::new(kv),
            codec: AccessTokenCodec::new(&config.access),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn codec(&self) -> &AccessTokenCodec {
        &self.codec
    }

    /// Create a session for a refresh token the caller already generated
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner of the session
    /// * `refresh_token` - Raw refresh token; only its hash is stored
    /// * `device` - Device metadata for display
    /// * `ban` - Initial ban state (pre-banned accounts may still sign in)
    ///
    /// # Returns
    ///
    /// * `AuthResult<SessionId>` - Id of the new session
    pub async fn create_session(
        &self,
        user_id: &UserId,
        refresh_token: &str,
        device: &DeviceInfo,
        ban: &BanState,
    ) -> AuthResult<SessionId> {
        let session_id = generate_secure_token(SESSION_ID_BYTES);
        let now = Utc::now();
        let expires_at = Duration::try_days(i64::from(self.config.refresh_lifetime_days))
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or(AuthError::LifetimeOverflow)?;

        let session = Session::new(
            user_id.clone(),
            hash_token(refresh_token),
            device,
            ban,
            now,
            expires_at,
        );

        self.store
            .insert(&session_id, &session, self.config.refresh_lifetime_secs())
            .await?;
        self.store.index_add(user_id, &session_id).await?;

        log::info!(
            "Created session {} for user {} ({})",
            short_id(&session_id),
            user_id,
            session.device_name.as_deref().unwrap_or("unknown device")
        );

        Ok(session_id)
    }

    /// Open a session and hand out every secret the client needs
    ///
    /// Generates the refresh token, creates the session, binds it to the
    /// device and signs the first access token.
    pub async fn issue_session(
        &self,
        user_id: &UserId,
        device: &DeviceInfo,
        ban: &BanState,
    ) -> AuthResult<IssuedSession> {
        let refresh_token = generate_secure_token(REFRESH_TOKEN_BYTES);
        let session_id = self
            .create_session(user_id, &refresh_token, device, ban)
            .await?;

        let binding_token = generate_secure_token(BINDING_TOKEN_BYTES);
        let ttl_secs = self.config.refresh_lifetime_secs();
        self.store
            .set_binding(&session_id, &hash_token(&binding_token), ttl_secs)
            .await?;

        let access_token = self.codec.issue(user_id, &session_id)?;

        Ok(IssuedSession {
            session_id,
            refresh_token,
            binding_token,
            access_token,
            expires_in_secs: ttl_secs,
        })
    }

    /// Bind an existing session to a new device secret
    ///
    /// The binding hash expires together with the session. Returns `None`
    /// when the session record is gone.
    pub async fn attach_binding(&self, session_id: &SessionId) -> AuthResult<Option<BindingGrant>> {
        let Some(ttl_secs) = self.store.remaining_ttl(session_id).await? else {
            return Ok(None);
        };

        let token = generate_secure_token(BINDING_TOKEN_BYTES);
        self.store
            .set_binding(session_id, &hash_token(&token), ttl_secs)
            .await?;

        Ok(Some(BindingGrant { token, ttl_secs }))
    }

    /// Load a session without validating any token
    pub async fn get_session(&self, session_id: &SessionId) -> AuthResult<Option<Session>> {
        Ok(self.store.load(session_id).await?)
    }

    /// Check a refresh token against its session
    ///
    /// Expired sessions are destroyed on the spot. Banned sessions are
    /// returned without checking the token so the caller can report the ban
    /// instead of a generic failure.
    ///
    /// # Returns
    ///
    /// * `Some(session)` - Token matches, or the session is banned
    /// * `None` - Missing, expired or mismatched
    pub async fn validate_refresh_token(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> AuthResult<Option<Session>> {
        let Some(session) = self.store.load(session_id).await? else {
            return Ok(None);
        };

        if session.is_expired_at(Utc::now()) {
            log::info!("Session {} expired; destroying", short_id(session_id));
            self.destroy_session(session_id).await?;
            return Ok(None);
        }

        if session.is_banned {
            return Ok(Some(session));
        }

        let presented = hash_token(refresh_token);
        let matches: bool = presented
            .as_bytes()
            .ct_eq(session.refresh_token_hash.as_bytes())
            .into();

        if !matches {
            log::warn!(
                "SECURITY: refresh token mismatch for session {} (user {})",
                short_id(session_id),
                session.user_id
            );
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Rotate using the session's current refresh token
    ///
    /// # Returns
    ///
    /// * `Some(tokens)` - New refresh and access tokens
    /// * `None` - Invalid token, banned, missing or expired session
    pub async fn rotate_legacy(
        &self,
        session_id: &SessionId,
        refresh_token: &str,
    ) -> AuthResult<Option<RotatedTokens>> {
        let Some(session) = self.validate_refresh_token(session_id, refresh_token).await? else {
            return Ok(None);
        };

        self.rotate_loaded(session_id, session).await
    }

    /// Rotate a session whose binding token the caller already verified
    ///
    /// Only existence and the ban flag are checked here.
    pub async fn rotate_bound(&self, session_id: &SessionId) -> AuthResult<Option<RotatedTokens>> {
        let Some(session) = self.store.load(session_id).await? else {
            return Ok(None);
        };

        self.rotate_loaded(session_id, session).await
    }

    async fn rotate_loaded(
        &self,
        session_id: &SessionId,
        mut session: Session,
    ) -> AuthResult<Option<RotatedTokens>> {
        if session.is_banned {
            log::info!(
                "Refusing to rotate banned session {} (user {})",
                short_id(session_id),
                session.user_id
            );
            return Ok(None);
        }

        let refresh_token = generate_secure_token(REFRESH_TOKEN_BYTES);
        session.refresh_token_hash = hash_token(&refresh_token);
        session.last_active_at = Utc::now();

        // Hash replacement only: the TTL and expires_at stay where creation put them
        if !self.store.save_preserving_ttl(session_id, &session).await? {
            return Ok(None);
        }

        let access_token = self.codec.issue(&session.user_id, session_id)?;
        log::debug!("Rotated refresh token for session {}", short_id(session_id));

        Ok(Some(RotatedTokens {
            refresh_token,
            access_token,
        }))
    }

    /// Stamp `last_active_at`; no-op if the session is gone
    pub async fn touch_session(&self, session_id: &SessionId) -> AuthResult<()> {
        if let Some(mut session) = self.store.load(session_id).await? {
            session.last_active_at = Utc::now();
            self.store.save_preserving_ttl(session_id, &session).await?;
        }
        Ok(())
    }

    /// Destroy one session (idempotent)
    pub async fn destroy_session(&self, session_id: &SessionId) -> AuthResult<()> {
        if let Some(session) = self.store.load(session_id).await? {
            self.store.index_remove(&session.user_id, session_id).await?;
        }
        self.store.remove(session_id).await?;

        log::info!("Destroyed session {}", short_id(session_id));
        Ok(())
    }

    /// Destroy every session of a user
    ///
    /// # Returns
    ///
    /// * `AuthResult<usize>` - Number of ids in the user's index, stale ones included
    pub async fn destroy_all_sessions(&self, user_id: &UserId) -> AuthResult<usize> {
        let session_ids = self.store.index_members(user_id).await?;
        for session_id in &session_ids {
            self.store.remove(session_id).await?;
        }
        self.store.index_clear(user_id).await?;

        log::info!(
            "Destroyed {} session(s) for user {}",
            session_ids.len(),
            user_id
        );
        Ok(session_ids.len())
    }

    /// Live sessions of a user, pruning index entries whose record is gone
    pub async fn list_user_sessions(&self, user_id: &UserId) -> AuthResult<Vec<SessionEntry>> {
        let mut entries = Vec::new();
        for session_id in self.store.index_members(user_id).await? {
            match self.store.load(&session_id).await? {
                Some(session) => entries.push(SessionEntry {
                    session_id,
                    session,
                }),
                None => self.store.index_remove(user_id, &session_id).await?,
            }
        }

        entries.sort_by(|a, b| b.session.last_active_at.cmp(&a.session.last_active_at));
        Ok(entries)
    }

    /// Set or clear the ban flag on every session of a user
    ///
    /// Banned sessions refuse rotation immediately, without waiting for
    /// their access tokens to lapse.
    ///
    /// # Returns
    ///
    /// * `AuthResult<usize>` - Number of sessions updated
    pub async fn propagate_ban(
        &self,
        user_id: &UserId,
        is_banned: bool,
        reason: Option<&str>,
    ) -> AuthResult<usize> {
        let mut updated = 0;
        for session_id in self.store.index_members(user_id).await? {
            let Some(mut session) = self.store.load(&session_id).await? else {
                self.store.index_remove(user_id, &session_id).await?;
                continue;
            };

            session.is_banned = is_banned;
            session.ban_reason = if is_banned {
                reason.map(str::to_string)
            } else {
                None
            };

            if self.store.save_preserving_ttl(&session_id, &session).await? {
                updated += 1;
            }
        }

        log::info!(
            "Ban state {} applied to {} session(s) of user {}",
            if is_banned { "set" } else { "cleared" },
            updated,
            user_id
        );
        Ok(updated)
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        self.codec.verify(token)
    }
}
