//! Signed access tokens.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, SessionId, UserId},
};
use crate::config::AccessTokenConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::{Error as JwtError, ErrorKind},
};
use uuid::Uuid;

/// Value of the `type` claim on access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// HS256 access token issuer/verifier
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl AccessTokenCodec {
    /// Create a codec from signing configuration
    pub fn new(config: &AccessTokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = config.leeway_secs;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::minutes(i64::from(config.ttl_minutes)),
        }
    }

    /// Sign an access token for a user's session
    pub fn issue(&self, user_id: &UserId, session_id: &SessionId) -> AuthResult<String> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::LifetimeOverflow)?;
        let claims = AccessTokenClaims {
            user_id: user_id.clone(),
            session_id: session_id.clone(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        self.sign(&claims)
    }

    fn sign(&self, claims: &AccessTokenClaims) -> AuthResult<String> {
        Ok(encode(&Header::default(), claims, &self.encoding_key)?)
    }

    /// Verify an access token and return its claims
    ///
    /// # Errors
    ///
    /// * `AuthError::TokenExpired` - Past `exp`
    /// * `AuthError::InvalidToken` - Bad signature, malformed token, wrong
    ///   issuer/audience or a `type` other than `access`
    /// * `AuthError::Jwt` - Any other verification failure, unmodified
    pub fn verify(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let data = decode::<AccessTokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(classify)?;

        if data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::InvalidToken);
        }

        Ok(data.claims)
    }
}

fn classify(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidToken
        | ErrorKind::InvalidSignature
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => AuthError::InvalidToken,
        _ => AuthError::Jwt(err),
    }
}
