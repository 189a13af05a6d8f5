//! JWT inspection and issuance.
//!
//! Consumed by callers independently of the request pipeline; the pipeline
//! itself never inspects tokens, so an expired credential simply surfaces
//! as a 401 from the service.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};

use crate::error::ClientError;

/// Decoded JWT claims as an open key-value map.
pub type Claims = Map<String, Value>;

/// Validates, decodes, and issues JWTs for the task service.
///
/// Verifies HS256 signatures by default. Verification can be disabled
/// explicitly, in which case [`TokenInspector::decode`] accepts tokens
/// signed with any secret; [`TokenInspector::is_expired`] always verifies.
#[derive(Debug, Clone)]
pub struct TokenInspector {
    secret: String,
    algorithms: Vec<Algorithm>,
    verify: bool,
}

impl TokenInspector {
    /// Create an inspector verifying HS256 signatures with `secret`.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithms: vec![Algorithm::HS256],
            verify: true,
        }
    }

    /// Replace the set of accepted algorithms.
    pub fn with_algorithms(mut self, algorithms: Vec<Algorithm>) -> Self {
        self.algorithms = algorithms;
        self
    }

    /// Disable signature verification for `decode`. Claims decoded this way
    /// are unverifiable; use only when the signature is checked elsewhere.
    pub fn without_verification(mut self) -> Self {
        self.verify = false;
        self
    }

    fn verifying_validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.algorithms = self.algorithms.clone();
        validation.set_required_spec_claims::<&str>(&[]);
        validation
    }

    /// Decode and validate a token.
    ///
    /// # Errors
    ///
    /// `TokenExpired` kind when the token is past its `exp` claim;
    /// `InvalidToken` for signature mismatch, malformed input, or a
    /// disallowed algorithm.
    pub fn decode(&self, token: &str) -> Result<Claims, ClientError> {
        let mut validation = self.verifying_validation();
        if !self.verify {
            validation.insecure_disable_signature_validation();
        }
        let data = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(map_decode_error)?;
        Ok(data.claims)
    }

    /// Encode `claims` into a signed token.
    ///
    /// When `ttl` is given, an `exp` claim is stamped at now + ttl,
    /// replacing any existing one.
    ///
    /// # Errors
    ///
    /// `InvalidToken` kind when encoding fails.
    pub fn encode(
        &self,
        claims: &Claims,
        algorithm: Algorithm,
        ttl: Option<std::time::Duration>,
    ) -> Result<String, ClientError> {
        let mut claims = claims.clone();
        if let Some(ttl) = ttl {
            let ttl = chrono::Duration::from_std(ttl)
                .map_err(|e| ClientError::invalid_token(format!("Failed to encode token: {e}")))?;
            let exp = Utc::now() + ttl;
            claims.insert("exp".to_string(), Value::from(exp.timestamp()));
        }

        jsonwebtoken::encode(
            &Header::new(algorithm),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ClientError::invalid_token(format!("Failed to encode token: {e}")))
    }

    /// Check expiry without raising. Any decode failure, including a
    /// signature mismatch, is reported as expired.
    pub fn is_expired(&self, token: &str) -> bool {
        jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &self.verifying_validation(),
        )
        .is_err()
    }

    /// Decode claims without verifying signature or expiry.
    ///
    /// # Errors
    ///
    /// `InvalidToken` kind only when the token is structurally malformed.
    pub fn peek_claims(&self, token: &str) -> Result<Claims, ClientError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        let data = jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| ClientError::invalid_token(format!("Failed to decode token: {e}")))?;
        Ok(data.claims)
    }

    /// Expiration time from the `exp` claim, read without verification.
    ///
    /// # Errors
    ///
    /// `InvalidToken` kind when the token is structurally malformed.
    pub fn expiration_time(&self, token: &str) -> Result<Option<DateTime<Utc>>, ClientError> {
        let claims = self.peek_claims(token)?;
        let Some(exp) = claims.get("exp") else {
            return Ok(None);
        };
        let seconds = exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64));
        Ok(seconds.and_then(|s| DateTime::from_timestamp(s, 0)))
    }

    /// Signed time remaining until expiry; negative means the token is
    /// already expired. `None` when the token carries no `exp` claim.
    ///
    /// # Errors
    ///
    /// `InvalidToken` kind when the token is structurally malformed.
    pub fn time_to_expiration(&self, token: &str) -> Result<Option<chrono::Duration>, ClientError> {
        Ok(self.expiration_time(token)?.map(|exp| exp - Utc::now()))
    }
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> ClientError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            ClientError::token_expired("Token has expired")
        }
        _ => ClientError::invalid_token(format!("Invalid token: {err}")),
    }
}
