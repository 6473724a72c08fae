/// JWT token issuing and verification
///
/// Tokens are signed with HS256 (HMAC-SHA256) and carry the subject's numeric
/// user id. A token is valid for 14 days from issuance; validity is decided
/// solely by signature and expiry, there is no server-side session table.
///
/// The signing secret is injected configuration, used symmetrically for both
/// issuing and verification. It should be at least 32 bytes.
///
/// # Example
///
/// ```
/// use taskforge_shared::auth::jwt::{issue_token, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "test-secret-key-at-least-32-bytes-long";
///
/// let token = issue_token(42, secret)?;
/// let claims = verify_token(&token, secret)?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Issuer claim embedded in every token
const ISSUER: &str = "taskforge";

/// Token validity window: 14 days from issuance
pub const TOKEN_TTL_DAYS: i64 = 14;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to sign the token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature mismatch, malformed token, or wrong issuer
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// JWT claims structure
///
/// Standard claims only; the subject is the authenticated user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: i64,

    /// Issuer - always "taskforge"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims for a subject with the default 14-day expiry
    pub fn new(subject_id: i64) -> Self {
        Self::with_expiration(subject_id, Duration::days(TOKEN_TTL_DAYS))
    }

    /// Creates claims with a custom expiry, mainly useful in tests
    pub fn with_expiration(subject_id: i64, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: subject_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims into a token string
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a token for a subject with the default 14-day expiry
///
/// Stateless: signing has no side effects.
pub fn issue_token(subject_id: i64, secret: &str) -> Result<String, JwtError> {
    create_token(&Claims::new(subject_id), secret)
}

/// Verifies a token and extracts its claims
///
/// Checks the signature, expiry, not-before time, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for an expired token and `JwtError::Invalid`
/// for any other failure (bad signature, malformed token, wrong issuer).
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
