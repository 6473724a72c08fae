/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and constant-time verification
/// - [`jwt`]: HS256 token issuing and verification (14-day validity)
/// - [`guard`]: the per-request gate turning a raw token into an authorized
///   identity, with per-route role allow-lists
/// - [`access`]: ownership-scoped access rules applied after the guard
///
/// # Example
///
/// ```
/// use taskforge_shared::auth::jwt::{issue_token, verify_token};
/// use taskforge_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = issue_token(42, "secret-key-at-least-32-bytes-long!!")?;
/// let claims = verify_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```
pub mod access;
pub mod guard;
pub mod jwt;
pub mod password;
