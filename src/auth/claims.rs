use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. Tokens are minted by the identity service; this
/// backend only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // user ID
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}
