use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload. Carries nothing but the user id and the validity window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,  // user ID
    pub iat: usize, // issued at (unix timestamp)
    pub exp: usize, // expires at (unix timestamp)
}
