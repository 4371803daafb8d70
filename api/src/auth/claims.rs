use serde::{Deserialize, Serialize};

/// JWT payload: the authenticated user's id and the token expiry.
///
/// Identity provisioning lives with the external identity provider; this
/// layer only validates tokens it is handed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
