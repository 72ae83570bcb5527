//! Bearer Credential
//!
//! The token is handed to each collaborator explicitly; nothing reads it from
//! ambient state. Claims are decoded without verification: the server is the
//! authority, the client only needs the acting employee's identity.

use std::fmt;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde_json::{Map, Value};

use crate::domain::{DomainError, DomainResult, IdKind, RecordId};

const NAME_CLAIM: &str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";
const EMPLOYEE_CLAIMS: [&str; 2] = ["Employee_Id", "employee_Id"];

/// An opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().trim().to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Decode the JWT payload segment
    pub fn claims(&self) -> DomainResult<Map<String, Value>> {
        let payload = self
            .token
            .split('.')
            .nth(1)
            .ok_or_else(|| DomainError::InvalidInput("token is not a JWT".to_string()))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .or_else(|_| URL_SAFE.decode(payload))
            .map_err(|e| DomainError::InvalidInput(format!("token payload is not base64: {}", e)))?;

        match serde_json::from_slice(&bytes) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DomainError::InvalidInput("token payload is not an object".to_string())),
            Err(e) => Err(DomainError::InvalidInput(format!("token payload is not JSON: {}", e))),
        }
    }

    /// The employee the token was issued to
    pub fn employee_id(&self) -> DomainResult<RecordId> {
        let claims = self.claims()?;
        EMPLOYEE_CLAIMS
            .iter()
            .find_map(|key| claims.get(*key))
            .ok_or_else(|| DomainError::NotFound("Employee_Id claim".to_string()))
            .and_then(|value| IdKind::Numeric.canonicalize(value))
    }

    pub fn user_name(&self) -> Option<String> {
        self.claims()
            .ok()?
            .get(NAME_CLAIM)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &format_args!("<{} chars>", self.token.len()))
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_token(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}
