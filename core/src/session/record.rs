use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ApiError, ApiResult};

/// Dashboard role of the logged-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Student => "student",
        };
        f.write_str(name)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            "student" => Ok(Role::Student),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Client-side session record
///
/// Only `accessToken` is required by the client. Every other field written by
/// the login flow is kept in `extra` so that re-serializing a record does not
/// drop identity claims the client does not know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionRecord {
    /// Creates a record holding just a token and an optional role
    pub fn new(access_token: impl Into<String>, role: Option<Role>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            role,
            extra: Map::new(),
        }
    }

    /// Parses a stored record.
    ///
    /// Anything that is not a JSON object is reported as `NoSession`. A
    /// non-string `accessToken` is treated as absent.
    pub fn parse(raw: &str) -> ApiResult<Self> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ApiError::NoSession)?;
        let Value::Object(mut fields) = value else {
            return Err(ApiError::NoSession);
        };

        let access_token = match fields.remove("accessToken") {
            Some(Value::String(token)) => Some(token),
            _ => None,
        };

        let role = match fields.remove("role") {
            Some(Value::String(name)) => match name.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    fields.insert("role".to_string(), Value::String(name));
                    None
                }
            },
            Some(other) => {
                fields.insert("role".to_string(), other);
                None
            }
            None => None,
        };

        Ok(Self {
            access_token,
            role,
            extra: fields,
        })
    }

    /// Returns the bearer token, or `NoToken` when it is missing or blank
    pub fn token(&self) -> ApiResult<&str> {
        match self.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => Err(ApiError::NoToken),
        }
    }

    /// Serializes the record back into its stored form
    pub fn to_json(&self) -> ApiResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ApiError::SessionStorage(format!("Failed to serialize session: {}", e)))
    }

    /// Decodes the token's claims without verifying its signature.
    ///
    /// For display only; returns `None` for tokens that are not JWTs.
    pub fn claims(&self) -> Option<TokenClaims> {
        self.token().ok().and_then(TokenClaims::peek)
    }
}

/// Subset of JWT claims the back-end places in access tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Reads the claims of `token` without checking the signature or expiry.
    pub fn peek(token: &str) -> Option<Self> {
        let header = jsonwebtoken::decode_header(token).ok()?;
        let mut validation = Validation::new(header.alg);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        jsonwebtoken::decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// True when the token carries an expiry that lies before `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires_at| expires_at < now)
    }
}
