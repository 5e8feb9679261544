use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, TokenData, Validation};
use log::debug;
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request, State,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;

pub const BEARER_PREFIX: &str = "Bearer ";

/// The already-authenticated identity behind a request.
///
/// The identity is opaque to the rest of the backend: it is only ever
/// compared against the `created_by` field of stored records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(String);

impl Caller {
    /// The caller's identity string.
    pub fn id(&self) -> &str {
        &self.0
    }

    /// Verify a bearer token and extract the identity it was issued to.
    pub fn from_token(token: &str, config: &Config) -> Result<Self, Error> {
        let claims = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|data: TokenData<Claims>| data.claims)?;
        if claims.subject.trim().is_empty() {
            return Err(Error::Unauthorized("Token has no subject".to_string()));
        }
        Ok(Self(claims.subject))
    }
}

/// Token claims: the subject identity plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "sub")]
    subject: String,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Caller {
    type Error = Error;

    /// Get a [`Caller`] from the `Authorization: Bearer` header.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        // Unwrap is safe as `Config` is always managed.
        let config = req.guard::<&State<Config>>().await.unwrap();

        let token = match req
            .headers()
            .get_one("Authorization")
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        {
            Some(token) => token,
            None => {
                return Outcome::Failure((
                    Status::Unauthorized,
                    Error::Unauthorized("Missing bearer token".to_string()),
                ))
            }
        };

        match Self::from_token(token.trim(), config) {
            Ok(caller) => Outcome::Success(caller),
            Err(err) => {
                debug!("Rejected bearer token: {err}");
                Outcome::Failure((Status::Unauthorized, err))
            }
        }
    }
}
