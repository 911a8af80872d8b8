//! Issues and verifies the bearer tokens that identify a logged in user.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, UserID};

/// The contents of a JSON Web Token.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: UserID,
    /// The time the token was issued, in seconds since the Unix epoch.
    pub iat: i64,
    /// The expiry time of the token, in seconds since the Unix epoch.
    pub exp: i64,
}

/// The keys for signing and verifying tokens, derived from one shared secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenKeys {
    /// Create HMAC keys from `secret`.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Create a token for `user_id` that expires after `duration`.
///
/// # Errors
/// Returns [Error::TokenCreation] if the token could not be signed.
pub fn issue_token(user_id: UserID, keys: &TokenKeys, duration: Duration) -> Result<String, Error> {
    let now = OffsetDateTime::now_utc();
    let claims = Claims {
        sub: user_id,
        iat: now.unix_timestamp(),
        exp: (now + duration).unix_timestamp(),
    };

    encode(&Header::default(), &claims, &keys.encoding_key)
        .map_err(|error| Error::TokenCreation(error.to_string()))
}

/// Check the signature and expiry of `token` and return its claims.
///
/// # Errors
/// Returns [Error::InvalidToken] if the token is malformed, was signed with a
/// different key, or has expired.
pub fn verify_token(token: &str, keys: &TokenKeys) -> Result<Claims, Error> {
    decode::<Claims>(token, &keys.decoding_key, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|error| {
            tracing::debug!("Rejected bearer token: {error}");
            Error::InvalidToken
        })
}

#[cfg(test)]
mod tests {
    use time::Duration;

    use crate::{
        Error, UserID,
        auth::token::{TokenKeys, issue_token, verify_token},
    };

    #[test]
    fn verified_token_has_user_id() {
        let keys = TokenKeys::from_secret("foobar");
        let user_id = UserID::new(7);

        let token = issue_token(user_id, &keys, Duration::hours(1)).unwrap();
        let claims = verify_token(&token, &keys).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token =
            issue_token(UserID::new(1), &TokenKeys::from_secret("foo"), Duration::hours(1))
                .unwrap();

        let result = verify_token(&token, &TokenKeys::from_secret("bar"));

        assert_eq!(result, Err(Error::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::from_secret("foobar");
        let token = issue_token(UserID::new(1), &keys, -Duration::hours(2)).unwrap();

        assert_eq!(verify_token(&token, &keys), Err(Error::InvalidToken));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::from_secret("foobar");

        assert_eq!(verify_token("FOOBAR", &keys), Err(Error::InvalidToken));
    }
}
