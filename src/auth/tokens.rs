// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token issuance and verification (HS256).
//!
//! Tokens are stateless: a token is valid if its signature verifies under
//! the configured secret and it has not expired. There is no revocation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{TokenClaims, TokenSubject};
use super::error::AuthError;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Error while signing a token.
#[derive(Debug, thiserror::Error)]
#[error("failed to sign token: {0}")]
pub struct TokenSigningError(#[from] jsonwebtoken::errors::Error);

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies bearer tokens with a shared secret.
///
/// Cheap to clone; the keys are shared.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Arc<Keys>,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            ttl,
        }
    }

    /// Sign a token for `subject`, valid for the configured TTL.
    pub fn issue(&self, subject: &TokenSubject) -> Result<String, TokenSigningError> {
        let now = Utc::now();
        self.issue_at(subject, now.timestamp(), (now + self.ttl).timestamp())
    }

    fn issue_at(
        &self,
        subject: &TokenSubject,
        iat: i64,
        exp: i64,
    ) -> Result<String, TokenSigningError> {
        let claims = TokenClaims {
            sub: subject.sub.clone(),
            username: subject.username.clone(),
            role: subject.role,
            did: subject.did.clone(),
            email: subject.email.clone(),
            iat,
            exp,
        };
        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.keys.encoding,
        )?)
    }

    /// Verify signature and expiry and return the claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = CLOCK_SKEW_LEEWAY;

        decode::<TokenClaims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(format!("{:?}", e.kind())))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"test-secret", Duration::hours(1))
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            sub: "2".to_string(),
            username: Some("user".to_string()),
            role: Role::User,
            did: Some("did:web:user.example.com".to_string()),
            email: None,
        }
    }

    #[test]
    fn issue_then_verify() {
        let issuer = issuer();
        let token = issuer.issue(&subject()).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "2");
        assert_eq!(claims.role, Role::User);
        assert_eq!(claims.did.as_deref(), Some("did:web:user.example.com"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issuer().issue(&subject()).unwrap();
        let other = TokenIssuer::new(b"other-secret", Duration::hours(1));
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn expired_token_is_invalid() {
        let issuer = issuer();
        let past = Utc::now().timestamp() - 3600;
        let token = issuer.issue_at(&subject(), past - 60, past).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            issuer().verify("not.a.token"),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn unknown_role_is_invalid() {
        use base64ct::{Base64UrlUnpadded, Encoding};
        use hmac::{Hmac, Mac};
        use sha2::Sha256;

        let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = Base64UrlUnpadded::encode_string(
            format!(
                r#"{{"sub":"1","role":"root","iat":1,"exp":{}}}"#,
                Utc::now().timestamp() + 600
            )
            .as_bytes(),
        );
        let signing_input = format!("{header}.{payload}");
        let mut mac = Hmac::<Sha256>::new_from_slice(b"test-secret").unwrap();
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
        let token = format!("{signing_input}.{signature}");

        assert!(matches!(issuer().verify(&token), Err(AuthError::InvalidToken(_))));
    }
}
