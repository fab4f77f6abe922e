// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Time-limited download links for stored forms.
//!
//! A link carries `key`, `expires` (unix seconds) and `signature`, the
//! base64url HMAC-SHA256 of `"{key}\n{expires}"`.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Path the download handler is mounted at.
pub const DOWNLOAD_PATH: &str = "/api/forms/download";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("download link signature does not match")]
    InvalidSignature,
    #[error("download link has expired")]
    Expired,
    #[error("cannot build download link: {0}")]
    Url(String),
    #[error("link signing key rejected")]
    Key,
}

impl LinkError {
    pub fn error_code(&self) -> &'static str {
        match self {
            LinkError::Expired => "form/link-expired",
            _ => "form/invalid-link",
        }
    }
}

/// Presigns and verifies download links.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    base_url: Url,
    ttl: Duration,
}

impl UrlSigner {
    pub fn new(secret: impl Into<Vec<u8>>, base_url: Url, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            base_url,
            ttl,
        }
    }

    fn mac(&self, key: &str, expires: i64) -> Result<HmacSha256, LinkError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| LinkError::Key)?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Build a link to `key` valid until `now + ttl`.
    pub fn presign(&self, key: &str, now: DateTime<Utc>) -> Result<Url, LinkError> {
        let expires = (now + self.ttl).timestamp();
        let signature = self.mac(key, expires)?.finalize().into_bytes();

        let mut url = self
            .base_url
            .join(DOWNLOAD_PATH)
            .map_err(|e| LinkError::Url(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &Base64UrlUnpadded::encode_string(&signature));
        Ok(url)
    }

    /// Check a link's signature, then its expiry.
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), LinkError> {
        let signature =
            Base64UrlUnpadded::decode_vec(signature).map_err(|_| LinkError::InvalidSignature)?;
        self.mac(key, expires)?
            .verify_slice(&signature)
            .map_err(|_| LinkError::InvalidSignature)?;

        if now.timestamp() >= expires {
            return Err(LinkError::Expired);
        }
        Ok(())
    }
}
