// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-use DID authentication challenges.

use std::collections::HashMap;
use std::sync::RwLock;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use super::{StorageError, StorageResult};

/// How long a challenge may be answered.
pub const CHALLENGE_TTL_SECS: i64 = 5 * 60;

const CHALLENGE_BYTES: usize = 32;

/// An issued challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChallengeRejection {
    #[error("challenge was never issued or has already been used")]
    Unknown,
    #[error("challenge expired")]
    Expired,
}

/// Outstanding challenges, removed on first use.
pub struct ChallengeStore {
    rng: SystemRandom,
    ttl: Duration,
    pending: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl Default for ChallengeStore {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(CHALLENGE_TTL_SECS))
    }
}

impl ChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            rng: SystemRandom::new(),
            ttl,
            pending: RwLock::new(HashMap::new()),
        }
    }

    /// Create a fresh random challenge valid from `now`.
    ///
    /// Expired challenges are swept on each issue.
    pub fn issue(&self, now: DateTime<Utc>) -> StorageResult<Challenge> {
        let mut bytes = [0u8; CHALLENGE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| StorageError::Io(std::io::Error::other("system RNG failure")))?;

        let challenge = Challenge {
            value: Base64UrlUnpadded::encode_string(&bytes),
            expires_at: now + self.ttl,
        };

        let mut pending = self.pending.write()?;
        pending.retain(|_, expires_at| *expires_at > now);
        pending.insert(challenge.value.clone(), challenge.expires_at);
        Ok(challenge)
    }

    /// Consume `value`. A challenge can be consumed at most once, and only
    /// before it expires.
    pub fn consume(
        &self,
        value: &str,
        now: DateTime<Utc>,
    ) -> StorageResult<Result<(), ChallengeRejection>> {
        let expires_at = match self.pending.write()?.remove(value) {
            Some(expires_at) => expires_at,
            None => return Ok(Err(ChallengeRejection::Unknown)),
        };

        if now >= expires_at {
            return Ok(Err(ChallengeRejection::Expired));
        }
        Ok(Ok(()))
    }

    pub fn pending(&self) -> StorageResult<usize> {
        Ok(self.pending.read()?.len())
    }
}
