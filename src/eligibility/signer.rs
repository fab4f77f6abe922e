// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential proof signing.
//!
//! [`Ed25519Signer`] produces real `Ed25519Signature2020`-style proofs with a
//! key loaded from a PKCS#8 file or generated at startup. [`StaticSigner`]
//! returns a fixed proof value and is what tests use.
//!
//! `proofValue` is the raw 64-byte signature encoded as unpadded base64url,
//! the same alphabet the DID document uses for the public key `x`. It is not
//! multibase; verifiers decode it with base64url rather than base58btc.

use std::path::Path;

use base64ct::{Base64UrlUnpadded, Encoding};
use ring::rand::SystemRandom;
use ring::signature::{Ed25519KeyPair, KeyPair};

/// Proof type written into issued credentials.
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("signing key rejected: {0}")]
    KeyRejected(String),
    #[error("could not read signing key: {0}")]
    Io(#[from] std::io::Error),
    #[error("key generation failed")]
    KeyGeneration,
}

/// Capability for signing credential payloads.
pub trait ProofSigner: Send + Sync {
    /// DID URL of the verification method, e.g. `did:web:fep.gov.uk#key-1`.
    fn verification_method(&self) -> &str;

    /// Sign `payload` and return the encoded proof value.
    fn sign(&self, payload: &[u8]) -> Result<String, SigningError>;

    /// Raw public key bytes for the DID document.
    fn public_key(&self) -> Vec<u8>;
}

/// Ed25519 signer backed by `ring`.
pub struct Ed25519Signer {
    key_pair: Ed25519KeyPair,
    verification_method: String,
}

impl Ed25519Signer {
    /// Generate a fresh key. Proofs will not verify after a restart.
    pub fn generate(verification_method: impl Into<String>) -> Result<Self, SigningError> {
        let rng = SystemRandom::new();
        let pkcs8 =
            Ed25519KeyPair::generate_pkcs8(&rng).map_err(|_| SigningError::KeyGeneration)?;
        Self::from_pkcs8(pkcs8.as_ref(), verification_method)
    }

    /// Load a PKCS#8 (v1 or v2) Ed25519 private key.
    pub fn from_pkcs8(
        pkcs8: &[u8],
        verification_method: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(pkcs8)
            .map_err(|e| SigningError::KeyRejected(e.to_string()))?;
        Ok(Self {
            key_pair,
            verification_method: verification_method.into(),
        })
    }

    /// Load a DER-encoded PKCS#8 key file.
    pub fn from_file(
        path: impl AsRef<Path>,
        verification_method: impl Into<String>,
    ) -> Result<Self, SigningError> {
        let der = std::fs::read(path)?;
        Self::from_pkcs8(&der, verification_method)
    }
}

impl ProofSigner for Ed25519Signer {
    fn verification_method(&self) -> &str {
        &self.verification_method
    }

    fn sign(&self, payload: &[u8]) -> Result<String, SigningError> {
        let signature = self.key_pair.sign(payload);
        Ok(Base64UrlUnpadded::encode_string(signature.as_ref()))
    }

    fn public_key(&self) -> Vec<u8> {
        self.key_pair.public_key().as_ref().to_vec()
    }
}

/// Deterministic signer for tests and local development.
pub struct StaticSigner {
    verification_method: String,
    proof_value: String,
}

impl StaticSigner {
    pub const DEFAULT_PROOF_VALUE: &'static str = "mockSignatureValue";

    pub fn new(verification_method: impl Into<String>) -> Self {
        Self {
            verification_method: verification_method.into(),
            proof_value: Self::DEFAULT_PROOF_VALUE.to_string(),
        }
    }
}

impl ProofSigner for StaticSigner {
    fn verification_method(&self) -> &str {
        &self.verification_method
    }

    fn sign(&self, _payload: &[u8]) -> Result<String, SigningError> {
        Ok(self.proof_value.clone())
    }

    fn public_key(&self) -> Vec<u8> {
        vec![0u8; 32]
    }
}
