// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Eligibility
//!
//! Financial eligibility evaluation and credential issuance.
//!
//! - [`evaluator`]: pure scoring of a financial declaration
//! - [`record`]: stored outcome of one check, valid for 90 days
//! - [`credential`]: W3C-style credential built from an eligible record
//! - [`signer`]: proof signing capability (Ed25519 or a fixed test value)

pub mod credential;
pub mod evaluator;
pub mod record;
pub mod signer;

pub use credential::{
    CredentialError, CredentialIssuer, CredentialProof, EligibilityLevel, EligibilitySubject,
    IssuedCredential, VerifiableCredential,
};
pub use evaluator::{evaluate, Assets, Evaluation, FinancialDeclaration, FinancialSummary, Income};
pub use record::{CredentialRef, CredentialStatus, EligibilityRecord, RECORD_VALIDITY_DAYS};
pub use signer::{Ed25519Signer, ProofSigner, SigningError, StaticSigner};
