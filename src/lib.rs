// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Financial Eligibility Passport
//!
//! Scores financial declarations against funeral-expenses eligibility
//! thresholds and issues signed verifiable credentials for eligible
//! results. The crate also hosts the funeral-expenses form relay.
//!
//! ## Modules
//!
//! - `api` - FEP HTTP handlers (Axum)
//! - `auth` - Bearer tokens, passwords and role checks
//! - `eligibility` - Scoring, records and credential issuance
//! - `forms` - Form relay service
//! - `reports` - Admin reports over the live stores
//! - `storage` - Store capabilities and their in-memory implementations

pub mod api;
pub mod auth;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod forms;
pub mod logging;
pub mod models;
pub mod registry;
pub mod reports;
pub mod server;
pub mod state;
pub mod storage;
