// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Eligibility scoring.
//!
//! [`evaluate`] is a pure function of the declaration: no clock, no store,
//! no randomness. Absent nested fields count as zero / empty.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Annual income threshold with no dependents.
pub const BASE_INCOME_THRESHOLD: f64 = 16_000.0;
/// Income threshold increase per dependent.
pub const INCOME_THRESHOLD_PER_DEPENDENT: f64 = 2_000.0;
/// Asset threshold with no dependents.
pub const BASE_ASSET_THRESHOLD: f64 = 6_000.0;
/// Asset threshold increase per dependent.
pub const ASSET_THRESHOLD_PER_DEPENDENT: f64 = 1_000.0;
/// Claiming any of these benefits makes the applicant eligible.
pub const PASSPORTING_BENEFITS: [&str; 2] = ["Universal Credit", "Income Support"];
/// Score bonus for applicants claiming at least one benefit.
pub const BENEFIT_SCORE_BOOST: u8 = 10;

/// Declared income.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Income {
    #[serde(default)]
    pub annual: Option<f64>,
    #[serde(default)]
    pub monthly: Option<f64>,
}

/// Declared assets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Assets {
    #[serde(default)]
    pub savings: Option<f64>,
    #[serde(default)]
    pub investments: Option<f64>,
    #[serde(default)]
    pub property: Option<f64>,
}

/// Financial information submitted with an eligibility check.
///
/// Dependents are opaque descriptors; only their count matters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDeclaration {
    #[serde(default)]
    pub income: Option<Income>,
    #[serde(default)]
    pub assets: Option<Assets>,
    #[serde(default)]
    #[schema(value_type = Option<Vec<Object>>)]
    pub dependents: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub benefits_claimed: Option<Vec<String>>,
}

impl FinancialDeclaration {
    /// `annual + monthly * 12`.
    pub fn total_income(&self) -> f64 {
        let income = self.income.as_ref();
        let annual = income.and_then(|i| i.annual).unwrap_or(0.0);
        let monthly = income.and_then(|i| i.monthly).unwrap_or(0.0);
        annual + monthly * 12.0
    }

    /// `savings + investments + property`.
    pub fn total_assets(&self) -> f64 {
        self.assets
            .as_ref()
            .map(|a| {
                a.savings.unwrap_or(0.0) + a.investments.unwrap_or(0.0) + a.property.unwrap_or(0.0)
            })
            .unwrap_or(0.0)
    }

    pub fn dependent_count(&self) -> usize {
        self.dependents.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn benefits(&self) -> &[String] {
        self.benefits_claimed.as_deref().unwrap_or(&[])
    }
}

/// Totals derived from a declaration, kept on the record for admin views.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub income: f64,
    pub assets: f64,
    pub dependents: usize,
    pub benefits_claimed: Vec<String>,
}

/// Result of scoring a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub is_eligible: bool,
    /// 0-100; always 0 when not eligible.
    pub score: u8,
    pub income_threshold: f64,
    pub asset_threshold: f64,
    pub summary: FinancialSummary,
}

/// Score a declaration.
///
/// Eligibility is `(income <= income threshold AND assets <= asset threshold)
/// OR claims a passporting benefit`. A passporting-benefit claimant is
/// eligible whatever their income and assets.
pub fn evaluate(declaration: &FinancialDeclaration) -> Evaluation {
    let total_income = declaration.total_income();
    let total_assets = declaration.total_assets();
    let dependent_count = declaration.dependent_count();
    let benefits = declaration.benefits();

    let income_threshold =
        BASE_INCOME_THRESHOLD + dependent_count as f64 * INCOME_THRESHOLD_PER_DEPENDENT;
    let asset_threshold =
        BASE_ASSET_THRESHOLD + dependent_count as f64 * ASSET_THRESHOLD_PER_DEPENDENT;

    let within_means = total_income <= income_threshold && total_assets <= asset_threshold;
    let passported = benefits
        .iter()
        .any(|b| PASSPORTING_BENEFITS.contains(&b.as_str()));
    let is_eligible = within_means || passported;

    let score = if is_eligible {
        let income_score = headroom_score(total_income, income_threshold);
        let asset_score = headroom_score(total_assets, asset_threshold);
        let mut score = ((income_score + asset_score) / 2.0).round() as u8;
        if !benefits.is_empty() {
            score = score.saturating_add(BENEFIT_SCORE_BOOST).min(100);
        }
        score
    } else {
        0
    };

    Evaluation {
        is_eligible,
        score,
        income_threshold,
        asset_threshold,
        summary: FinancialSummary {
            income: total_income,
            assets: total_assets,
            dependents: dependent_count,
            benefits_claimed: benefits.to_vec(),
        },
    }
}

/// How far below the threshold a value sits, as a 0-100 percentage.
fn headroom_score(value: f64, threshold: f64) -> f64 {
    (100.0 - value / threshold * 100.0).clamp(0.0, 100.0)
}
