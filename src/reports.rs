// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin reports computed from the live stores.
//!
//! A report covers an inclusive range of UTC calendar days. Daily breakdowns
//! only list days that had activity.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Role;
use crate::eligibility::{EligibilityLevel, EligibilityRecord};
use crate::storage::{AuditEntry, StoredUser};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid date {0:?}; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("start date {start} is after end date {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
}

/// Inclusive range of UTC days.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportPeriod {
    /// Parse `YYYY-MM-DD` (or full RFC 3339 timestamps, keeping the date).
    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        let start_date = parse_day(start)?;
        let end_date = parse_day(end)?;
        if start_date > end_date {
            return Err(PeriodError::Reversed {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.start_date <= day && day <= self.end_date
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, PeriodError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| PeriodError::InvalidDate(raw.to_string()))
}

// ============================================================================
// Eligibility report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilitySummary {
    pub total_checks: usize,
    pub eligible_count: usize,
    pub ineligible_count: usize,
    /// Mean score of eligible checks, one decimal place.
    pub avg_eligibility_score: f64,
    pub credentials_issued: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityDay {
    pub date: NaiveDate,
    pub checks: usize,
    pub eligible: usize,
    pub ineligible: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct LevelCount {
    pub level: EligibilityLevel,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityBreakdown {
    pub by_day: Vec<EligibilityDay>,
    pub by_eligibility_level: Vec<LevelCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct EligibilityReport {
    pub title: String,
    pub period: ReportPeriod,
    pub summary: EligibilitySummary,
    pub breakdown: EligibilityBreakdown,
}

/// Summarise the checks made during `period`.
///
/// Ineligible records score 0 and therefore count towards the `low` level.
pub fn eligibility_report(records: &[EligibilityRecord], period: ReportPeriod) -> EligibilityReport {
    let in_period: Vec<&EligibilityRecord> = records
        .iter()
        .filter(|r| period.contains(r.created_at))
        .collect();

    let eligible: Vec<&EligibilityRecord> =
        in_period.iter().copied().filter(|r| r.is_eligible).collect();
    let avg_eligibility_score = if eligible.is_empty() {
        0.0
    } else {
        let sum: f64 = eligible.iter().map(|r| f64::from(r.score)).sum();
        (sum / eligible.len() as f64 * 10.0).round() / 10.0
    };

    let mut by_day: BTreeMap<NaiveDate, EligibilityDay> = BTreeMap::new();
    for record in &in_period {
        let date = record.created_at.date_naive();
        let day = by_day.entry(date).or_insert(EligibilityDay {
            date,
            checks: 0,
            eligible: 0,
            ineligible: 0,
        });
        day.checks += 1;
        if record.is_eligible {
            day.eligible += 1;
        } else {
            day.ineligible += 1;
        }
    }

    let by_eligibility_level = [
        EligibilityLevel::High,
        EligibilityLevel::Medium,
        EligibilityLevel::Low,
    ]
    .into_iter()
    .map(|level| LevelCount {
        level,
        count: in_period
            .iter()
            .filter(|r| EligibilityLevel::from_score(r.score) == level)
            .count(),
    })
    .collect();

    EligibilityReport {
        title: "Eligibility Report".to_string(),
        period,
        summary: EligibilitySummary {
            total_checks: in_period.len(),
            eligible_count: eligible.len(),
            ineligible_count: in_period.len() - eligible.len(),
            avg_eligibility_score,
            credentials_issued: in_period.iter().filter(|r| r.credential.is_some()).count(),
        },
        breakdown: EligibilityBreakdown {
            by_day: by_day.into_values().collect(),
            by_eligibility_level,
        },
    }
}

// ============================================================================
// User activity report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserActivitySummary {
    pub total_users: usize,
    /// Distinct users with at least one audit entry in the period.
    pub active_users: usize,
    /// Accounts created in the period.
    pub new_users: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserActivityDay {
    pub date: NaiveDate,
    pub active: usize,
    pub new: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RoleCount {
    pub role: Role,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserActivityBreakdown {
    pub by_day: Vec<UserActivityDay>,
    pub by_role: Vec<RoleCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserActivityReport {
    pub title: String,
    pub period: ReportPeriod,
    pub summary: UserActivitySummary,
    pub breakdown: UserActivityBreakdown,
}

/// Summarise account creation and audited activity during `period`.
pub fn user_activity_report(
    users: &[StoredUser],
    audit: &[AuditEntry],
    period: ReportPeriod,
) -> UserActivityReport {
    let mut active_by_day: BTreeMap<NaiveDate, BTreeSet<&str>> = BTreeMap::new();
    let mut active: BTreeSet<&str> = BTreeSet::new();
    for entry in audit.iter().filter(|e| period.contains(e.timestamp)) {
        active.insert(&entry.user_id);
        active_by_day
            .entry(entry.timestamp.date_naive())
            .or_default()
            .insert(&entry.user_id);
    }

    let mut new_by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for user in users.iter().filter(|u| period.contains(u.created_at)) {
        *new_by_day.entry(user.created_at.date_naive()).or_default() += 1;
    }

    let days: BTreeSet<NaiveDate> = active_by_day.keys().chain(new_by_day.keys()).copied().collect();
    let by_day = days
        .into_iter()
        .map(|date| UserActivityDay {
            date,
            active: active_by_day.get(&date).map(BTreeSet::len).unwrap_or(0),
            new: new_by_day.get(&date).copied().unwrap_or(0),
        })
        .collect();

    let by_role = Role::ALL
        .iter()
        .map(|role| RoleCount {
            role: *role,
            count: users.iter().filter(|u| u.role == *role).count(),
        })
        .collect();

    UserActivityReport {
        title: "User Activity Report".to_string(),
        period,
        summary: UserActivitySummary {
            total_users: users.len(),
            active_users: active.len(),
            new_users: new_by_day.values().sum(),
        },
        breakdown: UserActivityBreakdown { by_day, by_role },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eligibility::{CredentialRef, FinancialDeclaration};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn period(start: &str, end: &str) -> ReportPeriod {
        ReportPeriod::parse(start, end).unwrap()
    }

    fn record(value: serde_json::Value, created: DateTime<Utc>) -> EligibilityRecord {
        let declaration: FinancialDeclaration = serde_json::from_value(value).unwrap();
        EligibilityRecord::evaluate(&declaration, "did:web:a", "N", created)
    }

    #[test]
    fn period_parsing() {
        let p = period("2026-06-15", "2026-06-17");
        assert!(p.contains(at(2026, 6, 15)));
        assert!(p.contains(at(2026, 6, 17)));
        assert!(!p.contains(at(2026, 6, 18)));

        let rfc = period("2026-06-15T00:00:00Z", "2026-06-17T23:59:59+00:00");
        assert_eq!(rfc, p);

        assert_eq!(
            ReportPeriod::parse("yesterday", "2026-06-17"),
            Err(PeriodError::InvalidDate("yesterday".into()))
        );
        assert!(matches!(
            ReportPeriod::parse("2026-06-18", "2026-06-17"),
            Err(PeriodError::Reversed { .. })
        ));
    }

    #[test]
    fn eligibility_report_counts_records_in_period() {
        let mut issued = record(json!({}), at(2026, 6, 15));
        issued.credential = Some(CredentialRef {
            id: "c".into(),
            issued_at: at(2026, 6, 15),
        });
        let records = vec![
            issued,                                                           // 100, high
            record(json!({"income": {"annual": 10000}, "assets": {"savings": 1000}}), at(2026, 6, 16)), // 60, medium
            record(json!({"income": {"annual": 90000}}), at(2026, 6, 16)),    // ineligible, low
            record(json!({}), at(2026, 7, 1)),                                // outside
        ];

        let report = eligibility_report(&records, period("2026-06-15", "2026-06-17"));
        assert_eq!(report.summary.total_checks, 3);
        assert_eq!(report.summary.eligible_count, 2);
        assert_eq!(report.summary.ineligible_count, 1);
        assert_eq!(report.summary.avg_eligibility_score, 80.0);
        assert_eq!(report.summary.credentials_issued, 1);

        assert_eq!(report.breakdown.by_day.len(), 2);
        assert_eq!(report.breakdown.by_day[1].checks, 2);
        assert_eq!(report.breakdown.by_day[1].ineligible, 1);

        let counts: Vec<usize> = report
            .breakdown
            .by_eligibility_level
            .iter()
            .map(|l| l.count)
            .collect();
        assert_eq!(counts, vec![1, 1, 1]);
    }

    #[test]
    fn empty_period_has_zero_average() {
        let report = eligibility_report(&[], period("2026-01-01", "2026-01-31"));
        assert_eq!(report.summary.total_checks, 0);
        assert_eq!(report.summary.avg_eligibility_score, 0.0);
        assert!(report.breakdown.by_day.is_empty());
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = eligibility_report(&[], period("2026-01-01", "2026-01-31"));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["period"]["startDate"], "2026-01-01");
        assert!(value["summary"].get("avgEligibilityScore").is_some());
        assert_eq!(value["breakdown"]["byEligibilityLevel"][0]["level"], "high");
    }

    fn stored(id: &str, role: Role, created_at: DateTime<Utc>) -> StoredUser {
        StoredUser {
            id: id.into(),
            username: format!("u{id}"),
            password_hash: String::new(),
            role,
            did: None,
            profile: Default::default(),
            created_at,
        }
    }

    fn entry(user_id: &str, timestamp: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            id: 1,
            timestamp,
            user_id: user_id.into(),
            username: None,
            action: "eligibility-check".into(),
            details: json!({}),
            ip_address: None,
        }
    }

    #[test]
    fn user_report_combines_accounts_and_audit() {
        let users = vec![
            stored("1", Role::Admin, at(2026, 1, 1)),
            stored("2", Role::Citizen, at(2026, 6, 15)),
            stored("3", Role::Citizen, at(2026, 6, 16)),
        ];
        let audit = vec![
            entry("2", at(2026, 6, 15)),
            entry("2", at(2026, 6, 15) + Duration::hours(1)),
            entry("3", at(2026, 6, 16)),
            entry("1", at(2026, 5, 1)),
        ];

        let report = user_activity_report(&users, &audit, period("2026-06-15", "2026-06-17"));
        assert_eq!(report.summary.total_users, 3);
        assert_eq!(report.summary.active_users, 2);
        assert_eq!(report.summary.new_users, 2);

        assert_eq!(
            report.breakdown.by_day,
            vec![
                UserActivityDay { date: at(2026, 6, 15).date_naive(), active: 1, new: 1 },
                UserActivityDay { date: at(2026, 6, 16).date_naive(), active: 1, new: 1 },
            ]
        );

        let citizens = report
            .breakdown
            .by_role
            .iter()
            .find(|r| r.role == Role::Citizen)
            .unwrap();
        assert_eq!(citizens.count, 2);
    }
}
