use serde::{Deserialize, Serialize};

use super::super::domain::ContractStatus;
use super::history::{ever_overdue, MonthlyRecord};
use super::ContractHistory;
use crate::workflows::credit::domain::VerificationStatus;

/// Letter grade summarizing a retailer's payment reliability, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CreditRating {
    A,
    B,
    C,
    D,
    E,
}

impl CreditRating {
    pub const fn label(self) -> &'static str {
        match self {
            CreditRating::A => "A",
            CreditRating::B => "B",
            CreditRating::C => "C",
            CreditRating::D => "D",
            CreditRating::E => "E",
        }
    }

    /// Fixed best-to-worst iteration order, used for deterministic mode
    /// resolution during aggregation.
    pub const ALL: [CreditRating; 5] = [
        CreditRating::A,
        CreditRating::B,
        CreditRating::C,
        CreditRating::D,
        CreditRating::E,
    ];
}

impl std::fmt::Display for CreditRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Qualitative label derived one-to-one from the letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub const fn from_rating(rating: CreditRating) -> Self {
        match rating {
            CreditRating::A => RiskLevel::VeryLow,
            CreditRating::B => RiskLevel::Low,
            CreditRating::C => RiskLevel::Medium,
            CreditRating::D => RiskLevel::High,
            CreditRating::E => RiskLevel::VeryHigh,
        }
    }

    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::VeryLow,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::VeryHigh,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::VeryLow => "very-low",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::VeryHigh => "very-high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Proportion-weighted on-time measure over the monthly ledger: each month
/// with dues contributes `paid/due` capped at 100%, averaged across those
/// months. Months without dues are excluded; a ledger with no scoreable
/// months contributes nothing.
pub fn payment_score(ledger: &[MonthlyRecord]) -> f64 {
    let scored: Vec<f64> = ledger
        .iter()
        .filter(|record| record.due > 0.0)
        .map(|record| (record.paid / record.due).min(1.0) * 100.0)
        .collect();
    if scored.is_empty() {
        return 0.0;
    }
    scored.iter().sum::<f64>() / scored.len() as f64
}

/// Share of contracts that completed without ever slipping, among contracts
/// that reached a decided state or slipped at least once. With no such
/// contracts yet there are no observed failures and the rate is 100.
pub fn contract_success_rate(histories: &[ContractHistory]) -> f64 {
    let mut denominator = 0u32;
    let mut numerator = 0u32;
    for history in histories {
        let slipped = ever_overdue(history);
        let decided = matches!(
            history.contract.status,
            ContractStatus::Completed | ContractStatus::Rejected
        );
        if decided || slipped {
            denominator += 1;
        }
        if history.contract.status == ContractStatus::Completed && !slipped {
            numerator += 1;
        }
    }
    if denominator == 0 {
        return 100.0;
    }
    f64::from(numerator) / f64::from(denominator) * 100.0
}

/// Mean settlement delay in days across verified payments. On-time and
/// early settlements count as zero delay, never negative.
pub fn average_delay(histories: &[ContractHistory]) -> f64 {
    let delays: Vec<f64> = histories
        .iter()
        .flat_map(|history| &history.payments)
        .filter(|payment| payment.verification == VerificationStatus::Verified)
        .map(|payment| (payment.paid_date - payment.due_date).num_days().max(0) as f64)
        .collect();
    if delays.is_empty() {
        return 0.0;
    }
    delays.iter().sum::<f64>() / delays.len() as f64
}

/// Banded contribution of settlement delay, 20 points at best.
pub fn delay_points(average_delay_days: f64) -> f64 {
    if average_delay_days <= 0.0 {
        20.0
    } else if average_delay_days <= 5.0 {
        15.0
    } else if average_delay_days <= 15.0 {
        10.0
    } else if average_delay_days <= 30.0 {
        5.0
    } else {
        0.0
    }
}

/// Banded contribution of total commitments, 10 points at best.
pub fn commitment_points(total_commitments: f64) -> f64 {
    if total_commitments >= 500_000.0 {
        10.0
    } else if total_commitments >= 200_000.0 {
        8.0
    } else if total_commitments >= 100_000.0 {
        6.0
    } else if total_commitments >= 50_000.0 {
        4.0
    } else {
        2.0
    }
}

/// Weighted composite out of 100: 40 points from the payment score, 30 from
/// the contract success rate, plus the delay and commitment bands.
pub fn composite_score(
    payment_score: f64,
    contract_success_rate: f64,
    average_delay_days: f64,
    total_commitments: f64,
) -> f64 {
    40.0 * (payment_score / 100.0)
        + 30.0 * (contract_success_rate / 100.0)
        + delay_points(average_delay_days)
        + commitment_points(total_commitments)
}

pub fn rating_for(score: f64) -> CreditRating {
    if score >= 85.0 {
        CreditRating::A
    } else if score >= 70.0 {
        CreditRating::B
    } else if score >= 55.0 {
        CreditRating::C
    } else if score >= 40.0 {
        CreditRating::D
    } else {
        CreditRating::E
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_score_caps_overperforming_months() {
        let ledger = vec![
            MonthlyRecord {
                month: "2026-01".to_string(),
                due: 10000.0,
                paid: 12000.0,
                on_time: true,
            },
            MonthlyRecord {
                month: "2026-02".to_string(),
                due: 10000.0,
                paid: 5000.0,
                on_time: false,
            },
        ];
        assert_eq!(payment_score(&ledger), 75.0);
    }

    #[test]
    fn payment_score_skips_months_without_dues() {
        let ledger = vec![
            MonthlyRecord {
                month: "2026-01".to_string(),
                due: 0.0,
                paid: 0.0,
                on_time: false,
            },
            MonthlyRecord {
                month: "2026-02".to_string(),
                due: 10000.0,
                paid: 10000.0,
                on_time: true,
            },
        ];
        assert_eq!(payment_score(&ledger), 100.0);
    }

    #[test]
    fn boundary_scenario_scores_exactly_b() {
        // 40 x 0.85 + 30 x 0.90 + 15 + 6 = 82, one point short of A's 85.
        let score = composite_score(85.0, 90.0, 3.0, 250_000.0);
        assert_eq!(score, 82.0);
        assert_eq!(rating_for(score), CreditRating::B);
    }

    #[test]
    fn rating_thresholds_are_inclusive() {
        assert_eq!(rating_for(85.0), CreditRating::A);
        assert_eq!(rating_for(84.999), CreditRating::B);
        assert_eq!(rating_for(70.0), CreditRating::B);
        assert_eq!(rating_for(55.0), CreditRating::C);
        assert_eq!(rating_for(40.0), CreditRating::D);
        assert_eq!(rating_for(39.999), CreditRating::E);
    }

    #[test]
    fn delay_bands_step_down() {
        assert_eq!(delay_points(0.0), 20.0);
        assert_eq!(delay_points(5.0), 15.0);
        assert_eq!(delay_points(15.0), 10.0);
        assert_eq!(delay_points(30.0), 5.0);
        assert_eq!(delay_points(31.0), 0.0);
    }

    #[test]
    fn commitment_bands_step_up() {
        assert_eq!(commitment_points(10_000.0), 2.0);
        assert_eq!(commitment_points(50_000.0), 4.0);
        assert_eq!(commitment_points(100_000.0), 6.0);
        assert_eq!(commitment_points(200_000.0), 8.0);
        assert_eq!(commitment_points(500_000.0), 10.0);
    }

    #[test]
    fn composite_is_monotone_in_its_inputs() {
        let base = composite_score(60.0, 60.0, 10.0, 100_000.0);
        assert!(composite_score(80.0, 60.0, 10.0, 100_000.0) >= base);
        assert!(composite_score(60.0, 90.0, 10.0, 100_000.0) >= base);
        assert!(composite_score(60.0, 60.0, 40.0, 100_000.0) <= base);
    }

    #[test]
    fn risk_level_tracks_rating() {
        assert_eq!(RiskLevel::from_rating(CreditRating::A), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_rating(CreditRating::C), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_rating(CreditRating::E), RiskLevel::VeryHigh);
    }
}
