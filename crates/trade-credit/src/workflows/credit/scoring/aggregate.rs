//! Cross-supplier aggregation for a retailer's credit profile.
//!
//! The merge is an explicit fold over the enumerated `CreditInfo` fields:
//! numeric fields average across supplier rows, the rating and risk labels
//! resolve by mode, and monthly ledgers merge month by month. No field is
//! merged by reflection or key iteration.

use std::collections::BTreeMap;

use super::history::MonthlyRecord;
use super::rating::{CreditRating, RiskLevel};
use super::CreditInfo;
use crate::workflows::credit::domain::UserId;

/// Merge per-supplier rows into one aggregate row. Empty input means the
/// retailer is unrated. A single row passes through with the supplier scope
/// cleared.
pub(crate) fn merge(retailer: &UserId, rows: Vec<CreditInfo>) -> Option<CreditInfo> {
    if rows.is_empty() {
        return None;
    }

    let count = rows.len() as f64;
    let credit_rating = rating_mode(&rows);
    let risk_level = risk_mode(&rows);

    Some(CreditInfo {
        retailer_id: retailer.clone(),
        supplier_id: None,
        total_contracts: average_count(rows.iter().map(|row| row.total_contracts)),
        active_contracts: average_count(rows.iter().map(|row| row.active_contracts)),
        total_commitments: rows.iter().map(|row| row.total_commitments).sum::<f64>() / count,
        paid_amount: rows.iter().map(|row| row.paid_amount).sum::<f64>() / count,
        overdue_amount: rows.iter().map(|row| row.overdue_amount).sum::<f64>() / count,
        payment_score: rows.iter().map(|row| row.payment_score).sum::<f64>() / count,
        average_delay_days: rows.iter().map(|row| row.average_delay_days).sum::<f64>() / count,
        contract_success_rate: rows
            .iter()
            .map(|row| row.contract_success_rate)
            .sum::<f64>()
            / count,
        credit_rating,
        risk_level,
        monthly_history: merge_monthly(&rows),
    })
}

fn average_count(values: impl Iterator<Item = u32>) -> u32 {
    let collected: Vec<u32> = values.collect();
    if collected.is_empty() {
        return 0;
    }
    let sum: f64 = collected.iter().map(|value| f64::from(*value)).sum();
    (sum / collected.len() as f64).round() as u32
}

/// Most frequent rating across rows. Ties resolve to the alphabetically
/// first letter, which is also the better grade, so the result never
/// depends on row order.
fn rating_mode(rows: &[CreditInfo]) -> CreditRating {
    let mut best = CreditRating::E;
    let mut best_count = 0usize;
    for candidate in CreditRating::ALL {
        let count = rows
            .iter()
            .filter(|row| row.credit_rating == candidate)
            .count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

fn risk_mode(rows: &[CreditInfo]) -> RiskLevel {
    let mut best = RiskLevel::VeryHigh;
    let mut best_count = 0usize;
    for candidate in RiskLevel::ALL {
        let count = rows
            .iter()
            .filter(|row| row.risk_level == candidate)
            .count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

#[derive(Default)]
struct MonthAccumulator {
    due: f64,
    paid: f64,
    on_time_votes: usize,
    contributors: usize,
}

/// Merge monthly ledgers by month key: dues and settlements average across
/// the suppliers contributing to that month, and the month counts as on
/// time only when a strict majority of contributors reported it on time.
fn merge_monthly(rows: &[CreditInfo]) -> Vec<MonthlyRecord> {
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();
    for row in rows {
        for record in &row.monthly_history {
            let slot = months.entry(record.month.clone()).or_default();
            slot.due += record.due;
            slot.paid += record.paid;
            slot.contributors += 1;
            if record.on_time {
                slot.on_time_votes += 1;
            }
        }
    }

    months
        .into_iter()
        .map(|(month, slot)| MonthlyRecord {
            month,
            due: slot.due / slot.contributors as f64,
            paid: slot.paid / slot.contributors as f64,
            on_time: slot.on_time_votes * 2 > slot.contributors,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(supplier: &str, rating: CreditRating, payment_score: f64) -> CreditInfo {
        CreditInfo {
            retailer_id: UserId("ret-1".to_string()),
            supplier_id: Some(UserId(supplier.to_string())),
            total_contracts: 4,
            active_contracts: 2,
            total_commitments: 100_000.0,
            paid_amount: 40_000.0,
            overdue_amount: 0.0,
            payment_score,
            average_delay_days: 2.0,
            contract_success_rate: 80.0,
            credit_rating: rating,
            risk_level: RiskLevel::from_rating(rating),
            monthly_history: vec![MonthlyRecord {
                month: "2026-01".to_string(),
                due: 10_000.0,
                paid: 10_000.0,
                on_time: rating == CreditRating::A,
            }],
        }
    }

    #[test]
    fn empty_input_is_unrated() {
        assert!(merge(&UserId("ret-1".to_string()), Vec::new()).is_none());
    }

    #[test]
    fn numeric_fields_average_across_suppliers() {
        let merged = merge(
            &UserId("ret-1".to_string()),
            vec![
                row("sup-1", CreditRating::A, 90.0),
                row("sup-2", CreditRating::A, 70.0),
            ],
        )
        .expect("rows present");

        assert_eq!(merged.payment_score, 80.0);
        assert_eq!(merged.total_contracts, 4);
        assert!(merged.supplier_id.is_none());
    }

    #[test]
    fn rating_mode_breaks_ties_toward_the_better_letter() {
        let merged = merge(
            &UserId("ret-1".to_string()),
            vec![
                row("sup-1", CreditRating::B, 75.0),
                row("sup-2", CreditRating::D, 45.0),
            ],
        )
        .expect("rows present");

        assert_eq!(merged.credit_rating, CreditRating::B);
        assert_eq!(merged.risk_level, RiskLevel::Low);
    }

    #[test]
    fn rating_mode_prefers_the_majority() {
        let merged = merge(
            &UserId("ret-1".to_string()),
            vec![
                row("sup-1", CreditRating::C, 60.0),
                row("sup-2", CreditRating::C, 62.0),
                row("sup-3", CreditRating::A, 95.0),
            ],
        )
        .expect("rows present");

        assert_eq!(merged.credit_rating, CreditRating::C);
    }

    #[test]
    fn monthly_merge_requires_a_strict_majority_for_on_time() {
        let merged = merge(
            &UserId("ret-1".to_string()),
            vec![
                row("sup-1", CreditRating::A, 90.0),
                row("sup-2", CreditRating::B, 80.0),
            ],
        )
        .expect("rows present");

        // One on-time vote out of two contributors is not a majority.
        assert_eq!(merged.monthly_history.len(), 1);
        assert!(!merged.monthly_history[0].on_time);
        assert_eq!(merged.monthly_history[0].due, 10_000.0);
    }
}
