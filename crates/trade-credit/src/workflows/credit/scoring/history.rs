use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{ContractStatus, PaymentStatus, VerificationStatus};
use super::ContractHistory;
use crate::workflows::credit::contracts::lifecycle::BALANCE_EPSILON;

/// One month of settlement activity for a retailer, keyed "YYYY-MM".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub month: String,
    pub due: f64,
    pub paid: f64,
    pub on_time: bool,
}

pub(crate) fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[derive(Default)]
struct MonthBucket {
    due: f64,
    paid: f64,
    late: bool,
}

/// Fold payment records into an ordered monthly ledger.
///
/// Rejected submissions are excluded entirely: the obligation they answered
/// is still open and will reappear under a fresh submission, so counting
/// them would double the month's dues. A month is on time when its verified
/// settlements cover the dues and none of them landed after its due date.
pub fn monthly_history(histories: &[ContractHistory]) -> Vec<MonthlyRecord> {
    let mut buckets: BTreeMap<String, MonthBucket> = BTreeMap::new();

    for history in histories {
        for payment in &history.payments {
            if payment.verification == VerificationStatus::Rejected {
                continue;
            }
            let bucket = buckets.entry(month_key(payment.due_date)).or_default();
            bucket.due += payment.amount_due;
            if payment.verification == VerificationStatus::Verified {
                bucket.paid += payment.amount_paid;
                if payment.paid_date > payment.due_date {
                    bucket.late = true;
                }
            }
        }
    }

    buckets
        .into_iter()
        .map(|(month, bucket)| MonthlyRecord {
            month,
            on_time: !bucket.late && bucket.due > 0.0 && bucket.paid + BALANCE_EPSILON >= bucket.due,
            due: bucket.due,
            paid: bucket.paid,
        })
        .collect()
}

/// Whether a contract has ever slipped: currently flagged overdue, carrying
/// an overdue-flagged payment, or settled an installment after its due date.
pub(crate) fn ever_overdue(history: &ContractHistory) -> bool {
    if history.contract.status == ContractStatus::Overdue {
        return true;
    }
    history.payments.iter().any(|payment| {
        payment.status == PaymentStatus::Overdue
            || (payment.verification == VerificationStatus::Verified
                && payment.paid_date > payment.due_date)
    })
}
