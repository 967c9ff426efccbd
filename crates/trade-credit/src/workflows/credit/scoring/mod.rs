//! Credit scoring over immutable contract/payment snapshots.
//!
//! Everything here is pure recomputation: `CreditInfo` is a read model and
//! never a source of truth for balances.

mod aggregate;
mod history;
mod rating;

pub use history::MonthlyRecord;
pub use rating::{CreditRating, RiskLevel};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contracts::{accounting, lifecycle};
use super::domain::{Contract, ContractStatus, Payment, UserId, VerificationStatus};

/// A contract and its full payment trail, the scoring engine's only input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractHistory {
    pub contract: Contract,
    pub payments: Vec<Payment>,
}

/// Derived credit profile for a retailer, either scoped to one supplier or
/// aggregated across all of them (`supplier_id: None`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditInfo {
    pub retailer_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<UserId>,
    pub total_contracts: u32,
    pub active_contracts: u32,
    pub total_commitments: f64,
    pub paid_amount: f64,
    pub overdue_amount: f64,
    pub payment_score: f64,
    pub average_delay_days: f64,
    pub contract_success_rate: f64,
    pub credit_rating: CreditRating,
    pub risk_level: RiskLevel,
    pub monthly_history: Vec<MonthlyRecord>,
}

/// Scoring result. Absent history is reported explicitly, never as an error
/// and never conflated with a bottom-of-scale rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "assessment", rename_all = "snake_case")]
pub enum CreditAssessment {
    Unrated { retailer_id: UserId },
    Rated(CreditInfo),
}

impl CreditAssessment {
    pub fn rated(&self) -> Option<&CreditInfo> {
        match self {
            CreditAssessment::Rated(info) => Some(info),
            CreditAssessment::Unrated { .. } => None,
        }
    }
}

/// Stateless evaluator recomputing a retailer's credit profile on read.
#[derive(Debug, Default, Clone)]
pub struct CreditScoringEngine;

impl CreditScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score one (retailer, supplier) pair from its contract histories.
    pub fn assess_pair(
        &self,
        retailer: &UserId,
        supplier: &UserId,
        histories: &[ContractHistory],
        as_of: NaiveDate,
    ) -> CreditAssessment {
        match self.build_info(retailer, Some(supplier.clone()), histories, as_of) {
            Some(info) => CreditAssessment::Rated(info),
            None => CreditAssessment::Unrated {
                retailer_id: retailer.clone(),
            },
        }
    }

    /// Cross-supplier view for the same retailer: score each supplier's
    /// slice independently, then merge the rated rows field by field.
    pub fn assess_aggregate(
        &self,
        retailer: &UserId,
        histories_by_supplier: &[(UserId, Vec<ContractHistory>)],
        as_of: NaiveDate,
    ) -> CreditAssessment {
        let rows: Vec<CreditInfo> = histories_by_supplier
            .iter()
            .filter_map(|(supplier, histories)| {
                self.build_info(retailer, Some(supplier.clone()), histories, as_of)
            })
            .collect();

        match aggregate::merge(retailer, rows) {
            Some(info) => CreditAssessment::Rated(info),
            None => CreditAssessment::Unrated {
                retailer_id: retailer.clone(),
            },
        }
    }

    /// `None` means unrated: no history at all, or nothing scoreable yet
    /// (no verified payments and no decided contracts).
    fn build_info(
        &self,
        retailer: &UserId,
        supplier: Option<UserId>,
        histories: &[ContractHistory],
        as_of: NaiveDate,
    ) -> Option<CreditInfo> {
        if histories.is_empty() {
            return None;
        }

        let has_verified_payment = histories.iter().any(|history| {
            history
                .payments
                .iter()
                .any(|payment| payment.verification == VerificationStatus::Verified)
        });
        let has_decided_contract = histories
            .iter()
            .any(|history| history.contract.status.is_terminal());
        if !has_verified_payment && !has_decided_contract {
            return None;
        }

        let monthly = history::monthly_history(histories);
        let payment_score = rating::payment_score(&monthly);
        let success_rate = rating::contract_success_rate(histories);
        let average_delay = rating::average_delay(histories);

        let mut total_commitments = 0.0;
        let mut paid_amount = 0.0;
        let mut overdue_amount = 0.0;
        let mut active_contracts = 0u32;
        for history in histories {
            if history.contract.status != ContractStatus::Rejected {
                total_commitments += history.contract.amount;
            }
            paid_amount += accounting::paid_so_far(&history.payments);
            match lifecycle::effective_status(&history.contract, as_of) {
                ContractStatus::Active => active_contracts += 1,
                ContractStatus::Overdue => {
                    active_contracts += 1;
                    overdue_amount += accounting::remaining(&history.contract, &history.payments);
                }
                _ => {}
            }
        }

        let score =
            rating::composite_score(payment_score, success_rate, average_delay, total_commitments);
        let credit_rating = rating::rating_for(score);

        Some(CreditInfo {
            retailer_id: retailer.clone(),
            supplier_id: supplier,
            total_contracts: histories.len() as u32,
            active_contracts,
            total_commitments,
            paid_amount,
            overdue_amount,
            payment_score,
            average_delay_days: average_delay,
            contract_success_rate: success_rate,
            credit_rating,
            risk_level: RiskLevel::from_rating(credit_rating),
            monthly_history: monthly,
        })
    }
}
