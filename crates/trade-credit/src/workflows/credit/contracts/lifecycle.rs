use chrono::{Duration, NaiveDate};

use super::super::domain::{
    Contract, ContractDecision, ContractId, ContractStatus, Payment, PaymentTerms, UserId,
};
use super::accounting;

/// Tolerance for balance comparisons. Installments are kept as unrounded
/// quotients, so equality checks must absorb accumulated float error.
pub const BALANCE_EPSILON: f64 = 1e-6;

/// Rejected creation input, one variant per violated constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("contract amount must be positive, got {0}")]
    NonPositiveAmount(f64),
    #[error("contract requires at least one installment")]
    NoInstallments,
    #[error("unsupported payment terms: {0} days")]
    UnsupportedTerms(u16),
    #[error("contract requires both a supplier and a retailer")]
    MissingParty,
}

/// State machine guard violations, kept distinct from validation failures so
/// callers can explain *why* an action was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LifecycleError {
    #[error("cannot {event} a {from} contract")]
    InvalidTransition {
        from: ContractStatus,
        event: &'static str,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Creation input as submitted by the retailer. Payment terms arrive as a
/// raw day count and are validated against the issued terms.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewContract {
    pub supplier_id: UserId,
    pub retailer_id: UserId,
    pub amount: f64,
    pub number_of_payments: u32,
    pub payment_terms_days: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Result of advancing a contract on a verified payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Verified balance now covers the contract amount.
    Completed,
    /// Another installment is expected on the returned date.
    Advanced { next_due: NaiveDate },
}

/// Validate retailer input and build a `Pending` contract with no due date.
pub fn new_contract(id: ContractId, input: NewContract) -> Result<Contract, ValidationError> {
    if input.supplier_id.0.trim().is_empty() || input.retailer_id.0.trim().is_empty() {
        return Err(ValidationError::MissingParty);
    }
    if input.amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount(input.amount));
    }
    if input.number_of_payments < 1 {
        return Err(ValidationError::NoInstallments);
    }
    let payment_terms = PaymentTerms::from_days(input.payment_terms_days)
        .ok_or(ValidationError::UnsupportedTerms(input.payment_terms_days))?;

    Ok(Contract {
        id,
        supplier_id: input.supplier_id,
        retailer_id: input.retailer_id,
        amount: input.amount,
        number_of_payments: input.number_of_payments,
        payment_terms,
        status: ContractStatus::Pending,
        description: input.description,
        start_date: input.start_date,
        end_date: input.end_date,
        due_date: None,
        paid_date: None,
    })
}

/// Apply the supplier's verdict. Only `Pending` contracts can be decided;
/// approval makes the first installment eligible immediately (`due_date =
/// today`), rejection is terminal.
pub fn decide(
    contract: &mut Contract,
    decision: ContractDecision,
    today: NaiveDate,
) -> Result<(), LifecycleError> {
    if contract.status != ContractStatus::Pending {
        return Err(LifecycleError::InvalidTransition {
            from: contract.status,
            event: "decide",
        });
    }

    match decision {
        ContractDecision::Approve => {
            contract.status = ContractStatus::Active;
            contract.due_date = Some(today);
        }
        ContractDecision::Reject => {
            contract.status = ContractStatus::Rejected;
        }
    }
    Ok(())
}

/// Guard shared by payment submission and verification: only running
/// contracts accept settlement events.
pub fn ensure_accepts_payments(
    contract: &Contract,
    event: &'static str,
) -> Result<(), LifecycleError> {
    match contract.status {
        ContractStatus::Active | ContractStatus::Overdue => Ok(()),
        from => Err(LifecycleError::InvalidTransition { from, event }),
    }
}

/// Advance the contract after a payment's verification flipped to verified.
///
/// The paid balance is recomputed from the distinct verified payment records
/// in `payments`, never from a counter, so replaying the same verification
/// event cannot double-count. Completion is balance-driven: once verified
/// settlements cover the contract amount the contract is `Completed` and the
/// due date stops advancing. Otherwise the due date moves forward by the
/// payment terms, and the contract returns to `Active` only when the
/// advanced date is not already in the past.
pub fn advance_on_verified_payment(
    contract: &mut Contract,
    payments: &[Payment],
    today: NaiveDate,
) -> Result<AdvanceOutcome, LifecycleError> {
    ensure_accepts_payments(contract, "advance")?;

    if accounting::remaining(contract, payments) <= BALANCE_EPSILON {
        contract.status = ContractStatus::Completed;
        contract.paid_date = Some(today);
        return Ok(AdvanceOutcome::Completed);
    }

    let previous_due = contract.due_date.unwrap_or(today);
    let next_due = previous_due + Duration::days(contract.payment_terms.days());
    contract.due_date = Some(next_due);
    contract.status = if next_due >= today {
        ContractStatus::Active
    } else {
        ContractStatus::Overdue
    };
    Ok(AdvanceOutcome::Advanced { next_due })
}

/// Pure overdue predicate: a running contract whose due date has passed.
pub fn is_overdue(contract: &Contract, as_of: NaiveDate) -> bool {
    match contract.status {
        ContractStatus::Overdue => true,
        ContractStatus::Active => contract
            .due_date
            .map(|due| due < as_of)
            .unwrap_or(false),
        _ => false,
    }
}

/// Status as a reader should see it on `as_of`, folding in the lazy overdue
/// check without mutating the record.
pub fn effective_status(contract: &Contract, as_of: NaiveDate) -> ContractStatus {
    if contract.status == ContractStatus::Active && is_overdue(contract, as_of) {
        ContractStatus::Overdue
    } else {
        contract.status
    }
}
