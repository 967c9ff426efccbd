use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{
    Contract, Payment, PaymentId, PaymentMethod, PaymentStatus, VerificationDecision,
    VerificationStatus,
};
use super::lifecycle::BALANCE_EPSILON;

/// Rejected settlement input or verification guard violation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AccountingError {
    #[error("payment of {requested:.2} exceeds the available balance of {available:.2}")]
    Overpayment { requested: f64, available: f64 },
    #[error("payment amount must be positive, got {0}")]
    NonPositiveAmount(f64),
    #[error("custom payments require an amount")]
    MissingCustomAmount,
    #[error("payment verification already {0}")]
    AlreadyDecided(VerificationStatus),
}

/// How the retailer sized the settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountType {
    Installment,
    Custom,
}

/// Retailer submission for one settlement event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub amount_type: AmountType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_amount: Option<f64>,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Unrounded per-installment quotient. Rounding is left to presentation so
/// summing N installments reproduces the contract amount exactly.
pub fn installment_amount(contract: &Contract) -> f64 {
    contract.amount / contract.number_of_payments as f64
}

/// Verified settlements only; pending and rejected payments never count
/// toward the balance.
pub fn paid_so_far(payments: &[Payment]) -> f64 {
    payments
        .iter()
        .filter(|payment| payment.verification == VerificationStatus::Verified)
        .map(|payment| payment.amount_paid)
        .sum()
}

/// Amounts already committed against the contract: verified settlements plus
/// submissions still awaiting verification. A rejected payment releases its
/// reservation. This is the figure overpayment checks run against, so a
/// sequence of not-yet-verified submissions can never exceed the contract.
pub fn open_exposure(payments: &[Payment]) -> f64 {
    payments
        .iter()
        .filter(|payment| payment.verification != VerificationStatus::Rejected)
        .map(|payment| payment.amount_paid)
        .sum()
}

pub fn remaining(contract: &Contract, payments: &[Payment]) -> f64 {
    contract.amount - paid_so_far(payments)
}

/// Installments still owed, `ceil(remaining / installment)` clamped to zero
/// once the balance is settled.
pub fn remaining_installments(contract: &Contract, payments: &[Payment]) -> u32 {
    let remaining = remaining(contract, payments);
    if remaining <= BALANCE_EPSILON {
        return 0;
    }
    (remaining / installment_amount(contract)).ceil() as u32
}

/// Build one settlement event from the retailer's submission.
///
/// The amount is the installment quotient for `Installment` requests and the
/// caller-supplied figure for `Custom` ones; either way it must fit inside
/// the exposure-adjusted balance or the payment is rejected before anything
/// is persisted. Verification always starts `Pending`.
pub fn record_payment(
    id: PaymentId,
    contract: &Contract,
    payments: &[Payment],
    request: &PaymentRequest,
    today: NaiveDate,
) -> Result<Payment, AccountingError> {
    let installment = installment_amount(contract);
    let amount_paid = match request.amount_type {
        AmountType::Installment => installment,
        AmountType::Custom => request
            .custom_amount
            .ok_or(AccountingError::MissingCustomAmount)?,
    };

    if amount_paid <= 0.0 {
        return Err(AccountingError::NonPositiveAmount(amount_paid));
    }

    let available = contract.amount - open_exposure(payments);
    if amount_paid > available + BALANCE_EPSILON {
        return Err(AccountingError::Overpayment {
            requested: amount_paid,
            available: available.max(0.0),
        });
    }

    Ok(Payment {
        id,
        contract_id: contract.id.clone(),
        amount_due: installment,
        amount_paid,
        due_date: contract.due_date.unwrap_or(today),
        paid_date: today,
        status: classify(amount_paid, installment),
        method: request.method,
        verification: VerificationStatus::Pending,
        notes: request.notes.clone(),
    })
}

/// Settlement classification against the installment amount.
pub fn classify(amount_paid: f64, installment: f64) -> PaymentStatus {
    if amount_paid + BALANCE_EPSILON >= installment {
        PaymentStatus::Paid
    } else if amount_paid > 0.0 {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Due
    }
}

/// Apply the supplier's verdict to a pending payment.
///
/// A verified payment is marked `Paid`, unless the contract stood overdue at
/// verification time, in which case the overdue flag is mirrored onto the
/// payment record for reporting. Rejection only flips the verification
/// state; the retailer must resubmit.
pub fn verify_payment(
    payment: &mut Payment,
    decision: VerificationDecision,
    contract_overdue: bool,
) -> Result<(), AccountingError> {
    if payment.verification != VerificationStatus::Pending {
        return Err(AccountingError::AlreadyDecided(payment.verification));
    }

    match decision {
        VerificationDecision::Verify => {
            payment.verification = VerificationStatus::Verified;
            payment.status = if contract_overdue {
                PaymentStatus::Overdue
            } else {
                PaymentStatus::Paid
            };
        }
        VerificationDecision::Reject => {
            payment.verification = VerificationStatus::Rejected;
        }
    }
    Ok(())
}
