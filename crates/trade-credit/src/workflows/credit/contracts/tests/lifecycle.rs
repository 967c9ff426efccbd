use super::common::*;
use crate::workflows::credit::contracts::lifecycle::{
    self, AdvanceOutcome, LifecycleError, ValidationError,
};
use crate::workflows::credit::domain::{
    Contract, ContractDecision, ContractId, ContractStatus, Payment, PaymentId, PaymentMethod,
    PaymentStatus, UserId, VerificationStatus,
};
use chrono::Duration;

fn pending_contract(amount: f64, installments: u32, terms_days: u16) -> Contract {
    lifecycle::new_contract(
        ContractId("ctr-test".to_string()),
        contract_input(amount, installments, terms_days),
    )
    .expect("valid input")
}

fn verified_payment(id: &str, contract: &Contract, amount: f64) -> Payment {
    Payment {
        id: PaymentId(id.to_string()),
        contract_id: contract.id.clone(),
        amount_due: contract.amount / contract.number_of_payments as f64,
        amount_paid: amount,
        due_date: contract.due_date.expect("active contract has a due date"),
        paid_date: contract.due_date.expect("active contract has a due date"),
        status: PaymentStatus::Paid,
        method: PaymentMethod::BankTransfer,
        verification: VerificationStatus::Verified,
        notes: None,
    }
}

#[test]
fn creation_rejects_out_of_range_input() {
    let zero_amount = lifecycle::new_contract(
        ContractId("ctr-a".to_string()),
        contract_input(0.0, 6, 30),
    );
    assert!(matches!(
        zero_amount,
        Err(ValidationError::NonPositiveAmount(_))
    ));

    let no_installments = lifecycle::new_contract(
        ContractId("ctr-b".to_string()),
        contract_input(1000.0, 0, 30),
    );
    assert!(matches!(no_installments, Err(ValidationError::NoInstallments)));

    let odd_terms = lifecycle::new_contract(
        ContractId("ctr-c".to_string()),
        contract_input(1000.0, 2, 20),
    );
    assert!(matches!(
        odd_terms,
        Err(ValidationError::UnsupportedTerms(20))
    ));

    let mut missing_party = contract_input(1000.0, 2, 30);
    missing_party.supplier_id = UserId(String::new());
    assert!(matches!(
        lifecycle::new_contract(ContractId("ctr-d".to_string()), missing_party),
        Err(ValidationError::MissingParty)
    ));
}

#[test]
fn creation_starts_pending_without_a_due_date() {
    let contract = pending_contract(60000.0, 6, 30);
    assert_eq!(contract.status, ContractStatus::Pending);
    assert!(contract.due_date.is_none());
    assert!(contract.paid_date.is_none());
}

#[test]
fn approval_sets_due_date_to_the_decision_date() {
    let mut contract = pending_contract(60000.0, 6, 30);
    let today = date(2026, 1, 15);
    lifecycle::decide(&mut contract, ContractDecision::Approve, today).expect("approves");
    assert_eq!(contract.status, ContractStatus::Active);
    assert_eq!(contract.due_date, Some(today));
}

#[test]
fn rejection_is_terminal() {
    let mut contract = pending_contract(60000.0, 6, 30);
    lifecycle::decide(&mut contract, ContractDecision::Reject, date(2026, 1, 15))
        .expect("rejects");
    assert_eq!(contract.status, ContractStatus::Rejected);

    let again = lifecycle::decide(&mut contract, ContractDecision::Approve, date(2026, 1, 16));
    assert!(matches!(
        again,
        Err(LifecycleError::InvalidTransition {
            from: ContractStatus::Rejected,
            ..
        })
    ));
}

#[test]
fn deciding_an_active_contract_is_an_invalid_transition() {
    let mut contract = pending_contract(60000.0, 6, 30);
    lifecycle::decide(&mut contract, ContractDecision::Approve, date(2026, 1, 15))
        .expect("approves");
    let again = lifecycle::decide(&mut contract, ContractDecision::Reject, date(2026, 1, 16));
    assert!(matches!(
        again,
        Err(LifecycleError::InvalidTransition {
            from: ContractStatus::Active,
            ..
        })
    ));
}

#[test]
fn three_verified_installments_advance_ninety_days() {
    // The worked example: 60000 over 6 installments at 30-day terms.
    let mut contract = pending_contract(60000.0, 6, 30);
    let activated = date(2026, 1, 1);
    lifecycle::decide(&mut contract, ContractDecision::Approve, activated).expect("approves");

    let mut payments = Vec::new();
    for index in 0..3 {
        payments.push(verified_payment(&format!("pay-{index}"), &contract, 10000.0));
        let outcome =
            lifecycle::advance_on_verified_payment(&mut contract, &payments, activated)
                .expect("advances");
        assert!(matches!(outcome, AdvanceOutcome::Advanced { .. }));
    }

    assert_eq!(contract.status, ContractStatus::Active);
    assert_eq!(contract.due_date, Some(activated + Duration::days(90)));
    assert!(contract.paid_date.is_none());
}

#[test]
fn settling_the_full_balance_completes_the_contract() {
    let mut contract = pending_contract(60000.0, 6, 30);
    let activated = date(2026, 1, 1);
    lifecycle::decide(&mut contract, ContractDecision::Approve, activated).expect("approves");

    let mut payments = Vec::new();
    for index in 0..6 {
        payments.push(verified_payment(&format!("pay-{index}"), &contract, 10000.0));
        lifecycle::advance_on_verified_payment(&mut contract, &payments, activated)
            .expect("advances");
    }

    assert_eq!(contract.status, ContractStatus::Completed);
    assert_eq!(contract.paid_date, Some(activated));

    // Terminal: no further advancement.
    let after = lifecycle::advance_on_verified_payment(&mut contract, &payments, activated);
    assert!(matches!(
        after,
        Err(LifecycleError::InvalidTransition {
            from: ContractStatus::Completed,
            ..
        })
    ));
}

#[test]
fn never_completes_while_the_balance_is_open() {
    let mut contract = pending_contract(60000.0, 6, 30);
    let activated = date(2026, 1, 1);
    lifecycle::decide(&mut contract, ContractDecision::Approve, activated).expect("approves");

    // Seven partial settlements summing below the contract amount.
    let mut payments = Vec::new();
    for index in 0..7 {
        payments.push(verified_payment(&format!("pay-{index}"), &contract, 5000.0));
        lifecycle::advance_on_verified_payment(&mut contract, &payments, activated)
            .expect("advances");
    }

    assert_ne!(contract.status, ContractStatus::Completed);
}

#[test]
fn overdue_contract_recovers_when_the_advanced_due_date_catches_up() {
    let mut contract = pending_contract(60000.0, 6, 30);
    lifecycle::decide(&mut contract, ContractDecision::Approve, date(2026, 1, 1))
        .expect("approves");
    contract.status = ContractStatus::Overdue;

    // Due date one week behind; one term forward lands in the future.
    let today = date(2026, 1, 8);
    let payments = vec![verified_payment("pay-0", &contract, 10000.0)];
    lifecycle::advance_on_verified_payment(&mut contract, &payments, today).expect("advances");

    assert_eq!(contract.status, ContractStatus::Active);
    assert_eq!(contract.due_date, Some(date(2026, 1, 31)));
}

#[test]
fn overdue_contract_stays_overdue_while_arrears_remain() {
    let mut contract = pending_contract(60000.0, 6, 30);
    lifecycle::decide(&mut contract, ContractDecision::Approve, date(2026, 1, 1))
        .expect("approves");
    contract.status = ContractStatus::Overdue;

    // Two full terms behind; one advancement still leaves the date past.
    let today = date(2026, 3, 15);
    let payments = vec![verified_payment("pay-0", &contract, 10000.0)];
    lifecycle::advance_on_verified_payment(&mut contract, &payments, today).expect("advances");

    assert_eq!(contract.status, ContractStatus::Overdue);
    assert_eq!(contract.due_date, Some(date(2026, 1, 31)));
}

#[test]
fn overdue_predicate_tracks_the_due_date() {
    let mut contract = pending_contract(60000.0, 6, 30);
    lifecycle::decide(&mut contract, ContractDecision::Approve, date(2026, 1, 1))
        .expect("approves");

    assert!(!lifecycle::is_overdue(&contract, date(2026, 1, 1)));
    assert!(lifecycle::is_overdue(&contract, date(2026, 1, 2)));
    assert_eq!(
        lifecycle::effective_status(&contract, date(2026, 1, 2)),
        ContractStatus::Overdue
    );
    // The stored record is untouched by the lazy check.
    assert_eq!(contract.status, ContractStatus::Active);

    contract.status = ContractStatus::Completed;
    assert!(!lifecycle::is_overdue(&contract, date(2026, 6, 1)));
}
