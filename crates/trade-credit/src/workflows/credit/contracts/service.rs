use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::super::domain::{
    Actor, Contract, ContractDecision, ContractId, ContractStatus, Payment, PaymentId, Role, User,
    UserId, VerificationDecision,
};
use super::super::scoring::{ContractHistory, CreditAssessment, CreditScoringEngine};
use super::accounting::{self, AccountingError, PaymentRequest};
use super::lifecycle::{self, AdvanceOutcome, LifecycleError, NewContract};
use super::repository::{
    ContractRepository, EmailMessage, EmailNotifier, PaymentRepository, RepositoryError,
    UserRepository,
};

/// Service composing the lifecycle and accounting engines with the record
/// store, the mail hook, and caller authorization. Engines stay pure; this
/// layer owns read-modify-write sequencing against the freshest records.
pub struct CreditService<U, C, P, N> {
    users: Arc<U>,
    contracts: Arc<C>,
    payments: Arc<P>,
    notifier: Arc<N>,
    scoring: CreditScoringEngine,
}

static CONTRACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static PAYMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_contract_id() -> ContractId {
    let id = CONTRACT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ContractId(format!("ctr-{id:06}"))
}

fn next_payment_id() -> PaymentId {
    let id = PAYMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PaymentId(format!("pay-{id:06}"))
}

/// Error raised by the credit service.
#[derive(Debug, thiserror::Error)]
pub enum CreditServiceError {
    #[error("operation requires the {required} role")]
    WrongRole { required: Role },
    #[error("actor {0} is not a party to this operation")]
    NotParty(UserId),
    #[error("unknown user {0}")]
    UnknownUser(UserId),
    #[error("user {user} does not hold the {expected} role")]
    PartyRole { user: UserId, expected: Role },
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Accounting(#[from] AccountingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Contract read model: the record plus derived accounting figures.
#[derive(Debug, Clone, Serialize)]
pub struct ContractStatement {
    pub contract: Contract,
    pub effective_status: &'static str,
    pub installment_amount: f64,
    pub paid_so_far: f64,
    pub remaining: f64,
    pub remaining_installments: u32,
    pub payments: Vec<Payment>,
}

impl<U, C, P, N> CreditService<U, C, P, N>
where
    U: UserRepository + 'static,
    C: ContractRepository + 'static,
    P: PaymentRepository + 'static,
    N: EmailNotifier + 'static,
{
    pub fn new(users: Arc<U>, contracts: Arc<C>, payments: Arc<P>, notifier: Arc<N>) -> Self {
        Self {
            users,
            contracts,
            payments,
            notifier,
            scoring: CreditScoringEngine::new(),
        }
    }

    /// Retailer proposes a contract. Both parties are notified; the contract
    /// waits in `pending` for the supplier's decision.
    pub fn create_contract(
        &self,
        actor: &Actor,
        input: NewContract,
    ) -> Result<Contract, CreditServiceError> {
        self.require_role(actor, Role::Retailer)?;
        if actor.user_id != input.retailer_id {
            return Err(CreditServiceError::NotParty(actor.user_id.clone()));
        }

        let supplier = self.known_user(&input.supplier_id, Role::Supplier)?;
        let retailer = self.known_user(&input.retailer_id, Role::Retailer)?;

        let contract = lifecycle::new_contract(next_contract_id(), input)
            .map_err(LifecycleError::Validation)?;
        let stored = self.contracts.insert(contract)?;

        let subject = format!("Contract request {}", stored.id);
        self.notify(
            &supplier.contact_email,
            &subject,
            format!(
                "{} requested a contract of {:.2} over {} installments.",
                retailer.commercial_name, stored.amount, stored.number_of_payments
            ),
        );
        self.notify(
            &retailer.contact_email,
            &subject,
            format!(
                "Your contract request with {} was submitted and awaits approval.",
                supplier.commercial_name
            ),
        );

        Ok(stored)
    }

    /// Supplier approves or rejects a pending contract.
    pub fn decide_contract(
        &self,
        actor: &Actor,
        contract_id: &ContractId,
        decision: ContractDecision,
        today: NaiveDate,
    ) -> Result<Contract, CreditServiceError> {
        self.require_role(actor, Role::Supplier)?;
        let mut contract = self.fetch_contract(contract_id)?;
        if contract.supplier_id != actor.user_id {
            return Err(CreditServiceError::NotParty(actor.user_id.clone()));
        }

        lifecycle::decide(&mut contract, decision, today)?;
        self.contracts.update(contract.clone())?;

        let verdict = match decision {
            ContractDecision::Approve => "approved",
            ContractDecision::Reject => "rejected",
        };
        self.notify_user(
            &contract.retailer_id,
            &format!("Contract {} {verdict}", contract.id),
            format!("The supplier {verdict} contract {}.", contract.id),
        );

        Ok(contract)
    }

    /// Retailer submits a settlement event against a running contract. The
    /// payment waits in `pending` verification and does not touch the
    /// contract until the supplier confirms it.
    pub fn record_payment(
        &self,
        actor: &Actor,
        contract_id: &ContractId,
        request: PaymentRequest,
        today: NaiveDate,
    ) -> Result<Payment, CreditServiceError> {
        self.require_role(actor, Role::Retailer)?;
        let mut contract = self.fetch_contract(contract_id)?;
        if contract.retailer_id != actor.user_id {
            return Err(CreditServiceError::NotParty(actor.user_id.clone()));
        }

        self.refresh_overdue(&mut contract, today)?;
        lifecycle::ensure_accepts_payments(&contract, "record a payment against")?;

        let history = self.payments.for_contract(&contract.id)?;
        let payment =
            accounting::record_payment(next_payment_id(), &contract, &history, &request, today)?;
        let stored = self.payments.insert(payment)?;
        Ok(stored)
    }

    /// Supplier confirms or rejects a submitted payment. Confirmation
    /// advances the contract; rejection leaves it untouched and the
    /// retailer must resubmit.
    pub fn verify_payment(
        &self,
        actor: &Actor,
        payment_id: &PaymentId,
        decision: VerificationDecision,
        today: NaiveDate,
    ) -> Result<Payment, CreditServiceError> {
        self.require_role(actor, Role::Supplier)?;
        let mut payment = self
            .payments
            .fetch(payment_id)?
            .ok_or(RepositoryError::NotFound)?;
        let mut contract = self.fetch_contract(&payment.contract_id)?;
        if contract.supplier_id != actor.user_id {
            return Err(CreditServiceError::NotParty(actor.user_id.clone()));
        }

        self.refresh_overdue(&mut contract, today)?;

        match decision {
            VerificationDecision::Verify => {
                lifecycle::ensure_accepts_payments(&contract, "verify a payment against")?;
                let was_overdue = contract.status == ContractStatus::Overdue;
                accounting::verify_payment(&mut payment, decision, was_overdue)?;
                self.payments.update(payment.clone())?;

                let history = self.payments.for_contract(&contract.id)?;
                let outcome = lifecycle::advance_on_verified_payment(&mut contract, &history, today)?;
                self.contracts.update(contract.clone())?;

                self.notify_user(
                    &contract.retailer_id,
                    &format!("Payment {} verified", payment.id),
                    format!(
                        "Your payment of {:.2} against contract {} was verified.",
                        payment.amount_paid, contract.id
                    ),
                );
                if outcome == AdvanceOutcome::Completed {
                    self.notify_user(
                        &contract.retailer_id,
                        &format!("Contract {} completed", contract.id),
                        format!("Contract {} is fully settled.", contract.id),
                    );
                }
            }
            VerificationDecision::Reject => {
                accounting::verify_payment(&mut payment, decision, false)?;
                self.payments.update(payment.clone())?;
                self.notify_user(
                    &contract.retailer_id,
                    &format!("Payment {} rejected", payment.id),
                    format!(
                        "Your payment of {:.2} against contract {} was rejected; please resubmit.",
                        payment.amount_paid, contract.id
                    ),
                );
            }
        }

        Ok(payment)
    }

    /// Contract plus derived accounting figures, visible to its parties and
    /// admins only.
    pub fn contract_statement(
        &self,
        actor: &Actor,
        contract_id: &ContractId,
        as_of: NaiveDate,
    ) -> Result<ContractStatement, CreditServiceError> {
        let contract = self.fetch_contract(contract_id)?;
        let is_party =
            actor.user_id == contract.supplier_id || actor.user_id == contract.retailer_id;
        if actor.role != Role::Admin && !is_party {
            return Err(CreditServiceError::NotParty(actor.user_id.clone()));
        }

        let payments = self.payments.for_contract(&contract.id)?;
        Ok(ContractStatement {
            effective_status: lifecycle::effective_status(&contract, as_of).label(),
            installment_amount: accounting::installment_amount(&contract),
            paid_so_far: accounting::paid_so_far(&payments),
            remaining: accounting::remaining(&contract, &payments),
            remaining_installments: accounting::remaining_installments(&contract, &payments),
            contract,
            payments,
        })
    }

    /// Persist the overdue flag for every active contract whose due date has
    /// passed. Intended for a periodic external trigger; reads apply the
    /// same predicate lazily without waiting for the sweep.
    pub fn sweep_overdue(&self, as_of: NaiveDate) -> Result<Vec<ContractId>, CreditServiceError> {
        let mut flagged = Vec::new();
        for mut contract in self.contracts.with_status(ContractStatus::Active)? {
            if lifecycle::is_overdue(&contract, as_of) {
                contract.status = ContractStatus::Overdue;
                self.contracts.update(contract.clone())?;
                flagged.push(contract.id);
            }
        }
        Ok(flagged)
    }

    /// Credit profile for a retailer. Suppliers get the pairwise view with
    /// themselves, retailers their own cross-supplier aggregate, admins any
    /// retailer's aggregate.
    pub fn credit_report(
        &self,
        actor: &Actor,
        retailer_id: &UserId,
        as_of: NaiveDate,
    ) -> Result<CreditAssessment, CreditServiceError> {
        self.known_user(retailer_id, Role::Retailer)?;

        match actor.role {
            Role::Supplier => {
                let contracts = self.contracts.for_pair(retailer_id, &actor.user_id)?;
                let histories = self.histories(contracts, as_of)?;
                Ok(self
                    .scoring
                    .assess_pair(retailer_id, &actor.user_id, &histories, as_of))
            }
            Role::Retailer => {
                if actor.user_id != *retailer_id {
                    return Err(CreditServiceError::NotParty(actor.user_id.clone()));
                }
                self.aggregate_report(retailer_id, as_of)
            }
            Role::Admin => self.aggregate_report(retailer_id, as_of),
        }
    }

    fn aggregate_report(
        &self,
        retailer_id: &UserId,
        as_of: NaiveDate,
    ) -> Result<CreditAssessment, CreditServiceError> {
        let contracts = self.contracts.for_retailer(retailer_id)?;
        let mut by_supplier: BTreeMap<UserId, Vec<Contract>> = BTreeMap::new();
        for contract in contracts {
            by_supplier
                .entry(contract.supplier_id.clone())
                .or_default()
                .push(contract);
        }

        let mut slices = Vec::with_capacity(by_supplier.len());
        for (supplier, contracts) in by_supplier {
            slices.push((supplier, self.histories(contracts, as_of)?));
        }
        Ok(self.scoring.assess_aggregate(retailer_id, &slices, as_of))
    }

    /// Snapshot contracts with their payment trails, folding the lazy
    /// overdue check into each contract's status so scoring sees the state
    /// a reader would.
    fn histories(
        &self,
        contracts: Vec<Contract>,
        as_of: NaiveDate,
    ) -> Result<Vec<ContractHistory>, CreditServiceError> {
        let mut histories = Vec::with_capacity(contracts.len());
        for mut contract in contracts {
            contract.status = lifecycle::effective_status(&contract, as_of);
            let payments = self.payments.for_contract(&contract.id)?;
            histories.push(ContractHistory { contract, payments });
        }
        Ok(histories)
    }

    fn require_role(&self, actor: &Actor, required: Role) -> Result<(), CreditServiceError> {
        if actor.role == required {
            Ok(())
        } else {
            Err(CreditServiceError::WrongRole { required })
        }
    }

    fn known_user(&self, id: &UserId, expected: Role) -> Result<User, CreditServiceError> {
        let user = self
            .users
            .fetch(id)?
            .ok_or_else(|| CreditServiceError::UnknownUser(id.clone()))?;
        if user.role != expected {
            return Err(CreditServiceError::PartyRole {
                user: id.clone(),
                expected,
            });
        }
        Ok(user)
    }

    fn fetch_contract(&self, id: &ContractId) -> Result<Contract, CreditServiceError> {
        Ok(self.contracts.fetch(id)?.ok_or(RepositoryError::NotFound)?)
    }

    fn notify_user(&self, user_id: &UserId, subject: &str, body: String) {
        match self.users.fetch(user_id) {
            Ok(Some(user)) => self.notify(&user.contact_email, subject, body),
            Ok(None) => warn!(%user_id, "notification recipient missing"),
            Err(err) => warn!(%user_id, error = %err, "notification recipient lookup failed"),
        }
    }

    /// Fire-and-forget: a failed send never rolls back a state transition.
    fn notify(&self, to: &str, subject: &str, body: String) {
        let message = EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body,
        };
        if let Err(err) = self.notifier.send(message) {
            warn!(recipient = to, error = %err, "notification dispatch failed");
        }
    }
}
