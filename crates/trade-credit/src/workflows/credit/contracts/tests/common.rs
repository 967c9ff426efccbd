use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::workflows::credit::contracts::repository::{
    ContractRepository, EmailMessage, EmailNotifier, NotificationError, PaymentRepository,
    RepositoryError, UserRepository,
};
use crate::workflows::credit::contracts::service::CreditService;
use crate::workflows::credit::contracts::{credit_router, NewContract};
use crate::workflows::credit::domain::{
    Actor, Contract, ContractDecision, ContractId, ContractStatus, Payment, PaymentId, Role, User,
    UserId,
};

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn supplier() -> User {
    User {
        id: UserId("sup-1".to_string()),
        role: Role::Supplier,
        commercial_identity: "CR-440011".to_string(),
        commercial_name: "Harbor Wholesale".to_string(),
        contact_email: "accounts@harborwholesale.test".to_string(),
    }
}

pub(super) fn retailer() -> User {
    User {
        id: UserId("ret-1".to_string()),
        role: Role::Retailer,
        commercial_identity: "CR-551202".to_string(),
        commercial_name: "Corner Market".to_string(),
        contact_email: "owner@cornermarket.test".to_string(),
    }
}

pub(super) fn second_supplier() -> User {
    User {
        id: UserId("sup-2".to_string()),
        role: Role::Supplier,
        commercial_identity: "CR-440099".to_string(),
        commercial_name: "Delta Distribution".to_string(),
        contact_email: "billing@deltadist.test".to_string(),
    }
}

pub(super) fn supplier_actor() -> Actor {
    Actor::new("sup-1", Role::Supplier)
}

pub(super) fn retailer_actor() -> Actor {
    Actor::new("ret-1", Role::Retailer)
}

pub(super) fn admin_actor() -> Actor {
    Actor::new("adm-1", Role::Admin)
}

pub(super) fn contract_input(amount: f64, installments: u32, terms_days: u16) -> NewContract {
    NewContract {
        supplier_id: UserId("sup-1".to_string()),
        retailer_id: UserId("ret-1".to_string()),
        amount,
        number_of_payments: installments,
        payment_terms_days: terms_days,
        description: "seasonal stock".to_string(),
        start_date: None,
        end_date: None,
    }
}

#[derive(Default)]
pub(super) struct MemoryUsers {
    records: Mutex<HashMap<UserId, User>>,
}

impl UserRepository for MemoryUsers {
    fn insert(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.records.lock().expect("user mutex poisoned");
        if guard.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.records.lock().expect("user mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryContracts {
    records: Mutex<HashMap<ContractId, Contract>>,
}

impl ContractRepository for MemoryContracts {
    fn insert(&self, contract: Contract) -> Result<Contract, RepositoryError> {
        let mut guard = self.records.lock().expect("contract mutex poisoned");
        if guard.contains_key(&contract.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(contract.id.clone(), contract.clone());
        Ok(contract)
    }

    fn update(&self, contract: Contract) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("contract mutex poisoned");
        if guard.contains_key(&contract.id) {
            guard.insert(contract.id.clone(), contract);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("contract mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_retailer(&self, retailer: &UserId) -> Result<Vec<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("contract mutex poisoned");
        Ok(guard
            .values()
            .filter(|contract| contract.retailer_id == *retailer)
            .cloned()
            .collect())
    }

    fn for_pair(
        &self,
        retailer: &UserId,
        supplier: &UserId,
    ) -> Result<Vec<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("contract mutex poisoned");
        Ok(guard
            .values()
            .filter(|contract| {
                contract.retailer_id == *retailer && contract.supplier_id == *supplier
            })
            .cloned()
            .collect())
    }

    fn with_status(&self, status: ContractStatus) -> Result<Vec<Contract>, RepositoryError> {
        let guard = self.records.lock().expect("contract mutex poisoned");
        Ok(guard
            .values()
            .filter(|contract| contract.status == status)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryPayments {
    records: Mutex<HashMap<PaymentId, Payment>>,
}

impl PaymentRepository for MemoryPayments {
    fn insert(&self, payment: Payment) -> Result<Payment, RepositoryError> {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        if guard.contains_key(&payment.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(payment.id.clone(), payment.clone());
        Ok(payment)
    }

    fn update(&self, payment: Payment) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("payment mutex poisoned");
        if guard.contains_key(&payment.id) {
            guard.insert(payment.id.clone(), payment);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let guard = self.records.lock().expect("payment mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn for_contract(&self, contract: &ContractId) -> Result<Vec<Payment>, RepositoryError> {
        let guard = self.records.lock().expect("payment mutex poisoned");
        let mut payments: Vec<Payment> = guard
            .values()
            .filter(|payment| payment.contract_id == *contract)
            .cloned()
            .collect();
        payments.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(payments)
    }
}

#[derive(Default)]
pub(super) struct MemoryMailer {
    messages: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    pub(super) fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().expect("mailer mutex poisoned").clone()
    }
}

impl EmailNotifier for MemoryMailer {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.messages
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(())
    }
}

pub(super) struct FailingMailer;

impl EmailNotifier for FailingMailer {
    fn send(&self, _message: EmailMessage) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableContracts;

impl ContractRepository for UnavailableContracts {
    fn insert(&self, _contract: Contract) -> Result<Contract, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn update(&self, _contract: Contract) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &ContractId) -> Result<Option<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn for_retailer(&self, _retailer: &UserId) -> Result<Vec<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn for_pair(
        &self,
        _retailer: &UserId,
        _supplier: &UserId,
    ) -> Result<Vec<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }

    fn with_status(&self, _status: ContractStatus) -> Result<Vec<Contract>, RepositoryError> {
        Err(RepositoryError::Unavailable("store offline".to_string()))
    }
}

pub(super) type TestService = CreditService<MemoryUsers, MemoryContracts, MemoryPayments, MemoryMailer>;

pub(super) struct TestHarness {
    pub(super) service: Arc<TestService>,
    pub(super) contracts: Arc<MemoryContracts>,
    pub(super) payments: Arc<MemoryPayments>,
    pub(super) mailer: Arc<MemoryMailer>,
}

pub(super) fn build_service() -> TestHarness {
    let users = Arc::new(MemoryUsers::default());
    users.insert(supplier()).expect("seed supplier");
    users.insert(retailer()).expect("seed retailer");
    users.insert(second_supplier()).expect("seed second supplier");

    let contracts = Arc::new(MemoryContracts::default());
    let payments = Arc::new(MemoryPayments::default());
    let mailer = Arc::new(MemoryMailer::default());
    let service = Arc::new(CreditService::new(
        users,
        contracts.clone(),
        payments.clone(),
        mailer.clone(),
    ));

    TestHarness {
        service,
        contracts,
        payments,
        mailer,
    }
}

/// Create a contract and approve it so installments start accruing.
pub(super) fn active_contract(
    harness: &TestHarness,
    amount: f64,
    installments: u32,
    terms_days: u16,
    activated_on: NaiveDate,
) -> Contract {
    let created = harness
        .service
        .create_contract(&retailer_actor(), contract_input(amount, installments, terms_days))
        .expect("contract creates");
    harness
        .service
        .decide_contract(
            &supplier_actor(),
            &created.id,
            ContractDecision::Approve,
            activated_on,
        )
        .expect("contract approves")
}

pub(super) fn credit_router_with_service(harness: &TestHarness) -> axum::Router {
    credit_router(harness.service.clone())
}

pub(super) async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
