use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

use trade_credit::workflows::credit::{
    Contract, ContractId, ContractRepository, ContractStatus, CreditService, EmailMessage,
    EmailNotifier, NotificationError, Payment, PaymentId, PaymentRepository, RepositoryError, Role,
    User, UserId, UserRepository,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryCreditService = CreditService<
    InMemoryUserRepository,
    InMemoryContractRepository,
    InMemoryPaymentRepository,
    LoggingEmailNotifier,
>;

#[derive(Default, Clone)]
pub(crate) struct InMemoryUserRepository {
    records: Arc<Mutex<HashMap<UserId, User>>>,
}

impl UserRepository for InMemoryUserRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryContractRepository {
    records: Arc<Mutex<HashMap<ContractId, Contract>>>,
}

impl ContractRepository for InMemoryContractRepository {
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

#[derive(Default, Clone)]
pub(crate) struct InMemoryPaymentRepository {
    records: Arc<Mutex<HashMap<PaymentId, Payment>>>,
}

impl PaymentRepository for InMemoryPaymentRepository {
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

/// Stand-in for the external mail collaborator: logs the dispatch instead of
/// delivering it. Swapping in a real transport only touches this type.
#[derive(Default, Clone)]
pub(crate) struct LoggingEmailNotifier;

impl EmailNotifier for LoggingEmailNotifier {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        info!(to = %message.to, subject = %message.subject, "email dispatched");
        Ok(())
    }
}

/// Identity provisioning (signup, sessions) is an external collaborator;
/// the in-memory store ships with a small set of commercial parties so the
/// service and demo are exercisable out of the box.
pub(crate) fn seed_parties(users: &InMemoryUserRepository) {
    let parties = [
        User {
            id: UserId("sup-1".to_string()),
            role: Role::Supplier,
            commercial_identity: "CR-440011".to_string(),
            commercial_name: "Harbor Wholesale".to_string(),
            contact_email: "accounts@harborwholesale.test".to_string(),
        },
        User {
            id: UserId("sup-2".to_string()),
            role: Role::Supplier,
            commercial_identity: "CR-440099".to_string(),
            commercial_name: "Delta Distribution".to_string(),
            contact_email: "billing@deltadist.test".to_string(),
        },
        User {
            id: UserId("ret-1".to_string()),
            role: Role::Retailer,
            commercial_identity: "CR-551202".to_string(),
            commercial_name: "Corner Market".to_string(),
            contact_email: "owner@cornermarket.test".to_string(),
        },
    ];

    for party in parties {
        // Conflict means the party is already seeded.
        users.insert(party).ok();
    }
}

pub(crate) fn build_service() -> Arc<InMemoryCreditService> {
    let users = InMemoryUserRepository::default();
    seed_parties(&users);
    Arc::new(CreditService::new(
        Arc::new(users),
        Arc::new(InMemoryContractRepository::default()),
        Arc::new(InMemoryPaymentRepository::default()),
        Arc::new(LoggingEmailNotifier),
    ))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
