use serde::{Deserialize, Serialize};

use super::super::domain::{Contract, ContractId, ContractStatus, Payment, PaymentId, User, UserId};

/// Error enumeration for record store failures. The store is a generic
/// collection-per-entity adapter; no cross-collection transactions are
/// assumed, and the core never retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to the `users` collection.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
}

/// Storage abstraction over the `contracts` collection so the service can
/// be exercised without a live store.
pub trait ContractRepository: Send + Sync {
    fn insert(&self, contract: Contract) -> Result<Contract, RepositoryError>;
    fn update(&self, contract: Contract) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ContractId) -> Result<Option<Contract>, RepositoryError>;
    fn for_retailer(&self, retailer: &UserId) -> Result<Vec<Contract>, RepositoryError>;
    fn for_pair(
        &self,
        retailer: &UserId,
        supplier: &UserId,
    ) -> Result<Vec<Contract>, RepositoryError>;
    /// Contracts currently carrying a given status, for overdue sweeps.
    fn with_status(&self, status: ContractStatus) -> Result<Vec<Contract>, RepositoryError>;
}

/// Storage abstraction over the `payments` collection.
pub trait PaymentRepository: Send + Sync {
    fn insert(&self, payment: Payment) -> Result<Payment, RepositoryError>;
    fn update(&self, payment: Payment) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PaymentId) -> Result<Option<Payment>, RepositoryError>;
    fn for_contract(&self, contract: &ContractId) -> Result<Vec<Payment>, RepositoryError>;
}

/// Outbound notification payload handed to the mail collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Notification dispatch error. Sends are fire-and-forget from the core's
/// perspective: a failed send is logged and never rolls back a transition.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Trait describing the outbound e-mail hook.
pub trait EmailNotifier: Send + Sync {
    fn send(&self, message: EmailMessage) -> Result<(), NotificationError>;
}
