//! Contract lifecycle, payment accounting, and the service surface that
//! ties both engines to the record store and notifier boundaries.

pub mod accounting;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use accounting::{AccountingError, AmountType, PaymentRequest};
pub use lifecycle::{AdvanceOutcome, LifecycleError, NewContract, ValidationError};
pub use repository::{
    ContractRepository, EmailMessage, EmailNotifier, NotificationError, PaymentRepository,
    RepositoryError, UserRepository,
};
pub use router::credit_router;
pub use service::{ContractStatement, CreditService, CreditServiceError};
