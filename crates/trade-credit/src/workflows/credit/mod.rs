//! Supplier/retailer trade-credit workflow: installment contracts, payment
//! verification, and derived credit ratings.

pub mod contracts;
pub mod domain;
pub mod scoring;

pub use contracts::{
    accounting, credit_router, lifecycle, AccountingError, AmountType, ContractRepository,
    ContractStatement, CreditService, CreditServiceError, EmailMessage, EmailNotifier,
    LifecycleError, NewContract, NotificationError, PaymentRepository, PaymentRequest,
    RepositoryError, UserRepository, ValidationError,
};
pub use domain::{
    Actor, Contract, ContractDecision, ContractId, ContractStatus, Payment, PaymentId,
    PaymentMethod, PaymentStatus, PaymentTerms, Role, User, UserId, VerificationDecision,
    VerificationStatus,
};
pub use scoring::{
    ContractHistory, CreditAssessment, CreditInfo, CreditRating, CreditScoringEngine,
    MonthlyRecord, RiskLevel,
};
