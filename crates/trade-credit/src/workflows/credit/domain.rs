use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for platform users (suppliers, retailers, admins).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for installment contracts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for settlement events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commercial role assigned at signup. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Supplier,
    Retailer,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Supplier => "supplier",
            Role::Retailer => "retailer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A supplier or retailer account as the contract workflow sees it.
/// Authentication and profile management live outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    pub commercial_identity: String,
    pub commercial_name: String,
    pub contact_email: String,
}

/// Days between installments. The platform only issues these four terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentTerms {
    Net15,
    Net30,
    Net45,
    Net60,
}

impl PaymentTerms {
    pub const fn days(self) -> i64 {
        match self {
            PaymentTerms::Net15 => 15,
            PaymentTerms::Net30 => 30,
            PaymentTerms::Net45 => 45,
            PaymentTerms::Net60 => 60,
        }
    }

    pub const fn from_days(days: u16) -> Option<Self> {
        match days {
            15 => Some(PaymentTerms::Net15),
            30 => Some(PaymentTerms::Net30),
            45 => Some(PaymentTerms::Net45),
            60 => Some(PaymentTerms::Net60),
            _ => None,
        }
    }
}

/// Contract state machine labels.
///
/// `Pending` awaits the supplier's decision; `Active` accrues installments;
/// `Overdue` marks a missed due date and can return to `Active`;
/// `Rejected` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Pending,
    Active,
    Rejected,
    Completed,
    Overdue,
}

impl ContractStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ContractStatus::Pending => "pending",
            ContractStatus::Active => "active",
            ContractStatus::Rejected => "rejected",
            ContractStatus::Completed => "completed",
            ContractStatus::Overdue => "overdue",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ContractStatus::Rejected | ContractStatus::Completed)
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An installment agreement between exactly one supplier and one retailer.
///
/// Party references and commercial terms are immutable after creation; only
/// `status`, `due_date`, and `paid_date` move, and only through the lifecycle
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub supplier_id: UserId,
    pub retailer_id: UserId,
    pub amount: f64,
    pub number_of_payments: u32,
    pub payment_terms: PaymentTerms,
    pub status: ContractStatus,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Date the next installment is expected. Absent while pending.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Set once, when the contract completes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<NaiveDate>,
}

/// Supplier verdict on a pending contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractDecision {
    Approve,
    Reject,
}

/// Settlement channel declared by the retailer when remitting money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Check,
    Cash,
    Card,
}

/// Classification of a single settlement event against its installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Due,
    Partial,
    Paid,
    Overdue,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentStatus::Due => "due",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

/// Supplier confirmation state for a submitted payment. Nothing counts
/// toward a contract balance until it reaches `Verified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Supplier verdict on a submitted payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationDecision {
    Verify,
    Reject,
}

/// One settlement event against a contract. Created by the retailer,
/// finalized by the supplier's verification, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub contract_id: ContractId,
    /// Installment amount at the time the payment was created.
    pub amount_due: f64,
    /// Amount actually remitted; below `amount_due` for partial payments.
    pub amount_paid: f64,
    pub due_date: NaiveDate,
    pub paid_date: NaiveDate,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub verification: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Caller identity supplied explicitly with every operation. The core holds
/// no ambient current-user state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            role,
        }
    }
}
