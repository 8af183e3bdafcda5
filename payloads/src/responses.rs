use crate::{
    AccountId, BankId, CustomerId, TransactionId, TransactionStatus, UserId,
};
use jiff::Timestamp;
#[cfg(feature = "use-sqlx")]
use jiff_sqlx::Timestamp as SqlxTs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub username: String,
    /// The bank this user administers, if they have created one.
    pub bank_id: Option<BankId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
pub struct Bank {
    pub id: BankId,
    pub name: String,
    pub description: Option<String>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub updated_at: Timestamp,
}

/// A customer's account.
///
/// `balance` is the sum of every transaction recorded against the account,
/// computed when the account is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub customer_id: CustomerId,
    pub balance: Decimal,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub bank_id: BankId,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub account: Account,
}

/// A single ledger row.
///
/// `user_id` is whoever last acted on the transaction: the creator while it
/// is pending, then the user who approved or declined it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "use-sqlx", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub amount: Decimal,
    pub description: String,
    pub status: TransactionStatus,
    pub user_id: Option<UserId>,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "use-sqlx", sqlx(try_from = "SqlxTs"))]
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub transaction: Transaction,
    /// The account owner, re-read after the transaction was recorded.
    pub customer: Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkTransferResult {
    /// The first customer in the request, re-read after the transfer.
    pub customer: Customer,
    pub bank: Bank,
    /// One transaction per requested customer id, in request order.
    pub transactions: Vec<Transaction>,
}
