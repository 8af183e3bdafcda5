use crate::{AccountId, BankId, CustomerId, TransferType};
use serde::{Deserialize, Serialize};

pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 30;
pub const BANK_NAME_MAX_LEN: usize = 255;
pub const CUSTOMER_NAME_MAX_LEN: usize = 255;
pub const DESCRIPTION_MAX_LEN: usize = 255;

/// Validation result for usernames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsernameValidation {
    Valid,
    TooShort,
    TooLong,
    InvalidCharacters,
    MustStartWithLetter,
}

impl UsernameValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            Self::Valid => None,
            Self::TooShort => Some("Username must be at least 3 characters"),
            Self::TooLong => Some("Username must be at most 30 characters"),
            Self::InvalidCharacters => Some(
                "Username can only contain letters, numbers, and underscores",
            ),
            Self::MustStartWithLetter => {
                Some("Username must start with a letter")
            }
        }
    }
}

/// Validate a username.
///
/// Rules:
/// - 3-30 characters
/// - ASCII letters, numbers, and underscores only
/// - Must start with a letter
pub fn validate_username(username: &str) -> UsernameValidation {
    if username.len() < USERNAME_MIN_LEN {
        return UsernameValidation::TooShort;
    }
    if username.len() > USERNAME_MAX_LEN {
        return UsernameValidation::TooLong;
    }

    let mut chars = username.chars();

    if let Some(first) = chars.next()
        && !first.is_ascii_alphabetic()
    {
        return UsernameValidation::MustStartWithLetter;
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return UsernameValidation::InvalidCharacters;
    }

    UsernameValidation::Valid
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct UpdatePassword {
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBank {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub bank_id: BankId,
    pub first_name: String,
    pub last_name: String,
}

/// Move money into or out of a single account.
///
/// `amount` is the raw text entered by the requester and is validated
/// server-side, so clients can forward form input unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransfer {
    pub account_id: AccountId,
    pub amount: String,
    #[serde(rename = "type", default)]
    pub transfer_type: TransferType,
    #[serde(default)]
    pub description: String,
}

/// Apply the same transfer to the account of every listed customer.
///
/// Customer ids are used as given; listing a customer twice creates two
/// transactions for that customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTransfer {
    pub customer_ids: Vec<CustomerId>,
    pub amount: String,
    #[serde(rename = "type", default)]
    pub transfer_type: TransferType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListAccountTransactions {
    pub account_id: AccountId,
    pub limit: i64,
    pub offset: i64,
}
