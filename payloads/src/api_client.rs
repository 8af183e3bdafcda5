use crate::{
    AccountId, BankId, CustomerId, TransactionId, requests, responses,
};
use reqwest::StatusCode;
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the backend.
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", &self.address)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ReqwestResult {
        self.inner_client
            .post(self.format_url(path))
            .json(body)
            .send()
            .await
    }

    async fn empty_post(&self, path: &str) -> ReqwestResult {
        self.inner_client.post(self.format_url(path)).send().await
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        self.inner_client.get(self.format_url(path)).send().await
    }
}

/// Methods on the backend API
impl APIClient {
    pub async fn health_check(&self) -> Result<(), ClientError> {
        let response = self.empty_get("health_check").await?;
        ok_empty(response).await
    }

    pub async fn create_account(
        &self,
        details: &requests::CreateAccount,
    ) -> Result<(), ClientError> {
        let response = self.post("create_account", details).await?;
        ok_empty(response).await
    }

    pub async fn login(
        &self,
        details: &requests::LoginCredentials,
    ) -> Result<(), ClientError> {
        let response = self.post("login", &details).await?;
        ok_empty(response).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.empty_post("logout").await?;
        ok_empty(response).await
    }

    /// Check if the user is logged in.
    pub async fn login_check(&self) -> Result<bool, ClientError> {
        let response = self.empty_post("login_check").await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(ClientError::APIError(
                response.status(),
                response.text().await?,
            )),
        }
    }

    /// Get the current user's profile information.
    pub async fn user_profile(
        &self,
    ) -> Result<responses::UserProfile, ClientError> {
        let response = self.empty_get("user_profile").await?;
        ok_body(response).await
    }

    pub async fn update_password(
        &self,
        details: &requests::UpdatePassword,
    ) -> Result<(), ClientError> {
        let response = self.post("update_password", details).await?;
        ok_empty(response).await
    }

    /// Create a bank administered by the current user.
    pub async fn create_bank(
        &self,
        details: &requests::CreateBank,
    ) -> Result<responses::Bank, ClientError> {
        let response = self.post("create_bank", details).await?;
        ok_body(response).await
    }

    pub async fn get_bank(
        &self,
        bank_id: &BankId,
    ) -> Result<responses::Bank, ClientError> {
        let response = self.post("get_bank", bank_id).await?;
        ok_body(response).await
    }

    /// Onboard a customer, opening their account.
    pub async fn create_customer(
        &self,
        details: &requests::CreateCustomer,
    ) -> Result<responses::Customer, ClientError> {
        let response = self.post("create_customer", details).await?;
        ok_body(response).await
    }

    pub async fn get_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<responses::Customer, ClientError> {
        let response = self.post("get_customer", customer_id).await?;
        ok_body(response).await
    }

    /// List every customer of a bank along with their balances.
    pub async fn list_customers(
        &self,
        bank_id: &BankId,
    ) -> Result<Vec<responses::Customer>, ClientError> {
        let response = self.post("list_customers", bank_id).await?;
        ok_body(response).await
    }

    pub async fn create_transfer(
        &self,
        details: &requests::CreateTransfer,
    ) -> Result<responses::TransferResult, ClientError> {
        let response = self.post("create_transfer", details).await?;
        ok_body(response).await
    }

    pub async fn bulk_transfer(
        &self,
        details: &requests::BulkTransfer,
    ) -> Result<responses::BulkTransferResult, ClientError> {
        let response = self.post("bulk_transfer", details).await?;
        ok_body(response).await
    }

    /// Approve a pending transaction, returning the refreshed pending list.
    pub async fn approve_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<responses::Transaction>, ClientError> {
        let response =
            self.post("approve_transaction", transaction_id).await?;
        ok_body(response).await
    }

    /// Decline a pending transaction, returning the refreshed pending list.
    pub async fn decline_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Vec<responses::Transaction>, ClientError> {
        let response =
            self.post("decline_transaction", transaction_id).await?;
        ok_body(response).await
    }

    /// Pending transactions across the current user's bank.
    pub async fn pending_transactions(
        &self,
    ) -> Result<Vec<responses::Transaction>, ClientError> {
        let response = self.empty_get("pending_transactions").await?;
        ok_body(response).await
    }

    pub async fn list_account_transactions(
        &self,
        account_id: &AccountId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<responses::Transaction>, ClientError> {
        let details = requests::ListAccountTransactions {
            account_id: *account_id,
            limit,
            offset,
        };
        let response =
            self.post("list_account_transactions", &details).await?;
        ok_body(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// An unhandled API error to display, containing response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(response.json::<T>().await?)
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
