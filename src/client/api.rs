//! Calls to the REST API.
//!
//! The traits let the cache and session run against [HttpApi] in production
//! and against in-memory fakes in tests.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    AuthenticatedUser, LogInCredentials, MessageBody, Registration, StatsSnapshot, Transaction,
    TransactionFields, TransactionId,
    client::{ClientError, Credential},
    endpoints::{self, format_endpoint},
};

/// The transaction endpoints.
#[async_trait]
pub trait TransactionApi: Send + Sync {
    /// Fetch all of the user's transactions, newest first.
    async fn list_transactions(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Transaction>, ClientError>;

    /// Fetch the statistics for the user's transactions.
    async fn get_stats(&self, credential: &Credential) -> Result<StatsSnapshot, ClientError>;

    /// Create a transaction and return it as stored.
    async fn create_transaction(
        &self,
        credential: &Credential,
        fields: &TransactionFields,
    ) -> Result<Transaction, ClientError>;

    /// Update a transaction and return it as stored.
    async fn update_transaction(
        &self,
        credential: &Credential,
        id: TransactionId,
        fields: &TransactionFields,
    ) -> Result<Transaction, ClientError>;

    /// Delete a transaction.
    async fn delete_transaction(
        &self,
        credential: &Credential,
        id: TransactionId,
    ) -> Result<(), ClientError>;
}

/// The user endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Register a new user.
    async fn register(&self, registration: &Registration)
    -> Result<AuthenticatedUser, ClientError>;

    /// Log in an existing user.
    async fn log_in(&self, credentials: &LogInCredentials)
    -> Result<AuthenticatedUser, ClientError>;
}

/// A reqwest backed client for the REST API.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    /// Create a client for the server at `base_url`, e.g. "http://localhost:3000".
    pub fn new(base_url: &str) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a client that sends requests with `client`, e.g. one configured
    /// with a timeout.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl TransactionApi for HttpApi {
    async fn list_transactions(
        &self,
        credential: &Credential,
    ) -> Result<Vec<Transaction>, ClientError> {
        let request = self
            .client
            .get(self.url(endpoints::TRANSACTIONS))
            .bearer_auth(credential.token());

        send(request).await
    }

    async fn get_stats(&self, credential: &Credential) -> Result<StatsSnapshot, ClientError> {
        let request = self
            .client
            .get(self.url(endpoints::TRANSACTION_STATS))
            .bearer_auth(credential.token());

        send(request).await
    }

    async fn create_transaction(
        &self,
        credential: &Credential,
        fields: &TransactionFields,
    ) -> Result<Transaction, ClientError> {
        let request = self
            .client
            .post(self.url(endpoints::TRANSACTIONS))
            .bearer_auth(credential.token())
            .json(fields);

        send(request).await
    }

    async fn update_transaction(
        &self,
        credential: &Credential,
        id: TransactionId,
        fields: &TransactionFields,
    ) -> Result<Transaction, ClientError> {
        let request = self
            .client
            .put(self.url(&format_endpoint(endpoints::TRANSACTION, id)))
            .bearer_auth(credential.token())
            .json(fields);

        send(request).await
    }

    async fn delete_transaction(
        &self,
        credential: &Credential,
        id: TransactionId,
    ) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&format_endpoint(endpoints::TRANSACTION, id)))
            .bearer_auth(credential.token());

        send::<MessageBody>(request).await.map(|_| ())
    }
}

#[async_trait]
impl AuthApi for HttpApi {
    async fn register(
        &self,
        registration: &Registration,
    ) -> Result<AuthenticatedUser, ClientError> {
        send(self.client.post(self.url(endpoints::USERS)).json(registration)).await
    }

    async fn log_in(
        &self,
        credentials: &LogInCredentials,
    ) -> Result<AuthenticatedUser, ClientError> {
        send(self.client.post(self.url(endpoints::LOG_IN)).json(credentials)).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
    let response = request.send().await.map_err(map_transport_error)?;

    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }

    serde_json::from_slice(&body)
        .map_err(|error| ClientError::Transport(format!("invalid response body: {error}")))
}

fn map_transport_error(error: reqwest::Error) -> ClientError {
    ClientError::Transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<MessageBody>(body)
        .ok()
        .map(|body| body.message);

    tracing::debug!("Request failed with {status}: {message:?}");

    ClientError::Server {
        status: status.as_u16(),
        message,
    }
}
