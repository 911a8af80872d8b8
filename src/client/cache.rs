//! A client side mirror of the user's transactions and statistics.
//!
//! All state changes go through [CacheState::reduce]. A mutation is only
//! applied locally once the server has confirmed it, after which the
//! statistics are always fetched again rather than patched.

use crate::{
    StatsSnapshot, Transaction, TransactionFields, TransactionId,
    client::{ClientError, Credential, api::TransactionApi},
};

/// The cached data and the status of the last operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    /// The user's transactions, in the order the server last returned them
    /// with local changes applied since.
    pub transactions: Vec<Transaction>,
    /// The statistics last fetched from the server.
    pub stats: StatsSnapshot,
    /// Whether an operation is in progress.
    pub is_loading: bool,
    /// The message of the last failed operation.
    pub error: Option<String>,
}

/// The state transitions of the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheAction {
    /// An operation started.
    Started,
    /// The server returned the full transaction list.
    TransactionsLoaded(Vec<Transaction>),
    /// The server returned fresh statistics.
    StatsLoaded(StatsSnapshot),
    /// The server created a transaction.
    Added(Transaction),
    /// The server deleted a transaction.
    Removed(TransactionId),
    /// The server updated a transaction.
    Updated(Transaction),
    /// The operation failed with a message for the user.
    Failed(String),
    /// The operation completed successfully.
    Finished,
    /// The user logged out.
    Reset,
}

impl CacheState {
    /// Apply `action` to the state.
    pub fn reduce(mut self, action: CacheAction) -> Self {
        match action {
            CacheAction::Started => {
                self.is_loading = true;
                self.error = None;
            }
            CacheAction::TransactionsLoaded(transactions) => self.transactions = transactions,
            CacheAction::StatsLoaded(stats) => self.stats = stats,
            CacheAction::Added(transaction) => self.transactions.insert(0, transaction),
            CacheAction::Removed(id) => self.transactions.retain(|transaction| transaction.id != id),
            CacheAction::Updated(updated) => {
                if let Some(transaction) = self
                    .transactions
                    .iter_mut()
                    .find(|transaction| transaction.id == updated.id)
                {
                    *transaction = updated;
                }
            }
            CacheAction::Failed(message) => {
                self.is_loading = false;
                self.error = Some(message);
            }
            CacheAction::Finished => self.is_loading = false,
            CacheAction::Reset => return Self::default(),
        }

        self
    }
}

/// Keeps a [CacheState] in sync with the server through `A`.
pub struct TransactionCache<A> {
    api: A,
    credential: Option<Credential>,
    state: CacheState,
}

impl<A: TransactionApi> TransactionCache<A> {
    /// Create an empty cache with no logged in user.
    pub fn new(api: A) -> Self {
        Self {
            api,
            credential: None,
            state: CacheState::default(),
        }
    }

    /// The current state.
    pub fn state(&self) -> &CacheState {
        &self.state
    }

    /// The API the cache calls.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Switch to the user identified by `credential`.
    ///
    /// The cache is reset to its defaults whenever the credential changes,
    /// so one user's data is never shown under another's credential. With
    /// `Some` the transactions and statistics are then loaded for the user.
    ///
    /// # Errors
    /// Returns the first error from loading the user's data.
    pub async fn set_credential(&mut self, credential: Option<Credential>) -> Result<(), ClientError> {
        if self.credential != credential {
            self.dispatch(CacheAction::Reset);
        }
        self.credential = credential;

        if self.credential.is_none() {
            return Ok(());
        }

        self.refresh_transactions().await?;
        self.refresh_stats().await
    }

    /// Replace the cached transactions with the server's list.
    ///
    /// # Errors
    /// Returns the error from the server, which is also stored in the state.
    pub async fn refresh_transactions(&mut self) -> Result<(), ClientError> {
        let credential = self.require_credential("Error fetching transactions")?;
        self.dispatch(CacheAction::Started);

        match self.api.list_transactions(&credential).await {
            Ok(transactions) => {
                self.dispatch(CacheAction::TransactionsLoaded(transactions));
                self.dispatch(CacheAction::Finished);
                Ok(())
            }
            Err(error) => Err(self.fail(error, "Error fetching transactions")),
        }
    }

    /// Replace the cached statistics with the server's.
    ///
    /// # Errors
    /// Returns the error from the server, which is also stored in the state.
    pub async fn refresh_stats(&mut self) -> Result<(), ClientError> {
        let credential = self.require_credential("Error fetching stats")?;
        self.dispatch(CacheAction::Started);
        self.reconcile_stats(&credential).await
    }

    /// Create a transaction, prepend it to the cache and refresh the statistics.
    ///
    /// # Errors
    /// Returns the error from the server. If the transaction could not be
    /// created the cached transactions are unchanged.
    pub async fn add(&mut self, fields: TransactionFields) -> Result<Transaction, ClientError> {
        let credential = self.require_credential("Error adding transaction")?;
        self.dispatch(CacheAction::Started);

        match self.api.create_transaction(&credential, &fields).await {
            Ok(transaction) => {
                self.dispatch(CacheAction::Added(transaction.clone()));
                self.reconcile_stats(&credential).await?;
                Ok(transaction)
            }
            Err(error) => Err(self.fail(error, "Error adding transaction")),
        }
    }

    /// Delete a transaction, drop it from the cache and refresh the statistics.
    ///
    /// # Errors
    /// Returns the error from the server. If the transaction could not be
    /// deleted the cached transactions are unchanged.
    pub async fn remove(&mut self, id: TransactionId) -> Result<(), ClientError> {
        let credential = self.require_credential("Error deleting transaction")?;
        self.dispatch(CacheAction::Started);

        match self.api.delete_transaction(&credential, id).await {
            Ok(()) => {
                self.dispatch(CacheAction::Removed(id));
                self.reconcile_stats(&credential).await
            }
            Err(error) => Err(self.fail(error, "Error deleting transaction")),
        }
    }

    /// Update a transaction, replace it in the cache and refresh the statistics.
    ///
    /// # Errors
    /// Returns the error from the server. If the transaction could not be
    /// updated the cached transactions are unchanged.
    pub async fn update(
        &mut self,
        id: TransactionId,
        fields: TransactionFields,
    ) -> Result<Transaction, ClientError> {
        let credential = self.require_credential("Error updating transaction")?;
        self.dispatch(CacheAction::Started);

        match self.api.update_transaction(&credential, id, &fields).await {
            Ok(transaction) => {
                self.dispatch(CacheAction::Updated(transaction.clone()));
                self.reconcile_stats(&credential).await?;
                Ok(transaction)
            }
            Err(error) => Err(self.fail(error, "Error updating transaction")),
        }
    }

    async fn reconcile_stats(&mut self, credential: &Credential) -> Result<(), ClientError> {
        match self.api.get_stats(credential).await {
            Ok(stats) => {
                self.dispatch(CacheAction::StatsLoaded(stats));
                self.dispatch(CacheAction::Finished);
                Ok(())
            }
            Err(error) => Err(self.fail(error, "Error fetching stats")),
        }
    }

    fn require_credential(&mut self, fallback: &str) -> Result<Credential, ClientError> {
        match self.credential.clone() {
            Some(credential) => Ok(credential),
            None => Err(self.fail(ClientError::NotAuthenticated, fallback)),
        }
    }

    fn fail(&mut self, error: ClientError, fallback: &str) -> ClientError {
        tracing::debug!("{fallback}: {error}");
        self.dispatch(CacheAction::Failed(error.message_or(fallback)));
        error
    }

    fn dispatch(&mut self, action: CacheAction) {
        self.state = std::mem::take(&mut self.state).reduce(action);
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use time::macros::date;

    use crate::{
        StatsSnapshot, Transaction, TransactionFields, TransactionId, UserID, compute_stats,
        client::{ClientError, Credential, api::TransactionApi},
    };

    /// An in-memory stand-in for the transaction endpoints.
    #[derive(Default)]
    pub(crate) struct FakeTransactionApi {
        pub(crate) transactions: Mutex<Vec<Transaction>>,
        pub(crate) fail_list: AtomicBool,
        pub(crate) fail_mutations: AtomicBool,
        pub(crate) fail_stats: AtomicBool,
        next_id: Mutex<TransactionId>,
    }

    impl FakeTransactionApi {
        pub(crate) fn with_transactions(transactions: Vec<Transaction>) -> Self {
            let next_id = transactions.iter().map(|t| t.id).max().unwrap_or(0);

            Self {
                transactions: Mutex::new(transactions),
                next_id: Mutex::new(next_id),
                ..Default::default()
            }
        }

        fn rejection() -> ClientError {
            ClientError::Server {
                status: 500,
                message: Some("database is unavailable".to_owned()),
            }
        }
    }

    #[async_trait]
    impl TransactionApi for FakeTransactionApi {
        async fn list_transactions(
            &self,
            _credential: &Credential,
        ) -> Result<Vec<Transaction>, ClientError> {
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection reset".to_owned()));
            }

            Ok(self.transactions.lock().unwrap().clone())
        }

        async fn get_stats(&self, _credential: &Credential) -> Result<StatsSnapshot, ClientError> {
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("connection reset".to_owned()));
            }

            Ok(compute_stats(&self.transactions.lock().unwrap()))
        }

        async fn create_transaction(
            &self,
            _credential: &Credential,
            fields: &TransactionFields,
        ) -> Result<Transaction, ClientError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }

            let new_transaction = fields
                .clone()
                .into_new_transaction(date!(2025 - 06 - 01))
                .map_err(|error| ClientError::Server {
                    status: 400,
                    message: Some(error.to_string()),
                })?;
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let transaction = Transaction {
                id: *next_id,
                user: UserID::new(1),
                title: new_transaction.title,
                amount: new_transaction.amount,
                kind: new_transaction.kind,
                date: new_transaction.date,
                reference: new_transaction.reference,
            };
            self.transactions.lock().unwrap().insert(0, transaction.clone());

            Ok(transaction)
        }

        async fn update_transaction(
            &self,
            _credential: &Credential,
            id: TransactionId,
            fields: &TransactionFields,
        ) -> Result<Transaction, ClientError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }

            let mut transactions = self.transactions.lock().unwrap();
            let transaction = transactions
                .iter_mut()
                .find(|transaction| transaction.id == id)
                .ok_or(ClientError::Server {
                    status: 404,
                    message: Some("Transaction not found".to_owned()),
                })?;
            fields
                .clone()
                .apply_to(transaction)
                .map_err(|error| ClientError::Server {
                    status: 400,
                    message: Some(error.to_string()),
                })?;

            Ok(transaction.clone())
        }

        async fn delete_transaction(
            &self,
            _credential: &Credential,
            id: TransactionId,
        ) -> Result<(), ClientError> {
            if self.fail_mutations.load(Ordering::SeqCst) {
                return Err(Self::rejection());
            }

            let mut transactions = self.transactions.lock().unwrap();
            let count = transactions.len();
            transactions.retain(|transaction| transaction.id != id);

            if transactions.len() == count {
                return Err(ClientError::Server {
                    status: 404,
                    message: Some("Transaction not found".to_owned()),
                });
            }

            Ok(())
        }
    }
}
