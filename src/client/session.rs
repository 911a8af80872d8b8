//! The logged in user on the client.

use crate::{
    AuthenticatedUser, LogInCredentials, Registration,
    client::{ClientError, Credential, api::AuthApi},
};

/// Holds the logged in user, if any, and the outcome of the last
/// registration or log-in attempt.
pub struct Session<A> {
    api: A,
    user: Option<AuthenticatedUser>,
    is_loading: bool,
    error: Option<String>,
}

impl<A: AuthApi> Session<A> {
    /// Create a logged out session.
    pub fn new(api: A) -> Self {
        Self {
            api,
            user: None,
            is_loading: false,
            error: None,
        }
    }

    /// Create a session for a user restored from storage.
    pub fn with_user(api: A, user: AuthenticatedUser) -> Self {
        Self {
            user: Some(user),
            ..Self::new(api)
        }
    }

    /// The logged in user.
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    /// The credential to pass to API calls for the logged in user.
    pub fn credential(&self) -> Option<Credential> {
        self.user.as_ref().map(|user| Credential::new(&user.token))
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Whether a request is in progress.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The message of the last failed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Register a new user and log them in.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if the
    /// passwords differ, otherwise the error from the server.
    pub async fn register(
        &mut self,
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<AuthenticatedUser, ClientError> {
        self.error = None;

        if password != confirm_password {
            return Err(self.reject("Passwords do not match"));
        }

        let registration = Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
        };

        self.is_loading = true;
        let result = self.api.register(&registration).await;
        self.finish(result, "Registration failed")
    }

    /// Log in an existing user.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if a field is
    /// empty, otherwise the error from the server.
    pub async fn log_in(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedUser, ClientError> {
        self.error = None;

        if email.is_empty() || password.is_empty() {
            return Err(self.reject("Please fill in all fields"));
        }

        let credentials = LogInCredentials {
            email: email.to_owned(),
            password: password.to_owned(),
        };

        self.is_loading = true;
        let result = self.api.log_in(&credentials).await;
        self.finish(result, "Login failed")
    }

    /// Forget the logged in user.
    pub fn log_out(&mut self) {
        self.user = None;
        self.error = None;
    }

    fn reject(&mut self, message: &str) -> ClientError {
        self.error = Some(message.to_owned());
        ClientError::Invalid(message.to_owned())
    }

    fn finish(
        &mut self,
        result: Result<AuthenticatedUser, ClientError>,
        fallback: &str,
    ) -> Result<AuthenticatedUser, ClientError> {
        self.is_loading = false;

        match result {
            Ok(user) => {
                tracing::debug!("Logged in as user {}", user.id);
                self.user = Some(user.clone());
                Ok(user)
            }
            Err(error) => {
                self.error = Some(error.message_or(fallback));
                Err(error)
            }
        }
    }
}
