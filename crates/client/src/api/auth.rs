//! Account endpoints.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use shopfront_core::Email;
use tracing::{info, instrument};

use super::{ApiClient, ApiError, LoginRequest, LoginResponse, RegisterRequest, Registration};
use crate::session::Session;

impl ApiClient {
    /// Sign in and install the returned session on this client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unauthorized` for bad credentials, or another error
    /// if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &SecretString) -> Result<Session, ApiError> {
        let request = self
            .request(Method::POST, &["auth", "login"])?
            .json(&LoginRequest {
                email,
                password: password.expose_secret(),
            });
        let response: LoginResponse = self.execute_json(request).await?;

        let session = Session::new(response.id, SecretString::from(response.token));
        self.inner.session.sign_in(session.clone());
        info!(customer_id = %session.customer_id, "Signed in");
        Ok(session)
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration or the
    /// request fails.
    #[instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<(), ApiError> {
        let request = self
            .request(Method::POST, &["auth", "register"])?
            .json(&RegisterRequest {
                name: &registration.name,
                email: &registration.email,
                password: registration.password.expose_secret(),
                phone_number: &registration.phone_number,
                address: [&registration.address],
            });
        self.execute(request).await?;
        info!("Account registered");
        Ok(())
    }

    /// Drop the current session, returning it if there was one.
    pub fn logout(&self) -> Option<Session> {
        let session = self.inner.session.sign_out();
        if let Some(session) = &session {
            info!(customer_id = %session.customer_id, "Signed out");
        }
        session
    }
}
