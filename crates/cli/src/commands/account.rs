//! Sign-in, registration and sign-out.

use secrecy::SecretString;
use shopfront_client::api::{Address, Registration};
use shopfront_client::{Error, Result};
use shopfront_core::Email;

use crate::app::App;
use crate::output;

fn email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| Error::InvalidInput(format!("email: {e}")))
}

/// `shopfront login -e <email> -p <password>`
///
/// The remote cart becomes authoritative once signed in, so the local cart
/// is refreshed from it.
pub async fn login(app: &App, email_raw: &str, password: String) -> Result<()> {
    let email = email(email_raw)?;
    let session = app.api.login(&email, &SecretString::from(password)).await?;
    output::message(&format!("Signed in as {email} ({}).", session.customer_id));

    let outcome = app.cart.fetch_and_reconcile().await?;
    output::outcome(outcome);
    Ok(())
}

/// `shopfront register ...`
pub async fn register(
    app: &App,
    name: String,
    email_raw: &str,
    password: String,
    phone_number: String,
    address: Address,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    let registration = Registration {
        name,
        email: email(email_raw)?,
        password: SecretString::from(password),
        phone_number,
        address,
    };
    app.api.register(&registration).await?;
    output::message("Account created. Sign in with `shopfront login`.");
    Ok(())
}

/// `shopfront logout`
#[allow(clippy::unnecessary_wraps)]
pub fn logout(app: &App) -> Result<()> {
    if app.api.logout().is_some() {
        app.cart.clear();
        output::message("Signed out.");
    } else {
        output::message("Not signed in.");
    }
    Ok(())
}
