use std::sync::Arc;

use thiserror::Error;

use crate::data::account::db::AccountStore;
use crate::data::account::{Account, PasswordHasher};
use crate::error::StoreError;
use crate::resp::session::Session;
use crate::util::is_filled;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email '{0}' already has an account")]
    AlreadyRegistered(String),
    #[error("email or password is wrong")]
    InvalidCredentials,
    #[error("email and password are required")]
    MissingFields,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates accounts and checks credentials against the account store.
#[derive(Clone)]
pub struct AuthGate {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
}

impl AuthGate {
    pub fn new(accounts: Arc<dyn AccountStore>, hasher: PasswordHasher) -> AuthGate {
        AuthGate { accounts, hasher }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        if self.accounts.find_account_by_email(email).await?.is_some() {
            return Err(AuthError::AlreadyRegistered(email.to_string()));
        }

        let account = Account::new(email, password, &self.hasher);
        self.accounts.insert_account(&account).await?;
        tracing::info!("account created");

        Ok(())
    }

    /// Checks the credentials and starts `session` for the account on success.
    ///
    /// A failed login leaves `session` as it was.
    #[tracing::instrument(skip(self, session, password))]
    pub async fn login(
        &self,
        session: &mut Session,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        if !is_filled(email) || !is_filled(password) {
            return Err(AuthError::MissingFields);
        }

        let account = self
            .accounts
            .find_account_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !account.accepts(password, &self.hasher) {
            tracing::debug!("password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        session.begin(account.email.clone());
        Ok(account.email)
    }
}

impl std::fmt::Debug for AuthGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGate")
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    fn gate() -> (AuthGate, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        let gate = AuthGate::new(store.clone(), PasswordHasher::new([5; 16], 4));
        (gate, store)
    }

    #[rocket::async_test]
    async fn unknown_email_is_invalid_and_session_stays_empty() {
        let (gate, _) = gate();
        let mut session = Session::default();

        let result = gate.login(&mut session, "a@b.com", "pw").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert_eq!(session, Session::default());
    }

    #[rocket::async_test]
    async fn registered_account_can_log_in() {
        let (gate, _) = gate();
        gate.register("a@b.com", "pw").await.expect("new account");

        let mut session = Session::default();
        let email = gate
            .login(&mut session, "a@b.com", "pw")
            .await
            .expect("valid credentials");

        assert_eq!(email, "a@b.com");
        assert_eq!(session.email(), Some("a@b.com"));
    }

    #[rocket::async_test]
    async fn wrong_password_is_invalid() {
        let (gate, _) = gate();
        gate.register("a@b.com", "pw").await.expect("new account");

        let mut session = Session::default();
        let result = gate.login(&mut session, "a@b.com", "PW").await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(!session.is_authenticated());
    }

    #[rocket::async_test]
    async fn empty_fields_are_missing() {
        let (gate, _) = gate();
        let mut session = Session::default();

        for (email, password) in [("", "pw"), ("a@b.com", ""), ("", "")] {
            let result = gate.login(&mut session, email, password).await;
            assert!(matches!(result, Err(AuthError::MissingFields)));
        }
    }

    #[rocket::async_test]
    async fn second_registration_is_rejected() {
        let (gate, store) = gate();
        gate.register("a@b.com", "pw").await.expect("new account");

        let result = gate.register("a@b.com", "otra").await;

        assert!(matches!(result, Err(AuthError::AlreadyRegistered(_))));
        assert_eq!(store.account_count().await, 1);
    }

    #[rocket::async_test]
    async fn stored_credential_is_not_the_password() {
        let (gate, store) = gate();
        gate.register("a@b.com", "pw").await.expect("new account");

        let account = store
            .find_account_by_email("a@b.com")
            .await
            .expect("lookup")
            .expect("account exists");
        let stored = bson::to_document(&account).expect("serializable");

        assert_ne!(stored.get_str("password_hash").ok(), Some("pw"));
    }
}
