use mongodb::Database;
use utoipa::ToSchema;

use crate::data::filter;
use crate::error::StoreError;

use super::{Account, ACCOUNT_COLLECTION_NAME};

pub mod problem {
    use crate::resp::problem::Problem;
    use rocket::http::Status;

    #[inline]
    pub fn already_registered(email: impl ToString) -> Problem {
        Problem::new_untyped(Status::Conflict, "El correo electrónico ya está registrado.")
            .insert_str("email", email)
            .to_owned()
    }

    #[inline]
    pub fn missing_credentials() -> Problem {
        Problem::new_untyped(Status::BadRequest, "Correo y contraseña son requeridos.")
    }

    #[inline]
    pub fn bad_login() -> Problem {
        Problem::new_untyped(Status::Unauthorized, "Correo o contraseña inválidos.")
    }

    #[inline]
    pub fn registration_failed() -> Problem {
        Problem::new_untyped(
            Status::InternalServerError,
            "Ocurrió un error durante el registro. Intente de nuevo.",
        )
    }

    #[inline]
    pub fn login_failed() -> Problem {
        Problem::new_untyped(
            Status::InternalServerError,
            "Ocurrió un error al iniciar sesión. Intente de nuevo.",
        )
    }
}

#[derive(Clone, Default, FromForm, ToSchema)]
pub struct CredentialsData {
    #[field(default = String::new())]
    #[schema(format = "email")]
    pub email: String,
    #[field(default = String::new())]
    #[schema(format = "password")]
    pub password: String,
}

impl std::fmt::Debug for CredentialsData {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credentials:{}", self.email)
    }
}

/// Collection of login credentials, keyed by email.
#[rocket::async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;
}

#[rocket::async_trait]
impl AccountStore for Database {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .collection::<Account>(ACCOUNT_COLLECTION_NAME)
            .find_one(filter::by_email(email), None)
            .await?)
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.collection::<Account>(ACCOUNT_COLLECTION_NAME)
            .insert_one(account, None)
            .await?;
        Ok(())
    }
}
