use tokio::sync::RwLock;

use crate::error::StoreError;

use super::account::db::AccountStore;
use super::account::Account;
use super::docente::db::DocenteStore;
use super::docente::Docente;

/// Process-local stand-in for both MongoDB collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docentes: RwLock<Vec<Docente>>,
    accounts: RwLock<Vec<Account>>,
}

impl MemoryStore {
    pub async fn docente_count(&self) -> usize {
        self.docentes.read().await.len()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[rocket::async_trait]
impl DocenteStore for MemoryStore {
    async fn find_docente_by_email(&self, email: &str) -> Result<Option<Docente>, StoreError> {
        let docentes = self.docentes.read().await;
        Ok(docentes.iter().find(|it| it.email == email).cloned())
    }

    async fn insert_docente(&self, docente: &Docente) -> Result<(), StoreError> {
        self.docentes.write().await.push(docente.clone());
        Ok(())
    }
}

#[rocket::async_trait]
impl AccountStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|it| it.email == email).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.accounts.write().await.push(account.clone());
        Ok(())
    }
}
