use std::sync::Arc;

use mongodb::Client;

use crate::config::{Config, StoreBackend};
use crate::error::BackendError;

use self::account::db::AccountStore;
use self::docente::db::DocenteStore;
use self::memory::MemoryStore;

pub mod account;
pub mod docente;
pub mod memory;

pub mod filter {
    use bson::{doc, Document};

    #[inline]
    pub fn by_email(email: impl AsRef<str>) -> Document {
        doc! { "email": email.as_ref() }
    }
}

/// Both collections the portal writes to.
#[derive(Clone)]
pub struct Stores {
    pub docentes: Arc<dyn DocenteStore>,
    pub accounts: Arc<dyn AccountStore>,
}

impl Stores {
    pub async fn connect(c: &Config) -> Result<Stores, BackendError> {
        match c.store {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store. Registrations won't survive a restart.");
                Ok(Stores::memory())
            }
            StoreBackend::MongoDb => {
                tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
                let client = Client::with_uri_str(c.mongodb_uri.as_str()).await?;

                tracing::info!("Using MongoDB database: {}", c.mongodb_db);
                let db = client.database(c.mongodb_db.as_str());

                if let Err(e) = db.list_collection_names(None).await {
                    tracing::error!("Unable to connect to MongoDB.");
                    return Err(e.into());
                }

                Ok(Stores {
                    docentes: Arc::new(db.clone()),
                    accounts: Arc::new(db),
                })
            }
        }
    }

    pub fn memory() -> Stores {
        let store = Arc::new(MemoryStore::default());
        Stores {
            docentes: store.clone(),
            accounts: store,
        }
    }
}
