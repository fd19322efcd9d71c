use mongodb::Database;

use crate::data::filter;
use crate::error::StoreError;

use super::{Docente, DOCENTE_COLLECTION_NAME};

/// Collection of submitted registration records.
///
/// Implementations only guarantee atomicity of each call on its own; a lookup
/// followed by an insert may race with another submission.
#[rocket::async_trait]
pub trait DocenteStore: Send + Sync {
    async fn find_docente_by_email(&self, email: &str) -> Result<Option<Docente>, StoreError>;

    async fn insert_docente(&self, docente: &Docente) -> Result<(), StoreError>;
}

#[rocket::async_trait]
impl DocenteStore for Database {
    async fn find_docente_by_email(&self, email: &str) -> Result<Option<Docente>, StoreError> {
        Ok(self
            .collection::<Docente>(DOCENTE_COLLECTION_NAME)
            .find_one(filter::by_email(email), None)
            .await?)
    }

    async fn insert_docente(&self, docente: &Docente) -> Result<(), StoreError> {
        self.collection::<Docente>(DOCENTE_COLLECTION_NAME)
            .insert_one(docente, None)
            .await?;
        Ok(())
    }
}
