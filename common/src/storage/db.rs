use crate::error::AppError;

use super::types::{
    processing_task::ProcessingTask, qa_pair::QaPair, transform_detail::TransformDetail,
    StoredObject,
};
use std::ops::Deref;
use surrealdb::{
    engine::any::{connect, Any},
    opt::auth::Root,
    Error, Surreal,
};

#[derive(Clone)]
pub struct SurrealDbClient {
    pub client: Surreal<Any>,
}

impl SurrealDbClient {
    /// # Initialize a new database client
    ///
    /// # Arguments
    /// * `address` - any engine address understood by `surrealdb::engine::any`
    ///
    /// # Returns
    /// * `SurrealDbClient` signed in and scoped to the namespace/database
    pub async fn new(
        address: &str,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str,
    ) -> Result<Self, Error> {
        let db = connect(address).await?;

        db.signin(Root { username, password }).await?;

        db.use_ns(namespace).use_db(database).await?;

        Ok(SurrealDbClient { client: db })
    }

    pub async fn ensure_initialized(&self) -> Result<(), AppError> {
        self.build_indexes().await?;
        Ok(())
    }

    /// Detail and QA rows are always read by owning task, so both tables are indexed on it.
    pub async fn build_indexes(&self) -> Result<(), Error> {
        let statements = [
            format!(
                "DEFINE INDEX IF NOT EXISTS idx_task_start ON {} FIELDS start_time",
                ProcessingTask::table_name()
            ),
            format!(
                "DEFINE INDEX IF NOT EXISTS idx_detail_task_stage ON {} FIELDS task_id, stage",
                TransformDetail::table_name()
            ),
            format!(
                "DEFINE INDEX IF NOT EXISTS idx_qa_task ON {} FIELDS task_id",
                QaPair::table_name()
            ),
        ];

        for statement in statements {
            self.client.query(statement).await?.check()?;
        }

        Ok(())
    }

    /// Operation to store a object in SurrealDB, requires the struct to implement StoredObject
    ///
    /// # Arguments
    /// * `item` - The item to be stored
    ///
    /// # Returns
    /// * `Result` - Item or Error
    pub async fn store_item<T>(&self, item: T) -> Result<Option<T>, Error>
    where
        T: StoredObject + Send + Sync + 'static,
    {
        self.client
            .create((T::table_name(), item.get_id().to_owned()))
            .content(item)
            .await
    }

    /// Operation to retrieve a single object by its ID
    ///
    /// # Returns
    /// * `Result<Option<T>, Error>` - The found item or Error
    pub async fn get_item<T>(&self, id: &str) -> Result<Option<T>, Error>
    where
        T: for<'de> StoredObject,
    {
        self.client.select((T::table_name(), id)).await
    }

    pub async fn delete_item<T>(&self, id: &str) -> Result<Option<T>, Error>
    where
        T: for<'de> StoredObject,
    {
        self.client.delete((T::table_name(), id)).await
    }
}

impl Deref for SurrealDbClient {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl SurrealDbClient {
    /// Create an in-memory SurrealDB client for testing.
    pub async fn memory(namespace: &str, database: &str) -> Result<Self, Error> {
        let db = connect("mem://").await?;

        db.use_ns(namespace).use_db(database).await?;

        Ok(SurrealDbClient { client: db })
    }
}
