use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

use super::transform_detail::{distinct_file_names, FileNameRow};

stored_object!(QaPair, "qa_pair", {
    task_id: String,
    file_name: String,
    question: String,
    answer: String
});

impl QaPair {
    pub fn new(task_id: &str, file_name: &str, question: &str, answer: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            task_id: task_id.to_string(),
            file_name: file_name.to_string(),
            question: question.to_string(),
            answer: answer.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn store(self, db: &SurrealDbClient) -> Result<(), AppError> {
        db.store_item(self).await?;
        Ok(())
    }

    pub async fn list_file_names(
        task_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<String>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT file_name, created_at FROM type::table($table) \
                 WHERE task_id = $task_id ORDER BY created_at ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .await?;

        let rows: Vec<FileNameRow> = result.take(0)?;
        Ok(distinct_file_names(rows))
    }

    pub async fn top_n_for_file(
        task_id: &str,
        file_name: &str,
        limit: usize,
        db: &SurrealDbClient,
    ) -> Result<Vec<QaPair>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT * FROM type::table($table) \
                 WHERE task_id = $task_id AND file_name = $file_name \
                 ORDER BY created_at ASC LIMIT $limit",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .bind(("file_name", file_name.to_string()))
            .bind(("limit", limit))
            .await?;

        let pairs: Vec<QaPair> = result.take(0)?;
        Ok(pairs)
    }

    pub async fn list_for_task(task_id: &str, db: &SurrealDbClient) -> Result<Vec<QaPair>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE task_id = $task_id ORDER BY created_at ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .await?;

        let pairs: Vec<QaPair> = result.take(0)?;
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pairs_are_grouped_and_limited_per_file() {
        let database = Uuid::new_v4().to_string();
        let db = SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb");

        for idx in 0..4 {
            QaPair::new("task-1", "one.pdf", &format!("Q{idx}?"), "A.")
                .store(&db)
                .await
                .expect("store");
        }
        QaPair::new("task-1", "two.pdf", "Q?", "A.")
            .store(&db)
            .await
            .expect("store");

        let names = QaPair::list_file_names("task-1", &db).await.expect("names");
        assert_eq!(names, vec!["one.pdf".to_string(), "two.pdf".to_string()]);

        let top = QaPair::top_n_for_file("task-1", "one.pdf", 2, &db)
            .await
            .expect("top");
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|p| p.file_name == "one.pdf"));

        assert!(QaPair::list_for_task("task-2", &db)
            .await
            .expect("other task")
            .is_empty());
    }
}
