use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

use super::stage::StageKind;

stored_object!(TransformDetail, "transform_detail", {
    task_id: String,
    file_name: String,
    stage: StageKind,
    pre_content: String,
    post_content: String,
    match_count: usize
});

#[derive(Debug, Deserialize)]
pub(crate) struct FileNameRow {
    pub(crate) file_name: String,
}

/// Distinct file names in first-seen order.
pub(crate) fn distinct_file_names(rows: Vec<FileNameRow>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for row in rows {
        if !names.contains(&row.file_name) {
            names.push(row.file_name);
        }
    }
    names
}

impl TransformDetail {
    pub fn new(
        task_id: &str,
        file_name: &str,
        stage: StageKind,
        pre_content: &str,
        post_content: &str,
        match_count: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            task_id: task_id.to_string(),
            file_name: file_name.to_string(),
            stage,
            pre_content: pre_content.to_string(),
            post_content: post_content.to_string(),
            match_count,
            created_at: now,
            updated_at: now,
        }
    }

    pub async fn store(self, db: &SurrealDbClient) -> Result<(), AppError> {
        db.store_item(self).await?;
        Ok(())
    }

    /// File names that produced at least one record for `stage`, in first-seen order.
    pub async fn list_file_names(
        task_id: &str,
        stage: StageKind,
        db: &SurrealDbClient,
    ) -> Result<Vec<String>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT file_name, created_at FROM type::table($table) \
                 WHERE task_id = $task_id AND stage = $stage ORDER BY created_at ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .bind(("stage", stage))
            .await?;

        let rows: Vec<FileNameRow> = result.take(0)?;
        Ok(distinct_file_names(rows))
    }

    pub async fn top_n_for_file(
        task_id: &str,
        stage: StageKind,
        file_name: &str,
        limit: usize,
        db: &SurrealDbClient,
    ) -> Result<Vec<TransformDetail>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT * FROM type::table($table) \
                 WHERE task_id = $task_id AND stage = $stage AND file_name = $file_name \
                 ORDER BY created_at ASC LIMIT $limit",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .bind(("stage", stage))
            .bind(("file_name", file_name.to_string()))
            .bind(("limit", limit))
            .await?;

        let details: Vec<TransformDetail> = result.take(0)?;
        Ok(details)
    }

    pub async fn list_for_task(
        task_id: &str,
        db: &SurrealDbClient,
    ) -> Result<Vec<TransformDetail>, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT * FROM type::table($table) WHERE task_id = $task_id ORDER BY created_at ASC",
            )
            .bind(("table", Self::table_name()))
            .bind(("task_id", task_id.to_string()))
            .await?;

        let details: Vec<TransformDetail> = result.take(0)?;
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn file_names_are_distinct_per_stage() {
        let db = memory_db().await;
        db.ensure_initialized().await.expect("indexes");

        for (file, stage) in [
            ("b.pdf", StageKind::RemoveEmail),
            ("a.pdf", StageKind::RemoveEmail),
            ("b.pdf", StageKind::RemoveEmail),
            ("c.pdf", StageKind::SpaceStandardization),
        ] {
            TransformDetail::new("task-1", file, stage, "pre", "post", 1)
                .store(&db)
                .await
                .expect("store");
        }
        TransformDetail::new("task-2", "z.pdf", StageKind::RemoveEmail, "pre", "post", 1)
            .store(&db)
            .await
            .expect("store other task");

        let names = TransformDetail::list_file_names("task-1", StageKind::RemoveEmail, &db)
            .await
            .expect("names");
        assert_eq!(names, vec!["b.pdf".to_string(), "a.pdf".to_string()]);

        let none = TransformDetail::list_file_names("task-1", StageKind::RemoveHtmlTag, &db)
            .await
            .expect("names");
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn top_n_limits_rows_for_one_file() {
        let db = memory_db().await;

        for idx in 0..5 {
            TransformDetail::new(
                "task-1",
                "doc.pdf",
                StageKind::RemoveInvisibleCharacters,
                &format!("pre-{idx}"),
                &format!("post-{idx}"),
                1,
            )
            .store(&db)
            .await
            .expect("store");
        }

        let top = TransformDetail::top_n_for_file(
            "task-1",
            StageKind::RemoveInvisibleCharacters,
            "doc.pdf",
            3,
            &db,
        )
        .await
        .expect("top n");

        assert_eq!(top.len(), 3);
        assert!(top.iter().all(|d| d.file_name == "doc.pdf"));
        assert!(top
            .iter()
            .all(|d| d.stage == StageKind::RemoveInvisibleCharacters));
        assert_eq!(
            TransformDetail::list_for_task("task-1", &db)
                .await
                .expect("all")
                .len(),
            5
        );
    }

    #[test]
    fn distinct_file_names_keeps_first_occurrence() {
        let rows = ["x", "y", "x", "z", "y"]
            .into_iter()
            .map(|name| FileNameRow {
                file_name: name.to_string(),
            })
            .collect();
        assert_eq!(distinct_file_names(rows), vec!["x", "y", "z"]);
    }
}
