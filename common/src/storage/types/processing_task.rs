use state_machines::state_machine;
use surrealdb::sql::Datetime as SurrealDatetime;
use uuid::Uuid;

use crate::{error::AppError, storage::db::SurrealDbClient, stored_object};

use super::{
    qa_pair::QaPair,
    stage::{StageConfigEntry, StageSet},
    transform_detail::TransformDetail,
};

pub const AUDIT_USER: &str = "admin";
pub const CREATE_PROGRAM: &str = "data-process-task-create";
pub const UPDATE_STATUS_PROGRAM: &str = "data-process-task-update-status";

#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Processing,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Processing => "processing",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Processing)
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: TaskStatusMachine,
        initial: Processing,
        states: [Processing, Succeeded, Failed],
        events {
            succeed {
                transition: { from: Processing, to: Succeeded }
            }
            fail {
                transition: { from: Processing, to: Failed }
            }
        }
    }

    pub(super) fn processing() -> TaskStatusMachine<(), Processing> {
        TaskStatusMachine::new(())
    }
}

fn invalid_transition(from: TaskStatus, to: TaskStatus) -> AppError {
    AppError::Validation(format!(
        "Invalid task status transition: {} -> {}",
        from.as_str(),
        to.as_str()
    ))
}

fn check_transition(from: TaskStatus, to: TaskStatus) -> Result<(), AppError> {
    use lifecycle::processing;
    match (from, to) {
        (TaskStatus::Processing, TaskStatus::Succeeded) => processing()
            .succeed()
            .map(|_| ())
            .map_err(|_| invalid_transition(from, to)),
        (TaskStatus::Processing, TaskStatus::Failed) => processing()
            .fail()
            .map(|_| ())
            .map_err(|_| invalid_transition(from, to)),
        _ => Err(invalid_transition(from, to)),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileReference {
    pub name: String,
}

/// Fields supplied by the caller when registering a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProcessingTask {
    pub name: String,
    pub file_type: String,
    #[serde(default)]
    pub pre_data_set_name: String,
    #[serde(default)]
    pub pre_data_set_version: String,
    #[serde(default)]
    pub post_data_set_name: String,
    #[serde(default)]
    pub post_data_set_version: String,
    pub file_names: Vec<FileReference>,
    #[serde(default)]
    pub data_process_config_info: Vec<StageConfigEntry>,
}

impl NewProcessingTask {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("task name must not be empty".into()));
        }
        if self.file_names.is_empty() {
            return Err(AppError::Validation(
                "task needs at least one input file".into(),
            ));
        }
        if let Some(blank) = self.file_names.iter().find(|f| f.name.trim().is_empty()) {
            return Err(AppError::Validation(format!(
                "file reference '{}' has an empty name",
                blank.name
            )));
        }
        Ok(())
    }
}

stored_object!(ProcessingTask, "processing_task", {
    name: String,
    file_type: String,
    pre_data_set_name: String,
    pre_data_set_version: String,
    post_data_set_name: String,
    post_data_set_version: String,
    file_names: Vec<FileReference>,
    data_process_config_info: Vec<StageConfigEntry>,
    status: TaskStatus,
    #[serde(serialize_with = "serialize_datetime", deserialize_with = "deserialize_datetime")]
    start_time: DateTime<Utc>,
    #[serde(
        serialize_with = "serialize_option_datetime",
        deserialize_with = "deserialize_option_datetime",
        default
    )]
    end_time: Option<DateTime<Utc>>,
    create_user: String,
    create_program: String,
    update_user: String,
    update_program: String
});

#[derive(Debug, Deserialize)]
struct CountRow {
    total: u64,
}

impl ProcessingTask {
    pub fn new(input: NewProcessingTask) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::now_v7().to_string(),
            name: input.name,
            file_type: input.file_type,
            pre_data_set_name: input.pre_data_set_name,
            pre_data_set_version: input.pre_data_set_version,
            post_data_set_name: input.post_data_set_name,
            post_data_set_version: input.post_data_set_version,
            file_names: input.file_names,
            data_process_config_info: input.data_process_config_info,
            status: TaskStatus::Processing,
            start_time: now,
            end_time: None,
            create_user: AUDIT_USER.to_string(),
            create_program: CREATE_PROGRAM.to_string(),
            update_user: AUDIT_USER.to_string(),
            update_program: CREATE_PROGRAM.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn enabled_stages(&self) -> StageSet {
        StageSet::from_entries(&self.data_process_config_info)
    }

    pub async fn create_and_add_to_db(
        input: NewProcessingTask,
        db: &SurrealDbClient,
    ) -> Result<ProcessingTask, AppError> {
        input.validate()?;
        let task = Self::new(input);
        db.store_item(task.clone()).await?;
        Ok(task)
    }

    pub async fn get(id: &str, db: &SurrealDbClient) -> Result<Option<ProcessingTask>, AppError> {
        Ok(db.get_item::<Self>(id).await?)
    }

    /// Tasks whose name contains `keyword`, newest first. `page_index` is zero-based.
    pub async fn list_by_page(
        keyword: &str,
        page_index: usize,
        page_size: usize,
        db: &SurrealDbClient,
    ) -> Result<Vec<ProcessingTask>, AppError> {
        if page_size == 0 {
            return Err(AppError::Validation("page size must be positive".into()));
        }
        let start = page_index
            .checked_mul(page_size)
            .ok_or_else(|| AppError::Validation("page index out of range".into()))?;

        let mut result = db
            .client
            .query(
                "SELECT * FROM type::table($table) \
                 WHERE string::contains(name, $keyword) \
                 ORDER BY start_time DESC LIMIT $limit START $start",
            )
            .bind(("table", Self::table_name()))
            .bind(("keyword", keyword.to_string()))
            .bind(("limit", page_size))
            .bind(("start", start))
            .await?;

        let tasks: Vec<ProcessingTask> = result.take(0)?;
        Ok(tasks)
    }

    pub async fn count(keyword: &str, db: &SurrealDbClient) -> Result<u64, AppError> {
        let mut result = db
            .client
            .query(
                "SELECT count() AS total FROM type::table($table) \
                 WHERE string::contains(name, $keyword) GROUP ALL",
            )
            .bind(("table", Self::table_name()))
            .bind(("keyword", keyword.to_string()))
            .await?;

        let row: Option<CountRow> = result.take(0)?;
        Ok(row.map_or(0, |row| row.total))
    }

    /// Removes the task together with its detail and QA records.
    /// Returns `false` when no task with `id` existed.
    pub async fn delete_with_details(id: &str, db: &SurrealDbClient) -> Result<bool, AppError> {
        let deleted: Option<ProcessingTask> = db.delete_item(id).await?;

        db.client
            .query("DELETE type::table($detail_table) WHERE task_id = $task_id")
            .query("DELETE type::table($qa_table) WHERE task_id = $task_id")
            .bind(("detail_table", TransformDetail::table_name()))
            .bind(("qa_table", QaPair::table_name()))
            .bind(("task_id", id.to_string()))
            .await?
            .check()?;

        Ok(deleted.is_some())
    }

    /// Moves a `processing` task to a terminal status and stamps `end_time`.
    pub async fn update_status(
        id: &str,
        status: TaskStatus,
        db: &SurrealDbClient,
    ) -> Result<ProcessingTask, AppError> {
        let current = Self::get(id, db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("processing task {id}")))?;
        check_transition(current.status, status)?;

        const UPDATE_STATUS_QUERY: &str = r#"
            UPDATE type::thing($table, $id)
            SET status = $status,
                end_time = $now,
                updated_at = $now,
                update_user = $user,
                update_program = $program
            WHERE status = $processing
            RETURN *;
        "#;

        let now = Utc::now();
        let mut result = db
            .client
            .query(UPDATE_STATUS_QUERY)
            .bind(("table", Self::table_name()))
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str()))
            .bind(("processing", TaskStatus::Processing.as_str()))
            .bind(("now", SurrealDatetime::from(now)))
            .bind(("user", AUDIT_USER))
            .bind(("program", UPDATE_STATUS_PROGRAM))
            .await?;

        let updated: Option<ProcessingTask> = result.take(0)?;
        updated.ok_or_else(|| invalid_transition(current.status, status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::types::stage::StageKind;
    use chrono::Duration;

    async fn memory_db() -> SurrealDbClient {
        let database = Uuid::new_v4().to_string();
        SurrealDbClient::memory("test_ns", &database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    fn new_task(name: &str) -> NewProcessingTask {
        NewProcessingTask {
            name: name.to_string(),
            file_type: "text".into(),
            pre_data_set_name: "dataset1".into(),
            pre_data_set_version: "v1".into(),
            post_data_set_name: "dataset1".into(),
            post_data_set_version: "v2".into(),
            file_names: vec![FileReference {
                name: "report.pdf".into(),
            }],
            data_process_config_info: vec![
                StageKind::QaSplit.into(),
                StageKind::RemoveEmail.into(),
            ],
        }
    }

    #[tokio::test]
    async fn created_task_starts_processing_with_audit_fields() {
        let db = memory_db().await;
        let task = ProcessingTask::create_and_add_to_db(new_task("alpha"), &db)
            .await
            .expect("create task");

        let stored = ProcessingTask::get(&task.id, &db)
            .await
            .expect("fetch")
            .expect("task exists");

        assert_eq!(stored.status, TaskStatus::Processing);
        assert_eq!(stored.create_user, AUDIT_USER);
        assert_eq!(stored.create_program, CREATE_PROGRAM);
        assert!(stored.end_time.is_none());
        assert_eq!(stored.file_names.len(), 1);
        assert!(stored.enabled_stages().contains(StageKind::RemoveEmail));
        assert!(!stored.enabled_stages().contains(StageKind::SpaceStandardization));
    }

    #[tokio::test]
    async fn creation_rejects_missing_files() {
        let db = memory_db().await;
        let mut input = new_task("empty");
        input.file_names.clear();

        let err = ProcessingTask::create_and_add_to_db(input, &db)
            .await
            .expect_err("validation should fail");
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(ProcessingTask::count("", &db).await.expect("count"), 0);
    }

    #[tokio::test]
    async fn ids_sort_by_creation_time() {
        let first = ProcessingTask::new(new_task("a"));
        let second = ProcessingTask::new(new_task("b"));
        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn list_by_page_filters_orders_and_pages() {
        let db = memory_db().await;
        let base = Utc::now();

        for (offset, name) in ["report-old", "report-mid", "other", "report-new"]
            .into_iter()
            .enumerate()
        {
            let mut task = ProcessingTask::new(new_task(name));
            task.start_time = base + Duration::seconds(offset as i64);
            db.store_item(task).await.expect("store");
        }

        let first_page = ProcessingTask::list_by_page("report", 0, 2, &db)
            .await
            .expect("page 0");
        let names: Vec<_> = first_page.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["report-new", "report-mid"]);

        let second_page = ProcessingTask::list_by_page("report", 1, 2, &db)
            .await
            .expect("page 1");
        let names: Vec<_> = second_page.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["report-old"]);

        assert_eq!(ProcessingTask::count("report", &db).await.expect("count"), 3);
        assert_eq!(ProcessingTask::count("", &db).await.expect("count"), 4);
        assert_eq!(ProcessingTask::count("missing", &db).await.expect("count"), 0);

        let err = ProcessingTask::list_by_page("", 0, 0, &db)
            .await
            .expect_err("zero page size");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_cascades_to_details_and_pairs() {
        let db = memory_db().await;
        let task = ProcessingTask::create_and_add_to_db(new_task("gone"), &db)
            .await
            .expect("create");
        let keep = ProcessingTask::create_and_add_to_db(new_task("kept"), &db)
            .await
            .expect("create");

        for owner in [&task.id, &keep.id] {
            TransformDetail::new(owner, "report.pdf", StageKind::RemoveEmail, "a@b.com", "T:EMAIL", 1)
                .store(&db)
                .await
                .expect("detail");
            QaPair::new(owner, "report.pdf", "Q?", "A.")
                .store(&db)
                .await
                .expect("qa");
        }

        assert!(ProcessingTask::delete_with_details(&task.id, &db)
            .await
            .expect("delete"));
        assert!(ProcessingTask::get(&task.id, &db).await.expect("get").is_none());
        assert!(TransformDetail::list_for_task(&task.id, &db)
            .await
            .expect("details")
            .is_empty());
        assert!(QaPair::list_for_task(&task.id, &db)
            .await
            .expect("pairs")
            .is_empty());

        assert_eq!(
            TransformDetail::list_for_task(&keep.id, &db)
                .await
                .expect("details")
                .len(),
            1
        );
        assert_eq!(QaPair::list_for_task(&keep.id, &db).await.expect("qa").len(), 1);

        assert!(!ProcessingTask::delete_with_details(&task.id, &db)
            .await
            .expect("second delete"));
    }

    #[tokio::test]
    async fn update_status_only_leaves_processing_once() {
        let db = memory_db().await;
        let task = ProcessingTask::create_and_add_to_db(new_task("status"), &db)
            .await
            .expect("create");

        let updated = ProcessingTask::update_status(&task.id, TaskStatus::Succeeded, &db)
            .await
            .expect("transition");
        assert_eq!(updated.status, TaskStatus::Succeeded);
        assert!(updated.end_time.is_some());
        assert_eq!(updated.update_program, UPDATE_STATUS_PROGRAM);
        assert!(updated.status.is_terminal());

        let err = ProcessingTask::update_status(&task.id, TaskStatus::Failed, &db)
            .await
            .expect_err("terminal task cannot move");
        assert!(matches!(err, AppError::Validation(_)));

        let missing = ProcessingTask::update_status("nope", TaskStatus::Failed, &db)
            .await
            .expect_err("missing task");
        assert!(matches!(missing, AppError::NotFound(_)));
    }
}
