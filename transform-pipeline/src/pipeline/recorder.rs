use common::storage::{
    db::SurrealDbClient,
    types::{qa_pair::QaPair, stage::StageKind, transform_detail::TransformDetail},
};
use tracing::warn;

use crate::qa::GeneratedQa;

/// Best-effort audit writes. A failed write is logged and the run goes on.
pub struct DetailRecorder<'a> {
    db: &'a SurrealDbClient,
    task_id: &'a str,
    file_name: &'a str,
}

impl<'a> DetailRecorder<'a> {
    pub fn new(db: &'a SurrealDbClient, task_id: &'a str, file_name: &'a str) -> Self {
        Self {
            db,
            task_id,
            file_name,
        }
    }

    /// Returns whether the record was written.
    pub async fn record_transform(
        &self,
        stage: StageKind,
        pre_content: &str,
        post_content: &str,
        match_count: usize,
    ) -> bool {
        let detail = TransformDetail::new(
            self.task_id,
            self.file_name,
            stage,
            pre_content,
            post_content,
            match_count,
        );
        match detail.store(self.db).await {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    task_id = %self.task_id,
                    file_name = %self.file_name,
                    stage = %stage,
                    error = %err,
                    "failed to persist transform detail"
                );
                false
            }
        }
    }

    /// Returns how many pairs were written.
    pub async fn record_qa_pairs(&self, pairs: &[GeneratedQa]) -> usize {
        let mut stored = 0_usize;
        for pair in pairs {
            let record = QaPair::new(self.task_id, self.file_name, &pair.question, &pair.answer);
            match record.store(self.db).await {
                Ok(()) => stored = stored.saturating_add(1),
                Err(err) => warn!(
                    task_id = %self.task_id,
                    file_name = %self.file_name,
                    error = %err,
                    "failed to persist QA pair"
                ),
            }
        }
        stored
    }
}
