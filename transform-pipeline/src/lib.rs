#![allow(clippy::missing_docs_in_private_items, clippy::result_large_err)]

pub mod detail;
pub mod dispatch;
pub mod pipeline;
pub mod qa;
pub mod tasks;
pub mod transforms;
pub mod utils;

pub use detail::{build_task_detail, support_types, PreviewLimits, TaskDetailView};
pub use dispatch::BackgroundDispatcher;
pub use pipeline::{
    ExportSummary, PipelineConfig, ProcessFileRequest, StageFailurePolicy, TransformPipeline,
};
pub use tasks::{run_task_files, submit_task};
