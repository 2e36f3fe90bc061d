use std::path::Path;

use common::error::AppError;

use crate::qa::GeneratedQa;

/// Directory under the data dir receiving exported artifacts.
pub const FINAL_DIR: &str = "final";
pub const QA_HEADER: [&str; 2] = ["q", "a"];

/// `report.pdf` becomes `report_final.csv`.
pub fn export_object_name(file_name: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _)| stem);
    format!("{stem}_final.csv")
}

pub fn qa_table_bytes(pairs: &[GeneratedQa]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(QA_HEADER)
        .map_err(|e| AppError::Processing(format!("failed to write CSV header: {e}")))?;
    for pair in pairs {
        writer
            .write_record([pair.question.as_str(), pair.answer.as_str()])
            .map_err(|e| AppError::Processing(format!("failed to write CSV row: {e}")))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Processing(format!("failed to flush CSV: {e}")))
}

/// Writes the header plus one row per pair to `<data_dir>/final/<stem>_final.csv`
/// and returns the object name.
pub async fn write_qa_csv(
    data_dir: &Path,
    file_name: &str,
    pairs: &[GeneratedQa],
) -> Result<String, AppError> {
    let object_name = export_object_name(file_name);
    let bytes = qa_table_bytes(pairs)?;

    let target_dir = data_dir.join(FINAL_DIR);
    tokio::fs::create_dir_all(&target_dir).await?;
    tokio::fs::write(target_dir.join(&object_name), bytes).await?;

    Ok(object_name)
}
