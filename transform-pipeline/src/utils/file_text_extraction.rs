use std::path::{Path, PathBuf};

use common::error::AppError;
use tracing::debug;

/// Directory under the data dir holding the uploaded source files.
pub const ORIGINAL_DIR: &str = "original";

/// Resolves `file_name` inside `<data_dir>/original`, rejecting anything that is not a bare file name.
pub fn source_path(data_dir: &Path, file_name: &str) -> Result<PathBuf, AppError> {
    let candidate = Path::new(file_name);
    let is_bare = candidate.file_name().is_some_and(|name| name == candidate.as_os_str());
    if file_name.trim().is_empty() || !is_bare {
        return Err(AppError::Validation(format!(
            "'{file_name}' is not a plain file name"
        )));
    }
    Ok(data_dir.join(ORIGINAL_DIR).join(candidate))
}

/// Extracts the text of a source document, concatenating all pages in order.
pub async fn extract_text_from_file(path: &Path) -> Result<String, AppError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => extract_pdf_text(path).await,
        "txt" | "md" => Ok(tokio::fs::read_to_string(path).await?),
        other => Err(AppError::Processing(format!(
            "unsupported source file type '{other}' for {}",
            path.display()
        ))),
    }
}

/// Runs `pdf-extract` off the async executor.
async fn extract_pdf_text(path: &Path) -> Result<String, AppError> {
    let pdf_bytes = tokio::fs::read(path).await?;
    let byte_len = pdf_bytes.len();

    let text = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_from_mem(&pdf_bytes)
    })
    .await?
    .map_err(|err| AppError::Processing(format!("Failed to extract text from PDF: {err}")))?;

    debug!(
        path = %path.display(),
        byte_len,
        text_chars = text.chars().count(),
        "pdf text extracted"
    );

    Ok(text)
}
