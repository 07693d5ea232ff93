//! PDF to plain text

use std::path::{Path, PathBuf};

use lopdf::Document;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

/// Extract the text of every page and write it to `<stem>.txt` beside the PDF.
///
/// Each non-empty page contributes its text followed by a blank line.
/// Returns the path of the text file.
pub async fn extract_pdf_text(pdf_path: impl AsRef<Path>) -> StoreResult<PathBuf> {
    let pdf_path = pdf_path.as_ref().to_path_buf();

    if !fs::metadata(&pdf_path).await.is_ok_and(|m| m.is_file()) {
        warn!("Error: File {} does not exist", pdf_path.display());
        return Err(StoreError::NotFound(pdf_path));
    }

    let bytes = fs::read(&pdf_path)
        .await
        .map_err(|e| StoreError::io(&pdf_path, e))?;

    let parse_path = pdf_path.clone();
    let text = tokio::task::spawn_blocking(move || pdf_bytes_to_text(&bytes, &parse_path))
        .await
        .map_err(|e| StoreError::Task(e.to_string()))??;

    let output_path = pdf_path.with_extension("txt");
    fs::write(&output_path, text)
        .await
        .map_err(|e| StoreError::io(&output_path, e))?;

    info!(
        "Text extraction complete. Results saved in: {}",
        output_path.display()
    );
    Ok(output_path)
}

fn pdf_bytes_to_text(bytes: &[u8], path: &Path) -> StoreResult<String> {
    let invalid = |reason: String| StoreError::InvalidPdf {
        path: path.to_path_buf(),
        reason,
    };

    let doc = Document::load_mem(bytes).map_err(|e| invalid(e.to_string()))?;
    let pages = doc.get_pages();
    info!(
        "Extracting text from {} ({} pages)",
        path.display(),
        pages.len()
    );

    let mut total = String::new();
    for &page_number in pages.keys() {
        match doc.extract_text(&[page_number]) {
            Ok(page_text) if !page_text.is_empty() => {
                total.push_str(&page_text);
                total.push_str("\n\n");
            }
            Ok(_) => {}
            // Pages lopdf cannot decode are skipped
            Err(e) => debug!("Skipping page {} of {}: {}", page_number, path.display(), e),
        }
    }
    Ok(total)
}
