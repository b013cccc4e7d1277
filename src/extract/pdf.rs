use std::panic;

use super::ExtractError;

/// Extract the text of every page, joined with newlines.
///
/// Pages that yield no text at all are skipped, so a scanned PDF without a
/// text layer comes back as an empty string rather than an error.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed font programs instead of erroring.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractError::Pdf("PDF parser aborted on malformed content".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;

    log::debug!("PDF has {} pages", pages.len());
    Ok(join_pages(pages))
}

fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator<Item = String>,
{
    pages
        .into_iter()
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
