use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::UploadConfig;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// PDFs may carry a few bytes of junk before the header; readers tolerate up to 1 KiB.
const MAGIC_SEARCH_WINDOW: usize = 1024;

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(MAGIC_SEARCH_WINDOW)];
    window
        .windows(PDF_MAGIC.len())
        .any(|candidate| candidate == PDF_MAGIC)
}

/// Extract plain text from an uploaded PDF.
///
/// Extraction is CPU-bound, so it runs on the blocking thread pool and is
/// abandoned after `extraction_timeout_secs`. A document that yields only
/// whitespace is treated as a failure.
pub async fn extract_text(bytes: Vec<u8>, config: &UploadConfig) -> Result<String> {
    if !looks_like_pdf(&bytes) {
        anyhow::bail!("Uploaded file is not a PDF");
    }

    let use_pdftotext = config.use_pdftotext;
    let size = bytes.len();
    tracing::info!("extract_text: starting blocking extraction ({size} bytes)");

    let handle = tokio::task::spawn_blocking(move || extract_pdf(&bytes, use_pdftotext));

    let timeout = Duration::from_secs(config.extraction_timeout_secs);
    let text = match tokio::time::timeout(timeout, handle).await {
        Ok(join_result) => join_result.context("Text extraction task panicked")??,
        Err(_) => anyhow::bail!(
            "Text extraction timed out after {}s",
            config.extraction_timeout_secs
        ),
    };

    if text.trim().is_empty() {
        anyhow::bail!("PDF contains no extractable text");
    }

    tracing::info!("extract_text: extraction succeeded, {} chars", text.len());
    Ok(text)
}

fn extract_pdf(bytes: &[u8], use_pdftotext: bool) -> Result<String> {
    if use_pdftotext {
        match extract_pdf_pdftotext(bytes) {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!("PDF extracted via pdftotext ({} chars)", text.len());
                return Ok(text);
            }
            Ok(_) => tracing::warn!("pdftotext returned empty text, falling back to pdf_extract"),
            Err(e) => tracing::warn!("pdftotext failed ({e:#}), falling back to pdf_extract"),
        }
    }

    pdf_extract::extract_text_from_mem(bytes).context("Failed to extract text from PDF")
}

fn extract_pdf_pdftotext(bytes: &[u8]) -> Result<String> {
    use std::io::Write;
    use std::process::Command;

    let mut tmp = tempfile::NamedTempFile::new().context("Failed to create temp file")?;
    tmp.write_all(bytes).context("Failed to write PDF to temp file")?;
    tmp.flush()?;

    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(tmp.path())
        .arg("-")
        .output()
        .context("Failed to run pdftotext (is poppler-utils installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdftotext exited with {}: {stderr}", output.status);
    }

    String::from_utf8(output.stdout).context("pdftotext output is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_config() -> UploadConfig {
        UploadConfig {
            max_file_size_mb: 1,
            extraction_timeout_secs: 5,
            use_pdftotext: false,
        }
    }

    #[test]
    fn test_looks_like_pdf() {
        assert!(looks_like_pdf(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n"));
        assert!(looks_like_pdf(b"\r\n%PDF-1.4"));
        assert!(!looks_like_pdf(b"\x89PNG\r\n\x1a\n"));
        assert!(!looks_like_pdf(b""));
    }

    #[tokio::test]
    async fn test_non_pdf_is_rejected() {
        let err = extract_text(b"GIF89a not a pdf".to_vec(), &upload_config())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a PDF"));
    }

    #[tokio::test]
    async fn test_truncated_pdf_fails() {
        let result = extract_text(b"%PDF-1.4\n1 0 obj\n".to_vec(), &upload_config()).await;
        assert!(result.is_err());
    }
}
