use std::path::Path;

use anyhow::Context;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use super::consumer::StreamConsumer;
use super::error::ClientError;
use super::session::{HistoryEntry, Session};
use crate::dto::ask::AskRequest;
use crate::dto::upload::UploadResponse;

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the upload and ask endpoints.
#[derive(Clone)]
pub struct QaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl QaClient {
    /// `base_url` may carry a path prefix (`http://host/qa`); endpoints are
    /// resolved beneath it.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url).context("Invalid server URL")?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Upload a PDF from disk and store its text in the session.
    pub async fn upload_file(&self, session: &mut Session, path: &Path) -> Result<(), ClientError> {
        session.begin_upload();

        let result = match tokio::fs::read(path).await {
            Ok(bytes) => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document.pdf".to_string());
                self.upload_bytes(bytes, &filename).await
            }
            Err(source) => Err(ClientError::Io {
                context: format!("Failed to read {}", path.display()),
                source,
            }),
        };

        match result {
            Ok(text) => {
                tracing::info!("Uploaded {} ({} chars extracted)", path.display(), text.len());
                session.finish_upload(Ok(text));
                Ok(())
            }
            Err(e) => {
                session.finish_upload(Err(&e));
                Err(e)
            }
        }
    }

    pub async fn upload_bytes(&self, bytes: Vec<u8>, filename: &str) -> Result<String, ClientError> {
        let url = self.endpoint("api/upload")?;

        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self.http.post(url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Upload failed".to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        Ok(body.text)
    }

    /// Run one ask cycle for the session's current document and question.
    ///
    /// `on_update` receives the complete answer so far after every fragment.
    /// The cycle completes when the server closes the stream; the answer is
    /// then filed in the session history.
    pub async fn ask<F>(&self, session: &mut Session, mut on_update: F) -> Result<HistoryEntry, ClientError>
    where
        F: FnMut(&str),
    {
        let question = session.begin_ask()?;

        match self.stream_answer(session, question, &mut on_update).await {
            Ok(answer) => Ok(session.complete_ask(answer)),
            Err(e) => {
                tracing::warn!("Ask failed: {e}");
                session.fail_ask(&e);
                Err(e)
            }
        }
    }

    async fn stream_answer<F>(
        &self,
        session: &mut Session,
        question: String,
        on_update: &mut F,
    ) -> Result<String, ClientError>
    where
        F: FnMut(&str),
    {
        let url = self.endpoint("api/ask")?;

        let request = AskRequest {
            form_text: session.document_text().to_string(),
            question,
        };

        let response = self.http.post(url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "Streaming failed".to_string());
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let mut consumer = StreamConsumer::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            consumer.feed(&chunk, |answer| {
                session.publish_answer(answer);
                on_update(answer);
            });
        }

        Ok(consumer.finish(|answer| {
            session.publish_answer(answer);
            on_update(answer);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_keep_path_prefix() {
        let client = QaClient::new("http://localhost:3000").unwrap();
        assert_eq!(
            client.endpoint("api/ask").unwrap().as_str(),
            "http://localhost:3000/api/ask"
        );

        for base in ["http://host/qa", "http://host/qa/"] {
            let client = QaClient::new(base).unwrap();
            assert_eq!(
                client.endpoint("api/upload").unwrap().as_str(),
                "http://host/qa/api/upload"
            );
        }
    }

    #[test]
    fn test_invalid_server_url() {
        assert!(QaClient::new("not a url").is_err());
    }
}
