//! HTTP Backend
//!
//! `reqwest` implementation of [`Backend`] against the staffing REST API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::envelope::{Ack, Envelope};
use super::error::{ApiError, ApiResult};
use super::routes::{download_task_files_path, item_path, routes, submit_task_path, BodyEncoding};
use super::{Backend, Payload, TaskSubmission};
use crate::credential::Credential;
use crate::domain::{EntityKind, RecordId};

pub struct HttpBackend {
    client: Client,
    base_url: String,
    credential: Credential,
}

impl HttpBackend {
    pub fn new(base_url: &str, credential: Credential, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, self.credential.bearer())
    }

    /// Send and decode the envelope; HTTP errors keep the server's message
    async fn send(&self, request: RequestBuilder) -> ApiResult<Envelope> {
        let response = self.authorized(request).send().await.map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;
        let envelope = serde_json::from_str::<Envelope>(&text).ok();

        if !status.is_success() {
            warn!("HTTP {} from backend", status.as_u16());
            return Err(ApiError::Status {
                code: status.as_u16(),
                message: envelope.and_then(|e| e.message),
            });
        }

        envelope.ok_or_else(|| ApiError::Decode(format!("not an envelope: {}", preview(&text))))
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(e.to_string())
    }
}

/// Flatten a payload into form pairs: nulls are omitted, lists repeat the key
fn form_fields(body: &Payload) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for (key, value) in body {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    fields.push((key.clone(), form_scalar(item)));
                }
            }
            other => fields.push((key.clone(), form_scalar(other))),
        }
    }
    fields
}

fn form_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list(&self, kind: EntityKind) -> ApiResult<Vec<Value>> {
        let path = routes(kind).list;
        debug!("GET {}", path);
        self.send(self.client.get(self.url(path))).await?.into_list()
    }

    async fn get(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Value> {
        let prefix = routes(kind)
            .get
            .ok_or(ApiError::Unsupported { kind, operation: "get" })?;
        let path = item_path(prefix, id);
        debug!("GET {}", path);
        self.send(self.client.get(self.url(&path))).await?.into_record()
    }

    async fn create(&self, kind: EntityKind, body: &Payload) -> ApiResult<Ack> {
        let route = routes(kind);
        debug!("POST {}", route.create);
        let request = self.client.post(self.url(route.create));
        let request = match route.create_body {
            BodyEncoding::Json => request.json(body),
            BodyEncoding::Form => request.form(&form_fields(body)),
        };
        self.send(request).await?.into_ack()
    }

    async fn update(&self, kind: EntityKind, id: &RecordId, body: &Payload) -> ApiResult<Ack> {
        let prefix = routes(kind)
            .update
            .ok_or(ApiError::Unsupported { kind, operation: "update" })?;
        let path = item_path(prefix, id);
        debug!("PUT {}", path);
        self.send(self.client.put(self.url(&path)).json(body)).await?.into_ack()
    }

    async fn delete(&self, kind: EntityKind, id: &RecordId) -> ApiResult<Ack> {
        let prefix = routes(kind)
            .delete
            .ok_or(ApiError::Unsupported { kind, operation: "delete" })?;
        let path = item_path(prefix, id);
        debug!("DELETE {}", path);
        self.send(self.client.delete(self.url(&path))).await?.into_ack()
    }

    async fn submit_task_work(&self, task_uid: &RecordId, submission: &TaskSubmission) -> ApiResult<Ack> {
        let mut form = Form::new().text("Description", submission.description.clone());
        for file in &submission.files {
            let mime = mime_guess::from_path(&file.file_name).first_or_octet_stream();
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.file_name.clone())
                .mime_str(mime.as_ref())
                .map_err(|e| ApiError::Io(format!("{}: {}", file.file_name, e)))?;
            form = form.part("Files", part);
        }

        let path = submit_task_path(task_uid);
        debug!("POST {} ({} files)", path, submission.files.len());
        self.send(self.client.post(self.url(&path)).multipart(form)).await?.into_ack()
    }

    async fn download_task_files(&self, task_uid: &RecordId) -> ApiResult<Vec<u8>> {
        let path = download_task_files_path(task_uid);
        debug!("GET {}", path);
        let response = self
            .authorized(self.client.get(self.url(&path)))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|text| serde_json::from_str::<Envelope>(&text).ok())
                .and_then(|e| e.message);
            return Err(ApiError::Status { code: status.as_u16(), message });
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_removed() {
        let backend = HttpBackend::new(
            "https://staff.example.com/",
            Credential::new("t"),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(backend.base_url(), "https://staff.example.com");
        assert_eq!(backend.url("/api/Task"), "https://staff.example.com/api/Task");
    }

    #[test]
    fn test_form_fields_flatten_payload() {
        let mut body = Payload::new();
        body.insert("UserName".into(), Value::from("dana"));
        body.insert("DepartmentIds".into(), serde_json::json!([2, 5]));
        body.insert("Phone".into(), Value::Null);
        body.insert("Age".into(), Value::from(30));

        assert_eq!(
            form_fields(&body),
            vec![
                ("Age".to_string(), "30".to_string()),
                ("DepartmentIds".to_string(), "2".to_string()),
                ("DepartmentIds".to_string(), "5".to_string()),
                ("UserName".to_string(), "dana".to_string()),
            ]
        );
    }
}
