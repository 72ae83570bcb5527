//! Submit Engine
//!
//! Validates a draft, builds its payload and issues exactly one write.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};
use serde_json::Value;

use super::diff::{create_payload, update_payload, PayloadContext};
use super::form::FormDraft;
use super::schema::Mode;
use crate::api::{ApiError, ApiResult, Backend};
use crate::domain::RecordId;
use crate::error::SubmitError;

pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(30);

/// What a submit targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    New,
    Existing(RecordId),
}

impl Target {
    pub fn mode(&self) -> Mode {
        match self {
            Target::New => Mode::Create,
            Target::Existing(_) => Mode::Update,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Carries the envelope's `data`, if the server sent any
    Created(Option<Value>),
    Updated,
    /// Nothing differed from the baseline; no request was made
    NothingToUpdate,
}

pub struct SubmitEngine {
    backend: Arc<dyn Backend>,
    context: PayloadContext,
    timeout: Duration,
}

impl SubmitEngine {
    pub fn new(backend: Arc<dyn Backend>, context: PayloadContext) -> Self {
        Self {
            backend,
            context,
            timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The draft is only read; on failure it is exactly as it was
    pub async fn submit(&self, draft: &FormDraft, target: &Target) -> Result<SubmitOutcome, SubmitError> {
        let schema = draft.schema();
        draft.validate(target.mode())?;

        match target {
            Target::New => {
                let payload = create_payload(schema, draft.values(), &self.context)?;
                let ack = bounded(self.timeout, self.backend.create(schema.kind, &payload))
                    .await
                    .map_err(|e| failed(schema.kind.collection(), e))?;
                info!("Created {} record", schema.kind);
                Ok(SubmitOutcome::Created(ack.data))
            }
            Target::Existing(id) => {
                let changes = draft.changes();
                let payload = match update_payload(schema, id, &changes, draft.values(), &self.context)? {
                    Some(payload) => payload,
                    None => {
                        info!("{} {}: nothing to update", schema.kind, id);
                        return Ok(SubmitOutcome::NothingToUpdate);
                    }
                };
                bounded(self.timeout, self.backend.update(schema.kind, id, &payload))
                    .await
                    .map_err(|e| failed(schema.kind.collection(), e))?;
                info!("Updated {} {} ({} fields)", schema.kind, id, changes.len());
                Ok(SubmitOutcome::Updated)
            }
        }
    }
}

/// Bound a backend call by `limit`
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Timeout),
    }
}

fn failed(collection: &str, e: ApiError) -> SubmitError {
    warn!("Write to {} failed: {}", collection, e);
    SubmitError::from(e)
}
