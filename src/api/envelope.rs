//! Response Envelope
//!
//! Every endpoint answers `{isSuccess, data, message}`. Anything other than
//! `isSuccess: true` is a failure, whatever the HTTP status said.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ApiError, ApiResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    pub is_success: Option<bool>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Result of an accepted write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ack {
    pub data: Option<Value>,
    pub message: Option<String>,
}

impl Envelope {
    pub fn succeeded(&self) -> bool {
        self.is_success == Some(true)
    }

    pub fn into_ack(self) -> ApiResult<Ack> {
        if !self.succeeded() {
            return Err(ApiError::Rejected { message: self.message });
        }
        Ok(Ack {
            data: self.data.filter(|d| !d.is_null()),
            message: self.message,
        })
    }

    pub fn into_record(self) -> ApiResult<Value> {
        match self.into_ack()?.data {
            Some(record @ Value::Object(_)) => Ok(record),
            Some(other) => Err(ApiError::Decode(format!("expected a record, got {}", other))),
            None => Err(ApiError::Decode("response has no data".to_string())),
        }
    }

    pub fn into_list(self) -> ApiResult<Vec<Value>> {
        match self.into_ack()?.data {
            Some(Value::Array(items)) => Ok(items),
            None => Ok(Vec::new()),
            Some(other) => Err(ApiError::Decode(format!("expected a list, got {}", other))),
        }
    }
}
