//! Wire messages exchanged with the daemon.
//!
//! Each message is one JSON object on its own line. Requests carry a
//! connection-unique id which the matching response echoes; responses may
//! arrive in any order.

use hordebrowse_common::{Fingerprint, RequestId};
use serde::{Deserialize, Serialize};

use super::{FailureReason, ResolutionOutcome, ResolvedAsset, ResolverError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub id: RequestId,
    pub tree_tiger: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    Success,
    NotFound,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResponse {
    pub id: RequestId,
    pub status: LookupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LookupResponse {
    pub fn into_outcome(self, fingerprint: Fingerprint) -> ResolutionOutcome {
        match self.status {
            LookupStatus::Success => ResolutionOutcome::Success(ResolvedAsset {
                fingerprint,
                size: self.size,
            }),
            LookupStatus::NotFound => ResolutionOutcome::Failure(FailureReason::NotFound),
            LookupStatus::Error => ResolutionOutcome::Failure(FailureReason::Rejected(
                self.message.unwrap_or_else(|| "unspecified error".to_string()),
            )),
        }
    }
}

/// Serialize a message as a single newline-terminated line.
pub fn encode_line<T: Serialize>(message: &T) -> Result<String, ResolverError> {
    let mut line =
        serde_json::to_string(message).map_err(|e| ResolverError::Protocol(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

pub fn decode_response(line: &str) -> Result<LookupResponse, ResolverError> {
    serde_json::from_str(line.trim()).map_err(|e| ResolverError::Protocol(e.to_string()))
}

#[derive(Deserialize)]
struct IdOnly {
    id: RequestId,
}

/// Recover the request id from a response that failed to decode.
pub fn response_id(line: &str) -> Option<RequestId> {
    serde_json::from_str::<IdOnly>(line.trim()).ok().map(|r| r.id)
}
