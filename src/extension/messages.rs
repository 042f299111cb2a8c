use serde::{Deserialize, Serialize};

use crate::storage::report::{ClearResult, PerCategory};
use crate::store::settings::Settings;

/// Messages a surface adapter sends to the background or content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ClearSite {
        domain: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default)]
        settings: Settings,
    },
    GetSettings,
    RefreshButton,
}

/// Replies, shaped the way the popup and content script read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Cleared { success: bool, results: PerCategory },
    Failed { success: bool, error: String },
    Settings { settings: Settings },
    Ack { success: bool },
}

impl Response {
    pub fn failed(error: impl Into<String>) -> Self {
        Response::Failed {
            success: false,
            error: error.into(),
        }
    }

    pub fn ack() -> Self {
        Response::Ack { success: true }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::Cleared { success, .. }
            | Response::Failed { success, .. }
            | Response::Ack { success } => *success,
            Response::Settings { .. } => true,
        }
    }
}

impl From<ClearResult> for Response {
    fn from(result: ClearResult) -> Self {
        if result.success {
            Response::Cleared {
                success: true,
                results: result.per_category,
            }
        } else {
            Response::failed(
                result
                    .error
                    .unwrap_or_else(|| "storage clearing failed".to_string()),
            )
        }
    }
}
