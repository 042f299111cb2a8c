use crate::common::errors::SiteWipeError;
use crate::common::site::{domain_from_url, INTERNAL_PAGE};
use crate::storage::privileged::Tab;

use super::messages::Response;

/// What the popup can offer for the active tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupTarget {
    Ready { domain: String, url: String },
    /// Controls are disabled; `reason` is shown inline
    Disabled { reason: String },
}

/// Resolve the active tab before any clear is issued
pub fn resolve_active_tab(tab: Option<&Tab>) -> PopupTarget {
    let Some(tab) = tab.filter(|t| !t.url.is_empty()) else {
        return PopupTarget::Disabled {
            reason: "No active tab".to_string(),
        };
    };
    match domain_from_url(&tab.url) {
        Ok(domain) => PopupTarget::Ready {
            domain,
            url: tab.url.clone(),
        },
        Err(SiteWipeError::UnmanageableUrl { reason, .. }) if reason == INTERNAL_PAGE => {
            PopupTarget::Disabled {
                reason: "Cannot clear storage on browser pages".to_string(),
            }
        }
        Err(_) => PopupTarget::Disabled {
            reason: "Invalid URL".to_string(),
        },
    }
}

/// Toast shown after a clear attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusToast {
    pub success: bool,
    pub text: String,
}

pub fn status_for(domain: &str, response: &Response) -> StatusToast {
    match response {
        Response::Cleared { success: true, .. } => StatusToast {
            success: true,
            text: format!("Storage cleared for {}", domain),
        },
        Response::Failed { error, .. } => StatusToast {
            success: false,
            text: format!("Error: {}", error),
        },
        _ => StatusToast {
            success: false,
            text: "Error: unexpected response".to_string(),
        },
    }
}

/// Message delivery failed before any response came back
pub fn transport_failure(error: &dyn std::fmt::Display) -> StatusToast {
    StatusToast {
        success: false,
        text: format!("Error: {}", error),
    }
}
