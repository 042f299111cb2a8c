//! Content script: the in-page clear button and its lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use super::messages::{Request, Response};
use crate::common::errors::PlatformError;
use crate::storage::category::Category;
use crate::storage::orchestrator::{ClearRequest, Orchestrator, Surface};
use crate::storage::page::PageContext;
use crate::storage::report::ClearResult;
use crate::store::namespace::StorageChange;
use crate::store::settings::Settings;

/// How long the cleared / error label stays before the button resets
pub const RESET_AFTER: Duration = Duration::from_secs(2);

/// The bits of the page DOM the button needs.
pub trait PageDocument: Send + Sync {
    fn has_element(&self, id: &str) -> bool;

    /// Append a button to `container` (or the body when `None`)
    fn insert_button(&self, container: Option<&str>, id: &str, label: &str) -> Result<(), PlatformError>;

    /// Returns false if nothing with that id was attached
    fn remove_element(&self, id: &str) -> bool;

    fn update_button(&self, id: &str, label: &str, disabled: bool);

    /// Blocking yes/no prompt
    fn confirm(&self, message: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonOptions {
    pub text: String,
    pub id: String,
    pub container_id: Option<String>,
}

impl Default for ButtonOptions {
    fn default() -> Self {
        Self {
            text: "Clear All Storage".to_string(),
            id: "storage-cleaner-btn".to_string(),
            container_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Idle,
    Clearing,
    Cleared,
    Failed,
}

impl ButtonState {
    pub fn label(self, idle_text: &str) -> String {
        match self {
            ButtonState::Idle => idle_text.to_string(),
            ButtonState::Clearing => "Clearing...".to_string(),
            ButtonState::Cleared => "✓ Cleared!".to_string(),
            ButtonState::Failed => "✗ Error".to_string(),
        }
    }
}

/// Prompt listing what a clear with `settings` will remove
pub fn confirmation_prompt(settings: &Settings) -> String {
    let mut prompt = String::from("Are you sure you want to clear storage for this site?\n\nThis will remove:\n");
    for category in settings.enabled_categories() {
        let line = match category {
            Category::Cookies => "All cookies",
            Category::LocalStorage => "localStorage data",
            Category::SessionStorage => "sessionStorage data",
            Category::IndexedDb => "IndexedDB databases",
            Category::CacheStorage => "Cache storage",
        };
        prompt.push_str("• ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push_str("\nThis action cannot be undone.");
    prompt
}

/// One attached clear button. Only one exists per page; `attach` checks the
/// document for an existing element with the same id.
pub struct ClearButton {
    document: Arc<dyn PageDocument>,
    options: ButtonOptions,
    state: ButtonState,
}

impl ClearButton {
    /// Returns `Ok(None)` when the page already has the button
    pub fn attach(
        document: Arc<dyn PageDocument>,
        options: ButtonOptions,
    ) -> Result<Option<Self>, PlatformError> {
        if document.has_element(&options.id) {
            debug!(id = %options.id, "button already present");
            return Ok(None);
        }
        document.insert_button(options.container_id.as_deref(), &options.id, &options.text)?;
        Ok(Some(Self {
            document,
            options,
            state: ButtonState::Idle,
        }))
    }

    pub fn state(&self) -> ButtonState {
        self.state
    }

    pub fn id(&self) -> &str {
        &self.options.id
    }

    fn show(&mut self, state: ButtonState) {
        self.state = state;
        self.document.update_button(
            &self.options.id,
            &state.label(&self.options.text),
            state == ButtonState::Clearing,
        );
    }

    /// Confirm if configured, then run the clear. `None` if the user declined.
    pub async fn click(
        &mut self,
        orchestrator: &Orchestrator,
        request: &ClearRequest,
    ) -> Option<ClearResult> {
        if self.state == ButtonState::Clearing {
            return None;
        }
        if request.settings.confirm_before_clear
            && !self.document.confirm(&confirmation_prompt(&request.settings))
        {
            return None;
        }

        self.show(ButtonState::Clearing);
        let result = orchestrator.clear(request).await;
        if result.success {
            self.show(ButtonState::Cleared);
        } else {
            error!(error = ?result.error, "clearing from page button failed");
            self.show(ButtonState::Failed);
        }
        Some(result)
    }

    /// Back to the idle label, once `RESET_AFTER` has passed
    pub fn reset(&mut self) {
        if matches!(self.state, ButtonState::Cleared | ButtonState::Failed) {
            self.show(ButtonState::Idle);
        }
    }

    pub fn destroy(self) -> bool {
        self.document.remove_element(&self.options.id)
    }
}

/// Page-side adapter: owns the button and clears through the page surface.
pub struct ContentScript {
    document: Arc<dyn PageDocument>,
    orchestrator: Orchestrator,
    hostname: String,
    settings: Settings,
    options: ButtonOptions,
    button: Option<ClearButton>,
}

impl ContentScript {
    pub fn new(page: Arc<dyn PageContext>, document: Arc<dyn PageDocument>, settings: Settings) -> Self {
        let hostname = page.hostname().to_string();
        Self {
            document,
            orchestrator: Orchestrator::new(Surface::Page(page)),
            hostname,
            settings,
            options: ButtonOptions::default(),
            button: None,
        }
    }

    pub fn with_options(mut self, options: ButtonOptions) -> Self {
        self.options = options;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn button(&self) -> Option<&ClearButton> {
        self.button.as_ref()
    }

    /// Attach or detach the button to match `showButton`
    pub fn refresh(&mut self) -> Result<(), PlatformError> {
        match (self.settings.show_button, self.button.take()) {
            (true, Some(button)) => self.button = Some(button),
            (true, None) => {
                self.button = ClearButton::attach(Arc::clone(&self.document), self.options.clone())?;
            }
            (false, Some(button)) => {
                button.destroy();
                info!(host = %self.hostname, "clear button removed");
            }
            (false, None) => {}
        }
        Ok(())
    }

    /// Storage-change listener for the synced settings namespace
    pub fn on_storage_changed(&mut self, changes: &[StorageChange]) -> Result<(), PlatformError> {
        let mut toggled = false;
        for change in changes {
            let value = change.new_value.as_ref().and_then(|v| v.as_bool());
            let value = match (value, Settings::default().get(&change.key)) {
                (Some(v), _) => v,
                (None, Some(default)) => default,
                (None, None) => continue,
            };
            self.settings.set(&change.key, value);
            toggled |= change.key == "showButton";
        }
        if toggled {
            self.refresh()?;
        }
        Ok(())
    }

    pub fn handle_message(&mut self, request: &Request) -> Option<Response> {
        match request {
            Request::RefreshButton => Some(match self.refresh() {
                Ok(()) => Response::ack(),
                Err(e) => Response::failed(e.to_string()),
            }),
            _ => None,
        }
    }

    /// The user pressed the page button
    pub async fn click(&mut self) -> Option<ClearResult> {
        let request = ClearRequest::new(self.hostname.clone(), self.settings);
        let button = self.button.as_mut()?;
        button.click(&self.orchestrator, &request).await
    }

    pub fn reset_button(&mut self) {
        if let Some(button) = self.button.as_mut() {
            button.reset();
        }
    }
}
