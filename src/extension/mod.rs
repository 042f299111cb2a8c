pub mod background;
pub mod content;
pub mod messages;
pub mod popup;

pub use background::{Background, BulkClear, InstallReason, SiteClear, TabStatus, CONTEXT_MENU_ID, CONTEXT_MENU_TITLE};
pub use content::{confirmation_prompt, ButtonOptions, ButtonState, ClearButton, ContentScript, PageDocument};
pub use messages::{Request, Response};
pub use popup::{resolve_active_tab, status_for, PopupTarget, StatusToast};
