pub mod capabilities;
pub mod category;
pub mod orchestrator;
pub mod page;
pub mod privileged;
pub mod report;

pub use capabilities::StorageCapabilities;
pub use category::{Category, CategoryOutcome, CountOutcome, DatabaseDeletion, FlagOutcome};
pub use orchestrator::{ClearRequest, Notice, Notifier, Orchestrator, Surface};
pub use page::{CookieScope, PageContext};
pub use privileged::{
    BrowserHost, CookieRecord, CookieRemoval, CookieTarget, RemovalReport, RemovalScope, Tab, TabId,
};
pub use report::{ClearResult, PerCategory};
