pub mod managed;
pub mod namespace;
pub mod settings;
pub mod transfer;

pub use managed::{ManagedSite, ManagedSites};
pub use namespace::{Namespace, StorageChange};
pub use settings::Settings;
pub use transfer::{export, import, ExportFile, ImportSummary, EXPORT_VERSION};
