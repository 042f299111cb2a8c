//! # SiteWipe
//!
//! Per-site browser storage clearing.
//!
//! Given a domain and a set of enabled categories, SiteWipe removes that
//! site's cookies, localStorage, sessionStorage, IndexedDB databases and
//! Cache Storage entries. It features:
//!
//! - **Two surfaces**: clear from inside a page, or from a privileged host with origin-scoped removal
//! - **Partial failure is normal**: every category reports its own outcome, nothing short-circuits
//! - **Managed sites**: opt domains into auto-clear on navigation
//! - **Extension glue**: background, content-script and popup adapters over a JSON message protocol
//! - **Firefox profiles**: a real backend that clears storage from a profile directory on disk

pub mod cli;
pub mod common;
pub mod extension;
pub mod firefox;
pub mod storage;
pub mod store;

pub use common::errors::{PlatformError, Result, SiteWipeError};
pub use storage::{Category, ClearRequest, ClearResult, Orchestrator, PerCategory, Surface};
pub use store::Settings;
