pub mod service;
pub mod worker;

pub use service::{SyncReport, SyncService};
