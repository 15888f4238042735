//! Sanction lifecycle
//!
//! Temporary timeouts with scheduled, unconditional lifts.

mod record;
mod service;
mod store;

pub use record::{SanctionRecord, SanctionState};
pub use service::SanctionService;
pub use store::SanctionStore;
