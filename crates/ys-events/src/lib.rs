//! Fee event harvesting.
//!
//! [`EventHarvester`] fans out one log query per vault, accumulates every
//! decoded record in a shared map keyed by vault and block, and reshapes it
//! into an [`EventHistory`](yieldscope_types::EventHistory) once all the
//! queries are done.

pub mod fetcher;
pub mod harvester;

pub use fetcher::{EventKey, filter_vault_events};
pub use harvester::{EventHarvester, HarvestConfig};
