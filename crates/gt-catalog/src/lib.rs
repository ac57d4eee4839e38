//! # gt-catalog — Event Catalog
//!
//! Organizers publish events gated by a minimum balance. An event is never
//! deleted; it is deactivated, or it simply passes its expiry. Event ids are
//! assigned sequentially from 1 and never reused.

pub mod catalog;
pub mod error;

pub use catalog::{Event, EventCatalog, EventUpdate};
pub use error::CatalogError;
