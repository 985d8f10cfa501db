//! Database layer for Loam

mod live;
mod migrations;
mod record;
mod store;

pub use live::observe;
pub use record::Entity;
pub use store::{ChangeEvent, ChangeKind, Store, SyncAck};
