//! Maker-checker review desk over configured warehouse tables.

pub mod desk;
pub mod lifecycle;
pub mod updater;

pub use desk::{apply_action, load_snapshot, RecordFilter, TableSnapshot};
pub use lifecycle::ReviewAction;
