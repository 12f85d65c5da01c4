pub mod state;

pub use state::{Invalidation, PendingUpload, SessionContext, SessionsState};
