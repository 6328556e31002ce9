pub mod store;
pub mod sweeper;

pub use store::{SessionEntry, SessionStore};
pub use sweeper::ExpirySweeper;
