pub mod diff;
pub mod histories;
pub mod manager;
pub mod restorer;
pub mod save;
pub mod writer;

// Re-exports
pub use diff::*;
pub use manager::*;
