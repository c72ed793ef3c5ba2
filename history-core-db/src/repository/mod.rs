pub mod memory;
pub mod pagination;
pub mod query;
pub mod store;

// Re-exports
pub use memory::*;
pub use pagination::*;
pub use query::*;
pub use store::*;
