pub mod history_record;
pub mod naming;
pub mod policy;
pub mod tracked;
pub mod versioned;

// Re-exports
pub use history_record::*;
pub use naming::*;
pub use policy::*;
pub use tracked::*;
pub use versioned::*;
