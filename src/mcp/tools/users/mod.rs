// Users module
pub mod get_me;

// Re-export the public items
pub use get_me::{GetMeArgs, get_me};
