// Public API - what other modules can use
pub use handlers::{delete_activity, edit_activity, get_activity, log_activity};

// Internal modules
mod handlers;
pub mod models;
pub mod types;
