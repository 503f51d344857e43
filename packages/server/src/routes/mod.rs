mod health;
mod receipts;

pub use health::health_handler;
pub use receipts::{list_handler, process_handler};
