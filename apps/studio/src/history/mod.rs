pub mod engine;
pub mod manager;

pub use engine::{History, HistoryStatus};
pub use manager::HistoryManager;
