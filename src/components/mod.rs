pub mod colors;
pub mod history;
pub mod tools;

pub use colors::Color;
pub use history::HistoryManager;
pub use tools::{Tool, ToolProperties};
