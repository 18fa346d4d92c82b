pub mod handler;
pub mod types;

pub use handler::{run_console, ConsoleSession};
