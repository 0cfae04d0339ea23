//! Core types shared by the engine and its surfaces.

mod error;
mod filter;
mod language;
pub mod progress;
mod window;

pub use error::{Error, Result};
pub use filter::{is_test_file, ChangeFilter};
pub use language::Language;
pub use window::Window;
