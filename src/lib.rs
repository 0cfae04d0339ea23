//! fixrisk - defect-risk scoring of files from git history.
//!
//! Mines the commits of a repository inside a date window, follows files
//! across renames, and scores every touched source file from five signals:
//! how recently and how often it was fixed, how often and how heavily it was
//! changed, and how new its developers were. Signal weights adapt to the
//! variance each signal shows in the repository.
//!
//! # Example
//!
//! ```no_run
//! use fixrisk::core::Window;
//! use fixrisk::git::GitRepo;
//! use fixrisk::risk::Analyzer;
//!
//! let repo = GitRepo::open(".").unwrap();
//! let history = repo.history(Some("main")).unwrap();
//! let window = Window::parse("2024-01-01", "2024-06-30").unwrap();
//! let analysis = Analyzer::new().analyze(&history, &window).unwrap();
//! for entry in analysis.top(Some(10)) {
//!     println!("{:.4} {}", entry.score, entry.key);
//! }
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod core;
pub mod eval;
pub mod git;
pub mod output;
pub mod risk;

pub use risk::{Analysis, Analyzer};
