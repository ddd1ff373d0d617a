//! cmdkit: build, publish and link a directory of command files onto PATH
//!
//! ```text
//! source_dir --build--> dist_dir --copy--> installed_dir --link--> path_dir/<name>
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
