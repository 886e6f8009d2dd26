//! # Filesystem Primitives
//!
//! Single-file moves and content hashing used by apply and undo, and the
//! on-disk description of files fed to the plan builder.

pub mod hash;
pub mod ops;
pub mod scan;

pub use hash::{files_identical, sha256sum};
pub use ops::{MoveOptions, MoveOutcome, atomic_move, long_path};
pub use scan::describe_file;
