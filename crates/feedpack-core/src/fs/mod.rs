//! Filesystem primitives shared across the pipeline.

pub mod copy;
pub mod stats;
pub mod tree_hash;

pub use copy::{CopyFailure, copy_dir_recursive, copy_file, ensure_dir};
pub use stats::{count_files, dir_size};
pub use tree_hash::{hash_tree, hash_tree_excluding};
