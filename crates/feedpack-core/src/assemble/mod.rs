//! Artifact assembly: select firmware files and lay out the output tree.

pub mod assembler;
pub mod filter;

pub use assembler::{
    Assembler, AssemblyReport, CREDENTIALS_FILE, DataSource, VENDOR_PREFIX,
};
pub use filter::{FileEntry, FilterPolicy, list_filtered_entries};
