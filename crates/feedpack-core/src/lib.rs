//! Feedpack Core Library
//!
//! Packages fish feeder firmware for deployment in battery or api mode and
//! talks to a running feeder over its HTTP API.

pub mod assemble;
pub mod config;
pub mod context;
pub mod device;
pub mod frontend;
pub mod fs;
pub mod manifest;
pub mod pipeline;
pub mod types;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{PackConfig, load_or_default};
    pub use crate::context::BuildContext;
    pub use crate::types::{BuildMode, ModeParseError};

    // Pipeline
    pub use crate::assemble::{DataSource, FilterPolicy};
    pub use crate::frontend::{CommandRunner, CommandStatus, SystemCommandRunner};
    pub use crate::pipeline::{BuildPipeline, BuildReport, BuildSummary, FrontendStatus};

    // Device
    pub use crate::device::{DeviceClient, DeviceError};
}
