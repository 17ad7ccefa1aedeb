//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) but are themselves
//! concrete structs, not traits.

mod replay;

pub use replay::{
    tree_digest, ReplayOptions, ReplayReport, ReplayService, StepOutcome, StepReport,
};
