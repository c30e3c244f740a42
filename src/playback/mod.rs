//! Macro replay

pub mod output;
pub mod scheduler;

#[cfg(feature = "native")]
pub mod native;

pub use output::{LogOutput, OutputCapability};
pub use scheduler::{MacroPlayer, PlaybackReport};
