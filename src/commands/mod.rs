//! Command runners behind the CLI subcommands

pub mod playback;
pub mod recording;

pub use playback::{run_play, PlayOptions};
pub use recording::{run_list, run_record, RecordOptions};
