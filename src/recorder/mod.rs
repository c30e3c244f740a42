//! Recording session and the input channel interface it is fed by

pub mod channel;
pub mod session;

pub use channel::{InputChannel, InputSink};
pub use session::{RecordingSession, SessionHandle};
