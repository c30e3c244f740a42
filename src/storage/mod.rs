//! Persistence of recorded macros

pub mod codec;

pub use codec::{decode_record, load, save, KeyDirection, PersistedRecord, RecordBody, SaveOutcome};
