//! Address ingestion: the source chain, payload decoding and repair

pub mod loader;
pub mod payload;
pub mod repair;
pub mod sample;

use thiserror::Error;

pub use loader::{AddressLoader, LoadNotice, LoadOutcome, LoadedFrom, NoticeLevel, SourceKind, Upload};
pub use payload::parse_payload;
pub use repair::repair_json;
pub use sample::generate_sample_addresses;

/// Why a single source tier produced no records.
///
/// These never escape the loader; each becomes a notice and the next tier
/// is tried.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File missing, network failure, or non-success HTTP status
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// Body did not parse, even after one repair attempt
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Body parsed but held no address records
    #[error("payload contained no addresses")]
    Empty,
}
