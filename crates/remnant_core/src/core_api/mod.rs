mod engine;
mod error;
mod types;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    EventEntry, ItemEntry, NodeListing, PrismSummary, ReplaceOutcome, SegmentEntry, SegmentListing,
};
