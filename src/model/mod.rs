//! The rating engine. Everything here is pure computation over snapshots;
//! persisting the results is the job of [`crate::database`].
//!
//! The flow of a match: match_recorder -> rating_utils
//! The flow of a decay run: decay_processor -> decay

pub mod constants;
pub mod decay;
pub mod decay_processor;
pub mod error;
pub mod match_recorder;
pub mod rating_tracker;
pub mod rating_utils;
pub mod replay;
pub mod structures;

pub use constants::RatingConstants;
pub use error::RatingError;
