//! Confidence filtering and ranking of decoded boxes.

pub mod filter;

pub use filter::{filter_candidates, Candidate};
