//! Luminosity Series
//!
//! The in-process history of luminosity samples and the timestamp
//! normalization that feeds it:
//!
//! - **time**: Parses upstream `recvTime` strings into the display timezone
//! - **store**: Insertion-ordered parallel sequences of timestamps and values
//!
//! # Example
//!
//! ```rust
//! use luminosity_viewer::series::{OverlapPolicy, Sample, SeriesStore, TimeNormalizer};
//!
//! let normalizer = TimeNormalizer::new(chrono_tz::Europe::Lisbon);
//! let timestamp = normalizer.normalize("2024-01-01T10:00:00.000Z").unwrap();
//!
//! let mut store = SeriesStore::new(OverlapPolicy::Append, None);
//! store.append(vec![Sample::new(timestamp, 12.5)]);
//!
//! assert_eq!(store.len(), 1);
//! assert_eq!(store.mean(), Some(12.5));
//! ```

pub mod store;
pub mod time;

pub use store::{OverlapPolicy, Sample, SeriesStore};
pub use time::{TimeError, TimeNormalizer};
