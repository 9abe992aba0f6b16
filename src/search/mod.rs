//! Search strategies for locating template instances.
//!
//! `response` holds the dense score surface and the visited mask used for
//! peak suppression; `find_all` drives the repeated maximum search.

pub(crate) mod find_all;
pub(crate) mod response;

pub use find_all::{collect_peaks, Match, MatchConfig, TemplateMatcher, Threshold, DEFAULT_PRECISION};
pub use response::{Peak, PeakMask, ResponseMap};
