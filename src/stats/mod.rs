//! Aggregations over a normalized dataset.
//!
//! Each submodule computes one kind of report value; none of them touch the
//! filesystem or render anything.

pub mod buckets;
pub mod correlation;
pub mod crosstab;
pub mod density;
pub mod describe;
pub mod frequency;
pub mod groups;
pub mod heatmap;
pub mod hypothesis;
pub mod utility;
