//! Loading the organization and keeping its tree current.
//!
//! A [`Dataset`] is the on-disk seed format. An [`OrgChart`] owns the
//! repository loaded from it and rebuilds the tree after every change.

pub mod chart;
pub mod dataset;

pub use chart::{ChartError, OpenError, OrgChart};
pub use dataset::{Dataset, LoadError};
