//! Simple to use cli for summarizing clocked outline journals.
//! Reads json exports of org-style outlines, clips their clock entries to a
//! reporting period and aggregates the result into hierarchical, grouped and
//! calendar views.
//!

pub mod calendar;
pub mod cli;
pub mod outline;
pub mod rollup;
pub mod utils;
