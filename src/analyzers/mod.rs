//! Descriptive statistics over a filtered trip dataset.
//!
//! Each pass is a read-only function of the dataset: travel times, popular
//! stations, trip duration, and user breakdown. [`analyzer::analyze`] runs
//! them all and assembles a [`types::StatisticsReport`].

pub mod analyzer;
pub mod duration;
pub mod stations;
pub mod time;
pub mod types;
pub mod users;
pub mod utility;
