//! CLI command implementations.
//!
//! - [`run`] - Run scrape jobs until interrupted

pub mod run;
