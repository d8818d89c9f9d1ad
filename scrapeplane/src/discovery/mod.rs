//! Target discovery.
//!
//! A [`TargetProvider`] produces target groups; a [`TargetSet`] runs a set
//! of providers, merges what they report and pushes the merged view into a
//! [`TargetSink`], normally a scrape pool.

mod provider;
mod static_provider;
mod target_set;

pub use provider::{providers_from_config, ProviderFuture, ProviderSet, TargetProvider};
pub use static_provider::StaticProvider;
pub use target_set::{TargetSet, TargetSink, UPDATE_CHANNEL_CAPACITY};
