//! HTTP surface for the pullcast acquisition pipeline.

pub mod api;
pub mod metrics;
pub mod state;
