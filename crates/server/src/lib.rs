pub mod api;
pub mod events;
pub mod metrics;
pub mod state;
