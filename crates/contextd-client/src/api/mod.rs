//! API endpoint implementations.

mod context;
mod health;

pub use context::{ContextApi, RecentQuery};
pub use health::HealthApi;
