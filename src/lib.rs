pub mod config;
pub mod drilldown;
pub mod error;
pub mod expansion;
pub mod explorer;
pub mod hierarchy;
pub mod model;
pub mod render;
pub mod resolver;
pub mod search;
pub mod server;
pub mod session;
pub mod stats;
pub mod store;
#[doc(hidden)]
pub mod test_support;
