pub mod logging;
pub mod metrics;

pub use logging::request_logger;
pub use metrics::{metrics_middleware, HttpMetrics};
