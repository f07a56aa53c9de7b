//! Observability infrastructure - Prometheus metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    create_metrics_router, init_metrics, record_decision, record_evaluation_duration,
    record_suspension, PrometheusMetrics,
};
