//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_admission_denied, record_bookkeeping_failure,
    record_generation_duration, record_http_request, record_tryon_request, PrometheusMetrics,
};
