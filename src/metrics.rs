//! Statement metrics and tracing spans.
//!
//! `METRICS` is available with the `metrics` feature, `tracing_helpers` with
//! the `tracing` feature.

#[cfg(feature = "metrics")]
pub use self::otel::{BuoyMetrics, METRICS};

#[cfg(feature = "metrics")]
mod otel {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        metrics::{Counter, Histogram, MeterProvider},
        KeyValue,
    };
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<BuoyMetrics> = Lazy::new(BuoyMetrics::init);

    pub struct BuoyMetrics {
        pub registry: Registry,
        pub provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub transactions_total: Counter<u64>,
    }

    impl BuoyMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let builder = SdkMeterProvider::builder();
            let builder = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => builder.with_reader(exporter),
                Err(e) => {
                    log::warn!("prometheus exporter unavailable, metrics stay in-process: {e}");
                    builder
                }
            };
            let provider = builder.build();
            let meter = provider.meter("buoy");

            let queries_total = meter
                .u64_counter("buoy_queries_total")
                .with_description("Total statements executed")
                .build();

            let query_errors_total = meter
                .u64_counter("buoy_query_errors_total")
                .with_description("Statements that failed in the driver")
                .build();

            let query_duration = meter
                .f64_histogram("buoy_query_duration_seconds")
                .with_description("Duration of statements")
                .build();

            let transactions_total = meter
                .u64_counter("buoy_transactions_total")
                .with_description("Transaction boundaries by outcome")
                .build();

            Self {
                registry,
                provider,
                queries_total,
                query_errors_total,
                query_duration,
                transactions_total,
            }
        }

        pub fn record_query(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_outcome(&self, elapsed: Duration, ok: bool) {
            self.record_query(elapsed);
            if !ok {
                self.record_query_error();
            }
        }

        /// Prometheus text exposition of everything registered so far.
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
                log::warn!("failed to encode metrics: {e}");
            }
            String::from_utf8_lossy(&buffer).into_owned()
        }

        /// `outcome` is `begin`, `commit` or `rollback`.
        pub fn record_transaction(&self, outcome: &'static str) {
            self.transactions_total
                .add(1, &[KeyValue::new("outcome", outcome)]);
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{debug_span, info_span, Span};

    /// Longest statement text recorded on a span.
    const STATEMENT_PREVIEW: usize = 256;

    fn preview(sql: &str) -> &str {
        match sql.char_indices().nth(STATEMENT_PREVIEW) {
            Some((idx, _)) => &sql[..idx],
            None => sql,
        }
    }

    pub fn execute_query_span(sql: &str) -> Span {
        debug_span!("buoy.execute", db.statement = preview(sql))
    }

    pub fn begin_transaction_span() -> Span {
        info_span!("buoy.transaction.begin")
    }

    pub fn commit_transaction_span() -> Span {
        info_span!("buoy.transaction.commit")
    }

    pub fn rollback_transaction_span() -> Span {
        info_span!("buoy.transaction.rollback")
    }

    pub fn acquire_connection_span() -> Span {
        info_span!("buoy.connect")
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_preview_truncates_on_char_boundary() {
            let long = "é".repeat(STATEMENT_PREVIEW + 10);
            assert_eq!(preview(&long).chars().count(), STATEMENT_PREVIEW);
            assert_eq!(preview("SELECT 1"), "SELECT 1");
        }
    }
}
