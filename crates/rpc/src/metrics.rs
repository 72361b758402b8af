use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How a message left the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A response envelope was produced, soft errors included
    Handled,
    /// The service did not recognize the message type
    Unrecognized,
    /// The handler faulted
    Fault,
}

impl Outcome {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Unrecognized => "unrecognized",
            Self::Fault => "fault",
        }
    }
}

/// Metrics collector for one service host
///
/// Each collector owns its registry, so several hosts can coexist in one
/// process (tests do).
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    pub messages: CounterVec,
    pub processing_duration: HistogramVec,
    pub entities: GaugeVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages = CounterVec::new(
            Opts::new("neuromesh_messages_total", "Total number of messages processed"),
            &["service", "type", "outcome"],
        )?;
        registry.register(Box::new(messages.clone()))?;

        let processing_duration = HistogramVec::new(
            HistogramOpts::new(
                "neuromesh_processing_seconds",
                "Message processing duration in seconds",
            ),
            &["service", "type"],
        )?;
        registry.register(Box::new(processing_duration.clone()))?;

        let entities = GaugeVec::new(
            Opts::new("neuromesh_entities", "Number of entities per store"),
            &["service", "store"],
        )?;
        registry.register(Box::new(entities.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            messages,
            processing_duration,
            entities,
        })
    }

    /// Export metrics in Prometheus format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode_to_string(&metric_families)
    }

    /// Record one processed message
    ///
    /// Unrecognized types are folded into a single label value to keep
    /// label cardinality bounded.
    pub fn record_message(&self, service: &str, message_type: &str, outcome: Outcome, seconds: f64) {
        let label = match outcome {
            Outcome::Unrecognized => "unrecognized",
            _ => message_type,
        };
        self.messages
            .with_label_values(&[service, label, outcome.as_str()])
            .inc();
        if outcome == Outcome::Handled {
            self.processing_duration
                .with_label_values(&[service, message_type])
                .observe(seconds);
        }
    }

    /// Update entity gauges from a service's store counts
    pub fn set_entities(&self, service: &str, counts: &BTreeMap<String, usize>) {
        for (store, count) in counts {
            self.entities
                .with_label_values(&[service, store.as_str()])
                .set(*count as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_independent_registries() {
        let first = Metrics::new().unwrap();
        let second = Metrics::new().unwrap();

        first.record_message("sales", "GET_PIPELINE", Outcome::Handled, 0.001);
        assert!(first.export().unwrap().contains("neuromesh_messages_total"));
        assert!(!second.export().unwrap().contains("GET_PIPELINE"));
    }

    #[test]
    fn test_unrecognized_label_is_folded() {
        let metrics = Metrics::new().unwrap();
        metrics.record_message("sales", "WHATEVER_1", Outcome::Unrecognized, 0.0);
        metrics.record_message("sales", "WHATEVER_2", Outcome::Unrecognized, 0.0);

        let exported = metrics.export().unwrap();
        assert!(!exported.contains("WHATEVER"));
        assert_eq!(
            metrics
                .messages
                .with_label_values(&["sales", "unrecognized", "unrecognized"])
                .get(),
            2.0
        );
    }

    #[test]
    fn test_entity_gauges() {
        let metrics = Metrics::new().unwrap();
        let counts = BTreeMap::from([("leads".to_string(), 3), ("campaigns".to_string(), 1)]);
        metrics.set_entities("sales", &counts);

        let exported = metrics.export().unwrap();
        assert!(exported.contains("neuromesh_entities{service=\"sales\",store=\"leads\"} 3"));
    }
}
