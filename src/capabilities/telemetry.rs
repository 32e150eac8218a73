use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Fire-and-forget diagnostics. Shells route these to their platform logger
/// or metrics pipeline; the core never waits on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum TelemetryOperation {
    Event {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Counter {
        name: String,
        value: u64,
    },
    Gauge {
        name: String,
        // f64 has no Eq; fixed-point keeps the operation comparable
        millis: i64,
    },
    Warn {
        code: String,
        detail: String,
    },
    Error {
        code: String,
        detail: String,
    },
}

impl Operation for TelemetryOperation {
    type Output = ();
}

#[derive(Clone)]
pub struct Telemetry<E> {
    context: CapabilityContext<TelemetryOperation, E>,
}

impl<Ev> Capability<Ev> for Telemetry<Ev> {
    type Operation = TelemetryOperation;
    type MappedSelf<MappedEv> = Telemetry<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Telemetry::new(self.context.map_event(f))
    }
}

impl<E> Telemetry<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<TelemetryOperation, E>) -> Self {
        Self { context }
    }

    fn notify(&self, operation: TelemetryOperation) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(operation).await;
        });
    }

    pub fn event(&self, name: &str, attrs: &[(&str, &str)]) {
        self.notify(TelemetryOperation::Event {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        });
    }

    pub fn counter(&self, name: &str, value: u64) {
        self.notify(TelemetryOperation::Counter {
            name: name.to_string(),
            value,
        });
    }

    pub fn gauge(&self, name: &str, value: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let millis = (value * 1000.0) as i64;
        self.notify(TelemetryOperation::Gauge {
            name: name.to_string(),
            millis,
        });
    }

    pub fn warn(&self, code: &str, detail: &str) {
        self.notify(TelemetryOperation::Warn {
            code: code.to_string(),
            detail: detail.to_string(),
        });
    }

    pub fn error(&self, code: &str, detail: &str) {
        self.notify(TelemetryOperation::Error {
            code: code.to_string(),
            detail: detail.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_serialization() {
        let op = TelemetryOperation::Event {
            name: "user_action".into(),
            attrs: vec![("event".into(), "wizard_next_requested".into())],
        };
        let json = serde_json::to_string(&op).unwrap();
        let parsed: TelemetryOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }

    #[test]
    fn test_gauge_fixed_point() {
        let op = TelemetryOperation::Gauge {
            name: "requests".into(),
            millis: 2500,
        };
        let json = serde_json::to_string(&op).unwrap();
        let parsed: TelemetryOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, parsed);
    }
}
