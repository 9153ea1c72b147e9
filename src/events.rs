//! Change events and the notification sink.
//!
//! Every resource mutation produces at most one change event, delivered to
//! an `EventService` sink. The transport behind the sink (LDN, websockets,
//! a message queue) is outside the engine.

use crate::core::vocab;
use crate::core::{Dataset, Quad, Term};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Supplier of unique opaque strings, used to skolemize blank nodes.
pub type IdSupplier = Arc<dyn Fn() -> String + Send + Sync>;

/// An identifier supplier combining the process start instant with a
/// monotonic counter.
pub fn default_id_supplier() -> IdSupplier {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let epoch = Utc::now().timestamp_millis();
    Arc::new(move || format!("{:x}-{:x}", epoch, COUNTER.fetch_add(1, Ordering::Relaxed)))
}

/// A change notification for one resource mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// When the mutation happened
    pub timestamp: DateTime<Utc>,
    /// The mutated resource
    pub resource: String,
    /// ActivityStreams activity type (Create, Update, Delete)
    pub activity: String,
    /// The agent responsible, when known
    pub actor: Option<String>,
}

impl ChangeEvent {
    /// Create an event stamped `now`.
    pub fn new(resource: &str, activity: &str, actor: Option<&str>) -> Self {
        ChangeEvent {
            timestamp: Utc::now(),
            resource: resource.to_string(),
            activity: activity.to_string(),
            actor: actor.map(str::to_string),
        }
    }

    /// Render the event as audit-context quads, the form carried on the
    /// event topic.
    pub fn to_dataset(&self, activity_node: &str) -> Dataset {
        let mut dataset = Dataset::new();
        dataset.add(Quad::new(
            vocab::trellis::PREFER_AUDIT,
            &self.resource,
            vocab::prov::WAS_GENERATED_BY,
            Term::iri(activity_node),
        ));
        dataset.add(Quad::new(
            vocab::trellis::PREFER_AUDIT,
            activity_node,
            vocab::rdf::TYPE,
            Term::iri(&self.activity),
        ));
        dataset.add(Quad::new(
            vocab::trellis::PREFER_AUDIT,
            activity_node,
            vocab::prov::GENERATED_AT_TIME,
            Term::typed_literal(
                &self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
                vocab::xsd::DATE_TIME,
            ),
        ));
        if let Some(actor) = &self.actor {
            dataset.add(Quad::new(
                vocab::trellis::PREFER_AUDIT,
                activity_node,
                vocab::prov::WAS_ASSOCIATED_WITH,
                Term::iri(actor),
            ));
        }
        dataset
    }

    /// Reconstruct an event from audit-context quads, if present.
    pub fn from_dataset(dataset: &Dataset) -> Option<ChangeEvent> {
        let generated = dataset
            .graph(vocab::trellis::PREFER_AUDIT)
            .find(|q| q.predicate == vocab::prov::WAS_GENERATED_BY)?;
        let resource = generated.subject_iri()?.to_string();
        let activity_node = generated.object.as_iri()?;

        let about_activity = |predicate: &str| {
            dataset
                .graph(vocab::trellis::PREFER_AUDIT)
                .find(|q| q.subject_iri() == Some(activity_node) && q.predicate == predicate)
        };

        let activity = about_activity(vocab::rdf::TYPE)?.object.as_iri()?.to_string();
        let timestamp = about_activity(vocab::prov::GENERATED_AT_TIME)
            .and_then(|q| q.object.as_literal())
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&Utc))?;
        let actor = about_activity(vocab::prov::WAS_ASSOCIATED_WITH)
            .and_then(|q| q.object.as_iri())
            .map(str::to_string);

        Some(ChangeEvent { timestamp, resource, activity, actor })
    }
}

/// A notification sink accepting change events.
pub trait EventService: Send + Sync {
    /// Deliver one event. Failures are the sink's to report; the journal
    /// write that produced the event is never rolled back.
    fn emit(&self, event: ChangeEvent);
}

/// Sink that logs each event.
#[derive(Default)]
pub struct LogEventService;

impl EventService for LogEventService {
    fn emit(&self, event: ChangeEvent) {
        info!(
            resource = %event.resource,
            activity = %event.activity,
            "change event at {}",
            event.timestamp
        );
    }
}

/// Sink that collects events in memory, for embedders and tests.
#[derive(Default)]
pub struct MemoryEventService {
    events: Mutex<Vec<ChangeEvent>>,
}

impl MemoryEventService {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events delivered so far.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventService for MemoryEventService {
    fn emit(&self, event: ChangeEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_to_dataset() {
        let event = ChangeEvent::new(
            "info:trellis/repository/resource",
            vocab::activitystreams::UPDATE,
            Some(vocab::trellis::REPOSITORY_ADMINISTRATOR),
        );
        let dataset = event.to_dataset("info:trellis/bnode/activity-1");
        assert_eq!(dataset.len(), 4);
        assert!(dataset.has_graph(vocab::trellis::PREFER_AUDIT));
    }

    #[test]
    fn test_event_dataset_roundtrip() {
        let event = ChangeEvent::new(
            "info:trellis/repository/resource",
            vocab::activitystreams::DELETE,
            Some(vocab::trellis::REPOSITORY_ADMINISTRATOR),
        );
        let dataset = event.to_dataset("info:trellis/bnode/activity-2");
        let decoded = ChangeEvent::from_dataset(&dataset).expect("decoded event");
        assert_eq!(decoded.resource, event.resource);
        assert_eq!(decoded.activity, event.activity);
        assert_eq!(decoded.actor, event.actor);
    }

    #[test]
    fn test_from_dataset_without_audit_quads() {
        assert!(ChangeEvent::from_dataset(&Dataset::new()).is_none());
    }

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemoryEventService::new();
        sink.emit(ChangeEvent::new("info:trellis/a", vocab::activitystreams::CREATE, None));
        sink.emit(ChangeEvent::new("info:trellis/b", vocab::activitystreams::DELETE, None));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].resource, "info:trellis/a");
        assert_eq!(events[1].activity, vocab::activitystreams::DELETE);
    }
}
