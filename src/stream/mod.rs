//! The event stream layer: named topics, the in-process message bus, the
//! mutation-routing topology and the Kafka mirror.

use crate::core::Dataset;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;

pub mod kafka_adapter;
pub mod topology;
pub mod window;

/// Topic carrying resource update datasets
pub const TOPIC_UPDATE: &str = "trellis.update";
/// Topic carrying resource delete datasets
pub const TOPIC_DELETE: &str = "trellis.delete";
/// Topic carrying inbound-reference additions
pub const TOPIC_INBOUND_ADD: &str = "trellis.inbound.add";
/// Topic carrying inbound-reference removals
pub const TOPIC_INBOUND_DELETE: &str = "trellis.inbound.delete";
/// Topic carrying containment additions for LDP containers
pub const TOPIC_LDP_CONTAINER_ADD: &str = "trellis.ldpcontainer.add";
/// Topic carrying containment removals for LDP containers
pub const TOPIC_LDP_CONTAINER_DELETE: &str = "trellis.ldpcontainer.delete";
/// Topic carrying coalesced cache-regeneration requests
pub const TOPIC_RECACHE: &str = "trellis.cache";
/// Topic carrying change events for the notification sink
pub const TOPIC_EVENT: &str = "trellis.event";

/// One record on a topic: a resource key with a multi-graph dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// The resource IRI this record is keyed by
    pub key: String,
    /// The quads carried by the record
    pub dataset: Dataset,
    /// Republication count; audit copies carry a nonzero value
    pub hops: u32,
}

impl Message {
    /// Create a first-publication message.
    pub fn new(key: &str, dataset: Dataset) -> Self {
        Message { key: key.to_string(), dataset, hops: 0 }
    }
}

/// In-process publish/subscribe bus over mpsc channels.
///
/// Each subscriber owns a receiver; publishing clones the message to every
/// live subscriber of the topic. Subscribers that dropped their receiver
/// are pruned on the next publish.
#[derive(Default)]
pub struct MessageBus {
    subscribers: Mutex<HashMap<String, Vec<Sender<Message>>>>,
}

impl MessageBus {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a topic.
    pub fn subscribe(&self, topic: &str) -> Receiver<Message> {
        let (sender, receiver) = channel();
        self.subscribers.lock().unwrap().entry(topic.to_string()).or_default().push(sender);
        receiver
    }

    /// Publish a message to all subscribers of a topic; returns how many
    /// received it.
    pub fn publish(&self, topic: &str, message: Message) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        let Some(senders) = subscribers.get_mut(topic) else {
            return 0;
        };
        senders.retain(|sender| sender.send(message.clone()).is_ok());
        senders.len()
    }
}
