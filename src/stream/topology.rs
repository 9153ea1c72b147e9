//! The mutation-routing topology.
//!
//! Consumes update and delete records, maintains containment and
//! inbound-reference quads on the affected journals, and coalesces cache
//! regenerations through a tumbling window. One thread per topic keeps
//! records for the same resource in arrival order; different resources
//! proceed in parallel.

use crate::core::{vocab, Quad};
use crate::events::{ChangeEvent, EventService, IdSupplier};
use crate::journal;
use crate::locking::{self, LockStore};
use crate::resource::cached;
use crate::storage::{resource_directory, RESOURCE_JOURNAL};
use crate::stream::window::WindowStore;
use crate::stream::{
    Message, MessageBus, TOPIC_DELETE, TOPIC_EVENT, TOPIC_INBOUND_ADD, TOPIC_INBOUND_DELETE,
    TOPIC_LDP_CONTAINER_ADD, TOPIC_LDP_CONTAINER_DELETE, TOPIC_RECACHE, TOPIC_UPDATE,
};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Where an update record is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRoute {
    /// The update creates a new child of an LDP container
    ContainerAdd {
        /// The parent container to receive the containment quad
        parent: String,
    },
    /// The update introduces inbound references to another resource
    InboundAdd {
        /// The referenced resource
        target: String,
    },
    /// Plain update: regenerate the resource's cache
    Recache,
}

/// Where a delete record is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRoute {
    /// The delete removes a container child
    ContainerDelete {
        /// The parent container losing the containment quad
        parent: String,
    },
    /// The delete removes inbound references
    InboundDelete {
        /// The formerly referenced resource
        target: String,
    },
    /// Plain delete: emit a change event
    Event,
}

/// Classify an update record. Branches are exclusive; first match wins.
pub fn route_update(message: &Message) -> UpdateRoute {
    if let Some(quad) = message.dataset.graph(vocab::ldp::PREFER_CONTAINMENT).next() {
        if let Some(parent) = quad.subject_iri() {
            return UpdateRoute::ContainerAdd { parent: parent.to_string() };
        }
    }
    if let Some(quad) = message.dataset.graph(vocab::trellis::INBOUND_REFERENCES).next() {
        if let Some(target) = quad.object.as_iri() {
            return UpdateRoute::InboundAdd { target: target.to_string() };
        }
    }
    UpdateRoute::Recache
}

/// Classify a delete record. Branches are exclusive; first match wins.
pub fn route_delete(message: &Message) -> DeleteRoute {
    if let Some(quad) = message.dataset.graph(vocab::ldp::PREFER_CONTAINMENT).next() {
        if let Some(parent) = quad.subject_iri() {
            return DeleteRoute::ContainerDelete { parent: parent.to_string() };
        }
    }
    if let Some(quad) = message.dataset.graph(vocab::trellis::INBOUND_REFERENCES).next() {
        if let Some(target) = quad.object.as_iri() {
            return DeleteRoute::InboundDelete { target: target.to_string() };
        }
    }
    DeleteRoute::Event
}

/// The running topology: one consumer thread per topic plus the window
/// flusher, sharing a shutdown flag.
pub struct StreamTopology {
    inner: Arc<TopologyInner>,
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

struct TopologyInner {
    bus: Arc<MessageBus>,
    partitions: HashMap<String, PathBuf>,
    lock_store: Arc<dyn LockStore>,
    events: Arc<dyn EventService>,
    id_supplier: IdSupplier,
    lock_timeout: Duration,
    window_delay: Duration,
    window: WindowStore,
}

impl StreamTopology {
    /// Wire a topology onto a bus. Threads start on `start`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bus: Arc<MessageBus>,
        partitions: HashMap<String, PathBuf>,
        lock_store: Arc<dyn LockStore>,
        events: Arc<dyn EventService>,
        id_supplier: IdSupplier,
        lock_timeout: Duration,
        window_delay: Duration,
        window_capacity: usize,
    ) -> Self {
        StreamTopology {
            inner: Arc::new(TopologyInner {
                bus,
                partitions,
                lock_store,
                events,
                id_supplier,
                lock_timeout,
                window_delay,
                window: WindowStore::new(window_capacity),
            }),
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Start the consumer threads.
    pub fn start(&mut self) {
        self.spawn(TOPIC_UPDATE, |inner, message| inner.on_update(message));
        self.spawn(TOPIC_DELETE, |inner, message| inner.on_delete(message));
        self.spawn(TOPIC_LDP_CONTAINER_ADD, |inner, message| {
            inner.apply_containment(message, true)
        });
        self.spawn(TOPIC_LDP_CONTAINER_DELETE, |inner, message| {
            inner.apply_containment(message, false)
        });
        self.spawn(TOPIC_INBOUND_ADD, |inner, message| inner.apply_inbound(message, true));
        self.spawn(TOPIC_INBOUND_DELETE, |inner, message| inner.apply_inbound(message, false));
        self.spawn_recache();
        self.spawn(TOPIC_EVENT, |inner, message| inner.on_event(message));
    }

    /// Stop the consumer threads, flushing the pending window first.
    pub fn shutdown(&mut self) {
        self.inner.flush_window();
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }

    fn spawn(&mut self, topic: &'static str, handler: fn(&TopologyInner, Message)) {
        let receiver = self.inner.bus.subscribe(topic);
        let inner = Arc::clone(&self.inner);
        let shutdown = Arc::clone(&self.shutdown);
        self.handles.push(std::thread::spawn(move || {
            while !shutdown.load(Ordering::SeqCst) {
                match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(message) => handler(&inner, message),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        }));
    }

    fn spawn_recache(&mut self) {
        let receiver = self.inner.bus.subscribe(TOPIC_RECACHE);
        let inner = Arc::clone(&self.inner);
        let shutdown = Arc::clone(&self.shutdown);
        self.handles.push(std::thread::spawn(move || {
            let mut window_close = Instant::now() + inner.window_delay;
            while !shutdown.load(Ordering::SeqCst) {
                match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(message) => {
                        if inner.window.offer(&message.key, message.dataset) {
                            // store at capacity: close the window early
                            inner.flush_window();
                            window_close = Instant::now() + inner.window_delay;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
                if Instant::now() >= window_close {
                    inner.flush_window();
                    window_close = Instant::now() + inner.window_delay;
                }
            }
        }));
    }
}

impl TopologyInner {
    fn on_update(&self, message: Message) {
        match route_update(&message) {
            UpdateRoute::ContainerAdd { parent } => {
                self.bus.publish(
                    TOPIC_LDP_CONTAINER_ADD,
                    Message { key: parent, dataset: message.dataset, hops: message.hops },
                );
            }
            UpdateRoute::InboundAdd { target } => {
                self.bus.publish(
                    TOPIC_INBOUND_ADD,
                    Message { key: target, dataset: message.dataset, hops: message.hops },
                );
            }
            UpdateRoute::Recache => {
                self.bus.publish(TOPIC_RECACHE, message);
            }
        }
    }

    fn on_delete(&self, message: Message) {
        if message.hops > 0 {
            // audit copy of a record already processed; do not route again
            debug!(key = %message.key, "audit copy on delete topic");
            return;
        }

        match route_delete(&message) {
            DeleteRoute::ContainerDelete { parent } => {
                self.bus.publish(
                    TOPIC_LDP_CONTAINER_DELETE,
                    Message { key: parent, dataset: message.dataset.clone(), hops: 0 },
                );
            }
            DeleteRoute::InboundDelete { target } => {
                self.bus.publish(
                    TOPIC_INBOUND_DELETE,
                    Message { key: target, dataset: message.dataset.clone(), hops: 0 },
                );
            }
            DeleteRoute::Event => {
                self.emit_event(&message.key, vocab::activitystreams::DELETE);
            }
        }

        let residual = Message { key: message.key, dataset: message.dataset, hops: 1 };
        self.bus.publish(TOPIC_DELETE, residual);
    }

    /// Apply a containment mutation to the parent's journal, then forward
    /// the parent to the recache topic.
    fn apply_containment(&self, message: Message, add: bool) {
        let parent = message.key.clone();
        let quads: Vec<Quad> = message
            .dataset
            .graph(vocab::ldp::PREFER_CONTAINMENT)
            .map(|q| {
                Quad::new(
                    vocab::trellis::PREFER_SERVER_MANAGED,
                    &parent,
                    vocab::ldp::CONTAINS,
                    q.object.clone(),
                )
            })
            .collect();
        if quads.is_empty() {
            return;
        }

        let (remove, append) = if add { (vec![], quads) } else { (quads, vec![]) };
        if let Err(e) = self.write_journal(&parent, &remove, &append) {
            error!(parent = %parent, "containment update failed: {}", e);
            return;
        }

        self.bus.publish(TOPIC_RECACHE, Message { key: parent, dataset: message.dataset, hops: 0 });
    }

    /// Write or remove inbound-reference quads on the target's journal.
    /// Terminal: nothing is forwarded.
    fn apply_inbound(&self, message: Message, add: bool) {
        let target = message.key.clone();
        let quads: Vec<Quad> =
            message.dataset.graph(vocab::trellis::INBOUND_REFERENCES).cloned().collect();
        if quads.is_empty() {
            return;
        }

        let (remove, append) = if add { (vec![], quads) } else { (quads, vec![]) };
        if let Err(e) = self.write_journal(&target, &remove, &append) {
            error!(target = %target, "inbound reference update failed: {}", e);
        }
    }

    fn write_journal(&self, identifier: &str, remove: &[Quad], add: &[Quad]) -> crate::Result<()> {
        let Some(dir) = resource_directory(&self.partitions, identifier) else {
            warn!(identifier = %identifier, "no partition for resource");
            return Ok(());
        };
        std::fs::create_dir_all(&dir)?;
        let _guard = locking::lock(&self.lock_store, identifier, self.lock_timeout)?;
        journal::write(&dir.join(RESOURCE_JOURNAL), remove, add, Utc::now())
    }

    fn flush_window(&self) {
        for (key, _dataset) in self.window.drain() {
            let Some(dir) = resource_directory(&self.partitions, &key) else {
                continue;
            };
            match cached::write(&dir, &key) {
                Ok(()) => self.emit_event(&key, vocab::activitystreams::UPDATE),
                Err(e) => {
                    // recoverable: the next read falls back to journal replay
                    error!(key = %key, "cache regeneration failed: {}", e);
                }
            }
        }
    }

    fn emit_event(&self, resource: &str, activity: &str) {
        let event = ChangeEvent::new(resource, activity, None);
        let node = format!("{}{}", vocab::trellis::BNODE_PREFIX, (self.id_supplier)());
        let dataset = event.to_dataset(&node);
        self.bus.publish(TOPIC_EVENT, Message::new(resource, dataset));
    }

    fn on_event(&self, message: Message) {
        if let Some(event) = ChangeEvent::from_dataset(&message.dataset) {
            self.events.emit(event);
        } else {
            warn!(key = %message.key, "event record without audit quads");
        }
    }
}
