//! The resource service façade.
//!
//! The service locates a resource's on-disk directory, appends journal
//! blocks under the per-resource lock, keeps the latest-state cache either
//! synchronously or through the recache topic, and publishes every mutation
//! to the event stream.

use crate::core::vocab::{self, REPO_PREFIX};
use crate::core::{Dataset, Quad, Term};
use crate::events::IdSupplier;
use crate::journal;
use crate::locking::{self, LockStore};
use crate::parsing::patch_parser::{parse_line, JournalLine};
use crate::resource::{cached, versioned, Resource};
use crate::storage::{
    as_path, resource_directory, MEMENTO_CACHE, PREFIX_DEPTH, RESOURCE_CACHE, RESOURCE_JOURNAL,
    RESOURCE_QUADS,
};
use crate::stream::kafka_adapter::KafkaProducerAdapter;
use crate::stream::{Message, MessageBus, TOPIC_DELETE, TOPIC_UPDATE};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use walkdir::WalkDir;

/// Explicit configuration record threaded through the service constructor.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Mapping from partition name to its data directory
    pub partitions: HashMap<String, PathBuf>,
    /// When true, `write` leaves cache regeneration to the recache topic
    pub async_cache: bool,
    /// Kafka endpoint mirroring the event stream, when configured
    pub bootstrap_servers: Option<String>,
    /// Coalescing window size for recache events, in milliseconds
    pub window_delay_ms: u64,
    /// Max entries in the in-memory window store
    pub window_cache_size: usize,
    /// Per-resource lock acquisition timeout, in milliseconds
    pub lock_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            partitions: HashMap::new(),
            async_cache: false,
            bootstrap_servers: None,
            window_delay_ms: 5000,
            window_cache_size: 4095,
            lock_timeout_ms: 100,
        }
    }
}

/// The public façade over the journal, the cache and the event stream.
pub struct ResourceService {
    config: ServiceConfig,
    lock_store: Arc<dyn LockStore>,
    bus: Arc<MessageBus>,
    id_supplier: IdSupplier,
    kafka: Option<KafkaProducerAdapter>,
}

impl ResourceService {
    /// Construct the service, validating every partition root and
    /// initializing missing partition root resources.
    pub fn new(
        config: ServiceConfig,
        lock_store: Arc<dyn LockStore>,
        bus: Arc<MessageBus>,
        id_supplier: IdSupplier,
    ) -> Result<Self> {
        let kafka = match &config.bootstrap_servers {
            Some(servers) => Some(KafkaProducerAdapter::new(servers)?),
            None => None,
        };
        let service = ResourceService { config, lock_store, bus, id_supplier, kafka };
        service.init()?;
        Ok(service)
    }

    /// The latest state of a resource: the cached snapshot when present,
    /// the journal replayed at now otherwise.
    pub fn get(&self, identifier: &str) -> Result<Option<Resource>> {
        let Some(dir) = resource_directory(&self.config.partitions, identifier) else {
            return Ok(None);
        };
        if !dir.exists() {
            return Ok(None);
        }
        if dir.join(RESOURCE_CACHE).is_file() {
            if let Some(resource) = cached::find(&dir, identifier) {
                return Ok(Some(resource));
            }
        }
        versioned::find(&dir, identifier, Utc::now())
    }

    /// The state of a resource at `time`, always from the journal.
    pub fn get_at(&self, identifier: &str, time: DateTime<Utc>) -> Result<Option<Resource>> {
        let Some(dir) = resource_directory(&self.config.partitions, identifier) else {
            return Ok(None);
        };
        if !dir.exists() {
            return Ok(None);
        }
        versioned::find(&dir, identifier, time)
    }

    /// Append one journal block for a resource under its lock.
    ///
    /// Returns `Ok(false)` when the identifier resolves to no configured
    /// partition. In synchronous mode the cache is regenerated before
    /// returning; either way a record is published to the update topic.
    pub fn write(
        &self,
        identifier: &str,
        remove: &[Quad],
        add: &[Quad],
        time: DateTime<Utc>,
    ) -> Result<bool> {
        let Some(dir) = resource_directory(&self.config.partitions, identifier) else {
            return Ok(false);
        };
        fs::create_dir_all(&dir)?;
        let journal_file = dir.join(RESOURCE_JOURNAL);
        let is_new = !journal_file.is_file();

        {
            let _guard =
                locking::lock(&self.lock_store, identifier, self.lock_timeout())?;
            journal::write(&journal_file, remove, add, time)?;
            if !self.config.async_cache {
                cached::write(&dir, identifier)?;
            }
        }

        let dataset = self.update_dataset(identifier, add, is_new);
        self.publish(TOPIC_UPDATE, Message::new(identifier, dataset));
        Ok(true)
    }

    /// Remove a resource's journal and every derived artifact, returning
    /// the IRIs of binary datastreams referenced from its history.
    pub fn purge(&self, identifier: &str) -> Result<Vec<String>> {
        let Some(dir) = resource_directory(&self.config.partitions, identifier) else {
            return Ok(Vec::new());
        };
        let journal_file = dir.join(RESOURCE_JOURNAL);

        let binaries = {
            let _guard =
                locking::lock(&self.lock_store, identifier, self.lock_timeout())?;

            let mut binaries = Vec::new();
            if journal_file.is_file() {
                let reader = BufReader::new(fs::File::open(&journal_file)?);
                for line in reader.lines() {
                    let line = line?;
                    if let Ok(JournalLine::Add(quad)) = parse_line(&line) {
                        if quad.graph == vocab::trellis::PREFER_SERVER_MANAGED
                            && quad.subject_iri() == Some(identifier)
                            && quad.predicate == vocab::dc::HAS_PART
                        {
                            if let Some(binary) = quad.object.as_iri() {
                                binaries.push(binary.to_string());
                            }
                        }
                    }
                }
            }

            for name in [RESOURCE_JOURNAL, RESOURCE_CACHE, RESOURCE_QUADS, MEMENTO_CACHE] {
                let path = dir.join(name);
                if path.is_file() {
                    fs::remove_file(path)?;
                }
            }
            binaries
        };

        let dataset = self.delete_dataset(identifier);
        self.publish(TOPIC_DELETE, Message::new(identifier, dataset));
        Ok(binaries)
    }

    /// Walk a partition root and yield one `rdf:type` quad per cached
    /// resource, read from the cache headers.
    pub fn list(&self, partition: &str) -> Result<Vec<Quad>> {
        let Some(root) = self.config.partitions.get(partition) else {
            return Ok(Vec::new());
        };

        let mut listing = Vec::new();
        for entry in WalkDir::new(root)
            .max_depth(PREFIX_DEPTH + 2)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && entry.file_name() == RESOURCE_CACHE {
                if let Some(parent) = entry.path().parent() {
                    if let Some(resource) = cached::read(parent) {
                        listing.push(Quad::new(
                            vocab::trellis::PREFER_SERVER_MANAGED,
                            &resource.identifier,
                            vocab::rdf::TYPE,
                            Term::iri(&resource.interaction_model),
                        ));
                    }
                }
            }
        }
        Ok(listing)
    }

    /// Reserved: garbage-collect superseded journal entries.
    pub fn compact(&self, identifier: &str) -> Result<Vec<String>> {
        Err(Error::Unsupported(format!("compact is not implemented: {}", identifier)))
    }

    /// The bus carrying this service's published records.
    pub fn bus(&self) -> Arc<MessageBus> {
        Arc::clone(&self.bus)
    }

    fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.config.lock_timeout_ms)
    }

    fn publish(&self, topic: &str, message: Message) {
        self.bus.publish(topic, message.clone());
        if let Some(kafka) = &self.kafka {
            if let Err(e) = kafka.send(topic, &message) {
                // never rolled back; downstream re-converges on the next event
                error!(topic = %topic, "event publish failed: {}", e);
            }
        }
    }

    /// Assemble the dataset published for a write: the added quads, plus a
    /// containment marker when the write created a new child resource,
    /// plus inbound-reference markers for repository IRIs it points at.
    fn update_dataset(&self, identifier: &str, add: &[Quad], is_new: bool) -> Dataset {
        let mut dataset = Dataset::from_quads(add.to_vec());

        if is_new {
            if let Some(parent) = parent_identifier(identifier) {
                dataset.add(Quad::new(
                    vocab::ldp::PREFER_CONTAINMENT,
                    &parent,
                    vocab::ldp::CONTAINS,
                    Term::iri(identifier),
                ));
            }
        }

        for quad in add.iter().filter(|q| q.graph == vocab::trellis::PREFER_USER_MANAGED) {
            if let Some(target) = quad.object.as_iri() {
                if target.starts_with(REPO_PREFIX) && target != identifier {
                    dataset.add(Quad::new(
                        vocab::trellis::INBOUND_REFERENCES,
                        identifier,
                        &quad.predicate,
                        Term::iri(target),
                    ));
                }
            }
        }

        dataset
    }

    fn delete_dataset(&self, identifier: &str) -> Dataset {
        let mut dataset = Dataset::new();
        if let Some(parent) = parent_identifier(identifier) {
            dataset.add(Quad::new(
                vocab::ldp::PREFER_CONTAINMENT,
                &parent,
                vocab::ldp::CONTAINS,
                Term::iri(identifier),
            ));
        }
        dataset
    }

    fn init(&self) -> Result<()> {
        for (name, root) in &self.config.partitions {
            info!(partition = %name, "using resource data directory: {}", root.display());
            fs::create_dir_all(root)?;
            probe_writable(root)?;

            let identifier = format!("{}{}", REPO_PREFIX, name);
            let Some(dir) = resource_directory(&self.config.partitions, &identifier) else {
                return Err(Error::Config(format!("partition root unresolvable: {}", name)));
            };
            if dir.join(RESOURCE_JOURNAL).is_file() {
                continue;
            }

            info!(root = %identifier, "initializing root container");
            fs::create_dir_all(&dir)?;
            let quads = self.root_quads(&identifier);
            journal::write(&dir.join(RESOURCE_JOURNAL), &[], &quads, Utc::now())?;
            cached::write(&dir, &identifier)?;
        }
        Ok(())
    }

    /// The initial block of a partition root: the container type, a default
    /// ACL for the administrator, and a creation provenance record.
    fn root_quads(&self, identifier: &str) -> Vec<Quad> {
        let auth = format!("{}#auth", identifier);
        let skolem = format!("{}{}", vocab::trellis::BNODE_PREFIX, (self.id_supplier)());
        let now = Utc::now();

        vec![
            Quad::new(
                vocab::trellis::PREFER_SERVER_MANAGED,
                identifier,
                vocab::rdf::TYPE,
                Term::iri(vocab::ldp::CONTAINER),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::rdf::TYPE,
                Term::iri(vocab::acl::AUTHORIZATION),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::acl::MODE,
                Term::iri(vocab::acl::READ),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::acl::MODE,
                Term::iri(vocab::acl::WRITE),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::acl::MODE,
                Term::iri(vocab::acl::CONTROL),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::acl::ACCESS_TO,
                Term::iri(identifier),
            ),
            Quad::new(
                vocab::trellis::PREFER_ACCESS_CONTROL,
                &auth,
                vocab::acl::AGENT_CLASS,
                Term::iri(vocab::foaf::AGENT),
            ),
            Quad::new(
                vocab::trellis::PREFER_AUDIT,
                identifier,
                vocab::prov::WAS_GENERATED_BY,
                Term::iri(&skolem),
            ),
            Quad::new(
                vocab::trellis::PREFER_AUDIT,
                &skolem,
                vocab::rdf::TYPE,
                Term::iri(vocab::prov::ACTIVITY),
            ),
            Quad::new(
                vocab::trellis::PREFER_AUDIT,
                &skolem,
                vocab::rdf::TYPE,
                Term::iri(vocab::activitystreams::CREATE),
            ),
            Quad::new(
                vocab::trellis::PREFER_AUDIT,
                &skolem,
                vocab::prov::WAS_ASSOCIATED_WITH,
                Term::iri(vocab::trellis::REPOSITORY_ADMINISTRATOR),
            ),
            Quad::new(
                vocab::trellis::PREFER_AUDIT,
                &skolem,
                vocab::prov::GENERATED_AT_TIME,
                Term::typed_literal(
                    &now.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                    vocab::xsd::DATE_TIME,
                ),
            ),
        ]
    }
}

/// The parent identifier of a resource, when it has one: the identifier
/// with its last path segment removed. The partition root has no parent.
pub fn parent_identifier(identifier: &str) -> Option<String> {
    let path = as_path(identifier);
    let (parent, _) = path.rsplit_once('/')?;
    Some(format!("{}{}", REPO_PREFIX, parent))
}

fn probe_writable(root: &std::path::Path) -> Result<()> {
    let probe = root.join(".write-probe");
    fs::write(&probe, b"")
        .map_err(|_| Error::Config(format!("cannot write to {}", root.display())))?;
    let _ = fs::remove_file(&probe);
    Ok(())
}
