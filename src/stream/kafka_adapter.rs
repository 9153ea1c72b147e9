//! Kafka mirror for the event log.
//!
//! When a bootstrap endpoint is configured, every record published on the
//! in-process bus is also produced to the corresponding Kafka topic, so
//! external consumers and auditors see the same stream.

use crate::stream::Message;
use crate::{Error, Result};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tokio::runtime::Runtime;

/// Producer adapter mirroring bus records to Kafka.
pub struct KafkaProducerAdapter {
    producer: FutureProducer,
    runtime: Runtime,
    timeout: Duration,
}

impl KafkaProducerAdapter {
    /// Connect a producer to the given bootstrap servers.
    pub fn new(bootstrap_servers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .set("client.id", "mnemosyne-resource-service")
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| Error::Publish(e.to_string()))?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Publish(e.to_string()))?;

        Ok(KafkaProducerAdapter { producer, runtime, timeout: Duration::from_secs(5) })
    }

    /// Produce one record, keyed by the resource IRI, with a bincode
    /// payload of the dataset.
    pub fn send(&self, topic: &str, message: &Message) -> Result<()> {
        let payload =
            bincode::serialize(&message.dataset).map_err(|e| Error::Publish(e.to_string()))?;
        let record = FutureRecord::to(topic).key(&message.key).payload(&payload);

        self.runtime
            .block_on(self.producer.send(record, self.timeout))
            .map(|_| ())
            .map_err(|(e, _)| Error::Publish(e.to_string()))
    }
}
