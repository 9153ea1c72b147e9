//! Repository CLI - command line tool to inspect and administer a resource
//! store partition.
//!
//! Usage:
//!   mnemosyne --partition repository --data-dir data init
//!   mnemosyne --partition repository --data-dir data get info:trellis/repository/resource
//!   mnemosyne --partition repository --data-dir data get info:trellis/repository/resource --time 2017-02-11T02:51:35Z
//!   mnemosyne --partition repository --data-dir data history info:trellis/repository/resource

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use mnemosyne::events::default_id_supplier;
use mnemosyne::locking::LocalLockStore;
use mnemosyne::resource::TripleContext;
use mnemosyne::service::{ResourceService, ServiceConfig};
use mnemosyne::stream::MessageBus;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "mnemosyne")]
#[command(about = "Versioned RDF resource store - inspect and administer a partition")]
struct Args {
    /// Partition name
    #[arg(short, long, default_value = "repository")]
    partition: String,

    /// Partition data directory
    #[arg(short, long, default_value = "data")]
    data_dir: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize the partition root resource
    Init,
    /// Print a resource's state, at an instant if given
    Get {
        /// Resource IRI
        iri: String,
        /// ISO-8601 instant to replay the journal at
        #[arg(short, long)]
        time: Option<String>,
    },
    /// Print a resource's memento ranges
    History {
        /// Resource IRI
        iri: String,
    },
    /// Remove a resource and print its referenced binaries
    Purge {
        /// Resource IRI
        iri: String,
    },
    /// List the cached resources of the partition
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let mut partitions = HashMap::new();
    partitions.insert(args.partition.clone(), PathBuf::from(&args.data_dir));
    let config = ServiceConfig { partitions, ..Default::default() };

    let service = ResourceService::new(
        config,
        Arc::new(LocalLockStore::new()),
        Arc::new(MessageBus::new()),
        default_id_supplier(),
    )?;

    match args.command {
        Command::Init => {
            println!("Partition '{}' initialized at {}", args.partition, args.data_dir);
        }
        Command::Get { iri, time } => {
            let resource = match time {
                Some(text) => {
                    let instant = DateTime::parse_from_rfc3339(&text)?.with_timezone(&Utc);
                    service.get_at(&iri, instant)?
                }
                None => service.get(&iri)?,
            };
            match resource {
                Some(resource) => {
                    println!("Identifier: {}", resource.identifier);
                    println!("Interaction model: {}", resource.interaction_model);
                    println!("Modified: {}", resource.modified);
                    println!("Memento: {}", resource.is_memento);
                    if !resource.contains.is_empty() {
                        println!("Contains:");
                        for child in &resource.contains {
                            println!("  {}", child);
                        }
                    }
                    println!("Quads:");
                    for quad in resource.stream(&[
                        TripleContext::UserManaged,
                        TripleContext::ServerManaged,
                        TripleContext::Containment,
                        TripleContext::Inbound,
                    ]) {
                        println!("  {} .", quad);
                    }
                }
                None => println!("No such resource: {}", iri),
            }
        }
        Command::History { iri } => match service.get(&iri)? {
            Some(resource) => {
                println!("Mementos of {}:", iri);
                for range in &resource.mementos {
                    println!("  {} -- {}", range.from, range.until);
                }
            }
            None => println!("No such resource: {}", iri),
        },
        Command::Purge { iri } => {
            let binaries = service.purge(&iri)?;
            println!("Purged {}", iri);
            for binary in binaries {
                println!("  binary: {}", binary);
            }
        }
        Command::List => {
            for quad in service.list(&args.partition)? {
                println!("{} .", quad);
            }
        }
    }

    Ok(())
}
