//! The cached resource view: a pre-materialized latest-state snapshot.
//!
//! The cache is a derived artifact. It may be deleted at any time; readers
//! fall back to journal replay. Writes go to a temporary file which is then
//! renamed into place, so readers never observe a partial cache.

use crate::core::{Quad, VersionRange};
use crate::journal;
use crate::resource::Resource;
use crate::storage::{MEMENTO_CACHE, RESOURCE_CACHE, RESOURCE_JOURNAL, RESOURCE_QUADS};
use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// The serialized form of the cache file: a small header plus the full
/// projected quad set.
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    id: String,
    ldp_type: String,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    quads: Vec<Quad>,
}

/// Regenerate the cache, quads blob and memento index from the journal,
/// atomically replacing each file.
pub fn write(dir: &Path, identifier: &str) -> Result<()> {
    let journal_file = dir.join(RESOURCE_JOURNAL);
    let projection = journal::replay(&journal_file, DateTime::<Utc>::MAX_UTC)?;
    let (created, modified) = match (projection.created, projection.modified) {
        (Some(created), Some(modified)) => (created, modified),
        _ => return Err(Error::Corrupt(format!("journal has no complete block: {}", identifier))),
    };

    let resource = Resource::from_parts(
        identifier,
        projection.quads,
        created,
        modified,
        journal::ranges(&projection.instants),
        false,
    );

    let cache = CacheFile {
        id: resource.identifier.clone(),
        ldp_type: resource.interaction_model.clone(),
        created,
        modified,
        quads: resource.quads.clone(),
    };
    let encoded = bincode::serialize(&cache)
        .map_err(|e| Error::Corrupt(format!("cache encoding failed: {}", e)))?;
    replace_file(dir, RESOURCE_CACHE, &encoded)?;

    let mut blob = String::new();
    for quad in &resource.quads {
        blob.push_str(&format!("{} .\n", quad));
    }
    replace_file(dir, RESOURCE_QUADS, blob.as_bytes())?;

    let mut index = String::new();
    for instant in &projection.instants {
        index.push_str(&instant.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        index.push('\n');
    }
    replace_file(dir, MEMENTO_CACHE, index.as_bytes())?;

    Ok(())
}

/// Read the cached snapshot, verifying it describes `identifier`.
pub fn find(dir: &Path, identifier: &str) -> Option<Resource> {
    read(dir).filter(|resource| resource.identifier == identifier)
}

/// Read the cached snapshot of whatever resource this directory holds.
///
/// Returns `None` when the cache file is missing or corrupt; callers fall
/// back to the versioned view.
pub fn read(dir: &Path) -> Option<Resource> {
    let bytes = fs::read(dir.join(RESOURCE_CACHE)).ok()?;
    let cache: CacheFile = match bincode::deserialize(&bytes) {
        Ok(cache) => cache,
        Err(e) => {
            warn!(dir = %dir.display(), "unreadable resource cache: {}", e);
            return None;
        }
    };

    let mementos = read_mementos(dir);
    Some(Resource::from_parts(
        &cache.id,
        cache.quads,
        cache.created,
        cache.modified,
        mementos,
        false,
    ))
}

fn read_mementos(dir: &Path) -> Vec<VersionRange> {
    let Ok(text) = fs::read_to_string(dir.join(MEMENTO_CACHE)) else {
        return Vec::new();
    };
    let instants: Vec<DateTime<Utc>> = text
        .lines()
        .filter_map(|line| DateTime::parse_from_rfc3339(line.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
        .collect();
    journal::ranges(&instants)
}

fn replace_file(dir: &Path, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp = dir.join(format!(".{}.tmp", name));
    {
        let mut handle = fs::File::create(&tmp)?;
        handle.write_all(bytes)?;
        handle.sync_all()?;
    }
    fs::rename(&tmp, dir.join(name))?;
    Ok(())
}
