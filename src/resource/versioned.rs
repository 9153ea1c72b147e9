//! The versioned resource view: journal replay at a fixed instant.

use crate::journal;
use crate::resource::Resource;
use crate::storage::RESOURCE_JOURNAL;
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::Path;

/// Reconstruct a resource as it looked at `time` by replaying its journal.
///
/// Returns `None` when the directory or journal is missing, or when `time`
/// precedes the first journal block. The returned view is a memento.
pub fn find(dir: &Path, identifier: &str, time: DateTime<Utc>) -> Result<Option<Resource>> {
    let file = dir.join(RESOURCE_JOURNAL);
    if !file.is_file() {
        return Ok(None);
    }

    let projection = journal::replay(&file, time)?;
    let (created, modified) = match (projection.created, projection.modified) {
        (Some(created), Some(modified)) => (created, modified),
        _ => return Ok(None),
    };

    let mementos = journal::ranges(&projection.instants);

    Ok(Some(Resource::from_parts(
        identifier,
        projection.quads,
        created,
        modified,
        mementos,
        true,
    )))
}
