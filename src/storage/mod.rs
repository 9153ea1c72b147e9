//! Deterministic on-disk placement of resource artifacts.
//!
//! Each resource owns one directory under its partition root, holding at
//! most four files: the journal (authoritative), the cache, the quads blob
//! and the memento index. The directory path is derived from the resource
//! IRI alone, so any process can locate a resource without an index.

use crate::core::vocab::REPO_PREFIX;
use crc32fast::Hasher;
use md5::{Digest, Md5};
use std::collections::HashMap;
use std::path::PathBuf;

/// File name of the append-only patch journal
pub const RESOURCE_JOURNAL: &str = "resource.rdfp";

/// File name of the materialized latest-snapshot cache
pub const RESOURCE_CACHE: &str = "resource.cache";

/// File name of the N-Quads blob of the latest snapshot
pub const RESOURCE_QUADS: &str = "resource.nq";

/// File name of the memento range index
pub const MEMENTO_CACHE: &str = "resource.mementos";

/// Depth of the hashed prefix directories below a partition root
pub const PREFIX_DEPTH: usize = 3;

/// Extract the resource path from an identifier: the IRI with the
/// repository prefix, any `?version=` query and any fragment removed.
///
/// `info:trellis/foo/bar?version=0123456#hash` becomes `foo/bar`.
pub fn as_path(identifier: &str) -> String {
    let path = identifier.strip_prefix(REPO_PREFIX).unwrap_or(identifier);
    let path = path.split('#').next().unwrap_or(path);
    let path = path.split('?').next().unwrap_or(path);
    path.to_string()
}

/// Derive the hashed directory path of a resource below its partition root.
///
/// The first six lowercase-hex characters of the CRC32 of the full IRI form
/// three two-character prefix directories; the terminal directory is the
/// full 32-character lowercase MD5 hex of the IRI.
pub fn partition_path(identifier: &str) -> PathBuf {
    let mut crc = Hasher::new();
    crc.update(identifier.as_bytes());
    let prefix = format!("{:08x}", crc.finalize());

    let digest = Md5::digest(identifier.as_bytes());
    let terminal: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();

    PathBuf::from(&prefix[0..2])
        .join(&prefix[2..4])
        .join(&prefix[4..6])
        .join(terminal)
}

/// Resolve the on-disk directory of a resource.
///
/// The partition is the first segment of the resource path; an identifier
/// whose first segment names no configured partition resolves to `None`.
pub fn resource_directory(
    partitions: &HashMap<String, PathBuf>,
    identifier: &str,
) -> Option<PathBuf> {
    let path = as_path(identifier);
    let partition = path.split('/').next().unwrap_or(&path);
    partitions.get(partition).map(|root| root.join(partition_path(identifier)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_path_is_deterministic() {
        let first = partition_path("info:trellis/repository/resource");
        let second = partition_path("info:trellis/repository/resource");
        assert_eq!(first, second);
    }

    #[test]
    fn test_partition_path_vectors() {
        assert_eq!(
            partition_path("info:trellis/resource"),
            PathBuf::from("e4/3d/d2/3c11fdfba716fe4a8c2ad59720f73b3e")
        );
        assert_eq!(
            partition_path("info:trellis/other"),
            PathBuf::from("56/02/ed/94db502039137b6017bd7089ceaf8ad1")
        );
    }

    #[test]
    fn test_as_path() {
        assert_eq!(as_path("info:trellis/foo/bar?version=0123456#hash"), "foo/bar");
        assert_eq!(as_path("info:trellis/foo?version=0123456#hash"), "foo");
        assert_eq!(as_path("info:trellis/foo"), "foo");
    }

    #[test]
    fn test_resource_directory_resolution() {
        let mut partitions = HashMap::new();
        partitions.insert("repository".to_string(), PathBuf::from("/data/repository"));

        let dir = resource_directory(&partitions, "info:trellis/repository/resource").unwrap();
        assert!(dir.starts_with("/data/repository"));
        assert!(dir.ends_with(partition_path("info:trellis/repository/resource")));

        assert!(resource_directory(&partitions, "info:trellis/unknown/resource").is_none());
    }
}
