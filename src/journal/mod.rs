//! The append-only RDF patch journal codec.
//!
//! The journal is the single source of truth for a resource: an ordered log
//! of blocks, each a run of quad additions and deletions sharing one
//! instant. Replaying the journal up to an instant T reconstructs the
//! resource state at T. Derived artifacts (cache, quads blob, memento
//! index) can always be rebuilt from it.

use crate::core::{Quad, VersionRange};
use crate::parsing::patch_parser::{parse_line, JournalLine};
use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

/// The state of a journal projected at an instant.
#[derive(Debug, Clone)]
pub struct Projection {
    /// The quads present at the projection instant, in arbitrary order
    pub quads: Vec<Quad>,
    /// Instant of the first block at or before the projection instant
    pub created: Option<DateTime<Utc>>,
    /// Instant of the last block at or before the projection instant
    pub modified: Option<DateTime<Utc>>,
    /// The distinct block instants at or before the projection instant
    pub instants: Vec<DateTime<Utc>>,
}

impl Projection {
    /// True if no block lies at or before the projection instant.
    pub fn is_empty_history(&self) -> bool {
        self.modified.is_none()
    }
}

/// Append one block to the journal: one `D` line per quad in `remove`, one
/// `A` line per quad in `add`, then a single `END` line carrying `time`.
///
/// The file is created if absent. The stream is flushed and synced before
/// returning; a torn block left behind by a crash is ignored by readers.
pub fn write(file: &Path, remove: &[Quad], add: &[Quad], time: DateTime<Utc>) -> Result<()> {
    let handle = OpenOptions::new().append(true).create(true).open(file)?;
    let mut writer = BufWriter::new(handle);

    for quad in remove {
        writeln!(writer, "D {} .", quad)?;
    }
    for quad in add {
        writeln!(writer, "A {} .", quad)?;
    }
    writeln!(writer, "END {} .", time.to_rfc3339_opts(SecondsFormat::AutoSi, true))?;

    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

/// Project the quad set at instant `time` by a single forward scan.
///
/// Operations of a block only take effect once its `END` line has been
/// seen, so a torn trailing block is ignored. Corrupt lines are logged and
/// skipped. Blocks appear in non-decreasing instant order, so the scan
/// stops at the first block after `time`.
pub fn replay(file: &Path, time: DateTime<Utc>) -> Result<Projection> {
    let reader = BufReader::new(File::open(file)?);

    // last-seen operation per quad: true = addition
    let mut last: HashMap<Quad, bool> = HashMap::new();
    let mut pending: Vec<(Quad, bool)> = Vec::new();
    let mut instants: Vec<DateTime<Utc>> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(JournalLine::Add(quad)) => pending.push((quad, true)),
            Ok(JournalLine::Delete(quad)) => pending.push((quad, false)),
            Ok(JournalLine::End(instant)) => {
                if instant > time {
                    break;
                }
                for (quad, is_add) in pending.drain(..) {
                    last.insert(quad, is_add);
                }
                if instants.last() != Some(&instant) {
                    instants.push(instant);
                }
            }
            Err(msg) => {
                warn!(file = %file.display(), "skipping corrupt journal line: {}", msg);
            }
        }
    }

    let quads =
        last.into_iter().filter_map(|(quad, is_add)| if is_add { Some(quad) } else { None })
            .collect();

    Ok(Projection {
        quads,
        created: instants.first().copied(),
        modified: instants.last().copied(),
        instants,
    })
}

/// The distinct block instants of the whole journal, in order.
pub fn instants(file: &Path) -> Result<Vec<DateTime<Utc>>> {
    let reader = BufReader::new(File::open(file)?);
    let mut result: Vec<DateTime<Utc>> = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if let Ok(JournalLine::End(instant)) = parse_line(&line) {
            if result.last() != Some(&instant) {
                result.push(instant);
            }
        }
    }
    Ok(result)
}

/// The memento ranges of the journal: one half-open `[tᵢ, tᵢ₊₁)` range per
/// consecutive pair of block instants. The trailing open range is left to
/// the caller.
pub fn mementos(file: &Path) -> Result<Vec<VersionRange>> {
    Ok(ranges(&instants(file)?))
}

/// Pair consecutive instants into half-open version ranges.
pub fn ranges(instants: &[DateTime<Utc>]) -> Vec<VersionRange> {
    instants.windows(2).map(|pair| VersionRange { from: pair[0], until: pair[1] }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab;
    use crate::core::Term;
    use chrono::TimeZone;
    use std::io::Write as IoWrite;
    use tempfile::tempdir;

    fn user_quad(predicate: &str, object: Term) -> Quad {
        Quad::new(vocab::trellis::PREFER_USER_MANAGED, "info:trellis/resource", predicate, object)
    }

    #[test]
    fn test_write_then_replay_at_same_instant() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let time = Utc.with_ymd_and_hms(2017, 3, 1, 12, 0, 0).unwrap();

        let add = vec![
            user_quad(vocab::dc::TITLE, Term::literal("Title")),
            user_quad(vocab::dc::DESCRIPTION, Term::literal("A longer description")),
        ];
        write(&file, &[], &add, time).unwrap();

        let projection = replay(&file, time).unwrap();
        assert_eq!(projection.quads.len(), 2);
        assert_eq!(projection.modified, Some(time));
        for quad in &add {
            assert!(projection.quads.contains(quad));
        }
    }

    #[test]
    fn test_deletion_hides_quad() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2017, 3, 2, 0, 0, 0).unwrap();

        let title = user_quad(vocab::dc::TITLE, Term::literal("Title"));
        write(&file, &[], &[title.clone()], t1).unwrap();
        write(&file, &[title.clone()], &[], t2).unwrap();

        assert_eq!(replay(&file, t1).unwrap().quads, vec![title]);
        assert!(replay(&file, t2).unwrap().quads.is_empty());
        assert_eq!(replay(&file, t2).unwrap().modified, Some(t2));
    }

    #[test]
    fn test_replay_before_first_block_is_empty() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], t1).unwrap();

        let before = Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap();
        let projection = replay(&file, before).unwrap();
        assert!(projection.quads.is_empty());
        assert!(projection.is_empty_history());
    }

    #[test]
    fn test_replay_in_future_equals_current_state() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], t1).unwrap();

        let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let projection = replay(&file, future).unwrap();
        assert_eq!(projection.quads.len(), 1);
        assert_eq!(projection.modified, Some(t1));
    }

    #[test]
    fn test_torn_trailing_block_is_ignored() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], t1).unwrap();

        // simulate a crash mid-block: operations with no END line
        let mut handle = OpenOptions::new().append(true).open(&file).unwrap();
        writeln!(
            handle,
            "A {} .",
            user_quad(vocab::dc::DESCRIPTION, Term::literal("torn"))
        )
        .unwrap();

        let projection = replay(&file, Utc::now()).unwrap();
        assert_eq!(projection.quads.len(), 1);
        assert_eq!(projection.modified, Some(t1));
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], t1).unwrap();

        let mut handle = OpenOptions::new().append(true).open(&file).unwrap();
        writeln!(handle, "garbage that is not a journal line").unwrap();
        let t2 = Utc.with_ymd_and_hms(2017, 3, 2, 0, 0, 0).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::SUBJECT, Term::iri("info:trellis/x"))], t2)
            .unwrap();

        let projection = replay(&file, Utc::now()).unwrap();
        assert_eq!(projection.quads.len(), 2);
        assert_eq!(projection.modified, Some(t2));
    }

    #[test]
    fn test_mementos_pair_consecutive_instants() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2017, 3, 2, 0, 0, 0).unwrap();
        let t3 = Utc.with_ymd_and_hms(2017, 3, 3, 0, 0, 0).unwrap();
        for t in [t1, t2, t3] {
            write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], t).unwrap();
        }

        let ranges = mementos(&file).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], VersionRange { from: t1, until: t2 });
        assert_eq!(ranges[1], VersionRange { from: t2, until: t3 });
    }

    #[test]
    fn test_subsecond_instant_roundtrip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("resource.rdfp");
        let time = Utc.timestamp_opt(1488370000, 123_000_000).unwrap();
        write(&file, &[], &[user_quad(vocab::dc::TITLE, Term::literal("T"))], time).unwrap();

        let projection = replay(&file, time).unwrap();
        assert_eq!(projection.modified, Some(time));
    }
}
