//! Journal Replay Integration Tests
//!
//! These tests replay a seeded journal covering additions and deletions of
//! DC metadata and a SKOS label across five blocks, verifying the
//! point-in-time projection semantics, and exercise the write path against
//! fresh journals.

use chrono::{DateTime, TimeZone, Utc};
use mnemosyne::core::vocab;
use mnemosyne::core::{Quad, Term};
use mnemosyne::journal;
use std::path::PathBuf;
use tempfile::tempdir;

const IDENTIFIER: &str = "info:trellis/resource";

fn journal1() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources/journal1.txt")
}

fn parse(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
}

fn predicates_of(quads: &[Quad], predicate: &str) -> usize {
    quads.iter().filter(|q| q.predicate == predicate).count()
}

#[test]
fn test_replay_at_final_block() {
    let projection = journal::replay(&journal1(), parse("2017-02-11T02:51:35Z")).unwrap();
    assert_eq!(projection.quads.len(), 2);
    assert_eq!(predicates_of(&projection.quads, vocab::skos::PREF_LABEL), 1);
    assert_eq!(projection.modified, Some(parse("2017-02-11T02:51:35Z")));
}

#[test]
fn test_replay_between_fourth_and_fifth_block() {
    let projection = journal::replay(&journal1(), parse("2017-02-09T02:51:35Z")).unwrap();
    assert_eq!(projection.quads.len(), 3);
    assert_eq!(predicates_of(&projection.quads, vocab::skos::PREF_LABEL), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::IS_PART_OF), 1);
}

#[test]
fn test_replay_after_second_block() {
    let projection = journal::replay(&journal1(), parse("2017-01-30T02:51:35Z")).unwrap();
    assert_eq!(projection.quads.len(), 7);
    assert_eq!(predicates_of(&projection.quads, vocab::skos::PREF_LABEL), 0);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::EXTENT), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::SPATIAL), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::TITLE), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::DESCRIPTION), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::SUBJECT), 2);
}

#[test]
fn test_replay_after_first_block() {
    let projection = journal::replay(&journal1(), parse("2017-01-15T09:14:00Z")).unwrap();
    assert_eq!(projection.quads.len(), 5);
    assert_eq!(predicates_of(&projection.quads, vocab::skos::PREF_LABEL), 0);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::EXTENT), 0);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::SPATIAL), 0);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::TITLE), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::DESCRIPTION), 1);
    assert_eq!(predicates_of(&projection.quads, vocab::dc::SUBJECT), 2);
}

#[test]
fn test_replay_is_monotone_between_instants() {
    // every quad present at t1 is, at t2 >= t1, either still present or
    // was deleted in (t1, t2]
    let t1 = parse("2017-01-15T09:14:00Z");
    let t2 = parse("2017-01-30T02:51:35Z");
    let early = journal::replay(&journal1(), t1).unwrap();
    let late = journal::replay(&journal1(), t2).unwrap();
    for quad in &early.quads {
        assert!(late.quads.contains(quad), "quad unexpectedly vanished: {}", quad);
    }
}

#[test]
fn test_memento_ranges_of_seeded_journal() {
    let ranges = journal::mementos(&journal1()).unwrap();
    assert_eq!(ranges.len(), 4);
    assert_eq!(ranges[0].from, parse("2017-01-10T00:00:00Z"));
    assert_eq!(ranges[0].until, parse("2017-01-20T00:00:00Z"));
    assert_eq!(ranges[3].from, parse("2017-02-10T00:00:00Z"));
    assert_eq!(ranges[3].until, parse("2017-02-11T02:51:35Z"));
}

#[test]
fn test_version_writer_roundtrip() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("resource.rdfp");
    let time = Utc::now();

    let add = vec![
        Quad::new(
            vocab::trellis::PREFER_USER_MANAGED,
            IDENTIFIER,
            vocab::dc::TITLE,
            Term::literal("Title"),
        ),
        Quad::new(
            vocab::trellis::PREFER_USER_MANAGED,
            IDENTIFIER,
            vocab::dc::DESCRIPTION,
            Term::literal("A longer description"),
        ),
    ];
    journal::write(&file, &[], &add, time).unwrap();

    let projection = journal::replay(&file, time).unwrap();
    assert_eq!(projection.quads.len(), add.len());
    for quad in &add {
        assert!(projection.quads.contains(quad));
    }
    assert_eq!(projection.modified, Some(time));
}

#[test]
fn test_blocks_share_one_instant() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("resource.rdfp");
    let t1 = Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap();
    let t2 = Utc.with_ymd_and_hms(2017, 3, 5, 0, 0, 0).unwrap();

    let first = vec![Quad::new(
        vocab::trellis::PREFER_USER_MANAGED,
        IDENTIFIER,
        vocab::dc::TITLE,
        Term::literal("Title"),
    )];
    let second = vec![
        Quad::new(
            vocab::trellis::PREFER_USER_MANAGED,
            IDENTIFIER,
            vocab::dc::SUBJECT,
            Term::iri("http://example.org/subject/1"),
        ),
        Quad::new(
            vocab::trellis::PREFER_USER_MANAGED,
            IDENTIFIER,
            vocab::dc::SUBJECT,
            Term::iri("http://example.org/subject/2"),
        ),
    ];
    journal::write(&file, &[], &first, t1).unwrap();
    journal::write(&file, &[], &second, t2).unwrap();

    // between the blocks, only the first block's state is visible
    let midpoint = Utc.with_ymd_and_hms(2017, 3, 3, 0, 0, 0).unwrap();
    let projection = journal::replay(&file, midpoint).unwrap();
    assert_eq!(projection.quads.len(), 1);
    assert_eq!(projection.modified, Some(t1));
    assert_eq!(projection.instants, vec![t1]);
}
