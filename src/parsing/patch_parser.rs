//! Parser for the journal line format.
//!
//! Each journal line is one of:
//!
//! ```text
//! A <graph> <subj> <pred> <obj> .
//! D <graph> <subj> <pred> <obj> .
//! END <ISO-8601-instant> .
//! ```
//!
//! Terms use the N-Triples lexical forms: IRIs in angle brackets, literals
//! double-quoted with optional `@lang` or `^^<datatype>`, blank nodes with
//! the `_:` prefix. The graph position always carries an IRI.

use crate::core::{Quad, Term};
use chrono::{DateTime, Utc};

/// One parsed journal line.
#[derive(Debug, Clone, PartialEq)]
pub enum JournalLine {
    /// A quad addition
    Add(Quad),
    /// A quad deletion
    Delete(Quad),
    /// A block terminator carrying the block's instant
    End(DateTime<Utc>),
}

/// Parse a single journal line.
///
/// Returns an error message for structurally invalid lines; callers log and
/// skip those rather than failing the whole read.
pub fn parse_line(line: &str) -> Result<JournalLine, String> {
    let trimmed = line.trim();

    if trimmed.is_empty() {
        return Err("Empty line".to_string());
    }

    if let Some(rest) = trimmed.strip_prefix("END ") {
        return parse_end(rest);
    }

    let (op, rest) = if let Some(rest) = trimmed.strip_prefix("A ") {
        ('A', rest)
    } else if let Some(rest) = trimmed.strip_prefix("D ") {
        ('D', rest)
    } else {
        return Err(format!("Unknown operation in line: {}", trimmed));
    };

    let (graph, rest) = parse_iri(rest, "graph")?;
    let (subject, rest) = parse_subject(rest)?;
    let (predicate, rest) = parse_iri(rest, "predicate")?;
    let (object, rest) = parse_object(rest)?;
    expect_terminal_dot(rest)?;

    let quad = Quad { graph, subject, predicate, object };
    match op {
        'A' => Ok(JournalLine::Add(quad)),
        _ => Ok(JournalLine::Delete(quad)),
    }
}

fn parse_end(rest: &str) -> Result<JournalLine, String> {
    let rest = rest.trim();
    let instant_text = rest.strip_suffix('.').unwrap_or(rest).trim();
    let instant = DateTime::parse_from_rfc3339(instant_text)
        .map_err(|e| format!("Invalid END instant '{}': {}", instant_text, e))?;
    Ok(JournalLine::End(instant.with_timezone(&Utc)))
}

/// Parse an IRI enclosed in angle brackets, returning the remaining input.
fn parse_iri<'a>(input: &'a str, field_name: &str) -> Result<(String, &'a str), String> {
    let input = input.trim_start();

    if !input.starts_with('<') {
        return Err(format!("Expected '<' for {} IRI, got: {}", field_name, input));
    }

    let end_idx = input
        .find('>')
        .ok_or_else(|| format!("Missing closing '>' for {} IRI", field_name))?;

    let iri = input[1..end_idx].to_string();
    let remaining = &input[end_idx + 1..];

    Ok((iri, remaining))
}

/// Parse a subject, which is an IRI or a blank node.
fn parse_subject(input: &str) -> Result<(Term, &str), String> {
    let input = input.trim_start();

    if input.starts_with('<') {
        let (iri, rest) = parse_iri(input, "subject")?;
        return Ok((Term::Iri(iri), rest));
    }

    if let Some(rest) = input.strip_prefix("_:") {
        let end = rest
            .find(char::is_whitespace)
            .ok_or_else(|| "Unterminated blank node label".to_string())?;
        return Ok((Term::Blank(rest[..end].to_string()), &rest[end..]));
    }

    Err(format!("Invalid subject: {}", input))
}

/// Parse an object, which is an IRI, a blank node, or a literal.
fn parse_object(input: &str) -> Result<(Term, &str), String> {
    let input = input.trim_start();

    if input.starts_with('<') {
        let (iri, rest) = parse_iri(input, "object")?;
        return Ok((Term::Iri(iri), rest));
    }

    if input.starts_with("_:") {
        return parse_subject(input);
    }

    if input.starts_with('"') {
        return parse_literal(input);
    }

    Err(format!("Invalid object: {}", input))
}

/// Parse a literal with optional datatype or language tag.
fn parse_literal(input: &str) -> Result<(Term, &str), String> {
    let mut lexical = String::new();
    let mut chars = input.char_indices().skip(1);
    let mut closing_idx = None;

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => {
                closing_idx = Some(idx);
                break;
            }
            '\\' => match chars.next() {
                Some((_, 'n')) => lexical.push('\n'),
                Some((_, 'r')) => lexical.push('\r'),
                Some((_, 't')) => lexical.push('\t'),
                Some((_, escaped)) => lexical.push(escaped),
                None => return Err("Dangling escape in literal".to_string()),
            },
            _ => lexical.push(c),
        }
    }

    let closing_idx = closing_idx.ok_or_else(|| "Missing closing quote for literal".to_string())?;
    let after_quote = &input[closing_idx + 1..];

    if let Some(rest) = after_quote.strip_prefix("^^") {
        let (datatype, remaining) = parse_iri(rest, "datatype")?;
        return Ok((
            Term::Literal { lexical, datatype: Some(datatype), language: None },
            remaining,
        ));
    }

    if let Some(rest) = after_quote.strip_prefix('@') {
        let end = rest
            .find(|c: char| c.is_whitespace())
            .ok_or_else(|| "Unterminated language tag".to_string())?;
        return Ok((
            Term::Literal { lexical, datatype: None, language: Some(rest[..end].to_string()) },
            &rest[end..],
        ));
    }

    Ok((Term::Literal { lexical, datatype: None, language: None }, after_quote))
}

fn expect_terminal_dot(input: &str) -> Result<(), String> {
    if input.trim() == "." {
        Ok(())
    } else {
        Err(format!("Expected terminal '.', got: {}", input.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vocab;
    use chrono::TimeZone;

    #[test]
    fn test_parse_add_line() {
        let line = "A <http://www.trellisldp.org/ns/trellis#PreferUserManaged> \
                    <info:trellis/resource> <http://purl.org/dc/terms/title> \"A title\" .";
        let parsed = parse_line(line).unwrap();
        match parsed {
            JournalLine::Add(quad) => {
                assert_eq!(quad.graph, vocab::trellis::PREFER_USER_MANAGED);
                assert_eq!(quad.subject, Term::iri("info:trellis/resource"));
                assert_eq!(quad.predicate, vocab::dc::TITLE);
                assert_eq!(quad.object, Term::literal("A title"));
            }
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_delete_line() {
        let line = "D <http://www.trellisldp.org/ns/trellis#PreferUserManaged> \
                    <info:trellis/resource> <http://purl.org/dc/terms/subject> \
                    <http://example.org/subject/1> .";
        assert!(matches!(parse_line(line).unwrap(), JournalLine::Delete(_)));
    }

    #[test]
    fn test_parse_end_line() {
        let parsed = parse_line("END 2017-02-11T02:51:35Z .").unwrap();
        let expected = Utc.with_ymd_and_hms(2017, 2, 11, 2, 51, 35).unwrap();
        assert_eq!(parsed, JournalLine::End(expected));
    }

    #[test]
    fn test_parse_lang_literal() {
        let line = "A <http://www.trellisldp.org/ns/trellis#PreferUserManaged> \
                    <info:trellis/resource> <http://www.w3.org/2000/01/rdf-schema#label> \
                    \"A label\"@eng .";
        match parse_line(line).unwrap() {
            JournalLine::Add(quad) => assert_eq!(quad.object, Term::lang_literal("A label", "eng")),
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_typed_literal() {
        let line = "A <http://www.trellisldp.org/ns/trellis#PreferAudit> \
                    <info:trellis/bnode/foo> <http://www.w3.org/ns/prov#generatedAtTime> \
                    \"2017-01-10T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .";
        match parse_line(line).unwrap() {
            JournalLine::Add(quad) => assert_eq!(
                quad.object,
                Term::typed_literal("2017-01-10T00:00:00Z", vocab::xsd::DATE_TIME)
            ),
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_blank_subject() {
        let line = "A <http://www.trellisldp.org/ns/trellis#PreferAudit> \
                    _:b0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> \
                    <http://www.w3.org/ns/prov#Activity> .";
        match parse_line(line).unwrap() {
            JournalLine::Add(quad) => assert_eq!(quad.subject, Term::blank("b0")),
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_escaped_literal_roundtrip() {
        let original = Term::literal("a \"quoted\" value\nsecond line");
        let line = format!(
            "A <{}> <info:trellis/resource> <{}> {} .",
            vocab::trellis::PREFER_USER_MANAGED,
            vocab::dc::TITLE,
            original
        );
        match parse_line(&line).unwrap() {
            JournalLine::Add(quad) => assert_eq!(quad.object, original),
            other => panic!("expected Add, got {:?}", other),
        }
    }

    #[test]
    fn test_reject_garbage() {
        assert!(parse_line("not a journal line").is_err());
        assert!(parse_line("").is_err());
        assert!(parse_line("A <g> <s> <p> \"unterminated .").is_err());
        assert!(parse_line("END not-a-date .").is_err());
    }
}
