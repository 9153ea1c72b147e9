//! Core RDF data structures for the versioned resource store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod vocab;

/// A historical snapshot of a resource, bounded by two instants.
///
/// The range is half-open: the snapshot was current from `from` (inclusive)
/// until `until` (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRange {
    /// First instant at which the snapshot was current
    pub from: DateTime<Utc>,
    /// Instant at which the snapshot was superseded
    pub until: DateTime<Utc>,
}

/// An RDF term: an IRI, a blank node, or a literal.
///
/// Literals keep their lexical form together with the optional datatype IRI
/// or language tag, so a parsed journal line can be written back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// An absolute IRI; equality is byte-wise
    Iri(String),
    /// A blank node label (without the `_:` prefix)
    Blank(String),
    /// A literal with optional datatype or language tag
    Literal {
        /// The lexical form, unescaped
        lexical: String,
        /// Datatype IRI, if any
        datatype: Option<String>,
        /// Language tag, if any
        language: Option<String>,
    },
}

impl Term {
    /// Create an IRI term.
    pub fn iri(value: &str) -> Self {
        Term::Iri(value.to_string())
    }

    /// Create a blank node term.
    pub fn blank(label: &str) -> Self {
        Term::Blank(label.to_string())
    }

    /// Create a plain literal term.
    pub fn literal(lexical: &str) -> Self {
        Term::Literal { lexical: lexical.to_string(), datatype: None, language: None }
    }

    /// Create a literal with a datatype IRI.
    pub fn typed_literal(lexical: &str, datatype: &str) -> Self {
        Term::Literal {
            lexical: lexical.to_string(),
            datatype: Some(datatype.to_string()),
            language: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang_literal(lexical: &str, language: &str) -> Self {
        Term::Literal {
            lexical: lexical.to_string(),
            datatype: None,
            language: Some(language.to_string()),
        }
    }

    /// The IRI string if this term is an IRI.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(value) => Some(value),
            _ => None,
        }
    }

    /// The lexical form if this term is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal { lexical, .. } => Some(lexical),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    /// Renders the term in N-Triples lexical form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(value) => write!(f, "<{}>", value),
            Term::Blank(label) => write!(f, "_:{}", label),
            Term::Literal { lexical, datatype, language } => {
                write!(f, "\"{}\"", escape_literal(lexical))?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// An RDF statement qualified by a named graph.
///
/// The graph name is always an IRI; a reserved IRI stands in for the
/// default graph so the journal line format never has an absent field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad {
    /// Named graph IRI partitioning this quad into a semantic context
    pub graph: String,
    /// Subject term (IRI or blank node)
    pub subject: Term,
    /// Predicate IRI
    pub predicate: String,
    /// Object term
    pub object: Term,
}

impl Quad {
    /// Create a quad with an IRI subject.
    pub fn new(graph: &str, subject: &str, predicate: &str, object: Term) -> Self {
        Quad {
            graph: graph.to_string(),
            subject: Term::iri(subject),
            predicate: predicate.to_string(),
            object,
        }
    }

    /// The subject IRI, when the subject is not a blank node.
    pub fn subject_iri(&self) -> Option<&str> {
        self.subject.as_iri()
    }
}

impl fmt::Display for Quad {
    /// Renders `<graph> <subj> <pred> <obj>` without the line-terminating dot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {} <{}> {}", self.graph, self.subject, self.predicate, self.object)
    }
}

/// A multi-graph collection of quads, the unit carried by stream messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// The quads in this dataset
    pub quads: Vec<Quad>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Dataset { quads: Vec::new() }
    }

    /// Create a dataset from a vector of quads.
    pub fn from_quads(quads: Vec<Quad>) -> Self {
        Dataset { quads }
    }

    /// Add a quad.
    pub fn add(&mut self, quad: Quad) {
        self.quads.push(quad);
    }

    /// Iterate over the quads whose graph name equals `graph`.
    pub fn graph<'a>(&'a self, graph: &str) -> impl Iterator<Item = &'a Quad> + 'a {
        let graph = graph.to_string();
        self.quads.iter().filter(move |q| q.graph == graph)
    }

    /// True if the dataset contains at least one quad in `graph`.
    pub fn has_graph(&self, graph: &str) -> bool {
        self.quads.iter().any(|q| q.graph == graph)
    }

    /// Number of quads.
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// True if the dataset has no quads.
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}
