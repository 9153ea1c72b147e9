//! Resource views over the journal and its derived artifacts.
//!
//! A single `Resource` record replaces a subtype hierarchy: behavior that
//! would depend on the LDP subtype (container-only containment, binary-only
//! datastreams) is a conditional on the `interaction_model` field.

use crate::core::vocab;
use crate::core::{Quad, Term, VersionRange};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod cached;
pub mod versioned;

/// The semantic context of a quad or synthesized triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripleContext {
    /// Quads submitted by clients
    UserManaged,
    /// Quads maintained by the server (types, containment, datastreams)
    ServerManaged,
    /// Access-control quads
    AccessControl,
    /// Audit and provenance quads
    Audit,
    /// Synthesized containment triples
    Containment,
    /// Synthesized membership triples
    Membership,
    /// Inbound references from other resources
    Inbound,
}

impl TripleContext {
    /// The graph IRI carrying quads of this context in the journal, for the
    /// contexts that are stored rather than synthesized.
    pub fn graph_name(&self) -> &'static str {
        match self {
            TripleContext::UserManaged => vocab::trellis::PREFER_USER_MANAGED,
            TripleContext::ServerManaged => vocab::trellis::PREFER_SERVER_MANAGED,
            TripleContext::AccessControl => vocab::trellis::PREFER_ACCESS_CONTROL,
            TripleContext::Audit => vocab::trellis::PREFER_AUDIT,
            TripleContext::Containment => vocab::ldp::PREFER_CONTAINMENT,
            TripleContext::Membership => vocab::ldp::PREFER_MEMBERSHIP,
            TripleContext::Inbound => vocab::trellis::INBOUND_REFERENCES,
        }
    }
}

/// Description of the binary content of a non-RDF source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datastream {
    /// Location of the binary content
    pub location: String,
    /// MIME type, if recorded
    pub format: Option<String>,
    /// Size in bytes, if recorded
    pub size: Option<u64>,
    /// Creation instant
    pub created: DateTime<Utc>,
    /// Last-modification instant
    pub modified: DateTime<Utc>,
}

/// A resource state, reconstructed from the journal or read from the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// The resource IRI
    pub identifier: String,
    /// The LDP interaction model
    pub interaction_model: String,
    /// Instant of the first journal block
    pub created: DateTime<Utc>,
    /// Instant of the last journal block covered by this view
    pub modified: DateTime<Utc>,
    /// rdf:type IRIs asserted by the user
    pub types: Vec<String>,
    /// ldp:inbox target
    pub inbox: Option<String>,
    /// Linked ACL resource
    pub acl: Option<String>,
    /// ldp:membershipResource of a direct or indirect container
    pub membership_resource: Option<String>,
    /// ldp:hasMemberRelation of a direct container
    pub has_member_relation: Option<String>,
    /// ldp:isMemberOfRelation of a direct container
    pub is_member_of_relation: Option<String>,
    /// ldp:insertedContentRelation of an indirect container
    pub inserted_content_relation: Option<String>,
    /// oa:annotationService target
    pub annotation_service: Option<String>,
    /// dc:creator of the resource
    pub creator: Option<String>,
    /// Child IRIs, derived from server-managed containment quads
    pub contains: Vec<String>,
    /// Historical snapshot ranges
    pub mementos: Vec<VersionRange>,
    /// True when this view was reconstructed at a fixed instant
    pub is_memento: bool,
    /// True when this view is one page of a paged response
    pub is_page: bool,
    /// Next page, when paged
    pub next: Option<String>,
    /// Binary content description, for non-RDF sources
    pub datastream: Option<Datastream>,
    /// The full projected quad set backing this view
    pub quads: Vec<Quad>,
}

impl Resource {
    /// Assemble a resource view from a projected quad set.
    pub fn from_parts(
        identifier: &str,
        quads: Vec<Quad>,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        mementos: Vec<VersionRange>,
        is_memento: bool,
    ) -> Self {
        let mut resource = Resource {
            identifier: identifier.to_string(),
            interaction_model: vocab::ldp::RDF_SOURCE.to_string(),
            created,
            modified,
            types: Vec::new(),
            inbox: None,
            acl: None,
            membership_resource: None,
            has_member_relation: None,
            is_member_of_relation: None,
            inserted_content_relation: None,
            annotation_service: None,
            creator: None,
            contains: Vec::new(),
            mementos,
            is_memento,
            is_page: false,
            next: None,
            datastream: None,
            quads,
        };
        resource.derive_attributes();
        resource
    }

    fn derive_attributes(&mut self) {
        let mut binary: Option<String> = None;

        for quad in &self.quads {
            let about_self = quad.subject_iri() == Some(self.identifier.as_str());
            let server_managed = quad.graph == vocab::trellis::PREFER_SERVER_MANAGED;

            if about_self && server_managed {
                match quad.predicate.as_str() {
                    p if p == vocab::rdf::TYPE => {
                        if let Some(iri) = quad.object.as_iri() {
                            if iri.starts_with("http://www.w3.org/ns/ldp#") {
                                self.interaction_model = iri.to_string();
                            }
                        }
                    }
                    p if p == vocab::ldp::CONTAINS => {
                        if let Some(child) = quad.object.as_iri() {
                            self.contains.push(child.to_string());
                        }
                    }
                    p if p == vocab::dc::HAS_PART => {
                        if let Some(part) = quad.object.as_iri() {
                            binary = Some(part.to_string());
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if !about_self {
                continue;
            }

            match quad.predicate.as_str() {
                p if p == vocab::rdf::TYPE => {
                    if let Some(iri) = quad.object.as_iri() {
                        self.types.push(iri.to_string());
                    }
                }
                p if p == vocab::ldp::INBOX => set_iri(&mut self.inbox, &quad.object),
                p if p == vocab::acl::ACCESS_CONTROL => set_iri(&mut self.acl, &quad.object),
                p if p == vocab::ldp::MEMBERSHIP_RESOURCE => {
                    set_iri(&mut self.membership_resource, &quad.object)
                }
                p if p == vocab::ldp::HAS_MEMBER_RELATION => {
                    set_iri(&mut self.has_member_relation, &quad.object)
                }
                p if p == vocab::ldp::IS_MEMBER_OF_RELATION => {
                    set_iri(&mut self.is_member_of_relation, &quad.object)
                }
                p if p == vocab::ldp::INSERTED_CONTENT_RELATION => {
                    set_iri(&mut self.inserted_content_relation, &quad.object)
                }
                p if p == vocab::oa::ANNOTATION_SERVICE => {
                    set_iri(&mut self.annotation_service, &quad.object)
                }
                p if p == vocab::dc::CREATOR => set_iri(&mut self.creator, &quad.object),
                _ => {}
            }
        }

        if let Some(location) = binary {
            self.datastream = Some(self.assemble_datastream(location));
        }
    }

    fn assemble_datastream(&self, location: String) -> Datastream {
        let mut format = None;
        let mut size = None;
        for quad in self.quads.iter().filter(|q| {
            q.graph == vocab::trellis::PREFER_SERVER_MANAGED
                && q.subject_iri() == Some(location.as_str())
        }) {
            match quad.predicate.as_str() {
                p if p == vocab::dc::FORMAT => {
                    format = quad.object.as_literal().map(str::to_string);
                }
                p if p == vocab::dc::EXTENT => {
                    size = quad.object.as_literal().and_then(|v| v.parse().ok());
                }
                _ => {}
            }
        }
        Datastream { location, format, size, created: self.created, modified: self.modified }
    }

    /// Stream the quads of the requested contexts as one lazy, single-pass
    /// sequence. Containment and membership are synthesized from
    /// server-managed state; the other contexts read stored quads.
    pub fn stream<'a>(
        &'a self,
        contexts: &'a [TripleContext],
    ) -> Box<dyn Iterator<Item = Quad> + 'a> {
        Box::new(contexts.iter().flat_map(move |context| self.context_quads(*context)))
    }

    fn context_quads(&self, context: TripleContext) -> Box<dyn Iterator<Item = Quad> + '_> {
        match context {
            TripleContext::Containment => {
                Box::new(self.contains.iter().map(move |child| {
                    Quad::new(
                        vocab::ldp::PREFER_CONTAINMENT,
                        &self.identifier,
                        vocab::ldp::CONTAINS,
                        Term::iri(child),
                    )
                }))
            }
            TripleContext::Membership => Box::new(self.membership_quads()),
            _ => {
                let graph = context.graph_name();
                Box::new(self.quads.iter().filter(move |q| q.graph == graph).cloned())
            }
        }
    }

    fn membership_quads(&self) -> impl Iterator<Item = Quad> + '_ {
        let outward = self
            .membership_resource
            .as_deref()
            .zip(self.has_member_relation.as_deref())
            .into_iter()
            .flat_map(move |(resource, relation)| {
                self.contains.iter().map(move |member| {
                    Quad::new(vocab::ldp::PREFER_MEMBERSHIP, resource, relation, Term::iri(member))
                })
            });
        let inward = self
            .membership_resource
            .as_deref()
            .zip(self.is_member_of_relation.as_deref())
            .into_iter()
            .flat_map(move |(resource, relation)| {
                self.contains.iter().map(move |member| {
                    Quad::new(vocab::ldp::PREFER_MEMBERSHIP, member, relation, Term::iri(resource))
                })
            });
        outward.chain(inward)
    }
}

fn set_iri(slot: &mut Option<String>, object: &Term) {
    if slot.is_none() {
        if let Some(iri) = object.as_iri() {
            *slot = Some(iri.to_string());
        }
    }
}
