//! Vocabulary IRI constants used by the store.

/// The repository IRI prefix; every resource identifier starts with this.
pub const REPO_PREFIX: &str = "info:trellis/";

/// RDF core vocabulary
pub mod rdf {
    /// rdf:type
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}

/// Linked Data Platform vocabulary
pub mod ldp {
    /// ldp:Resource
    pub const RESOURCE: &str = "http://www.w3.org/ns/ldp#Resource";
    /// ldp:RDFSource
    pub const RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#RDFSource";
    /// ldp:NonRDFSource
    pub const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";
    /// ldp:Container
    pub const CONTAINER: &str = "http://www.w3.org/ns/ldp#Container";
    /// ldp:BasicContainer
    pub const BASIC_CONTAINER: &str = "http://www.w3.org/ns/ldp#BasicContainer";
    /// ldp:DirectContainer
    pub const DIRECT_CONTAINER: &str = "http://www.w3.org/ns/ldp#DirectContainer";
    /// ldp:IndirectContainer
    pub const INDIRECT_CONTAINER: &str = "http://www.w3.org/ns/ldp#IndirectContainer";
    /// ldp:contains
    pub const CONTAINS: &str = "http://www.w3.org/ns/ldp#contains";
    /// ldp:inbox
    pub const INBOX: &str = "http://www.w3.org/ns/ldp#inbox";
    /// ldp:membershipResource
    pub const MEMBERSHIP_RESOURCE: &str = "http://www.w3.org/ns/ldp#membershipResource";
    /// ldp:hasMemberRelation
    pub const HAS_MEMBER_RELATION: &str = "http://www.w3.org/ns/ldp#hasMemberRelation";
    /// ldp:isMemberOfRelation
    pub const IS_MEMBER_OF_RELATION: &str = "http://www.w3.org/ns/ldp#isMemberOfRelation";
    /// ldp:insertedContentRelation
    pub const INSERTED_CONTENT_RELATION: &str = "http://www.w3.org/ns/ldp#insertedContentRelation";
    /// ldp:PreferContainment
    pub const PREFER_CONTAINMENT: &str = "http://www.w3.org/ns/ldp#PreferContainment";
    /// ldp:PreferMembership
    pub const PREFER_MEMBERSHIP: &str = "http://www.w3.org/ns/ldp#PreferMembership";
}

/// Dublin Core terms
pub mod dc {
    /// dc:title
    pub const TITLE: &str = "http://purl.org/dc/terms/title";
    /// dc:description
    pub const DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    /// dc:subject
    pub const SUBJECT: &str = "http://purl.org/dc/terms/subject";
    /// dc:isPartOf
    pub const IS_PART_OF: &str = "http://purl.org/dc/terms/isPartOf";
    /// dc:hasPart
    pub const HAS_PART: &str = "http://purl.org/dc/terms/hasPart";
    /// dc:relation
    pub const RELATION: &str = "http://purl.org/dc/terms/relation";
    /// dc:creator
    pub const CREATOR: &str = "http://purl.org/dc/terms/creator";
    /// dc:format
    pub const FORMAT: &str = "http://purl.org/dc/terms/format";
    /// dc:extent
    pub const EXTENT: &str = "http://purl.org/dc/terms/extent";
    /// dc:spatial
    pub const SPATIAL: &str = "http://purl.org/dc/terms/spatial";
    /// dc:alternative
    pub const ALTERNATIVE: &str = "http://purl.org/dc/terms/alternative";
    /// dc:created
    pub const CREATED: &str = "http://purl.org/dc/terms/created";
    /// dc:modified
    pub const MODIFIED: &str = "http://purl.org/dc/terms/modified";
}

/// SKOS vocabulary
pub mod skos {
    /// skos:prefLabel
    pub const PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
}

/// Web Access Control vocabulary
pub mod acl {
    /// acl:Authorization
    pub const AUTHORIZATION: &str = "http://www.w3.org/ns/auth/acl#Authorization";
    /// acl:mode
    pub const MODE: &str = "http://www.w3.org/ns/auth/acl#mode";
    /// acl:Read
    pub const READ: &str = "http://www.w3.org/ns/auth/acl#Read";
    /// acl:Write
    pub const WRITE: &str = "http://www.w3.org/ns/auth/acl#Write";
    /// acl:Control
    pub const CONTROL: &str = "http://www.w3.org/ns/auth/acl#Control";
    /// acl:accessTo
    pub const ACCESS_TO: &str = "http://www.w3.org/ns/auth/acl#accessTo";
    /// acl:agentClass
    pub const AGENT_CLASS: &str = "http://www.w3.org/ns/auth/acl#agentClass";
    /// acl:accessControl
    pub const ACCESS_CONTROL: &str = "http://www.w3.org/ns/auth/acl#accessControl";
}

/// PROV vocabulary
pub mod prov {
    /// prov:Activity
    pub const ACTIVITY: &str = "http://www.w3.org/ns/prov#Activity";
    /// prov:wasGeneratedBy
    pub const WAS_GENERATED_BY: &str = "http://www.w3.org/ns/prov#wasGeneratedBy";
    /// prov:wasAssociatedWith
    pub const WAS_ASSOCIATED_WITH: &str = "http://www.w3.org/ns/prov#wasAssociatedWith";
    /// prov:generatedAtTime
    pub const GENERATED_AT_TIME: &str = "http://www.w3.org/ns/prov#generatedAtTime";
}

/// ActivityStreams vocabulary
pub mod activitystreams {
    /// as:Create
    pub const CREATE: &str = "https://www.w3.org/ns/activitystreams#Create";
    /// as:Update
    pub const UPDATE: &str = "https://www.w3.org/ns/activitystreams#Update";
    /// as:Delete
    pub const DELETE: &str = "https://www.w3.org/ns/activitystreams#Delete";
}

/// FOAF vocabulary
pub mod foaf {
    /// foaf:Agent
    pub const AGENT: &str = "http://xmlns.com/foaf/0.1/Agent";
}

/// XML Schema datatypes
pub mod xsd {
    /// xsd:dateTime
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    /// xsd:long
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
}

/// Web Annotation vocabulary
pub mod oa {
    /// oa:annotationService
    pub const ANNOTATION_SERVICE: &str = "http://www.w3.org/ns/oa#annotationService";
}

/// Repository-internal vocabulary: the semantic context graph names and
/// well-known repository agents.
pub mod trellis {
    /// Graph holding user-managed quads
    pub const PREFER_USER_MANAGED: &str =
        "http://www.trellisldp.org/ns/trellis#PreferUserManaged";
    /// Graph holding server-managed quads (types, containment, datastreams)
    pub const PREFER_SERVER_MANAGED: &str =
        "http://www.trellisldp.org/ns/trellis#PreferServerManaged";
    /// Graph holding access-control quads
    pub const PREFER_ACCESS_CONTROL: &str =
        "http://www.trellisldp.org/ns/trellis#PreferAccessControl";
    /// Graph holding audit/provenance quads
    pub const PREFER_AUDIT: &str = "http://www.trellisldp.org/ns/trellis#PreferAudit";
    /// Graph holding inbound-reference quads
    pub const INBOUND_REFERENCES: &str =
        "http://www.trellisldp.org/ns/trellis#InboundReferences";
    /// Reserved IRI standing in for the default graph
    pub const DEFAULT_GRAPH: &str = "http://www.trellisldp.org/ns/trellis#DefaultGraph";
    /// The administrator agent authorized by the default root ACL
    pub const REPOSITORY_ADMINISTRATOR: &str =
        "http://www.trellisldp.org/ns/trellis#RepositoryAdministrator";
    /// Prefix for skolemized blank nodes
    pub const BNODE_PREFIX: &str = "info:trellis/bnode/";
}
