//! View model for classified resource descriptions.
use serde::Serialize;

/// A single RDF node as seen at the triple store boundary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Iri(String),
    Blank(String),
    Literal { value: String, lang: Option<String> },
}

impl Node {
    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }

    /// The IRI of a named node, if it is one.
    pub fn iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    /// Identifier of a resource endpoint: IRI or blank node label.
    pub fn id(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            Node::Blank(id) => Some(id),
            Node::Literal { .. } => None,
        }
    }
}

/// One triple with the predicate already narrowed to an IRI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    pub subject: Node,
    pub predicate: String,
    pub object: Node,
}

/// One classified relationship edge. Direction (outgoing or incoming) is
/// determined by the operation that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelatedResourceDescription {
    pub predicate: String,
    pub uri: String,
    pub types: Vec<String>,
    pub label: Option<String>,
}

/// Human-presentable summary of one resource.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShortResourceDescription {
    pub uri: String,
    pub label: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_uri: Option<String>,
}
