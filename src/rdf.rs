//! The triple store capability: load the RDF graph, answer `DESCRIBE`
//! queries as streamed serialized RDF, and list the statements a resource
//! participates in.
#![allow(rustdoc::bare_urls)]
use crate::config::Config;
use crate::error::StoreError;
use crate::format::RdfFormat;
use crate::resolve::ResolvedUri;
use crate::resource::{Node, Statement};
use sophia::api::graph::Graph;
use sophia::api::serializer::{QuadSerializer, TripleSerializer};
use sophia::api::source::TripleSource;
use sophia::api::term::matcher::Any;
use sophia::api::term::{IriRef, SimpleTerm};
use sophia::api::MownStr;
use sophia::inmem::graph::FastGraph;
use sophia::jsonld::serializer::JsonLdSerializer;
use sophia::turtle::parser::turtle;
use sophia::turtle::serializer::nt::NtSerializer;
use sophia::turtle::serializer::turtle::{TurtleConfig, TurtleSerializer};
use sophia::xml::serializer::RdfXmlSerializer;
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufReader, Write};

/// Canonical query text for a `DESCRIBE` of the given resource. The URI has
/// already passed RFC 3986 validation, so bracket delimiting is all the
/// query needs; any further escaping of query-language reserved characters
/// is the store's concern.
pub fn describe_query(uri: &ResolvedUri) -> String {
    format!("DESCRIBE <{uri}>")
}

/// The triple store boundary. Implementations execute `DESCRIBE` queries,
/// streaming the serialized result, and enumerate the statements in which a
/// resource occurs as subject or object.
pub trait SparqlService: Send + Sync {
    /// Execute `query` and write the result to `out` in the given format,
    /// flushing incrementally. A failed write aborts the remaining
    /// serialization.
    fn query(&self, query: &str, format: RdfFormat, out: &mut dyn Write) -> Result<(), StoreError>;

    /// Statements with the given resource as subject.
    fn outgoing(&self, uri: &str) -> Result<Vec<Statement>, StoreError>;

    /// Statements with the given resource as object.
    fn incoming(&self, uri: &str) -> Result<Vec<Statement>, StoreError>;
}

/// In-memory store over a sophia [FastGraph] loaded from RDF Turtle.
pub struct GraphStore {
    graph: FastGraph,
}

impl GraphStore {
    /// Load the knowledge base named by the configuration, from a file path
    /// or an http(s) URL. The server is useless without it, so failure logs
    /// and exits.
    pub fn load(config: &Config) -> GraphStore {
        let Some(kb) = &config.kb_file else {
            log::error!("No knowledge base configured. Set kb_file in data/config.toml or env var LODEVIEW_KB_FILE.");
            std::process::exit(1);
        };
        match Self::read(kb) {
            Ok(store) => {
                log::info!("~ {} triples loaded from {}", store.graph.triples().size_hint().0, kb);
                store
            }
            Err(e) => {
                log::error!("Cannot load knowledge base '{kb}': {e}");
                std::process::exit(1);
            }
        }
    }

    fn read(kb: &str) -> Result<GraphStore, Box<dyn std::error::Error>> {
        let graph: FastGraph = if kb.starts_with("http://") || kb.starts_with("https://") {
            turtle::parse_bufread(BufReader::new(ureq::get(kb).call()?.into_reader())).collect_triples()?
        } else {
            turtle::parse_bufread(BufReader::new(File::open(kb)?)).collect_triples()?
        };
        Ok(GraphStore { graph })
    }

    #[cfg(test)]
    pub fn from_turtle(ttl: &str) -> GraphStore {
        let graph: FastGraph = turtle::parse_str(ttl).collect_triples().expect("invalid test turtle");
        GraphStore { graph }
    }

    /// Concise bounded description: all statements with the resource as
    /// subject, plus the closure over blank node objects. The visited set
    /// keeps cyclic blank node chains from looping.
    fn describe_triples<'a>(&'a self, uri: &'a str) -> Vec<[SimpleTerm<'a>; 3]> {
        let mut result = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier = vec![iri_term(uri)];
        while let Some(subject) = frontier.pop() {
            for t in self.graph.triples_matching(Some(&subject), Any, Any) {
                let t = t.expect("in-memory graph never fails");
                let triple = [t[0].clone(), t[1].clone(), t[2].clone()];
                if let SimpleTerm::BlankNode(id) = &triple[2] {
                    if visited.insert(id.as_str().to_owned()) {
                        frontier.push(triple[2].clone());
                    }
                }
                result.push(triple);
            }
        }
        result
    }
}

impl SparqlService for GraphStore {
    fn query(&self, query: &str, format: RdfFormat, out: &mut dyn Write) -> Result<(), StoreError> {
        let uri = describe_target(query)?;
        let triples = self.describe_triples(uri);
        serialize(triples, format, out)
    }

    fn outgoing(&self, uri: &str) -> Result<Vec<Statement>, StoreError> {
        let subject = iri_term(uri);
        Ok(self
            .graph
            .triples_matching(Some(&subject), Any, Any)
            .map(|t| {
                let t = t.expect("in-memory graph never fails");
                [t[0].clone(), t[1].clone(), t[2].clone()]
            })
            .filter_map(statement)
            .collect())
    }

    fn incoming(&self, uri: &str) -> Result<Vec<Statement>, StoreError> {
        let object = iri_term(uri);
        Ok(self
            .graph
            .triples_matching(Any, Any, Some(&object))
            .map(|t| {
                let t = t.expect("in-memory graph never fails");
                [t[0].clone(), t[1].clone(), t[2].clone()]
            })
            .filter_map(statement)
            .collect())
    }
}

/// The bundled store only answers the query form the explorer produces.
fn describe_target(query: &str) -> Result<&str, StoreError> {
    let rest = query
        .trim()
        .strip_prefix("DESCRIBE")
        .ok_or_else(|| StoreError::Query("only DESCRIBE queries are supported".to_owned()))?;
    rest.trim()
        .strip_prefix('<')
        .and_then(|r| r.strip_suffix('>'))
        .ok_or_else(|| StoreError::Query("DESCRIBE expects a single IRI in angle brackets".to_owned()))
}

fn iri_term(uri: &str) -> SimpleTerm<'_> {
    SimpleTerm::Iri(IriRef::new_unchecked(MownStr::from(uri)))
}

fn node(term: &SimpleTerm) -> Option<Node> {
    match term {
        SimpleTerm::Iri(iri) => Some(Node::Iri(iri.as_str().to_owned())),
        SimpleTerm::BlankNode(id) => Some(Node::Blank(id.as_str().to_owned())),
        SimpleTerm::LiteralLanguage(value, tag) => {
            Some(Node::Literal { value: value.to_string(), lang: Some(tag.as_str().to_owned()) })
        }
        SimpleTerm::LiteralDatatype(value, _) => Some(Node::Literal { value: value.to_string(), lang: None }),
        // variables and quoted triples have no place in a resource description
        _ => None,
    }
}

fn statement(t: [SimpleTerm; 3]) -> Option<Statement> {
    let [s, p, o] = t;
    let SimpleTerm::Iri(p) = p else { return None };
    Some(Statement { subject: node(&s)?, predicate: p.as_str().to_owned(), object: node(&o)? })
}

fn serialization_error<E: Display>(e: E) -> StoreError {
    StoreError::Serialization(e.to_string())
}

fn serialize(triples: Vec<[SimpleTerm; 3]>, format: RdfFormat, out: &mut dyn Write) -> Result<(), StoreError> {
    match format {
        RdfFormat::NTriples => {
            let source = triples.into_iter().map(Ok::<_, Infallible>);
            NtSerializer::new(&mut *out).serialize_triples(source).map_err(serialization_error)?;
        }
        // Turtle doubles as N3 output: every Turtle document is valid N3.
        RdfFormat::Turtle | RdfFormat::N3 => {
            let source = triples.into_iter().map(Ok::<_, Infallible>);
            TurtleSerializer::new_with_config(&mut *out, TurtleConfig::new().with_pretty(true))
                .serialize_triples(source)
                .map_err(serialization_error)?;
        }
        RdfFormat::RdfXml => {
            let source = triples.into_iter().map(Ok::<_, Infallible>);
            RdfXmlSerializer::new(&mut *out).serialize_triples(source).map_err(serialization_error)?;
        }
        RdfFormat::JsonLd => {
            let quads = triples.into_iter().map(|[s, p, o]| Ok::<_, Infallible>(([s, p, o], None::<SimpleTerm>)));
            JsonLdSerializer::new(&mut *out).serialize_quads(quads).map_err(serialization_error)?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::UriResolver;

    const TTL: &str = r#"
        @prefix ex: <http://example.org/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        ex:a rdfs:label "thing a" ;
             ex:knows ex:b ;
             ex:detail [ rdfs:label "hidden detail" ] .
        ex:b ex:knows ex:a .
    "#;

    fn resolved(uri: &str) -> ResolvedUri {
        UriResolver::new(None).unwrap().resolve(uri).unwrap().unwrap()
    }

    #[test]
    fn describe_query_brackets_the_uri() {
        assert_eq!(describe_query(&resolved("http://example.org/a")), "DESCRIBE <http://example.org/a>");
    }

    #[test]
    fn describe_streams_subject_triples_with_blank_node_closure() {
        let store = GraphStore::from_turtle(TTL);
        let mut out = Vec::new();
        store.query("DESCRIBE <http://example.org/a>", RdfFormat::NTriples, &mut out).unwrap();
        let nt = String::from_utf8(out).unwrap();
        assert!(nt.contains("<http://example.org/a> <http://example.org/knows> <http://example.org/b>"));
        // the blank node's own statements belong to the description
        assert!(nt.contains("hidden detail"));
        // other subjects do not
        assert!(!nt.contains("<http://example.org/b> <http://example.org/knows>"));
    }

    #[test]
    fn non_describe_queries_are_rejected() {
        let store = GraphStore::from_turtle(TTL);
        let mut out = Vec::new();
        let err = store.query("SELECT * WHERE { ?s ?p ?o }", RdfFormat::NTriples, &mut out).unwrap_err();
        assert!(matches!(err, StoreError::Query(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn outgoing_and_incoming_views() {
        let store = GraphStore::from_turtle(TTL);
        let out = store.outgoing("http://example.org/a").unwrap();
        assert!(out.iter().any(|s| s.predicate == "http://example.org/knows"
            && s.object == Node::Iri("http://example.org/b".to_owned())));
        assert!(out.iter().any(|s| matches!(&s.object, Node::Literal { value, .. } if value == "thing a")));
        let inc = store.incoming("http://example.org/a").unwrap();
        assert_eq!(inc.len(), 1);
        assert_eq!(inc[0].subject, Node::Iri("http://example.org/b".to_owned()));
    }
}
