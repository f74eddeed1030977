//! Classify the triples describing a resource into typed views: type
//! assertions, priority relationships, ordinary outgoing relationships,
//! incoming relationships, label/description, depiction links.
use crate::config::Config;
use crate::error::StoreError;
use crate::rdf::SparqlService;
use crate::resource::{Node, RelatedResourceDescription, ShortResourceDescription, Statement};
use multimap::MultiMap;
use std::collections::HashSet;
use std::sync::Arc;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_SUB_CLASS_OF: &str = "http://www.w3.org/2000/01/rdf-schema#subClassOf";

/// Whether the given resource is in subject or object position.
enum Direction {
    Outgoing,
    Incoming,
}

/// Partitions and filters the statements a resource participates in.
/// Holds an immutable snapshot of the classification policy; shared
/// read-only across concurrent requests.
pub struct GraphClassifier {
    store: Arc<dyn SparqlService>,
    ignored_types: HashSet<String>,
    /// Ignored and top predicates together; the "other relationships"
    /// bucket is strictly everything else, so it can never collide with
    /// the top bucket.
    other_exclusions: HashSet<String>,
    label_properties: Vec<String>,
    description_properties: Vec<String>,
    depiction_property: String,
    ignore_blank_nodes: bool,
    preferred_language: Option<String>,
}

impl GraphClassifier {
    pub fn new(config: &Config, store: Arc<dyn SparqlService>) -> GraphClassifier {
        let mut other_exclusions: HashSet<String> = config.ignored_relationships.iter().cloned().collect();
        other_exclusions.extend(config.top_relationships.iter().cloned());
        GraphClassifier {
            store,
            ignored_types: config.ignored_types.iter().cloned().collect(),
            other_exclusions,
            label_properties: config.label_properties.clone(),
            description_properties: config.description_properties.clone(),
            depiction_property: config.depiction_property.clone(),
            ignore_blank_nodes: config.ignore_blank_nodes,
            preferred_language: config.preferred_language.clone(),
        }
    }

    /// Direct `rdf:type` objects, filtered and deduplicated, each enriched
    /// with a label where one is available.
    pub fn types(&self, uri: &str) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        self.direct_type_uris(uri)?.into_iter().map(|t| self.type_description(t)).collect()
    }

    /// Direct types plus the transitive closure upward via
    /// `rdfs:subClassOf`. Breadth does not matter for the result set; the
    /// visited set guarantees termination on cyclic hierarchies. A store
    /// without hierarchy triples yields exactly the direct set.
    pub fn all_types(&self, uri: &str) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        let direct = self.direct_type_uris(uri)?;
        let mut visited: HashSet<String> = direct.iter().cloned().collect();
        let mut result = direct.clone();
        let mut frontier = direct;
        while let Some(class) = frontier.pop() {
            for st in self.store.outgoing(&class)? {
                if st.predicate != RDFS_SUB_CLASS_OF {
                    continue;
                }
                // rdfs:subClassOf is also used with blank nodes for owl
                // restrictions, which are not displayable types
                let Some(parent) = st.object.iri() else { continue };
                if self.ignored_types.contains(parent) {
                    continue;
                }
                if visited.insert(parent.to_owned()) {
                    result.push(parent.to_owned());
                    frontier.push(parent.to_owned());
                }
            }
        }
        result.into_iter().map(|t| self.type_description(t)).collect()
    }

    /// Outgoing edges whose predicate is neither globally ignored nor a
    /// top relationship: the residual bucket.
    pub fn related_to_objects(&self, uri: &str) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        self.related(uri, Direction::Outgoing, &self.other_exclusions, false)
    }

    /// Outgoing edges whose predicate IS in the caller-supplied priority
    /// set. Disjoint from [Self::related_to_objects] by construction.
    pub fn related_by_property(
        &self,
        uri: &str,
        properties: &HashSet<String>,
    ) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        self.related(uri, Direction::Outgoing, properties, true)
    }

    /// Incoming edges, filtered by a caller-supplied ignore set (distinct
    /// from the global one, so callers can widen exclusions per call).
    pub fn related_from_subjects(
        &self,
        uri: &str,
        ignored: &HashSet<String>,
    ) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        self.related(uri, Direction::Incoming, ignored, false)
    }

    /// Label and description are the first non-empty literal of the first
    /// matching predicate in the configured priority lists; the label
    /// falls back to the URI itself and is never empty.
    pub fn short_description(&self, uri: &str) -> Result<ShortResourceDescription, StoreError> {
        let statements = self.store.outgoing(uri)?;
        let language = self.preferred_language.as_deref();
        let label = pick_literal(&statements, &self.label_properties, language).unwrap_or_else(|| uri.to_owned());
        let description = pick_literal(&statements, &self.description_properties, language);
        let type_uri = statements
            .iter()
            .filter(|st| st.predicate == RDF_TYPE)
            .filter_map(|st| st.object.iri())
            .find(|t| !self.ignored_types.contains(*t))
            .map(str::to_owned);
        Ok(ShortResourceDescription { uri: uri.to_owned(), label, description, type_uri })
    }

    /// Deduplicated depiction URLs, in order of first occurrence.
    pub fn depictions(&self, uri: &str) -> Result<Vec<String>, StoreError> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for st in self.store.outgoing(uri)? {
            if st.predicate != self.depiction_property {
                continue;
            }
            if let Node::Iri(url) = st.object {
                if seen.insert(url.clone()) {
                    urls.push(url);
                }
            }
        }
        Ok(urls)
    }

    fn direct_type_uris(&self, uri: &str) -> Result<Vec<String>, StoreError> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for st in self.store.outgoing(uri)? {
            if st.predicate != RDF_TYPE {
                continue;
            }
            if st.object.is_blank() && self.ignore_blank_nodes {
                continue;
            }
            let Some(id) = st.object.id() else { continue };
            if self.ignored_types.contains(id) {
                continue;
            }
            if seen.insert(id.to_owned()) {
                result.push(id.to_owned());
            }
        }
        Ok(result)
    }

    fn type_description(&self, type_uri: String) -> Result<RelatedResourceDescription, StoreError> {
        let label = self.label_of(&type_uri)?;
        Ok(RelatedResourceDescription { predicate: RDF_TYPE.to_owned(), uri: type_uri, types: Vec::new(), label })
    }

    fn label_of(&self, uri: &str) -> Result<Option<String>, StoreError> {
        let statements = self.store.outgoing(uri)?;
        Ok(pick_literal(&statements, &self.label_properties, self.preferred_language.as_deref()))
    }

    /// Shared filter for the three relationship views. `keep_if_member`
    /// selects between "predicate must be in the set" (priority view) and
    /// "predicate must not be in the set" (residual and incoming views).
    /// Literal endpoints are attributes, not relationships, and never
    /// appear; blank endpoints vanish entirely when the flag is set.
    fn related(
        &self,
        uri: &str,
        direction: Direction,
        predicates: &HashSet<String>,
        keep_if_member: bool,
    ) -> Result<Vec<RelatedResourceDescription>, StoreError> {
        let statements = match direction {
            Direction::Outgoing => self.store.outgoing(uri)?,
            Direction::Incoming => self.store.incoming(uri)?,
        };
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for st in statements {
            if predicates.contains(&st.predicate) != keep_if_member {
                continue;
            }
            let endpoint = match direction {
                Direction::Outgoing => &st.object,
                Direction::Incoming => &st.subject,
            };
            if endpoint.is_blank() && self.ignore_blank_nodes {
                continue;
            }
            let Some(id) = endpoint.id() else { continue };
            if !seen.insert((st.predicate.clone(), id.to_owned())) {
                continue;
            }
            let types = self.direct_type_uris(id)?;
            let label = self.label_of(id)?;
            result.push(RelatedResourceDescription { predicate: st.predicate.clone(), uri: id.to_owned(), types, label });
        }
        Ok(result)
    }
}

/// "First matching predicate, not necessarily first literal value":
/// predicate priority order is the primary key, literal occurrence order
/// the tie-break. Among the winning predicate's literals, one tagged with
/// the preferred language beats the first encountered. Empty literals
/// never win.
fn pick_literal(statements: &[Statement], properties: &[String], preferred_language: Option<&str>) -> Option<String> {
    let mut literals: MultiMap<&str, (&str, Option<&str>)> = MultiMap::new();
    for st in statements {
        if let Node::Literal { value, lang } = &st.object {
            if !value.is_empty() {
                literals.insert(st.predicate.as_str(), (value.as_str(), lang.as_deref()));
            }
        }
    }
    for property in properties {
        if let Some(candidates) = literals.get_vec(property.as_str()) {
            let preferred = preferred_language
                .and_then(|wanted| candidates.iter().find(|(_, lang)| lang.is_some_and(|l| l.eq_ignore_ascii_case(wanted))));
            let chosen = preferred.or_else(|| candidates.first())?;
            return Some(chosen.0.to_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rdf::GraphStore;

    const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
    const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";
    const DCT_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
    const FOAF_DEPICTION: &str = "http://xmlns.com/foaf/0.1/depiction";

    const TTL: &str = r#"
        @prefix ex: <http://example.org/> .
        @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
        @prefix skos: <http://www.w3.org/2004/02/skos/core#> .
        @prefix foaf: <http://xmlns.com/foaf/0.1/> .
        ex:a a ex:Foo, ex:Bar ;
             rdfs:label "a label"@en, "ein Label"@de ;
             rdfs:comment "comment a"@en ;
             ex:top ex:t1 ;
             ex:knows ex:b ;
             ex:secret [ rdfs:label "anon" ] ;
             foaf:depiction ex:img1 .
        ex:b skos:prefLabel "b name" ;
             ex:knows ex:a .
        ex:c ex:cites ex:a .
        ex:Foo rdfs:label "foo class"@en ;
               rdfs:subClassOf ex:Super .
        ex:Super rdfs:subClassOf ex:Foo .
    "#;

    fn test_config() -> Config {
        Config {
            host: "127.0.0.1".to_owned(),
            port: 0,
            kb_file: None,
            base_uri: Some("http://example.org/".to_owned()),
            ignored_types: vec!["http://example.org/Bar".to_owned()],
            ignored_relationships: vec![RDF_TYPE.to_owned()],
            top_relationships: vec!["http://example.org/top".to_owned()],
            label_properties: vec![RDFS_LABEL.to_owned(), SKOS_PREF_LABEL.to_owned()],
            description_properties: vec![DCT_DESCRIPTION.to_owned(), RDFS_COMMENT.to_owned()],
            depiction_property: FOAF_DEPICTION.to_owned(),
            ignore_blank_nodes: true,
            preferred_language: Some("en".to_owned()),
            log_level: None,
        }
    }

    fn classifier_with(config: Config) -> GraphClassifier {
        GraphClassifier::new(&config, Arc::new(GraphStore::from_turtle(TTL)))
    }

    fn classifier() -> GraphClassifier {
        classifier_with(test_config())
    }

    /// Store stub returning a fixed statement list, for order-sensitive
    /// and duplicate-sensitive cases an indexed graph cannot express.
    struct ListStore(Vec<Statement>);

    impl SparqlService for ListStore {
        fn query(&self, _: &str, _: crate::format::RdfFormat, _: &mut dyn std::io::Write) -> Result<(), StoreError> {
            Err(StoreError::Query("not supported".to_owned()))
        }

        fn outgoing(&self, uri: &str) -> Result<Vec<Statement>, StoreError> {
            Ok(self.0.iter().filter(|st| st.subject.id() == Some(uri)).cloned().collect())
        }

        fn incoming(&self, uri: &str) -> Result<Vec<Statement>, StoreError> {
            Ok(self.0.iter().filter(|st| st.object.id() == Some(uri)).cloned().collect())
        }
    }

    fn st(subject: &str, predicate: &str, object: Node) -> Statement {
        Statement { subject: Node::Iri(subject.to_owned()), predicate: predicate.to_owned(), object }
    }

    fn literal(value: &str, lang: Option<&str>) -> Node {
        Node::Literal { value: value.to_owned(), lang: lang.map(str::to_owned) }
    }

    #[test]
    fn types_filters_ignored_and_enriches_labels() {
        let types = classifier().types("http://example.org/a").unwrap();
        let uris: Vec<&str> = types.iter().map(|t| t.uri.as_str()).collect();
        assert_eq!(uris, ["http://example.org/Foo"]);
        assert_eq!(types[0].label.as_deref(), Some("foo class"));
        assert_eq!(types[0].predicate, RDF_TYPE);
    }

    #[test]
    fn all_types_follows_subclass_closure_and_survives_cycles() {
        let types = classifier().all_types("http://example.org/a").unwrap();
        let mut uris: Vec<&str> = types.iter().map(|t| t.uri.as_str()).collect();
        uris.sort_unstable();
        assert_eq!(uris, ["http://example.org/Foo", "http://example.org/Super"]);
    }

    #[test]
    fn top_and_other_views_partition_the_outgoing_edges() {
        let c = classifier();
        let config = test_config();
        let top_set: HashSet<String> = config.top_relationships.iter().cloned().collect();
        let top = c.related_by_property("http://example.org/a", &top_set).unwrap();
        let other = c.related_to_objects("http://example.org/a").unwrap();

        let top_edges: HashSet<(String, String)> =
            top.iter().map(|r| (r.predicate.clone(), r.uri.clone())).collect();
        let other_edges: HashSet<(String, String)> =
            other.iter().map(|r| (r.predicate.clone(), r.uri.clone())).collect();
        assert!(top_edges.is_disjoint(&other_edges));

        let union: HashSet<(String, String)> = top_edges.union(&other_edges).cloned().collect();
        let expected: HashSet<(String, String)> = [
            ("http://example.org/top".to_owned(), "http://example.org/t1".to_owned()),
            ("http://example.org/knows".to_owned(), "http://example.org/b".to_owned()),
            (FOAF_DEPICTION.to_owned(), "http://example.org/img1".to_owned()),
        ]
        .into();
        assert_eq!(union, expected);
    }

    #[test]
    fn related_resources_carry_filtered_types_and_labels() {
        let other = classifier().related_to_objects("http://example.org/a").unwrap();
        let b = other.iter().find(|r| r.uri == "http://example.org/b").unwrap();
        assert_eq!(b.label.as_deref(), Some("b name"));
        assert!(b.types.is_empty());
    }

    #[test]
    fn blank_nodes_are_invisible_when_ignored() {
        let c = classifier();
        let other = c.related_to_objects("http://example.org/a").unwrap();
        assert!(other.iter().all(|r| r.predicate != "http://example.org/secret"));

        let mut config = test_config();
        config.ignore_blank_nodes = false;
        let visible = classifier_with(config).related_to_objects("http://example.org/a").unwrap();
        assert!(visible.iter().any(|r| r.predicate == "http://example.org/secret"));
    }

    #[test]
    fn incoming_edges_respect_the_caller_supplied_ignore_set() {
        let c = classifier();
        let incoming = c.related_from_subjects("http://example.org/a", &HashSet::new()).unwrap();
        let mut pairs: Vec<(&str, &str)> =
            incoming.iter().map(|r| (r.predicate.as_str(), r.uri.as_str())).collect();
        pairs.sort_unstable();
        assert_eq!(
            pairs,
            [
                ("http://example.org/cites", "http://example.org/c"),
                ("http://example.org/knows", "http://example.org/b"),
            ]
        );

        let widened: HashSet<String> = ["http://example.org/knows".to_owned()].into();
        let incoming = c.related_from_subjects("http://example.org/a", &widened).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].uri, "http://example.org/c");
    }

    #[test]
    fn short_description_prefers_configured_language_and_predicates() {
        let sd = classifier().short_description("http://example.org/a").unwrap();
        assert_eq!(sd.label, "a label");
        assert_eq!(sd.description.as_deref(), Some("comment a"));
        assert_eq!(sd.type_uri.as_deref(), Some("http://example.org/Foo"));
    }

    #[test]
    fn short_description_label_falls_back_to_the_uri() {
        let sd = classifier().short_description("http://example.org/t1").unwrap();
        assert_eq!(sd.label, "http://example.org/t1");
        assert_eq!(sd.description, None);
    }

    #[test]
    fn predicate_order_beats_literal_occurrence_order() {
        let statements = vec![
            st("http://example.org/x", SKOS_PREF_LABEL, literal("second choice", None)),
            st("http://example.org/x", RDFS_LABEL, literal("first choice", None)),
        ];
        let c = GraphClassifier::new(&test_config(), Arc::new(ListStore(statements)));
        assert_eq!(c.short_description("http://example.org/x").unwrap().label, "first choice");
    }

    #[test]
    fn literal_selection_is_deterministic_without_a_language_match() {
        let statements = vec![
            st("http://example.org/x", RDFS_LABEL, literal("premier", Some("fr"))),
            st("http://example.org/x", RDFS_LABEL, literal("zweiter", Some("de"))),
        ];
        let c = GraphClassifier::new(&test_config(), Arc::new(ListStore(statements)));
        // no "en" candidate: the first encountered wins, every time
        assert_eq!(c.short_description("http://example.org/x").unwrap().label, "premier");
    }

    #[test]
    fn empty_literals_never_win() {
        let statements = vec![
            st("http://example.org/x", RDFS_LABEL, literal("", None)),
            st("http://example.org/x", SKOS_PREF_LABEL, literal("fallback", None)),
        ];
        let c = GraphClassifier::new(&test_config(), Arc::new(ListStore(statements)));
        assert_eq!(c.short_description("http://example.org/x").unwrap().label, "fallback");
    }

    #[test]
    fn depictions_are_deduplicated() {
        let statements = vec![
            st("http://example.org/x", FOAF_DEPICTION, Node::Iri("http://example.org/img.png".to_owned())),
            st("http://example.org/x", FOAF_DEPICTION, Node::Iri("http://example.org/img.png".to_owned())),
        ];
        let c = GraphClassifier::new(&test_config(), Arc::new(ListStore(statements)));
        assert_eq!(c.depictions("http://example.org/x").unwrap(), ["http://example.org/img.png"]);
    }

    #[test]
    fn duplicate_type_statements_collapse() {
        let statements = vec![
            st("http://example.org/x", RDF_TYPE, Node::Iri("http://example.org/Foo".to_owned())),
            st("http://example.org/x", RDF_TYPE, Node::Iri("http://example.org/Foo".to_owned())),
        ];
        let c = GraphClassifier::new(&test_config(), Arc::new(ListStore(statements)));
        assert_eq!(c.types("http://example.org/x").unwrap().len(), 1);
    }
}
