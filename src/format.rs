//! Output format registry for serialized `DESCRIBE` results.

/// The closed set of supported RDF serializations. Unrecognized or absent
/// tokens fall back to N-Triples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RdfFormat {
    NTriples,
    RdfXml,
    N3,
    Turtle,
    JsonLd,
}

impl RdfFormat {
    /// Resolve a request token, case-insensitively.
    pub fn resolve(token: Option<&str>) -> Self {
        match token.map(str::to_ascii_lowercase).as_deref() {
            Some("rdf" | "xml" | "rdf/xml") => RdfFormat::RdfXml,
            Some("n3") => RdfFormat::N3,
            Some("ttl" | "turtle") => RdfFormat::Turtle,
            Some("json" | "json-ld") => RdfFormat::JsonLd,
            _ => RdfFormat::NTriples,
        }
    }

    /// Canonical serialization name.
    pub fn name(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "N-Triples",
            RdfFormat::RdfXml => "RDF/XML",
            RdfFormat::N3 => "N3",
            RdfFormat::Turtle => "Turtle",
            RdfFormat::JsonLd => "JSON-LD",
        }
    }

    /// Content type emitted alongside the serialized body.
    pub fn content_type(self) -> &'static str {
        match self {
            RdfFormat::NTriples => "text/plain; charset=utf-8",
            RdfFormat::RdfXml => "application/rdf+xml; charset=utf-8",
            RdfFormat::N3 => "text/n3; charset=utf-8",
            RdfFormat::Turtle => "text/turtle; charset=utf-8",
            RdfFormat::JsonLd => "application/rdf+json; charset=utf-8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_unrecognized_tokens_yield_ntriples() {
        assert_eq!(RdfFormat::resolve(None), RdfFormat::NTriples);
        assert_eq!(RdfFormat::resolve(Some("")), RdfFormat::NTriples);
        assert_eq!(RdfFormat::resolve(Some("nquads")), RdfFormat::NTriples);
        assert_eq!(RdfFormat::NTriples.content_type(), "text/plain; charset=utf-8");
    }

    #[test]
    fn token_table() {
        for t in ["rdf", "xml", "rdf/xml"] {
            assert_eq!(RdfFormat::resolve(Some(t)), RdfFormat::RdfXml);
        }
        assert_eq!(RdfFormat::RdfXml.content_type(), "application/rdf+xml; charset=utf-8");
        assert_eq!(RdfFormat::resolve(Some("n3")), RdfFormat::N3);
        for t in ["ttl", "turtle"] {
            assert_eq!(RdfFormat::resolve(Some(t)), RdfFormat::Turtle);
        }
        assert_eq!(RdfFormat::Turtle.content_type(), "text/turtle; charset=utf-8");
        for t in ["json", "json-ld"] {
            assert_eq!(RdfFormat::resolve(Some(t)), RdfFormat::JsonLd);
        }
    }

    #[test]
    fn token_matching_is_case_insensitive() {
        assert_eq!(RdfFormat::resolve(Some("RDF/XML")), RdfFormat::RdfXml);
        assert_eq!(RdfFormat::resolve(Some("Turtle")), RdfFormat::Turtle);
        assert_eq!(RdfFormat::resolve(Some("JSON-LD")), RdfFormat::JsonLd);
        assert_eq!(RdfFormat::resolve(Some("N3")), RdfFormat::N3);
    }
}
