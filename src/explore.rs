//! Stateless orchestration of resolver, classifier and store for each
//! exposed operation.
use crate::classify::GraphClassifier;
use crate::config::Config;
use crate::error::ExploreError;
use crate::rdf::SparqlService;
use crate::resolve::{ResolvedUri, UriResolver};
use crate::resource::{RelatedResourceDescription, ShortResourceDescription};
use std::collections::HashSet;
use std::sync::Arc;

/// One value per process; cheap to clone into request handlers. All state
/// is immutable and shared, so concurrent requests never contend.
#[derive(Clone)]
pub struct Explorer {
    resolver: UriResolver,
    classifier: Arc<GraphClassifier>,
    store: Arc<dyn SparqlService>,
    top_relationships: Arc<HashSet<String>>,
}

impl Explorer {
    pub fn new(config: &Config, store: Arc<dyn SparqlService>) -> Result<Explorer, String> {
        let resolver = UriResolver::new(config.base_uri.as_deref())?;
        let classifier = Arc::new(GraphClassifier::new(config, store.clone()));
        let top_relationships = Arc::new(config.top_relationships.iter().cloned().collect());
        Ok(Explorer { resolver, classifier, store, top_relationships })
    }

    pub fn resolve(&self, raw: &str) -> Result<Option<ResolvedUri>, ExploreError> {
        self.resolver.resolve(raw)
    }

    pub fn store(&self) -> Arc<dyn SparqlService> {
        self.store.clone()
    }

    pub fn types(&self, raw: &str) -> Result<Vec<RelatedResourceDescription>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.types(uri.as_str())?),
        }
    }

    pub fn all_types(&self, raw: &str) -> Result<Vec<RelatedResourceDescription>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.all_types(uri.as_str())?),
        }
    }

    pub fn related_to_objects(&self, raw: &str) -> Result<Vec<RelatedResourceDescription>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.related_to_objects(uri.as_str())?),
        }
    }

    pub fn top_objects(&self, raw: &str) -> Result<Vec<RelatedResourceDescription>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.related_by_property(uri.as_str(), &self.top_relationships)?),
        }
    }

    pub fn related_from_subjects(&self, raw: &str) -> Result<Vec<RelatedResourceDescription>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.related_from_subjects(uri.as_str(), &HashSet::new())?),
        }
    }

    /// Never yields "no value": an unresolvable (empty) input degrades to
    /// the input echoed as its own label, keeping display code simple.
    pub fn short_description(&self, raw: &str) -> Result<ShortResourceDescription, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(ShortResourceDescription {
                uri: raw.to_owned(),
                label: raw.to_owned(),
                description: None,
                type_uri: None,
            }),
            Some(uri) => Ok(self.classifier.short_description(uri.as_str())?),
        }
    }

    pub fn depictions(&self, raw: &str) -> Result<Vec<String>, ExploreError> {
        match self.resolver.resolve(raw)? {
            None => Ok(Vec::new()),
            Some(uri) => Ok(self.classifier.depictions(uri.as_str())?),
        }
    }
}
