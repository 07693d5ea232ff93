//! MCP Resource Trait

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use research_papers_protocol::{McpResult, Resource, ResourceContents, ResourceTemplate};

use crate::uri_template::UriTemplate;

/// High-level trait for implementing MCP resources
///
/// A resource either has a fixed URI or is addressed through a URI template
/// such as `papers://{topic}`. Fixed resources are listed by
/// `resources/list`, templated ones by `resources/templates/list`.
#[async_trait]
pub trait McpResource: Send + Sync {
    /// Fixed URI or template pattern
    fn uri(&self) -> &str;

    fn name(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    fn mime_type(&self) -> Option<&str> {
        Some("text/markdown")
    }

    /// Template variables substituted from the request URI, empty for fixed resources
    async fn read(
        &self,
        uri: &str,
        variables: HashMap<String, String>,
    ) -> McpResult<Vec<ResourceContents>>;

    fn to_resource(&self) -> Resource {
        Resource {
            uri: self.uri().to_string(),
            name: self.name().to_string(),
            title: None,
            description: self.description().map(str::to_string),
            mime_type: self.mime_type().map(str::to_string),
        }
    }

    fn to_template(&self) -> ResourceTemplate {
        ResourceTemplate {
            uri_template: self.uri().to_string(),
            name: self.name().to_string(),
            description: self.description().map(str::to_string),
            mime_type: self.mime_type().map(str::to_string),
        }
    }
}

/// Fixed resources by URI plus templated ones in registration order
#[derive(Default)]
pub struct ResourceRegistry {
    fixed: HashMap<String, Arc<dyn McpResource>>,
    templated: Vec<(UriTemplate, Arc<dyn McpResource>)>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource; URIs containing `{` are compiled as templates
    pub fn register(&mut self, resource: Arc<dyn McpResource>) -> McpResult<()> {
        if resource.uri().contains('{') {
            let template = UriTemplate::new(resource.uri())?;
            self.templated.push((template, resource));
        } else {
            self.fixed.insert(resource.uri().to_string(), resource);
        }
        Ok(())
    }

    pub fn resources(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> = self.fixed.values().map(|r| r.to_resource()).collect();
        resources.sort_by(|a, b| a.uri.cmp(&b.uri));
        resources
    }

    pub fn templates(&self) -> Vec<ResourceTemplate> {
        self.templated.iter().map(|(_, r)| r.to_template()).collect()
    }

    /// Exact URIs win over templates, so `papers://folders` is never read as a topic
    pub fn resolve(
        &self,
        uri: &str,
    ) -> Option<(Arc<dyn McpResource>, HashMap<String, String>)> {
        if let Some(resource) = self.fixed.get(uri) {
            return Some((Arc::clone(resource), HashMap::new()));
        }
        self.templated.iter().find_map(|(template, resource)| {
            template
                .extract(uri)
                .map(|vars| (Arc::clone(resource), vars))
        })
    }
}
