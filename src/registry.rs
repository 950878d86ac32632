//! Scheme-keyed URL handler registry
//!
//! The host side of URL resolution: factories are registered per scheme and
//! only ever consulted for URLs carrying that scheme.

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::error::Result;
use crate::s3::types::ObjectStream;

/// A per-URL connection handed out by a [`ProtocolHandlerFactory`]
pub trait UrlConnection: Send {
    fn url(&self) -> &Url;

    /// Prepare the connection. May do nothing at all.
    fn connect(&mut self) -> Result<()>;

    /// Open the content stream of the URL
    fn open_stream(&mut self) -> Result<ObjectStream>;
}

pub trait ProtocolHandlerFactory: Send + Sync {
    /// Create a connection for `url`, or `None` when `scheme` isn't handled
    fn create(&self, scheme: &str, url: &Url) -> Option<Box<dyn UrlConnection>>;
}

#[derive(Default, Clone)]
pub struct UrlHandlers {
    factories: HashMap<String, Arc<dyn ProtocolHandlerFactory>>,
}

impl UrlHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `scheme`, returning the one it replaces
    pub fn register(
        &mut self,
        scheme: impl Into<String>,
        factory: Arc<dyn ProtocolHandlerFactory>,
    ) -> Option<Arc<dyn ProtocolHandlerFactory>> {
        let scheme = scheme.into().to_ascii_lowercase();
        tracing::debug!("Registered URL handler for scheme '{}'", scheme);
        self.factories.insert(scheme, factory)
    }

    pub fn handles(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// Open a connection for `url`; `None` means no handler, fall back to other resolution
    pub fn open(&self, url: &Url) -> Option<Box<dyn UrlConnection>> {
        let factory = self.factories.get(url.scheme())?;
        factory.create(url.scheme(), url)
    }
}
