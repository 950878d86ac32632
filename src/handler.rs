//! `s3://` protocol handler
//!
//! [`S3HandlerFactory`] hands out one [`S3ProtocolHandler`] per URL. Nothing
//! happens until the stream is requested: that is when credentials get
//! resolved (once per factory) and the single GET is issued.

use std::sync::Arc;

use anyhow::Context;
use url::Url;

use crate::config::HandlerConfig;
use crate::error::{Error, Result};
use crate::registry::{ProtocolHandlerFactory, UrlConnection, UrlHandlers};
use crate::s3::client::{ObjectStore, SdkObjectStore};
use crate::s3::credentials::CredentialResolver;
use crate::s3::types::{ObjectStream, S3Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    /// Terminal, even when opening the stream failed
    StreamOpened,
}

/// Connection to a single `s3://` URL
pub struct S3ProtocolHandler {
    url: Url,
    resolver: Arc<CredentialResolver>,
    store: Arc<dyn ObjectStore>,
    state: ConnectionState,
}

impl S3ProtocolHandler {
    pub fn new(url: Url, resolver: Arc<CredentialResolver>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            url,
            resolver,
            store,
            state: ConnectionState::Unconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// No-op, all work is deferred to [`Self::open_object_stream`]
    pub fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Resolve credentials and GET the object
    ///
    /// Fails with [`Error::CredentialsUnavailable`] before touching the
    /// network when no credentials can be found. A failed GET is returned as
    /// [`Error::ObjectFetch`] with the store's error as its source. There is
    /// no retry and the handler can't be reopened.
    pub fn open_object_stream(&mut self) -> Result<ObjectStream> {
        if self.state == ConnectionState::StreamOpened {
            return Err(Error::AlreadyOpened(self.url.to_string()));
        }
        self.state = ConnectionState::StreamOpened;

        let location = S3Url::from_url(&self.url)?;
        let client = self.resolver.resolve().ok_or(Error::CredentialsUnavailable)?;

        tracing::info!("Opening {} with credentials from {}", location, client.origin);

        self.store
            .get_object(&client, &location.bucket, &location.key)
            .map_err(|source| Error::ObjectFetch {
                bucket: location.bucket,
                key: location.key,
                source,
            })
    }
}

impl UrlConnection for S3ProtocolHandler {
    fn url(&self) -> &Url {
        &self.url
    }

    fn connect(&mut self) -> Result<()> {
        S3ProtocolHandler::connect(self)
    }

    fn open_stream(&mut self) -> Result<ObjectStream> {
        self.open_object_stream()
    }
}

/// Creates [`S3ProtocolHandler`]s sharing one resolver and one store
#[derive(Clone)]
pub struct S3HandlerFactory {
    resolver: Arc<CredentialResolver>,
    store: Arc<dyn ObjectStore>,
}

impl S3HandlerFactory {
    pub const SCHEME: &'static str = S3Url::SCHEME;

    pub fn new(resolver: Arc<CredentialResolver>, store: Arc<dyn ObjectStore>) -> Self {
        Self { resolver, store }
    }

    /// Wire up the AWS SDK backed resolver and store
    ///
    /// Starts the tokio runtime every SDK call is driven on.
    pub fn with_config(config: &HandlerConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("s3-url-handler")
            .enable_all()
            .build()
            .map_err(Error::Runtime)?;
        let runtime = Arc::new(runtime);

        let resolver = CredentialResolver::from_config(config, runtime.clone());
        tracing::debug!("Credential sources: {:?}", resolver.source_names());

        Ok(Self::new(
            Arc::new(resolver),
            Arc::new(SdkObjectStore::new(config, runtime)),
        ))
    }

    /// Same as [`Self::with_config`] using the config file, if any
    pub fn from_env() -> anyhow::Result<Self> {
        let config = HandlerConfig::load()?;
        Self::with_config(&config).context("Failed to create s3 handler factory")
    }

    /// New handler for `url`, or `None` if `scheme` isn't `s3`
    pub fn create_handler(&self, scheme: &str, url: &Url) -> Option<S3ProtocolHandler> {
        if !scheme.eq_ignore_ascii_case(Self::SCHEME) {
            return None;
        }
        Some(S3ProtocolHandler::new(
            url.clone(),
            self.resolver.clone(),
            self.store.clone(),
        ))
    }

    /// Register this factory for the `s3` scheme
    pub fn install(self, handlers: &mut UrlHandlers) {
        handlers.register(Self::SCHEME, Arc::new(self));
    }
}

impl ProtocolHandlerFactory for S3HandlerFactory {
    fn create(&self, scheme: &str, url: &Url) -> Option<Box<dyn UrlConnection>> {
        self.create_handler(scheme, url)
            .map(|handler| Box::new(handler) as Box<dyn UrlConnection>)
    }
}
