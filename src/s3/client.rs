//! AWS S3 client wrapper

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::{Arc, OnceLock};

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials as SdkCredentials, Region};
use aws_sdk_s3::Client;
use tokio::io::AsyncRead;
use tokio::runtime::Runtime;
use tokio_util::io::SyncIoBridge;

use crate::config::HandlerConfig;
use crate::error::BoxError;
use crate::s3::types::{ObjectStream, ResolvedClient};

/// Storage backend able to GET a single object
pub trait ObjectStore: Send + Sync {
    /// Start downloading `bucket`/`key` and hand back the body as it arrives
    fn get_object(
        &self,
        client: &ResolvedClient,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectStream, BoxError>;
}

/// [`ObjectStore`] backed by the AWS SDK
///
/// The SDK client is built from the first [`ResolvedClient`] seen and reused
/// afterwards; a resolver only ever hands out one.
pub struct SdkObjectStore {
    runtime: Arc<Runtime>,
    endpoint_url: Option<String>,
    force_path_style: bool,
    client: OnceLock<Client>,
}

impl SdkObjectStore {
    pub fn new(config: &HandlerConfig, runtime: Arc<Runtime>) -> Self {
        Self {
            runtime,
            endpoint_url: config.endpoint_url.clone(),
            force_path_style: config.force_path_style,
            client: OnceLock::new(),
        }
    }

    fn client(&self, resolved: &ResolvedClient) -> &Client {
        self.client.get_or_init(|| {
            let creds = &resolved.credentials;
            let credentials = SdkCredentials::new(
                creds.access_key_id(),
                creds.secret_key(),
                creds.session_token().map(str::to_string),
                None,
                "s3-url-handler",
            );

            let mut builder = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(resolved.region.clone()))
                .credentials_provider(credentials)
                .force_path_style(self.force_path_style);

            if let Some(endpoint) = &self.endpoint_url {
                builder = builder.endpoint_url(endpoint);
            }

            tracing::debug!(
                "Created S3 client for region {} using {}",
                resolved.region,
                resolved.origin
            );
            Client::from_conf(builder.build())
        })
    }
}

impl ObjectStore for SdkObjectStore {
    fn get_object(
        &self,
        client: &ResolvedClient,
        bucket: &str,
        key: &str,
    ) -> Result<ObjectStream, BoxError> {
        let request = self.client(client).get_object().bucket(bucket).key(key).send();
        let response = self.runtime.block_on(request)?;

        let body: Pin<Box<dyn AsyncRead + Send>> = Box::pin(response.body.into_async_read());
        Ok(Box::new(BodyReader {
            inner: SyncIoBridge::new_with_handle(body, self.runtime.handle().clone()),
            _runtime: self.runtime.clone(),
        }))
    }
}

/// Blocking reader over a streaming response body
///
/// Holds on to the runtime so the body can still be driven if everything
/// else has been dropped.
struct BodyReader {
    inner: SyncIoBridge<Pin<Box<dyn AsyncRead + Send>>>,
    _runtime: Arc<Runtime>,
}

impl Read for BodyReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}
