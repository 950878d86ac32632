//! AWS credential discovery
//!
//! Credentials are looked up from an ordered list of sources, stopping at the
//! first one that yields a key pair:
//! - A named profile from ~/.aws/config and ~/.aws/credentials
//! - The SDK default provider chain (environment variables, EC2/ECS roles, default profile)
//! - `.s3credentials` files in a list of directories
//!
//! The outcome, including "nothing found", is computed once per resolver and
//! never refreshed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use aws_config::default_provider::region::DefaultRegionChain;
use aws_config::profile::profile_file::ProfileFiles;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials as SdkCredentials, ProvideCredentials};
use tokio::runtime::Runtime;

use crate::config::HandlerConfig;
use crate::s3::types::{CredentialOrigin, Credentials, ResolvedClient};

/// Key/value pairs read from a `.s3credentials` file
pub type CredentialFileEntry = HashMap<String, String>;

/// One way of discovering credentials
///
/// Failures stay inside the source: anything that goes wrong is reported as
/// `None` so the resolver can move on to the next source.
pub trait CredentialSource: Send + Sync {
    /// Human readable description, used in logs
    fn name(&self) -> String;

    fn try_resolve(&self) -> Option<ResolvedClient>;
}

/// Runs credential sources in order and remembers the first outcome
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
    resolved: OnceLock<Option<Arc<ResolvedClient>>>,
}

impl CredentialResolver {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self {
            sources,
            resolved: OnceLock::new(),
        }
    }

    /// Build the standard chain: named profile, SDK default chain, then one
    /// file source per search directory
    pub fn from_config(config: &HandlerConfig, runtime: Arc<Runtime>) -> Self {
        let mut sources: Vec<Box<dyn CredentialSource>> = vec![
            Box::new(ProfileCredentialSource::new(
                &config.profile_name,
                &config.default_region,
                runtime.clone(),
            )),
            Box::new(DefaultChainCredentialSource::new(
                &config.default_region,
                runtime,
            )),
        ];

        for dir in config.search_dirs() {
            sources.push(Box::new(FileCredentialSource::new(
                dir.join(&config.credentials_file_name),
                &config.default_region,
            )));
        }

        Self::new(sources)
    }

    /// Names of the configured sources in precedence order
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolve credentials, running the chain on first use only
    ///
    /// Concurrent first callers wait for the single in-flight resolution.
    pub fn resolve(&self) -> Option<Arc<ResolvedClient>> {
        self.resolved.get_or_init(|| self.run_chain()).clone()
    }

    fn run_chain(&self) -> Option<Arc<ResolvedClient>> {
        for source in &self.sources {
            tracing::debug!("Trying AWS credentials from {}", source.name());

            if let Some(client) = source.try_resolve() {
                tracing::info!(
                    "Found AWS credentials from {} (region {})",
                    client.origin,
                    client.region
                );
                return Some(Arc::new(client));
            }
        }

        tracing::warn!(
            "No AWS credentials found after trying {} sources",
            self.sources.len()
        );
        None
    }
}

/// Credentials from a named profile, region from the default region chain
pub struct ProfileCredentialSource {
    profile: String,
    default_region: String,
    runtime: Arc<Runtime>,
    profile_files: Option<ProfileFiles>,
}

impl ProfileCredentialSource {
    pub fn new(profile: &str, default_region: &str, runtime: Arc<Runtime>) -> Self {
        Self {
            profile: profile.to_string(),
            default_region: default_region.to_string(),
            runtime,
            profile_files: None,
        }
    }

    /// Read profiles from `files` instead of ~/.aws/config and ~/.aws/credentials
    pub fn with_profile_files(mut self, files: ProfileFiles) -> Self {
        self.profile_files = Some(files);
        self
    }
}

impl CredentialSource for ProfileCredentialSource {
    fn name(&self) -> String {
        format!("profile '{}'", self.profile)
    }

    fn try_resolve(&self) -> Option<ResolvedClient> {
        self.runtime.block_on(async {
            let mut builder =
                ProfileFileCredentialsProvider::builder().profile_name(&self.profile);
            if let Some(files) = &self.profile_files {
                builder = builder.profile_files(files.clone());
            }
            let provider = builder.build();

            let creds = match provider.provide_credentials().await {
                Ok(creds) => creds,
                Err(e) => {
                    tracing::debug!(
                        "Profile '{}' has no usable credentials: {}",
                        self.profile,
                        e
                    );
                    return None;
                }
            };

            let region = DefaultRegionChain::builder()
                .build()
                .region()
                .await
                .map(|r| r.to_string())
                .unwrap_or_else(|| self.default_region.clone());

            Some(ResolvedClient::new(
                from_sdk_credentials(&creds),
                region,
                CredentialOrigin::Profile(self.profile.clone()),
            ))
        })
    }
}

/// Credentials and region from the SDK default provider chains
pub struct DefaultChainCredentialSource {
    default_region: String,
    runtime: Arc<Runtime>,
}

impl DefaultChainCredentialSource {
    pub fn new(default_region: &str, runtime: Arc<Runtime>) -> Self {
        Self {
            default_region: default_region.to_string(),
            runtime,
        }
    }
}

impl CredentialSource for DefaultChainCredentialSource {
    fn name(&self) -> String {
        "default provider chain".to_string()
    }

    fn try_resolve(&self) -> Option<ResolvedClient> {
        self.runtime.block_on(async {
            let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
            let Some(provider) = config.credentials_provider() else {
                tracing::debug!("Default provider chain has no credentials provider");
                return None;
            };

            let creds = match provider.provide_credentials().await {
                Ok(creds) => creds,
                Err(e) => {
                    tracing::debug!("Default provider chain has no credentials: {}", e);
                    return None;
                }
            };

            let region = config
                .region()
                .map(|r| r.to_string())
                .unwrap_or_else(|| self.default_region.clone());

            Some(ResolvedClient::new(
                from_sdk_credentials(&creds),
                region,
                CredentialOrigin::DefaultChain,
            ))
        })
    }
}

fn from_sdk_credentials(creds: &SdkCredentials) -> Credentials {
    Credentials::new(creds.access_key_id(), creds.secret_access_key())
        .with_session_token(creds.session_token().map(str::to_string))
}

/// Credentials from a `key=value` file with `accessKey`, `secretKey` and optional `region`
pub struct FileCredentialSource {
    path: PathBuf,
    default_region: String,
}

impl FileCredentialSource {
    pub fn new(path: impl Into<PathBuf>, default_region: &str) -> Self {
        Self {
            path: path.into(),
            default_region: default_region.to_string(),
        }
    }
}

impl CredentialSource for FileCredentialSource {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn try_resolve(&self) -> Option<ResolvedClient> {
        let entries = match read_credentials_file(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Credentials file {:?} unreadable: {}", self.path, e);
                return None;
            }
        };

        let Some((credentials, region)) = credentials_from_entries(&entries, &self.default_region)
        else {
            tracing::debug!(
                "Credentials file {:?} lacks accessKey or secretKey",
                self.path
            );
            return None;
        };

        Some(ResolvedClient::new(
            credentials,
            region,
            CredentialOrigin::File(self.path.clone()),
        ))
    }
}

/// Read and parse a credentials file
///
/// Invalid UTF-8 is replaced rather than rejected, so only I/O errors surface.
pub fn read_credentials_file(path: &Path) -> std::io::Result<CredentialFileEntry> {
    let bytes = fs::read(path)?;
    Ok(parse_credentials(&String::from_utf8_lossy(&bytes)))
}

/// Parse `key=value` lines
///
/// Blank lines, `#` comments and lines without `=` are skipped. Later
/// duplicates win.
pub fn parse_credentials(content: &str) -> CredentialFileEntry {
    let mut entries = CredentialFileEntry::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    entries
}

/// Pick credentials and region out of parsed entries
///
/// Both `accessKey` and `secretKey` must be present and non-empty. A missing
/// or empty `region` falls back to `default_region`.
pub fn credentials_from_entries(
    entries: &CredentialFileEntry,
    default_region: &str,
) -> Option<(Credentials, String)> {
    let non_empty = |key: &str| entries.get(key).filter(|v| !v.is_empty());

    let access_key = non_empty("accessKey")?;
    let secret_key = non_empty("secretKey")?;
    let region = non_empty("region").map_or(default_region, String::as_str);

    Some((
        Credentials::new(access_key.as_str(), secret_key.as_str()),
        region.to_string(),
    ))
}
