//! S3 data types

use std::fmt;
use std::io::Read;
use std::path::PathBuf;

use url::Url;

use crate::error::{Error, Result};

/// Region used when no source supplies one
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Readable body of a fetched object
pub type ObjectStream = Box<dyn Read + Send>;

/// Static AWS credentials. The secret never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_key: String,
    session_token: Option<String>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_key: secret_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token (temporary credentials from the SDK chains)
    pub fn with_session_token(mut self, token: Option<String>) -> Self {
        self.session_token = token;
        self
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

/// Where a set of credentials came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOrigin {
    /// Named profile from the shared AWS config/credentials files
    Profile(String),
    /// SDK default provider chain (env vars, instance metadata, default profile...)
    DefaultChain,
    /// A `.s3credentials` file
    File(PathBuf),
}

impl fmt::Display for CredentialOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialOrigin::Profile(name) => write!(f, "profile '{}'", name),
            CredentialOrigin::DefaultChain => f.write_str("default provider chain"),
            CredentialOrigin::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

/// Credentials paired with a region, ready to talk to S3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClient {
    pub credentials: Credentials,
    pub region: String,
    pub origin: CredentialOrigin,
}

impl ResolvedClient {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        origin: CredentialOrigin,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            origin,
        }
    }
}

/// S3 URL parsed components
///
/// `s3://<authority>/<bucket>/<key...>`. The authority is meant as a region
/// hint but is only recorded, never used to pick a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Url {
    pub authority: Option<String>,
    pub bucket: String,
    pub key: String,
}

impl S3Url {
    pub const SCHEME: &'static str = "s3";

    /// Split an already parsed `s3://` URL into bucket and key
    ///
    /// Percent escapes added by URL parsing are decoded so the key matches the
    /// object name as written. Dot segments have already been collapsed by
    /// [`Url`] at this point; use [`S3Url::parse`] to keep them.
    pub fn from_url(url: &Url) -> Result<Self> {
        if url.scheme() != Self::SCHEME {
            return Err(invalid(url.as_str(), "scheme is not s3"));
        }

        let authority = url.host_str().filter(|h| !h.is_empty());
        Self::from_parts(url.as_str(), authority, url.path())
    }

    /// Parse a string URL without normalizing its path
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| invalid(url, "not a valid URL"))?;
        if !scheme.eq_ignore_ascii_case(Self::SCHEME) {
            return Err(invalid(url, "scheme is not s3"));
        }

        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        Self::from_parts(url, Some(authority).filter(|a| !a.is_empty()), path)
    }

    fn from_parts(url: &str, authority: Option<&str>, path: &str) -> Result<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);
        let (bucket, key) = path.split_once('/').unwrap_or((path, ""));

        let decode = |part: &str| {
            urlencoding::decode(part)
                .map(|decoded| decoded.into_owned())
                .map_err(|_| invalid(url, "percent-encoded bytes are not UTF-8"))
        };
        let bucket = decode(bucket)?;
        let key = decode(key)?;

        if bucket.is_empty() {
            return Err(invalid(url, "missing bucket name"));
        }
        if key.is_empty() {
            return Err(invalid(url, "missing object key"));
        }

        Ok(S3Url {
            authority: authority.map(str::to_string),
            bucket,
            key,
        })
    }
}

fn invalid(url: &str, reason: &'static str) -> Error {
    Error::InvalidUrl {
        url: url.to_string(),
        reason,
    }
}

impl fmt::Display for S3Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_url_parse_with_region_authority() {
        let url =
            S3Url::parse("s3://s3-eu-west-1.amazonaws.com/my-bucket/path/to/object.jar").unwrap();
        assert_eq!(url.bucket, "my-bucket");
        assert_eq!(url.key, "path/to/object.jar");
        assert_eq!(url.authority.as_deref(), Some("s3-eu-west-1.amazonaws.com"));
    }

    #[test]
    fn test_s3_url_parse_single_segment_key() {
        let url = S3Url::parse("s3://host/bucket/file.txt").unwrap();
        assert_eq!(url.bucket, "bucket");
        assert_eq!(url.key, "file.txt");
    }

    #[test]
    fn test_s3_url_parse_deep_path() {
        let url = S3Url::parse("s3://host/bucket/a/b/c/d/e/f.txt").unwrap();
        assert_eq!(url.bucket, "bucket");
        assert_eq!(url.key, "a/b/c/d/e/f.txt");
    }

    #[test]
    fn test_s3_url_parse_trailing_slash_key_kept() {
        let url = S3Url::parse("s3://host/bucket/folder/").unwrap();
        assert_eq!(url.key, "folder/");
    }

    #[test]
    fn test_s3_url_parse_empty_authority() {
        let url = S3Url::parse("s3:///bucket/key.txt").unwrap();
        assert!(url.authority.is_none());
        assert_eq!(url.bucket, "bucket");
        assert_eq!(url.key, "key.txt");
    }

    #[test]
    fn test_s3_url_parse_invalid() {
        assert!(matches!(
            S3Url::parse("s3://host/bucket-only"),
            Err(Error::InvalidUrl { reason: "missing object key", .. })
        ));
        assert!(matches!(
            S3Url::parse("s3://host/"),
            Err(Error::InvalidUrl { reason: "missing bucket name", .. })
        ));
        assert!(matches!(
            S3Url::parse("https://example.com/bucket/file.txt"),
            Err(Error::InvalidUrl { reason: "scheme is not s3", .. })
        ));
        assert!(S3Url::parse("not-a-url").is_err());
    }

    #[test]
    fn test_s3_url_key_with_spaces_and_non_ascii() {
        let parsed = Url::parse("s3://host/bucket/dir/my file ü.jar").unwrap();
        let url = S3Url::from_url(&parsed).unwrap();
        assert_eq!(url.bucket, "bucket");
        assert_eq!(url.key, "dir/my file ü.jar");

        let url = S3Url::parse("s3://host/bucket/dir/my file ü.jar").unwrap();
        assert_eq!(url.key, "dir/my file ü.jar");
    }

    #[test]
    fn test_s3_url_percent_escapes_decoded() {
        let url = S3Url::parse("s3://host/my-bucket/libs/a%2Bb%20c.jar").unwrap();
        assert_eq!(url.key, "libs/a+b c.jar");
        assert!(matches!(
            S3Url::parse("s3://host/bucket/bad%FF.jar"),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_s3_url_parse_keeps_dot_segments() {
        let url = S3Url::parse("s3://host/bucket/a/../b.jar").unwrap();
        assert_eq!(url.bucket, "bucket");
        assert_eq!(url.key, "a/../b.jar");
    }

    #[test]
    fn test_s3_url_parse_drops_query_and_fragment() {
        let url = S3Url::parse("s3://host/bucket/lib.jar?versionId=1#frag").unwrap();
        assert_eq!(url.key, "lib.jar");
    }

    #[test]
    fn test_s3_url_display() {
        let url = S3Url::parse("s3://host/test-bucket/folder/file.txt").unwrap();
        assert_eq!(url.to_string(), "s3://test-bucket/folder/file.txt");
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI")
            .with_session_token(Some("session-token-value".to_string()));
        let debug = format!("{:?}", creds);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("wJalrXUtnFEMI"));
        assert!(!debug.contains("session-token-value"));
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(
            CredentialOrigin::Profile("artifacts".to_string()).to_string(),
            "profile 'artifacts'"
        );
        assert_eq!(CredentialOrigin::DefaultChain.to_string(), "default provider chain");
    }
}
