//! Errors surfaced by the s3:// handler

/// Boxed error produced by a storage collaborator
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Every credential source was tried and none produced credentials.
    /// Raised before any request is sent.
    #[error(
        "no AWS credentials available: tried the named profile, the default provider chain \
         and .s3credentials files"
    )]
    CredentialsUnavailable,

    /// The GET request for the object failed. The storage client's error is kept as the source.
    #[error("failed to fetch s3 object '{key}' from bucket '{bucket}'")]
    ObjectFetch {
        bucket: String,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid s3 URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("stream for '{0}' was already opened")]
    AlreadyOpened(String),

    #[error("failed to start the AWS SDK runtime")]
    Runtime(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_credentials_unavailable_message_is_not_a_network_error() {
        let msg = Error::CredentialsUnavailable.to_string();
        assert!(msg.contains("no AWS credentials"));
        assert!(Error::CredentialsUnavailable.source().is_none());
    }

    #[test]
    fn test_object_fetch_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::ObjectFetch {
            bucket: "b".to_string(),
            key: "k".to_string(),
            source: Box::new(io),
        };

        let source = err.source().expect("source must be attached");
        let io = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
        assert_eq!(err.to_string(), "failed to fetch s3 object 'k' from bucket 'b'");
    }
}
