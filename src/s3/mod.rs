//! S3 access module
//!
//! This module provides:
//! - [`credentials::CredentialResolver`] - Ordered, memoized credential discovery
//! - [`client::ObjectStore`] - Object GET abstraction
//! - [`client::SdkObjectStore`] - AWS SDK backed object store
//! - [`types`] - S3 data types (Credentials, ResolvedClient, S3Url)

pub mod client;
pub mod credentials;
pub mod types;

// Re-export commonly used types
pub use client::{ObjectStore, SdkObjectStore};
pub use credentials::{
    CredentialResolver, CredentialSource, DefaultChainCredentialSource, FileCredentialSource,
    ProfileCredentialSource,
};
pub use types::{
    CredentialOrigin, Credentials, ObjectStream, ResolvedClient, S3Url, DEFAULT_REGION,
};
