//! s3:// URL handler
//!
//! Lets a scheme-keyed URL resolution layer read objects addressed as
//! `s3://<authority>/<bucket>/<key>`. Credentials and region are discovered
//! from the environment (named profile, SDK default chain, `.s3credentials`
//! files) and never taken from the URL.

pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod s3;

pub use config::HandlerConfig;
pub use error::{BoxError, Error, Result};
pub use handler::{ConnectionState, S3HandlerFactory, S3ProtocolHandler};
pub use registry::{ProtocolHandlerFactory, UrlConnection, UrlHandlers};
