//! Client for the NAS photo service: endpoint failover, per-family session
//! authentication, multipart uploads across the incompatible API
//! generations, and vendor error-code translation.

pub mod auth;
pub mod codes;
pub mod endpoints;
pub mod error;
pub mod responses;
pub mod upload;

#[cfg(test)]
pub mod testserver;

pub use auth::{Authenticator, Credentials, SessionFamily};
pub use codes::ErrorCategory;
pub use endpoints::EndpointResolver;
pub use error::SynoError;
pub use upload::{PhotoSpace, UploadOrchestrator, UploadTarget};
