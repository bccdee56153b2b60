//! OATH crate: sub-modules.

pub mod types;
pub mod config;
pub mod secret;
pub mod template;
pub mod uri;
pub mod provision;

// Re-export top-level items for convenience.
pub use config::TemplateConfig;
pub use provision::{ConnectionState, MovingFactor, OathConnection, ProvisionRequest};
pub use template::{CredentialId, CredentialIdentifier, CredentialTemplate, TemplateFields};
pub use types::*;
pub use uri::{parse, parse_lossy, parse_many, parse_with, to_uri};
