pub mod analyzer;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod reporting;
pub mod scanner;
pub mod sources;
pub mod transport;

// Re-export commonly used items
pub use analyzer::{classify, group, normalize, EndpointGroup};
pub use auth::{AuthResult, AuthType, Authenticator};
pub use config::*;
pub use errors::*;
pub use models::*;
pub use orchestrator::{Cancellation, Orchestrator};
pub use reporting::{export_all, Exporter, Format};
pub use scanner::{analyze, ScanReport, Scanner};
pub use sources::{Source, SourceKind};
pub use transport::{Response, TokenBucket, Transport};
