// Domain Layer - Pure data and lexical rules

pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod ids;

// Re-exports
pub use credentials::{AwsCredentials, OutputFormat};
pub use endpoint::{
    service_short_name, EndpointSpec, EndpointType, Placement, RouteTableSelection,
    ScriptDialect,
};
pub use error::DomainError;
