// Application Layer - Use Cases

pub mod configure;
pub mod constants;
pub mod execute;
pub mod generate;
pub mod route_tables;
pub mod script;
pub mod validation;

// Re-exports
pub use configure::{ConfigureOutcome, ConfigureRequest};
pub use execute::ExecuteRequest;
pub use route_tables::RouteTables;
pub use script::GeneratedScript;
pub use validation::EndpointRequest;
