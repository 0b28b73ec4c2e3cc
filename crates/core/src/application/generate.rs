// Generate Use Case

use crate::application::script::{self, GeneratedScript};
use crate::application::validation::{self, EndpointRequest};
use crate::domain::ScriptDialect;
use crate::error::Result;
use tracing::info;

/// Validate the request and render its script.
///
/// `default_dialect` applies when the request does not pick a `shell`.
pub fn execute(req: &EndpointRequest, default_dialect: ScriptDialect) -> Result<GeneratedScript> {
    let spec = validation::into_spec(req)?;
    let dialect = req.shell.unwrap_or(default_dialect);

    let script = script::render(&spec, dialect);

    info!(
        endpoint_type = %spec.endpoint_type(),
        vpc_id = %spec.vpc_id,
        region = %spec.region,
        services = spec.service_names.len(),
        dialect = %dialect,
        "Generated endpoint script"
    );

    Ok(script)
}
