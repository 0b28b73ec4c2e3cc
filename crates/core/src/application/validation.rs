// Request validation: required fields, lexical ID checks, and spec construction

use crate::domain::ids;
use crate::domain::{EndpointSpec, EndpointType, Placement, RouteTableSelection, ScriptDialect};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Endpoint request as received from clients.
///
/// Deliberately loose: every field is optional on the wire so that missing
/// values are reported as validation messages instead of decode failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointRequest {
    #[serde(default)]
    pub endpoint_type: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub vpc_id: String,
    /// Multiple services (preferred)
    #[serde(default)]
    pub service_names: Option<Vec<String>>,
    /// Single service (legacy clients)
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub tag_prefix: Option<String>,
    #[serde(default)]
    pub tag_suffix: Option<String>,
    // Interface
    #[serde(default)]
    pub subnets: Option<Vec<String>>,
    #[serde(default)]
    pub security_groups: Option<Vec<String>>,
    #[serde(default)]
    pub private_dns_enabled: Option<bool>,
    // Gateway
    #[serde(default)]
    pub route_tables: Option<Vec<String>>,
    #[serde(default)]
    pub select_all_route_tables: bool,
    /// Script dialect; server default when absent
    #[serde(default)]
    pub shell: Option<ScriptDialect>,
}

impl EndpointRequest {
    /// `service_names` wins over the legacy `service_name`; blank entries are dropped
    pub fn resolved_service_names(&self) -> Vec<String> {
        let names: Vec<String> = match &self.service_names {
            Some(names) if !names.is_empty() => names.clone(),
            _ => self.service_name.iter().cloned().collect(),
        };
        names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    }

    fn subnets(&self) -> &[String] {
        self.subnets.as_deref().unwrap_or_default()
    }

    fn security_groups(&self) -> &[String] {
        self.security_groups.as_deref().unwrap_or_default()
    }

    fn route_tables(&self) -> &[String] {
        self.route_tables.as_deref().unwrap_or_default()
    }
}

/// Presence checks run before generation
pub fn required_field_errors(req: &EndpointRequest) -> Vec<String> {
    let mut errors = Vec::new();

    let endpoint_type = if req.endpoint_type.trim().is_empty() {
        errors.push("endpoint_type is required".to_string());
        None
    } else {
        match req.endpoint_type.parse::<EndpointType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push("endpoint_type must be 'Interface' or 'Gateway'".to_string());
                None
            }
        }
    };

    if req.region.trim().is_empty() {
        errors.push("region is required".to_string());
    }
    if req.vpc_id.trim().is_empty() {
        errors.push("vpc_id is required".to_string());
    }
    if req.resolved_service_names().is_empty() {
        errors.push("service_name(s) is required".to_string());
    }

    match endpoint_type {
        Some(EndpointType::Interface) => {
            if req.subnets().is_empty() {
                errors.push("subnets are required for Interface endpoints".to_string());
            }
            if req.security_groups().is_empty() {
                errors.push("security_groups are required for Interface endpoints".to_string());
            }
        }
        Some(EndpointType::Gateway) => {
            if req.route_tables().is_empty() && !req.select_all_route_tables {
                errors.push(
                    "route_tables are required for Gateway endpoints or select_all_route_tables must be true"
                        .to_string(),
                );
            }
        }
        None => {}
    }

    errors
}

/// Lexical checks on every identifier in the request
pub fn identifier_errors(req: &EndpointRequest) -> Vec<String> {
    let mut errors = Vec::new();

    if !ids::is_vpc_id(&req.vpc_id) {
        errors.push(format!("Invalid VPC ID format: {}", req.vpc_id));
    }
    if !ids::is_region(&req.region) {
        errors.push(format!("Invalid region format: {}", req.region));
    }

    match req.endpoint_type.parse::<EndpointType>() {
        Ok(EndpointType::Interface) => {
            if req.subnets().is_empty() {
                errors.push("At least one subnet is required for Interface endpoints".to_string());
            }
            for subnet in req.subnets() {
                if !ids::is_subnet_id(subnet) {
                    errors.push(format!("Invalid subnet ID format: {}", subnet));
                }
            }

            if req.security_groups().is_empty() {
                errors.push(
                    "At least one security group is required for Interface endpoints".to_string(),
                );
            }
            for sg in req.security_groups() {
                if !ids::is_security_group_id(sg) {
                    errors.push(format!("Invalid security group ID format: {}", sg));
                }
            }
        }
        Ok(EndpointType::Gateway) => {
            if req.route_tables().is_empty() && !req.select_all_route_tables {
                errors.push("At least one route table is required for Gateway endpoints".to_string());
            }
            for rt in req.route_tables() {
                if !ids::is_route_table_id(rt) {
                    errors.push(format!("Invalid route table ID format: {}", rt));
                }
            }
        }
        Err(_) => errors.push("endpoint_type must be 'Interface' or 'Gateway'".to_string()),
    }

    for service in req.resolved_service_names() {
        if !ids::is_service_name(&service) {
            errors.push(format!("Invalid service name format: {}", service));
        }
    }

    if let Some(prefix) = req.tag_prefix.as_deref().filter(|p| !p.is_empty()) {
        if !ids::is_tag_input(prefix) {
            errors.push(format!("Invalid tag prefix: {}", prefix));
        }
    }
    if let Some(suffix) = req.tag_suffix.as_deref().filter(|s| !s.is_empty()) {
        if !ids::is_tag_input(suffix) {
            errors.push(format!("Invalid tag suffix: {}", suffix));
        }
    }

    errors
}

/// Validate inputs without generating anything
pub fn validate(req: &EndpointRequest) -> Result<()> {
    let errors = identifier_errors(req);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Run both passes and build a validated `EndpointSpec`
pub fn into_spec(req: &EndpointRequest) -> Result<EndpointSpec> {
    let errors = required_field_errors(req);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    validate(req)?;

    let endpoint_type: EndpointType = req.endpoint_type.parse()?;
    let placement = match endpoint_type {
        EndpointType::Interface => Placement::Interface {
            subnets: req.subnets().to_vec(),
            security_groups: req.security_groups().to_vec(),
            private_dns_enabled: req.private_dns_enabled.unwrap_or(true),
        },
        EndpointType::Gateway => Placement::Gateway {
            route_tables: if req.select_all_route_tables {
                RouteTableSelection::AllInVpc
            } else {
                RouteTableSelection::Explicit(req.route_tables().to_vec())
            },
        },
    };

    Ok(EndpointSpec {
        region: req.region.clone(),
        vpc_id: req.vpc_id.clone(),
        service_names: req.resolved_service_names(),
        tag_prefix: req.tag_prefix.clone().filter(|p| !p.is_empty()),
        tag_suffix: req.tag_suffix.clone().filter(|s| !s.is_empty()),
        placement,
    })
}
