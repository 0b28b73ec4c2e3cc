// Endpoint Domain Model

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// VPC endpoint flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointType {
    /// PrivateLink ENIs placed in subnets, guarded by security groups
    Interface,
    /// Route table entries (S3, DynamoDB)
    Gateway,
}

impl EndpointType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Interface => "Interface",
            EndpointType::Gateway => "Gateway",
        }
    }
}

impl std::fmt::Display for EndpointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointType {
    type Err = DomainError;

    /// Case-insensitive; the canonical spelling is used when rendering
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "interface" => Ok(EndpointType::Interface),
            "gateway" => Ok(EndpointType::Gateway),
            other => Err(DomainError::UnknownEndpointType(other.to_string())),
        }
    }
}

/// Script language a generated script is written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
    #[default]
    #[serde(alias = "pwsh", alias = "ps1")]
    PowerShell,
    #[serde(alias = "sh")]
    Bash,
}

impl ScriptDialect {
    pub fn extension(&self) -> &'static str {
        match self {
            ScriptDialect::PowerShell => "ps1",
            ScriptDialect::Bash => "sh",
        }
    }

    /// Default file name offered to clients for a generated script
    pub fn default_script_name(&self) -> String {
        format!("vpc-endpoint-script.{}", self.extension())
    }

    /// Infer the dialect from a script file name (`.sh` => bash, anything else => PowerShell)
    pub fn from_script_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".sh") || lower.ends_with(".bash") {
            ScriptDialect::Bash
        } else {
            ScriptDialect::PowerShell
        }
    }
}

impl std::fmt::Display for ScriptDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScriptDialect::PowerShell => write!(f, "powershell"),
            ScriptDialect::Bash => write!(f, "bash"),
        }
    }
}

/// Which route tables a Gateway endpoint is attached to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTableSelection {
    Explicit(Vec<String>),
    /// Resolved by the script at execution time via describe-route-tables
    AllInVpc,
}

/// Type-specific placement of the endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    Interface {
        subnets: Vec<String>,
        security_groups: Vec<String>,
        private_dns_enabled: bool,
    },
    Gateway {
        route_tables: RouteTableSelection,
    },
}

impl Placement {
    pub fn endpoint_type(&self) -> EndpointType {
        match self {
            Placement::Interface { .. } => EndpointType::Interface,
            Placement::Gateway { .. } => EndpointType::Gateway,
        }
    }
}

/// A fully validated endpoint description.
///
/// Only produced by `application::validation::into_spec`, so every identifier
/// it carries has passed the lexical checks in `domain::ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub region: String,
    pub vpc_id: String,
    pub service_names: Vec<String>,
    pub tag_prefix: Option<String>,
    pub tag_suffix: Option<String>,
    pub placement: Placement,
}

impl EndpointSpec {
    pub fn endpoint_type(&self) -> EndpointType {
        self.placement.endpoint_type()
    }

    /// `Name` tag for one service: `[prefix-]<short service>[-suffix]`
    pub fn tag_name(&self, service_name: &str) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(3);
        if let Some(prefix) = self.tag_prefix.as_deref().filter(|p| !p.is_empty()) {
            parts.push(prefix);
        }
        parts.push(service_short_name(service_name));
        if let Some(suffix) = self.tag_suffix.as_deref().filter(|s| !s.is_empty()) {
            parts.push(suffix);
        }
        parts.join("-")
    }
}

/// Last dot-separated segment: `com.amazonaws.ap-southeast-1.ec2` -> `ec2`
pub fn service_short_name(service_name: &str) -> &str {
    service_name.rsplit('.').next().unwrap_or(service_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_spec(prefix: Option<&str>, suffix: Option<&str>) -> EndpointSpec {
        EndpointSpec {
            region: "ap-southeast-1".to_string(),
            vpc_id: "vpc-0a1b2c3d".to_string(),
            service_names: vec!["com.amazonaws.ap-southeast-1.s3".to_string()],
            tag_prefix: prefix.map(str::to_string),
            tag_suffix: suffix.map(str::to_string),
            placement: Placement::Gateway {
                route_tables: RouteTableSelection::AllInVpc,
            },
        }
    }

    #[test]
    fn test_endpoint_type_parse_is_case_insensitive() {
        assert_eq!("Interface".parse::<EndpointType>().unwrap(), EndpointType::Interface);
        assert_eq!("gateway".parse::<EndpointType>().unwrap(), EndpointType::Gateway);
        assert_eq!(" GATEWAY ".parse::<EndpointType>().unwrap(), EndpointType::Gateway);
        assert!("GatewayLoadBalancer".parse::<EndpointType>().is_err());
    }

    #[test]
    fn test_dialect_from_script_name() {
        assert_eq!(ScriptDialect::from_script_name("run.sh"), ScriptDialect::Bash);
        assert_eq!(ScriptDialect::from_script_name("RUN.SH"), ScriptDialect::Bash);
        assert_eq!(
            ScriptDialect::from_script_name("vpc-endpoint-script.ps1"),
            ScriptDialect::PowerShell
        );
        assert_eq!(ScriptDialect::from_script_name("noext"), ScriptDialect::PowerShell);
    }

    #[test]
    fn test_dialect_serde_names() {
        let d: ScriptDialect = serde_json::from_str("\"bash\"").unwrap();
        assert_eq!(d, ScriptDialect::Bash);
        let d: ScriptDialect = serde_json::from_str("\"pwsh\"").unwrap();
        assert_eq!(d, ScriptDialect::PowerShell);
        assert_eq!(serde_json::to_string(&ScriptDialect::PowerShell).unwrap(), "\"powershell\"");
    }

    #[test]
    fn test_service_short_name() {
        assert_eq!(service_short_name("com.amazonaws.ap-southeast-1.ec2"), "ec2");
        assert_eq!(service_short_name("s3"), "s3");
    }

    #[test]
    fn test_tag_name_skips_empty_parts() {
        let svc = "com.amazonaws.ap-southeast-1.s3";
        assert_eq!(gateway_spec(None, None).tag_name(svc), "s3");
        assert_eq!(gateway_spec(Some("prod"), None).tag_name(svc), "prod-s3");
        assert_eq!(gateway_spec(None, Some("vpce")).tag_name(svc), "s3-vpce");
        assert_eq!(gateway_spec(Some("prod"), Some("vpce")).tag_name(svc), "prod-s3-vpce");
        assert_eq!(gateway_spec(Some(""), Some("")).tag_name(svc), "s3");
    }
}
