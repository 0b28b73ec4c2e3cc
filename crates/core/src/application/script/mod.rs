//! Script rendering
//!
//! Turns a validated [`EndpointSpec`] into the literal `aws ec2
//! create-vpc-endpoint` commands and a runnable script in the requested
//! dialect. Rendering never talks to AWS: route tables for
//! [`RouteTableSelection::AllInVpc`] are looked up by the script itself when
//! it runs.

mod bash;
mod powershell;

use crate::domain::{EndpointSpec, Placement, RouteTableSelection, ScriptDialect};

pub const SCRIPT_TITLE: &str = "# AWS VPC Endpoint Generation Script";
pub const SCRIPT_GENERATOR: &str = "# Created by AWS VPC Endpoint Generator";

/// Rendered script plus the commands it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedScript {
    pub content: String,
    /// One literal command per service, joined by ` && `
    pub command: String,
    pub dialect: ScriptDialect,
    pub script_name: String,
}

/// Render the script and commands for every service in `spec`
pub fn render(spec: &EndpointSpec, dialect: ScriptDialect) -> GeneratedScript {
    let command = spec
        .service_names
        .iter()
        .map(|service| create_command(spec, service))
        .collect::<Vec<_>>()
        .join(" && ");

    let content = match dialect {
        ScriptDialect::PowerShell => powershell::render(spec),
        ScriptDialect::Bash => bash::render(spec),
    };

    GeneratedScript {
        content,
        command,
        dialect,
        script_name: dialect.default_script_name(),
    }
}

/// The literal AWS CLI command for one service
pub fn create_command(spec: &EndpointSpec, service: &str) -> String {
    let placement = match static_placement_args(&spec.placement) {
        Some(args) => args,
        None => format!(" --route-table-ids {}", all_route_tables_placeholder(&spec.vpc_id)),
    };

    format!(
        "aws ec2 create-vpc-endpoint {}{} --tag-specifications \"{}\"",
        base_args(spec, service),
        placement,
        tag_specification(spec, service)
    )
}

/// Shown in place of route table IDs that are resolved at execution time
pub fn all_route_tables_placeholder(vpc_id: &str) -> String {
    format!("<all-route-tables-in-{}>", vpc_id)
}

/// `--vpc-id ... --region ...` (no leading space)
fn base_args(spec: &EndpointSpec, service: &str) -> String {
    format!(
        "--vpc-id {} --vpc-endpoint-type {} --service-name {} --region {}",
        spec.vpc_id,
        spec.endpoint_type(),
        service,
        spec.region
    )
}

/// Placement arguments known at render time, each with a leading space.
/// `None` when route tables are resolved by the script.
fn static_placement_args(placement: &Placement) -> Option<String> {
    match placement {
        Placement::Interface {
            subnets,
            security_groups,
            private_dns_enabled,
        } => {
            let mut args = String::new();
            if !subnets.is_empty() {
                args.push_str(&format!(" --subnet-ids {}", subnets.join(" ")));
            }
            if !security_groups.is_empty() {
                args.push_str(&format!(" --security-group-ids {}", security_groups.join(" ")));
            }
            if *private_dns_enabled {
                args.push_str(" --private-dns-enabled");
            } else {
                args.push_str(" --no-private-dns-enabled");
            }
            Some(args)
        }
        Placement::Gateway {
            route_tables: RouteTableSelection::Explicit(ids),
        } if ids.is_empty() => Some(String::new()),
        Placement::Gateway {
            route_tables: RouteTableSelection::Explicit(ids),
        } => Some(format!(" --route-table-ids {}", ids.join(" "))),
        Placement::Gateway {
            route_tables: RouteTableSelection::AllInVpc,
        } => None,
    }
}

fn tag_specification(spec: &EndpointSpec, service: &str) -> String {
    format!(
        "ResourceType=vpc-endpoint,Tags=[{{Key=Name,Value={}}}]",
        spec.tag_name(service)
    )
}

fn header_lines(spec: &EndpointSpec) -> Vec<String> {
    vec![
        SCRIPT_TITLE.to_string(),
        SCRIPT_GENERATOR.to_string(),
        format!("# Endpoint Type: {}", spec.endpoint_type()),
        format!("# VPC ID: {}", spec.vpc_id),
        format!("# Region: {}", spec.region),
        format!("# Services: {}", spec.service_names.join(", ")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interface_spec() -> EndpointSpec {
        EndpointSpec {
            region: "ap-southeast-1".to_string(),
            vpc_id: "vpc-0a1b2c3d".to_string(),
            service_names: vec!["com.amazonaws.ap-southeast-1.ec2".to_string()],
            tag_prefix: Some("prod".to_string()),
            tag_suffix: None,
            placement: Placement::Interface {
                subnets: vec!["subnet-11111111".to_string(), "subnet-22222222".to_string()],
                security_groups: vec!["sg-33333333".to_string()],
                private_dns_enabled: true,
            },
        }
    }

    fn gateway_spec(route_tables: RouteTableSelection) -> EndpointSpec {
        EndpointSpec {
            region: "us-east-1".to_string(),
            vpc_id: "vpc-0a1b2c3d".to_string(),
            service_names: vec![
                "com.amazonaws.us-east-1.s3".to_string(),
                "com.amazonaws.us-east-1.dynamodb".to_string(),
            ],
            tag_prefix: None,
            tag_suffix: Some("vpce".to_string()),
            placement: Placement::Gateway { route_tables },
        }
    }

    #[test]
    fn test_interface_command_literal() {
        let spec = interface_spec();
        assert_eq!(
            create_command(&spec, "com.amazonaws.ap-southeast-1.ec2"),
            "aws ec2 create-vpc-endpoint --vpc-id vpc-0a1b2c3d --vpc-endpoint-type Interface \
             --service-name com.amazonaws.ap-southeast-1.ec2 --region ap-southeast-1 \
             --subnet-ids subnet-11111111 subnet-22222222 --security-group-ids sg-33333333 \
             --private-dns-enabled \
             --tag-specifications \"ResourceType=vpc-endpoint,Tags=[{Key=Name,Value=prod-ec2}]\""
        );
    }

    #[test]
    fn test_interface_command_without_private_dns() {
        let mut spec = interface_spec();
        spec.placement = Placement::Interface {
            subnets: vec!["subnet-11111111".to_string()],
            security_groups: vec!["sg-33333333".to_string()],
            private_dns_enabled: false,
        };
        let cmd = create_command(&spec, "com.amazonaws.ap-southeast-1.ec2");
        assert!(cmd.contains(" --no-private-dns-enabled "));
        assert!(!cmd.contains(" --private-dns-enabled "));
    }

    #[test]
    fn test_gateway_explicit_command_literal() {
        let spec = gateway_spec(RouteTableSelection::Explicit(vec![
            "rtb-aaaaaaaa".to_string(),
            "rtb-bbbbbbbb".to_string(),
        ]));
        assert_eq!(
            create_command(&spec, "com.amazonaws.us-east-1.s3"),
            "aws ec2 create-vpc-endpoint --vpc-id vpc-0a1b2c3d --vpc-endpoint-type Gateway \
             --service-name com.amazonaws.us-east-1.s3 --region us-east-1 \
             --route-table-ids rtb-aaaaaaaa rtb-bbbbbbbb \
             --tag-specifications \"ResourceType=vpc-endpoint,Tags=[{Key=Name,Value=s3-vpce}]\""
        );
    }

    #[test]
    fn test_gateway_all_route_tables_uses_placeholder() {
        let spec = gateway_spec(RouteTableSelection::AllInVpc);
        let cmd = create_command(&spec, "com.amazonaws.us-east-1.s3");
        assert!(cmd.contains(" --route-table-ids <all-route-tables-in-vpc-0a1b2c3d> "));
    }

    #[test]
    fn test_render_joins_commands_per_service() {
        let spec = gateway_spec(RouteTableSelection::Explicit(vec!["rtb-aaaaaaaa".to_string()]));
        let script = render(&spec, ScriptDialect::PowerShell);

        let commands: Vec<&str> = script.command.split(" && ").collect();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].contains("--service-name com.amazonaws.us-east-1.s3 "));
        assert!(commands[1].contains("--service-name com.amazonaws.us-east-1.dynamodb "));
        assert!(commands[1].contains("Value=dynamodb-vpce}"));
        assert_eq!(script.script_name, "vpc-endpoint-script.ps1");
    }

    #[test]
    fn test_render_bash_dialect_name() {
        let script = render(&interface_spec(), ScriptDialect::Bash);
        assert_eq!(script.dialect, ScriptDialect::Bash);
        assert_eq!(script.script_name, "vpc-endpoint-script.sh");
        assert!(script.content.starts_with("#!/usr/bin/env bash\n"));
    }
}
