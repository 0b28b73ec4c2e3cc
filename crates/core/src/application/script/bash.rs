// Bash dialect
//
// Uses `--query ... --output text` instead of JSON so the script needs
// nothing beyond bash and the AWS CLI. The query yields
// `<Error.Code> <VpcEndpointId> <State>`, with `None` for missing fields.

use super::{base_args, header_lines, static_placement_args, tag_specification};
use crate::domain::EndpointSpec;

const CHECK_OUTPUT: &str = r#"echo "Raw AWS Response:"
echo "${output}"
if [ -z "${output}" ] || [ "${output}" = "None" ]; then
    echo "[FAIL] AWS CLI returned no output" >&2
    exit 1
fi
read -r error_code endpoint_id endpoint_state <<< "${output}"
if [ -n "${error_code}" ] && [ "${error_code}" != "None" ]; then
    echo "[FAIL] AWS returned an error: ${error_code}" >&2
    exit 1
fi
case "${endpoint_id}" in
    vpce-*) ;;
    *)
        echo "[FAIL] Unexpected response - VpcEndpoint not found" >&2
        exit 1
        ;;
esac
echo "[OK] Endpoint created successfully"
echo "ID: ${endpoint_id}"
echo "State: ${endpoint_state:-unknown}""#;

pub(super) fn render(spec: &EndpointSpec) -> String {
    let mut lines = vec!["#!/usr/bin/env bash".to_string()];
    lines.extend(header_lines(spec));
    lines.push(String::new());
    lines.push("set -euo pipefail".to_string());

    for service in &spec.service_names {
        lines.push(String::new());
        lines.push(format!("# Service: {}", service));
        lines.extend(service_block(spec, service));
    }

    let mut script = lines.join("\n");
    script.push('\n');
    script
}

fn service_block(spec: &EndpointSpec, service: &str) -> Vec<String> {
    let mut lines = vec![format!("echo \"Creating VPC Endpoint for {}...\"", service)];

    let placement = match static_placement_args(&spec.placement) {
        Some(args) => args,
        None => {
            lines.push(format!(
                "if ! route_tables=$(aws ec2 describe-route-tables --filters \"Name=vpc-id,Values={}\" --region {} --query \"RouteTables[].RouteTableId\" --output text); then",
                spec.vpc_id, spec.region
            ));
            lines.push("    echo \"[FAIL] Failed to describe route tables\" >&2".to_string());
            lines.push("    exit 1".to_string());
            lines.push("fi".to_string());
            lines.push("route_table_args=\"\"".to_string());
            lines.push(
                "if [ -n \"${route_tables}\" ] && [ \"${route_tables}\" != \"None\" ]; then"
                    .to_string(),
            );
            lines.push("    route_table_args=\" --route-table-ids ${route_tables}\"".to_string());
            lines.push("fi".to_string());
            // Unquoted on purpose: the IDs must word-split into separate arguments
            "${route_table_args}".to_string()
        }
    };

    lines.push(format!(
        "if ! output=$(aws ec2 create-vpc-endpoint {}{} --tag-specifications \"{}\" --query '[Error.Code,VpcEndpoint.VpcEndpointId,VpcEndpoint.State]' --output text 2>&1); then",
        base_args(spec, service),
        placement,
        tag_specification(spec, service)
    ));
    lines.push("    echo \"[FAIL] Failed to create endpoint\" >&2".to_string());
    lines.push("    echo \"${output}\" >&2".to_string());
    lines.push("    exit 1".to_string());
    lines.push("fi".to_string());
    lines.extend(CHECK_OUTPUT.lines().map(str::to_string));
    lines
}
