// PowerShell dialect

use super::{base_args, header_lines, static_placement_args, tag_specification};
use crate::domain::EndpointSpec;

/// Runs `$command`, prints the raw response and checks it. Closes the `try`.
const RUN_AND_CHECK: &str = r#"    Write-Host "Executing endpoint creation..." -ForegroundColor Yellow
    $output = Invoke-Expression $command 2>&1 | Out-String
    Write-Host "Raw AWS Response:" -ForegroundColor Gray
    Write-Host $output -ForegroundColor Gray
    if ([string]::IsNullOrWhiteSpace($output)) {
        Write-Host "[FAIL] AWS CLI returned no output" -ForegroundColor Red
        exit 1
    }
    $result = $null
    try {
        $result = $output | ConvertFrom-Json
    } catch {
        Write-Host "[FAIL] Failed to parse AWS response as JSON" -ForegroundColor Red
        Write-Host "Error: $($_.Exception.Message)" -ForegroundColor Red
        Write-Host "Raw output:" -ForegroundColor Red
        Write-Host $output -ForegroundColor Red
        exit 1
    }
    if ($null -eq $result) {
        Write-Host "[FAIL] AWS response parsed to null" -ForegroundColor Red
        Write-Host "Raw output:" -ForegroundColor Red
        Write-Host $output -ForegroundColor Red
        exit 1
    }
    if ($result.Error -or $result.Errors) {
        Write-Host "[FAIL] AWS API Error" -ForegroundColor Red
        if ($result.Error) {
            Write-Host "Code: $($result.Error.Code)" -ForegroundColor Red
            Write-Host "Message: $($result.Error.Message)" -ForegroundColor Red
        } elseif ($result.Errors) {
            Write-Host ($result.Errors | ConvertTo-Json) -ForegroundColor Red
        }
        exit 1
    }
    if ($result.VpcEndpoint -and $result.VpcEndpoint.VpcEndpointId) {
        Write-Host "[OK] Endpoint created successfully" -ForegroundColor Green
        Write-Host "ID: $($result.VpcEndpoint.VpcEndpointId)" -ForegroundColor Cyan
        Write-Host "State: $($result.VpcEndpoint.State)" -ForegroundColor Cyan
    } else {
        Write-Host "[FAIL] Unexpected response - VpcEndpoint not found" -ForegroundColor Red
        Write-Host "Response structure:" -ForegroundColor Red
        Write-Host ($result | ConvertTo-Json -Depth 3) -ForegroundColor Red
        exit 1
    }
}
catch {
    Write-Host "[FAIL] Failed to create endpoint" -ForegroundColor Red
    Write-Host $_.Exception.Message -ForegroundColor Red
    Write-Host $_.ScriptStackTrace -ForegroundColor Red
    exit 1
}"#;

pub(super) fn render(spec: &EndpointSpec) -> String {
    let mut lines = header_lines(spec);
    lines.push(String::new());
    lines.push("$ErrorActionPreference = \"Stop\"".to_string());

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
    let mut lines = vec![
        format!(
            "Write-Host \"Creating VPC Endpoint for {}...\" -ForegroundColor Green",
            service
        ),
        "try {".to_string(),
        format!("    $tagSpec = \"{}\"", tag_specification(spec, service)),
    ];

    let placement = match static_placement_args(&spec.placement) {
        Some(args) => args,
        None => {
            // Resolved when the script runs so generation never needs credentials
            lines.push(format!(
                "    $routeTables = aws ec2 describe-route-tables --filters \"Name=vpc-id,Values={}\" --region {} --query \"RouteTables[].RouteTableId\" --output json 2>&1 | ConvertFrom-Json",
                spec.vpc_id, spec.region
            ));
            lines.push(
                "    if ($null -eq $routeTables -or $routeTables.Count -eq 0) {".to_string(),
            );
            lines.push("        $routeTableArg = \"\"".to_string());
            lines.push("    } else {".to_string());
            lines.push(
                "        $routeTableArg = \" --route-table-ids \" + ($routeTables -join \" \")"
                    .to_string(),
            );
            lines.push("    }".to_string());
            "$routeTableArg".to_string()
        }
    };

    lines.push(format!(
        "    $command = \"aws ec2 create-vpc-endpoint {}{} --tag-specifications '$tagSpec' --output json\"",
        base_args(spec, service),
        placement
    ));
    lines.extend(RUN_AND_CHECK.lines().map(str::to_string));
    lines
}
