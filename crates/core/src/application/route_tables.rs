// Route Tables Use Case - list the route tables of a VPC

use crate::domain::ids;
use crate::error::{AppError, Result};
use crate::port::{AwsCli, AwsCliError};
use tracing::info;

/// Route tables found in one VPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTables {
    pub vpc_id: String,
    pub region: String,
    pub route_table_ids: Vec<String>,
}

pub async fn execute(
    aws_cli: &dyn AwsCli,
    profile: &str,
    vpc_id: &str,
    region: &str,
) -> Result<RouteTables> {
    let mut errors = Vec::new();
    if !ids::is_vpc_id(vpc_id) {
        errors.push(format!("Invalid VPC ID format: {}", vpc_id));
    }
    if !ids::is_region(region) {
        errors.push(format!("Invalid region format: {}", region));
    }
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let route_table_ids = aws_cli.describe_route_tables(vpc_id, region, profile).await?;

    info!(vpc_id = %vpc_id, region = %region, count = route_table_ids.len(), "Described route tables");

    Ok(RouteTables {
        vpc_id: vpc_id.to_string(),
        region: region.to_string(),
        route_table_ids,
    })
}

/// Human-readable explanation of an AWS CLI failure, with a hint for the usual causes
pub fn explain_aws_failure(err: &AwsCliError) -> String {
    let msg = err.to_string();
    if msg.contains("RequestExpired") || msg.contains("InvalidUserID.NotFound") {
        format!(
            "AWS credential error: {}. Please reconfigure your AWS credentials - your session may have expired.",
            msg
        )
    } else if msg.contains("UnauthorizedOperation") || msg.contains("UnauthorizedAccount") {
        format!(
            "AWS authorization failed: {}. Please check your AWS permissions and credentials.",
            msg
        )
    } else {
        format!("Failed to query route tables: {}", msg)
    }
}
