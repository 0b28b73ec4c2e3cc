//! vpce - Command-line client for the VPC Endpoint Generator API

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tabled::{Table, Tabled};
use vpce_core::application::EndpointRequest;
use vpce_core::domain::ScriptDialect;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Parser)]
#[command(name = "vpce")]
#[command(about = "AWS VPC Endpoint Generator CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API server URL
    #[arg(long, env = "VPCE_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is up
    Health,

    /// List the regions offered by the server
    Regions,

    /// Write AWS credentials into the server's AWS CLI profile
    Configure {
        #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
        access_key: String,

        #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
        secret_key: String,

        #[arg(long, env = "AWS_REGION")]
        region: String,

        /// json, yaml, yaml-stream, text or table
        #[arg(long, default_value = "json")]
        output_format: String,

        #[arg(long, env = "AWS_SESSION_TOKEN", hide_env_values = true)]
        session_token: Option<String>,
    },

    /// Validate endpoint inputs without generating anything
    Validate(EndpointArgs),

    /// Generate an endpoint creation script
    Generate {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Write the script here instead of printing it
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run a script on the server
    Execute {
        /// Script file
        file: PathBuf,

        /// Interpreter (default: from the file extension)
        #[arg(long, value_enum)]
        shell: Option<Shell>,
    },

    /// List the route tables of a VPC
    RouteTables {
        #[arg(long)]
        vpc_id: String,

        /// Defaults to the server's configured region
        #[arg(long)]
        region: Option<String>,
    },
}

#[derive(Args, Debug, Clone)]
struct EndpointArgs {
    /// Interface or Gateway
    #[arg(short = 't', long = "type")]
    endpoint_type: String,

    #[arg(short, long)]
    region: String,

    #[arg(long)]
    vpc_id: String,

    /// Service name, e.g. com.amazonaws.us-east-1.s3 (repeatable)
    #[arg(short, long = "service", required = true)]
    services: Vec<String>,

    /// Subnet ID for Interface endpoints (repeatable)
    #[arg(long = "subnet")]
    subnets: Vec<String>,

    /// Security group ID for Interface endpoints (repeatable)
    #[arg(long = "security-group")]
    security_groups: Vec<String>,

    /// Disable private DNS for Interface endpoints
    #[arg(long)]
    no_private_dns: bool,

    /// Route table ID for Gateway endpoints (repeatable)
    #[arg(long = "route-table")]
    route_tables: Vec<String>,

    /// Attach every route table in the VPC (resolved when the script runs)
    #[arg(long)]
    all_route_tables: bool,

    #[arg(long)]
    tag_prefix: Option<String>,

    #[arg(long)]
    tag_suffix: Option<String>,

    #[arg(long, value_enum)]
    shell: Option<Shell>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Shell {
    Powershell,
    Bash,
}

impl From<Shell> for ScriptDialect {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Powershell => ScriptDialect::PowerShell,
            Shell::Bash => ScriptDialect::Bash,
        }
    }
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

impl EndpointArgs {
    fn to_request(&self) -> EndpointRequest {
        EndpointRequest {
            endpoint_type: self.endpoint_type.clone(),
            region: self.region.clone(),
            vpc_id: self.vpc_id.clone(),
            service_names: non_empty(&self.services),
            service_name: None,
            tag_prefix: self.tag_prefix.clone(),
            tag_suffix: self.tag_suffix.clone(),
            subnets: non_empty(&self.subnets),
            security_groups: non_empty(&self.security_groups),
            private_dns_enabled: Some(!self.no_private_dns),
            route_tables: non_empty(&self.route_tables),
            select_all_route_tables: self.all_route_tables,
            shell: self.shell.map(ScriptDialect::from),
        }
    }
}

/// Non-2xx answer from the API
#[derive(Debug, thiserror::Error)]
#[error("API error ({status}): {}", describe_detail(.detail))]
struct ApiFailure {
    status: u16,
    detail: Value,
}

/// Readable text for a `{"detail": ...}` payload
fn describe_detail(detail: &Value) -> String {
    match detail {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            if let Some(errors) = map
                .get("validation_errors")
                .or_else(|| map.get("errors"))
                .and_then(Value::as_array)
            {
                let lines: Vec<String> = errors
                    .iter()
                    .map(|e| format!("  - {}", e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string())))
                    .collect();
                let heading = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("Validation failed");
                return format!("{}\n{}", heading, lines.join("\n"));
            }
            let message = map.get("message").and_then(Value::as_str);
            let error = map.get("error").and_then(Value::as_str);
            match (map.get("exit_code").and_then(Value::as_i64), message, error) {
                (Some(code), _, Some(error)) => format!("exit code {}: {}", code, error),
                (None, Some(message), Some(error)) => format!("{}: {}", message, error),
                _ => detail.to_string(),
            }
        }
        other => other.to_string(),
    }
}

struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to connect to {}", self.base_url))?;
        Self::read(response).await
    }

    async fn read(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.context("Failed to parse response")?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiFailure {
                status: status.as_u16(),
                detail: body.get("detail").cloned().unwrap_or(body),
            }
            .into())
        }
    }
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "#")]
    index: usize,
    region: String,
}

#[derive(Tabled)]
struct RouteTableRow {
    route_table: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let health = api.get("/health", &[]).await?;
            let info = api.get("/", &[]).await?;

            println!("{}", "Server Status".cyan().bold());
            println!();
            println!("  {} {}", "API URL:".bold(), cli.api_url);
            println!(
                "  {} {}",
                "Status:".bold(),
                health["status"].as_str().unwrap_or("unknown").green()
            );
            println!("  {} {}", "Version:".bold(), info["version"].as_str().unwrap_or("?"));
        }

        Commands::Regions => {
            let result = api.get("/api/regions", &[]).await?;
            let rows: Vec<RegionRow> = result["regions"]
                .as_array()
                .map(|regions| {
                    regions
                        .iter()
                        .filter_map(Value::as_str)
                        .enumerate()
                        .map(|(i, r)| RegionRow {
                            index: i + 1,
                            region: r.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            println!("{}", Table::new(rows));
        }

        Commands::Configure {
            access_key,
            secret_key,
            region,
            output_format,
            session_token,
        } => {
            let body = json!({
                "access_key": access_key,
                "secret_key": secret_key,
                "region": region,
                "output_format": output_format,
                "session_token": session_token,
            });

            let result = api.post("/api/configure", &body).await?;

            println!("{}", "✓ AWS CLI configured successfully".green().bold());
            println!();
            println!("  {} {}", "Profile:".bold(), result["details"]["profile"].as_str().unwrap_or("?"));
            println!("  {} {}", "Region:".bold(), result["details"]["region"].as_str().unwrap_or("?"));
        }

        Commands::Validate(endpoint) => {
            api.post("/api/validate", &endpoint.to_request()).await?;
            println!("{}", "✓ All inputs are valid".green().bold());
        }

        Commands::Generate { endpoint, out } => {
            let result = api.post("/api/generate", &endpoint.to_request()).await?;
            let content = result["ps1_content"].as_str().unwrap_or_default();

            match out {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "{}",
                        format!("✓ Script written to {}", path.display()).green().bold()
                    );
                }
                None => print!("{}", content),
            }

            if let Some(command) = result["command"].as_str() {
                eprintln!();
                eprintln!("{}", "AWS CLI commands:".cyan().bold());
                for cmd in command.split(" && ") {
                    eprintln!("  {}", cmd);
                }
            }
        }

        Commands::Execute { file, shell } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let script_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned());
            let body = json!({
                "ps1_content": content,
                "script_name": script_name,
                "shell": shell.map(ScriptDialect::from),
            });

            match api.post("/api/execute", &body).await {
                Ok(result) => {
                    println!("{}", "✓ Script executed successfully".green().bold());
                    println!();
                    println!("{}", result["output"].as_str().unwrap_or_default());
                    if let Some(stderr) = result["error"].as_str() {
                        eprintln!("{}", stderr.yellow());
                    }
                }
                Err(e) => {
                    if let Some(failure) = e.downcast_ref::<ApiFailure>() {
                        if let Some(output) = failure.detail.get("output").and_then(Value::as_str) {
                            println!("{}", output);
                        }
                    }
                    println!("{}", "✗ Script execution failed".red().bold());
                    return Err(e);
                }
            }
        }

        Commands::RouteTables { vpc_id, region } => {
            let mut query = vec![("vpc_id", vpc_id.as_str())];
            if let Some(region) = region.as_deref() {
                query.push(("region", region));
            }

            let result = api.get("/api/route-tables", &query).await?;
            let rows: Vec<RouteTableRow> = result["route_tables"]
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(Value::as_str)
                        .map(|id| RouteTableRow {
                            route_table: id.to_string(),
                        })
                        .collect()
                })
                .unwrap_or_default();

            println!(
                "{}",
                format!(
                    "Route tables in {} ({})",
                    result["vpc_id"].as_str().unwrap_or(&vpc_id),
                    result["region"].as_str().unwrap_or("?")
                )
                .cyan()
                .bold()
            );
            if rows.is_empty() {
                println!("{}", "No route tables found".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}
