// Service constants (no magic values in adapters)
use std::time::Duration;

/// Default timeout for one script run (60s)
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for a single `aws` invocation made by the service itself (30s)
pub const DEFAULT_AWS_CLI_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period between SIGTERM and SIGKILL for a timed-out script (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: i64 = 5000;

/// AWS CLI profile written by `configure` unless overridden
pub const DEFAULT_AWS_PROFILE: &str = "default";

/// Region used when a request does not name one
pub const DEFAULT_AWS_REGION: &str = "ap-southeast-1";

/// Script name assumed by `execute` when the client sends none
pub const DEFAULT_SCRIPT_NAME: &str = "vpc-endpoint-script.ps1";
