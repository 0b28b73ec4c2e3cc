// Subprocess executor implementation
// reason: async-trait, tokio for async process management
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use vpce_core::application::constants::DEFAULT_SCRIPT_TIMEOUT;
use vpce_core::domain::ScriptDialect;
use vpce_core::port::script_executor::{
    ExecutionError, ExecutionResult, ExecutionStatus, ScriptExecutor, ScriptRun,
};
use vpce_core::port::{IdProvider, TimeProvider};

/// Variables passed through to scripts; a trailing `*` matches by prefix
pub const DEFAULT_ENV_ALLOWLIST: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LANG",
    "TMPDIR",
    "TEMP",
    "TMP",
    "SYSTEMROOT",
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "PSModulePath",
    "AWS_*",
];

/// Interpreter binaries per dialect
#[derive(Debug, Clone)]
pub struct InterpreterPaths {
    pub powershell: String,
    pub bash: String,
}

impl Default for InterpreterPaths {
    fn default() -> Self {
        Self {
            powershell: if cfg!(windows) {
                "powershell.exe".to_string()
            } else {
                "pwsh".to_string()
            },
            bash: "bash".to_string(),
        }
    }
}

/// Subprocess executor
/// Writes each script to a scratch file and runs it with an allow-listed environment
pub struct SubprocessExecutor {
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    env_allowlist: Vec<String>,
    scratch_dir: PathBuf,
    interpreters: InterpreterPaths,
    timeout: Duration,
}

impl SubprocessExecutor {
    /// Create a new subprocess executor
    ///
    /// # Arguments
    /// * `time_provider` - Time provider for duration tracking
    /// * `id_provider` - Unique prefixes for scratch file names
    /// * `env_allowlist` - Allowed environment variables (`AWS_*` style prefixes allowed)
    ///
    /// # Example
    /// ```ignore
    /// let executor = SubprocessExecutor::new(
    ///     Arc::new(SystemTimeProvider),
    ///     Arc::new(UuidProvider),
    ///     vec!["PATH".to_string(), "HOME".to_string(), "AWS_*".to_string()],
    /// );
    /// ```
    pub fn new(
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        env_allowlist: Vec<String>,
    ) -> Self {
        Self {
            time_provider,
            id_provider,
            env_allowlist,
            scratch_dir: std::env::temp_dir(),
            interpreters: InterpreterPaths::default(),
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_interpreters(mut self, interpreters: InterpreterPaths) -> Self {
        self.interpreters = interpreters;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn is_allowed(&self, key: &str) -> bool {
        self.env_allowlist.iter().any(|allowed| match allowed.strip_suffix('*') {
            Some(prefix) => key.starts_with(prefix),
            None => allowed == key,
        })
    }

    /// Filter environment variables to allowlist only
    fn filter_env<I>(&self, env: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        env.into_iter().filter(|(k, _)| self.is_allowed(k)).collect()
    }

    /// Scratch path for a run: `<scratch_dir>/<unique id>-<file name>`.
    /// Only the final component of the requested name is used.
    fn script_path(&self, run: &ScriptRun) -> PathBuf {
        let file_name = Path::new(&run.script_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| {
                n.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            })
            .map(str::to_string)
            .unwrap_or_else(|| run.dialect.default_script_name());

        self.scratch_dir
            .join(format!("{}-{}", self.id_provider.generate_id(), file_name))
    }

    /// Interpreter program and arguments for a script file
    fn command_for(&self, dialect: ScriptDialect, path: &Path) -> (String, Vec<String>) {
        let path = path.to_string_lossy().into_owned();
        match dialect {
            ScriptDialect::PowerShell => (
                self.interpreters.powershell.clone(),
                vec![
                    "-NoProfile".to_string(),
                    "-NonInteractive".to_string(),
                    "-ExecutionPolicy".to_string(),
                    "Bypass".to_string(),
                    "-File".to_string(),
                    path,
                ],
            ),
            ScriptDialect::Bash => (self.interpreters.bash.clone(), vec![path]),
        }
    }

    /// Spawn child process and wait for output.
    /// One deadline covers both the interpreter's exit and draining its pipes.
    async fn spawn_and_wait(
        &self,
        program: &str,
        args: &[String],
    ) -> Result<std::process::Output, ExecutionError> {
        let filtered_env = self.filter_env(std::env::vars());

        let mut command = Command::new(program);
        command
            .args(args)
            .env_clear()
            .envs(&filtered_env)
            .current_dir(&self.scratch_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so background children can be signalled with the script
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(format!("{}: {}", program, e)))?;
        let pid = child.id();
        let mut group = ProcessGroupGuard::new(pid);

        // Drain both pipes concurrently so a chatty script cannot block on a full pipe
        let mut stdout_task = tokio::spawn(read_to_end(child.stdout.take()));
        let mut stderr_task = tokio::spawn(read_to_end(child.stderr.take()));
        let timeout_ms = self.timeout.as_millis() as i64;

        let collected = timeout(self.timeout, async {
            let status = child
                .wait()
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            let stdout = (&mut stdout_task)
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            let stderr = (&mut stderr_task)
                .await
                .map_err(|e| ExecutionError::IoError(e.to_string()))?;
            Ok::<_, ExecutionError>(std::process::Output {
                status,
                stdout,
                stderr,
            })
        })
        .await;

        match collected {
            Ok(output) => {
                group.disarm();
                output
            }
            Err(_) => {
                warn!(program = %program, timeout_ms, "Script timed out, terminating");
                if let Err(e) = self.kill_graceful(&mut child, pid).await {
                    warn!(error = %e, "Failed to terminate timed-out script");
                }
                group.disarm();
                stdout_task.abort();
                stderr_task.abort();
                Err(ExecutionError::Timeout(timeout_ms))
            }
        }
    }

    /// Build execution result from process output
    fn build_result(&self, output: std::process::Output, duration_ms: i64) -> ExecutionResult {
        let status = if output.status.success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Failed
        };

        ExecutionResult {
            status,
            exit_code: exit_code(&output.status),
            duration_ms,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Write, run and always remove the scratch file
    async fn execute_internal(&self, run: &ScriptRun) -> Result<ExecutionResult, ExecutionError> {
        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| ExecutionError::IoError(e.to_string()))?;

        let scratch = ScratchFile(self.script_path(run));
        let path = scratch.0.as_path();
        tokio::fs::write(path, &run.content)
            .await
            .map_err(|e| ExecutionError::IoError(format!("{}: {}", path.display(), e)))?;

        let (program, args) = self.command_for(run.dialect, path);
        let start_time = self.time_provider.now_millis();

        info!(
            program = %program,
            script = %path.display(),
            dialect = %run.dialect,
            timeout_ms = self.timeout.as_millis() as u64,
            "Starting script execution"
        );

        let output = self.spawn_and_wait(&program, &args).await;
        drop(scratch);

        let duration_ms = self.time_provider.now_millis() - start_time;
        let result = self.build_result(output?, duration_ms);

        info!(
            program = %program,
            duration_ms = %duration_ms,
            exit_code = result.exit_code,
            status = ?result.status,
            "Script execution completed"
        );

        Ok(result)
    }

    /// SIGTERM the script's process group, then SIGKILL if it is still around
    async fn kill_graceful(
        &self,
        child: &mut Child,
        pid: Option<u32>,
    ) -> Result<(), ExecutionError> {
        const GRACEFUL_TIMEOUT_MS: i64 =
            vpce_core::application::constants::GRACEFUL_SHUTDOWN_TIMEOUT_MS;

        let Some(pid) = pid else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            let pgid = Pid::from_raw(pid as i32);

            // Step 1: Send SIGTERM to the whole group
            info!(pgid = %pid, "Sending SIGTERM for graceful shutdown");
            match killpg(pgid, Signal::SIGTERM) {
                Ok(()) => {}
                Err(Errno::ESRCH) => {
                    let _ = child.wait().await;
                    return Ok(());
                }
                Err(e) => return Err(ExecutionError::Killed(format!("SIGTERM failed: {}", e))),
            }

            // Step 2: Wait for the group to empty (check every 100ms)
            let start_time = self.time_provider.now_millis();
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;

                // Reap the interpreter so it no longer counts as a group member
                if let Err(e) = child.try_wait() {
                    return Err(ExecutionError::IoError(e.to_string()));
                }
                if killpg(pgid, None) == Err(Errno::ESRCH) {
                    info!(pgid = %pid, "Process group exited gracefully after SIGTERM");
                    return Ok(());
                }

                if self.time_provider.now_millis() - start_time > GRACEFUL_TIMEOUT_MS {
                    warn!(pgid = %pid, "Process group did not exit after SIGTERM, sending SIGKILL");
                    match killpg(pgid, Signal::SIGKILL) {
                        Ok(()) | Err(Errno::ESRCH) => {}
                        Err(e) => {
                            return Err(ExecutionError::Killed(format!("SIGKILL failed: {}", e)))
                        }
                    }
                    let _ = child.wait().await;
                    return Ok(());
                }
            }
        }

        #[cfg(windows)]
        {
            // Windows: taskkill /T /F (whole tree, force)
            info!(pid = %pid, "Killing process tree on Windows");
            let output = Command::new("taskkill")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .output()
                .await
                .map_err(|e| ExecutionError::Killed(e.to_string()))?;

            if !output.status.success() {
                warn!(
                    pid = %pid,
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "taskkill failed, killing interpreter only"
                );
                let _ = GRACEFUL_TIMEOUT_MS;
                return child
                    .kill()
                    .await
                    .map_err(|e| ExecutionError::Killed(e.to_string()));
            }

            let _ = child.wait().await;
            Ok(())
        }
    }
}

/// Scratch script removed when dropped, including when the run is cancelled
struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            debug!(script = %self.0.display(), error = %e, "Could not remove scratch script");
        }
    }
}

/// SIGKILLs the script's process group if the run is dropped before it finishes.
/// `kill_on_drop` only reaches the interpreter itself.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.take() {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            warn!(pgid, "Script run cancelled, killing process group");
            let _ = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL);
        }
    }
}

async fn read_to_end<R: AsyncRead + Unpin>(pipe: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Failed to read script output");
        }
    }
    buf
}

/// Exit code, or `-SIGNUM` when the process was killed by a signal
fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    -1
}

#[async_trait]
impl ScriptExecutor for SubprocessExecutor {
    async fn run(&self, script: &ScriptRun) -> Result<ExecutionResult, ExecutionError> {
        self.execute_internal(script).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpce_core::port::id_provider::SequentialIdProvider;
    use vpce_core::port::time_provider::SystemTimeProvider;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("vpce-exec-{}-{}", std::process::id(), name))
    }

    fn executor(name: &str) -> SubprocessExecutor {
        SubprocessExecutor::new(
            Arc::new(SystemTimeProvider),
            Arc::new(SequentialIdProvider::new()),
            vec!["PATH".to_string(), "HOME".to_string()],
        )
        .with_scratch_dir(scratch(name))
    }

    fn bash(content: &str) -> ScriptRun {
        ScriptRun {
            content: content.to_string(),
            script_name: "test.sh".to_string(),
            dialect: ScriptDialect::Bash,
        }
    }

    #[tokio::test]
    async fn test_execute_success() {
        let result = executor("success").run(&bash("echo hello")).await.unwrap();

        assert_eq!(result.status, ExecutionStatus::Success);
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_execute_non_zero_exit() {
        let result = executor("fail")
            .run(&bash("echo partial\necho oops >&2\nexit 3"))
            .await
            .unwrap();

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.exit_code, 3);
        assert_eq!(result.stdout.trim(), "partial");
        assert_eq!(result.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_execute_timeout() {
        let executor = executor("timeout").with_timeout(Duration::from_millis(200));

        let result = executor.run(&bash("sleep 10")).await;

        assert!(matches!(result, Err(ExecutionError::Timeout(200))));
    }

    #[tokio::test]
    async fn test_timeout_covers_background_children() {
        let executor = executor("background").with_timeout(Duration::from_secs(1));

        let started = std::time::Instant::now();
        let result = executor.run(&bash("sleep 30 &\necho started")).await;

        // Interpreter exits at once but the sleeper holds stdout open
        assert!(matches!(result, Err(ExecutionError::Timeout(1000))));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cancelled_run_removes_scratch_file() {
        let dir = scratch("cancel");
        let executor = executor("cancel");

        let cancelled =
            tokio::time::timeout(Duration::from_millis(300), executor.run(&bash("sleep 3"))).await;
        assert!(cancelled.is_err());

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let executor = executor("spawn").with_interpreters(InterpreterPaths {
            powershell: "/nonexistent/pwsh".to_string(),
            bash: "/nonexistent/bash".to_string(),
        });

        let result = executor.run(&bash("echo never")).await;

        assert!(matches!(result, Err(ExecutionError::SpawnFailed(_))));
    }

    #[tokio::test]
    async fn test_scratch_file_removed_after_run() {
        let dir = scratch("cleanup");
        let executor = executor("cleanup");

        executor.run(&bash("exit 1")).await.unwrap();

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_child_environment_is_filtered() {
        std::env::set_var("VPCE_TEST_SECRET_MARKER", "leaked");
        let result = executor("env")
            .run(&bash("echo \"marker=${VPCE_TEST_SECRET_MARKER:-absent}\""))
            .await
            .unwrap();

        assert!(result.stdout.contains("marker=absent"));
    }

    #[test]
    fn test_env_filtering() {
        let executor = SubprocessExecutor::new(
            Arc::new(SystemTimeProvider),
            Arc::new(SequentialIdProvider::new()),
            vec!["ALLOWED_VAR".to_string(), "AWS_*".to_string()],
        );

        let env = vec![
            ("ALLOWED_VAR".to_string(), "value1".to_string()),
            ("BLOCKED_VAR".to_string(), "value2".to_string()),
            ("AWS_PROFILE".to_string(), "dev".to_string()),
            ("XAWS_PROFILE".to_string(), "no".to_string()),
        ];

        let filtered = executor.filter_env(env);

        assert_eq!(filtered.len(), 2);
        assert!(filtered.contains_key("ALLOWED_VAR"));
        assert!(filtered.contains_key("AWS_PROFILE"));
        assert!(!filtered.contains_key("BLOCKED_VAR"));
    }

    #[test]
    fn test_script_path_keeps_only_file_name() {
        let executor = executor("paths");

        let mut run = bash("true");
        run.script_name = "../../etc/cron.d/evil.sh".to_string();
        let path = executor.script_path(&run);
        assert_eq!(path, scratch("paths").join("run-1-evil.sh"));

        run.script_name = "bad name;.sh".to_string();
        let path = executor.script_path(&run);
        assert_eq!(path, scratch("paths").join("run-2-vpc-endpoint-script.sh"));
    }

    #[test]
    fn test_powershell_command_line() {
        let executor = executor("pwsh");
        let (program, args) =
            executor.command_for(ScriptDialect::PowerShell, Path::new("/tmp/x.ps1"));

        assert_eq!(program, InterpreterPaths::default().powershell);
        assert_eq!(
            args,
            vec!["-NoProfile", "-NonInteractive", "-ExecutionPolicy", "Bypass", "-File", "/tmp/x.ps1"]
        );
    }
}
