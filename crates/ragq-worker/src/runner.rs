use crate::error::WorkerError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Injectable job body (design notes §9): production wires [`SubprocessRunner`],
/// which shells out to the reindex binary; tests substitute an in-process
/// fake so none of the worker-loop scenarios need a real subprocess.
#[async_trait]
pub trait JobRunner: Send + Sync {
    async fn run(&self, payload: Option<serde_json::Value>) -> Result<serde_json::Value, WorkerError>;
}

/// Shells out to the reindex runner binary, passing the job payload (if any)
/// on `--payload-json` and parsing its metrics JSON off the last stdout line.
/// The only place that knows the runner's binary path and working directory.
pub struct SubprocessRunner {
    pub binary_path: String,
    pub working_dir: Option<PathBuf>,
}

#[async_trait]
impl JobRunner for SubprocessRunner {
    async fn run(&self, payload: Option<serde_json::Value>) -> Result<serde_json::Value, WorkerError> {
        let mut command = Command::new(&self.binary_path);
        if let Some(payload) = &payload {
            command.arg("--payload-json").arg(payload.to_string());
        }
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        parse_subprocess_output(output.status.success(), &output.stdout, &output.stderr)
    }
}

fn parse_subprocess_output(
    success: bool,
    stdout: &[u8],
    stderr: &[u8],
) -> Result<serde_json::Value, WorkerError> {
    let stdout_text = String::from_utf8_lossy(stdout);
    let last_line = stdout_text.lines().rev().find(|line| !line.trim().is_empty());

    if !success {
        let stderr_text = String::from_utf8_lossy(stderr).trim().to_string();
        return Err(WorkerError::SubprocessFailed { stderr: stderr_text });
    }

    let Some(last_line) = last_line else {
        return Err(WorkerError::NoOutput);
    };

    let parsed: serde_json::Value = serde_json::from_str(last_line)
        .map_err(|_| WorkerError::NonJsonOutput { line: last_line.to_string() })?;

    if !parsed.is_object() {
        return Err(WorkerError::NonJsonOutput { line: last_line.to_string() });
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_metrics_from_last_stdout_line() {
        let stdout = b"ignored preamble\n{\"chunks\": 12, \"duration_ms\": 30}\n";
        let result = parse_subprocess_output(true, stdout, b"").unwrap();
        assert_eq!(result["chunks"], 12);
    }

    #[test]
    fn no_output_is_a_distinct_failure() {
        let result = parse_subprocess_output(true, b"", b"");
        assert!(matches!(result, Err(WorkerError::NoOutput)));
    }

    #[test]
    fn non_json_last_line_is_a_distinct_failure() {
        let result = parse_subprocess_output(true, b"not json at all", b"");
        assert!(matches!(result, Err(WorkerError::NonJsonOutput { .. })));
    }

    #[test]
    fn nonzero_exit_surfaces_captured_stderr() {
        let result = parse_subprocess_output(false, b"", b"boom");
        match result {
            Err(WorkerError::SubprocessFailed { stderr }) => assert_eq!(stderr, "boom"),
            other => panic!("expected SubprocessFailed, got {other:?}"),
        }
    }
}
