use domain::alias::error::AliasError;
use tokio::process::Command;
use tracing::debug;

/// Run an external program and return its stdout.
///
/// A spawn failure or a non-zero exit status is reported as a fetch error
/// against `program`.
pub async fn run(program: &str, args: &[&str]) -> Result<String, AliasError> {
    debug!(program, ?args, "running external command");

    let output = Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AliasError::fetch(program, format!("spawn failed: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AliasError::fetch(
            program,
            format!("exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
