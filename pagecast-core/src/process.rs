//! External program invocation

use crate::error::ProcessError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::Stdio;

/// Captured output of a finished program
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// Runs external programs.
///
/// Nothing is retried and there is no timeout; a program that never exits
/// blocks the caller.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, capturing stdout and stderr.
    /// A non-zero exit status is an error.
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput, ProcessError>;

    /// Start a program without waiting for it to exit
    async fn launch(&self, program: &str, args: &[OsString]) -> Result<(), ProcessError>;
}

/// Runs programs on the host with `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<ProcessOutput, ProcessError> {
        tracing::debug!("running {} {:?}", program, args);

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ProcessError::Launch {
                program: program.to_string(),
                source,
            })?;

        tracing::debug!("{} stdout: {}", program, String::from_utf8_lossy(&output.stdout));
        tracing::debug!("{} stderr: {}", program, String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ProcessError::Exit {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ProcessOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    async fn launch(&self, program: &str, args: &[OsString]) -> Result<(), ProcessError> {
        tracing::debug!("launching {} {:?}", program, args);

        let child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ProcessError::Launch {
                program: program.to_string(),
                source,
            })?;

        // the viewer outlives the read; its exit status is never collected
        drop(child);
        Ok(())
    }
}

/// Program and leading arguments of the platform's default opener
pub fn default_opener() -> (&'static str, Vec<OsString>) {
    if cfg!(target_os = "windows") {
        ("cmd", vec!["/C".into(), "start".into(), "".into()])
    } else if cfg!(target_os = "macos") {
        ("open", Vec::new())
    } else {
        ("xdg-open", Vec::new())
    }
}

/// Open `target` with `program`, or with the default opener when `program` is
/// `None`
pub async fn open_with(
    runner: &dyn ProcessRunner,
    target: impl Into<OsString>,
    program: Option<&str>,
) -> Result<(), ProcessError> {
    let target = target.into();
    match program {
        Some(program) => runner.launch(program, &[target]).await,
        None => {
            let (opener, mut args) = default_opener();
            args.push(target);
            runner.launch(opener, &args).await
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[tokio::test]
    async fn test_run_captures_output() {
        let output = SystemRunner::new()
            .run("sh", &args(&["-c", "printf out; printf err >&2"]))
            .await
            .unwrap();
        assert_eq!(output.stdout, b"out");
        assert_eq!(output.stderr, b"err");
    }

    #[tokio::test]
    async fn test_run_non_zero_exit() {
        let err = SystemRunner::new()
            .run("sh", &args(&["-c", "echo broken >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            ProcessError::Exit {
                program, stderr, ..
            } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_run_missing_program() {
        let err = SystemRunner::new()
            .run("pagecast-no-such-program", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_launch_does_not_wait() {
        let start = std::time::Instant::now();
        SystemRunner::new()
            .launch("sleep", &args(&["5"]))
            .await
            .unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_launch_missing_program() {
        let err = SystemRunner::new()
            .launch("pagecast-no-such-program", &args(&["x"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Launch { .. }));
    }
}
