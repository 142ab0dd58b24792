// Helper functions shared by the provider and the orchestrator

use std::process::Stdio;

use lazy_static::lazy_static;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration as TokioDuration};

use super::errors::ProviderError;

/// Share-tracking parameter appended by the mobile share sheet
const SHARE_PARAM: &str = "&si=";

lazy_static! {
    static ref HOST_RE: Regex =
        Regex::new(r"^(?i)[a-z][a-z0-9+.\-]*://(?:[^@/?#]*@)?([^:/?#]+)").unwrap();
}

/// Drop the share-tracking parameter and everything after it
pub fn strip_share_param(url: &str) -> &str {
    match url.find(SHARE_PARAM) {
        Some(idx) => &url[..idx],
        None => url,
    }
}

/// Lowercased host of an absolute URL
pub fn host_of(url: &str) -> Option<String> {
    HOST_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// True when the URL's host equals one of `hosts` or is a subdomain of one
pub fn matches_source_host(url: &str, hosts: &[String]) -> bool {
    let Some(host) = host_of(url) else {
        return false;
    };
    hosts.iter().any(|allowed| {
        let allowed = allowed.trim_start_matches('.').to_lowercase();
        host == allowed || host.ends_with(&format!(".{allowed}"))
    })
}

/// Run command with timeout, capturing stdout and stderr
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, ProviderError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProviderError::ToolNotFound(program.to_string()),
            _ => ProviderError::Execution(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        ProviderError::Execution(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        ProviderError::Execution(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let waited = timeout(TokioDuration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                ProviderError::Execution(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = collect_pipe(stdout_task, "stdout").await?;
            let stderr = collect_pipe(stderr_task, "stderr").await?;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ProviderError::Timeout(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

async fn collect_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    name: &str,
) -> Result<Vec<u8>, ProviderError> {
    task.await
        .map_err(|e| ProviderError::Execution(format!("{} task failed: {}", name, e)))?
        .map_err(|e| ProviderError::Execution(format!("Failed to read {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn share_param_is_stripped() {
        assert_eq!(
            strip_share_param("https://www.youtube.com/watch?v=abc&si=XYZ&t=3"),
            "https://www.youtube.com/watch?v=abc"
        );
        assert_eq!(
            strip_share_param("https://youtu.be/abc?si=XYZ"),
            "https://youtu.be/abc?si=XYZ"
        );
    }

    #[test]
    fn hosts_match_exactly_or_as_subdomain() {
        let hosts = vec!["youtube.com".to_string(), "youtu.be".to_string()];
        assert!(matches_source_host("https://www.youtube.com/watch?v=a", &hosts));
        assert!(matches_source_host("https://music.youtube.com/watch?v=a", &hosts));
        assert!(matches_source_host("HTTPS://YOUTU.BE/a", &hosts));
        assert!(!matches_source_host("https://notyoutube.com/watch?v=a", &hosts));
        assert!(!matches_source_host("https://vimeo.com/1", &hosts));
        assert!(!matches_source_host("youtube.com/watch?v=a", &hosts));
    }

    #[test]
    fn host_ignores_credentials_and_port() {
        assert_eq!(
            host_of("https://user:pw@Example.test:8080/x").as_deref(),
            Some("example.test")
        );
    }

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let err = run_output_with_timeout("curator-no-such-binary", Vec::new(), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ToolNotFound(_)));
    }
}
