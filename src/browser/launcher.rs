use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use super::discovery::{discover_browser, BrowserInfo, BrowserType};
use crate::error::{ReloadrError, Result};

/// Launches a browser with CDP enabled against a throwaway profile directory.
pub struct BrowserLauncher {
    browser_info: BrowserInfo,
    cdp_port: u16,
    headless: bool,
    user_data_dir: TempDir,
}

impl BrowserLauncher {
    /// Create a launcher, discovering a browser unless an explicit path is given.
    pub fn new(browser_path: Option<&str>, cdp_port: u16, headless: bool) -> Result<Self> {
        let browser_info = match browser_path {
            Some(path) => {
                let path = PathBuf::from(path);
                if !path.exists() {
                    return Err(ReloadrError::BrowserLaunchFailed(format!(
                        "Browser not found at: {}",
                        path.display()
                    )));
                }
                // Assume Chrome-compatible
                BrowserInfo::new(BrowserType::Chrome, path)
            }
            None => discover_browser()?,
        };

        // Each run gets a fresh profile; the directory is removed on drop.
        let user_data_dir = tempfile::Builder::new().prefix("reloadr-").tempdir()?;

        Ok(Self {
            browser_info,
            cdp_port,
            headless,
            user_data_dir,
        })
    }

    pub fn browser_info(&self) -> &BrowserInfo {
        &self.browser_info
    }

    /// Hand the profile directory to the caller so it outlives the launcher.
    pub fn into_user_data_dir(self) -> TempDir {
        self.user_data_dir
    }

    /// Build the browser launch arguments
    fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.cdp_port),
            format!("--user-data-dir={}", self.user_data_dir.path().display()),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
            "--disable-infobars".to_string(),
            "--disable-session-crashed-bubble".to_string(),
            "--no-sandbox".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--log-level=3".to_string(),
        ];

        if self.headless {
            args.push("--headless=new".to_string());
            args.push("--disable-gpu".to_string());
        }

        args
    }

    /// Launch the browser and return the process handle
    pub fn launch(&self) -> Result<Child> {
        let args = self.build_args();

        tracing::debug!(
            "Launching browser: {:?} with args: {:?}",
            self.browser_info.path,
            args
        );

        let child = Command::new(&self.browser_info.path)
            .args(&args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ReloadrError::BrowserLaunchFailed(format!(
                    "Failed to launch {}: {}",
                    self.browser_info.browser_type.name(),
                    e
                ))
            })?;

        Ok(child)
    }

    /// Wait for the CDP endpoint to be ready and return its WebSocket URL
    pub async fn wait_for_cdp(&self) -> Result<String> {
        let url = format!("http://127.0.0.1:{}/json/version", self.cdp_port);

        // Build client with NO_PROXY for localhost
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        // Try for up to 10 seconds
        for i in 0..20 {
            sleep(Duration::from_millis(500)).await;

            match client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    let json: serde_json::Value = response.json().await.map_err(|e| {
                        ReloadrError::CdpConnectionFailed(format!(
                            "Failed to parse CDP response: {}",
                            e
                        ))
                    })?;

                    if let Some(ws_url) = json.get("webSocketDebuggerUrl").and_then(|v| v.as_str())
                    {
                        tracing::debug!("CDP ready at: {}", ws_url);
                        return Ok(ws_url.to_string());
                    }
                }
                Ok(_) => {
                    tracing::debug!("CDP not ready yet (attempt {})", i + 1);
                }
                Err(e) => {
                    tracing::debug!("CDP connection attempt {} failed: {}", i + 1, e);
                }
            }
        }

        Err(ReloadrError::CdpConnectionFailed(
            "Timeout waiting for CDP to be ready".to_string(),
        ))
    }
}
