//! Browser session lifecycle.
//!
//! A [`Session`] is one spawned browser process plus a CDP connection and a
//! single page. It is opened once, exclusively borrowed by the reload loop,
//! and released exactly once via [`Session::close`] no matter how the run
//! ends. Partial failures inside [`Session::open`] clean up the spawned
//! process before the error is returned.

use std::process::Child;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::page::ReloadParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use super::launcher::BrowserLauncher;
use crate::error::{ReloadrError, Result};
use crate::runner::ReloadTarget;

/// Immutable inputs for one browser session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target URL for the initial navigation
    pub url: String,
    /// Run in headless mode
    pub headless: bool,
    /// Bound on how long a navigation may take to settle
    pub implicit_wait: Duration,
    /// Browser executable path (overrides auto-discovery)
    pub browser_path: Option<String>,
    /// CDP debugging port
    pub cdp_port: u16,
}

/// One live automated-browser connection
pub struct Session {
    browser: Option<Browser>,
    page: Option<Page>,
    child: Option<Child>,
    // Held so the throwaway profile directory outlives the browser process.
    _user_data_dir: TempDir,
    alive: Arc<AtomicBool>,
    implicit_wait: Duration,
}

impl Session {
    /// Launch a browser, connect over CDP, and navigate to the configured URL.
    pub async fn open(config: &SessionConfig) -> Result<Self> {
        let launcher =
            BrowserLauncher::new(config.browser_path.as_deref(), config.cdp_port, config.headless)?;

        info!(
            "Launching {} (headless: {})",
            launcher.browser_info().browser_type.name(),
            config.headless
        );

        let mut child = launcher.launch()?;

        match Self::attach(config, &launcher).await {
            Ok((browser, page, alive)) => Ok(Self {
                browser: Some(browser),
                page: Some(page),
                child: Some(child),
                _user_data_dir: launcher.into_user_data_dir(),
                alive,
                implicit_wait: config.implicit_wait,
            }),
            Err(e) => {
                // The handle never became usable; don't leave the process behind.
                let _ = child.kill();
                let _ = child.wait();
                Err(e)
            }
        }
    }

    async fn attach(
        config: &SessionConfig,
        launcher: &BrowserLauncher,
    ) -> Result<(Browser, Page, Arc<AtomicBool>)> {
        let cdp_url = launcher.wait_for_cdp().await?;

        let (browser, mut handler) = Browser::connect(&cdp_url).await.map_err(|e| {
            ReloadrError::CdpConnectionFailed(format!("Failed to connect to browser: {}", e))
        })?;

        // Drain CDP events in the background. When the handler ends the
        // browser has disconnected or crashed.
        let alive = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive.clone();
        tokio::spawn(async move {
            while handler.next().await.is_some() {}
            warn!("Browser disconnected (event handler ended)");
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        // The browser opens with one blank tab; reuse it
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| ReloadrError::CdpConnectionFailed(e.to_string()))?;

            if pages.is_empty() {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| ReloadrError::CdpConnectionFailed(e.to_string()))?
            } else {
                pages.remove(0)
            }
        };

        debug!("Navigating to: {}", config.url);
        page.goto(config.url.as_str())
            .await
            .map_err(|e| ReloadrError::NavigationFailed(e.to_string()))?;
        Self::settle(&page, config.implicit_wait)
            .await
            .map_err(|e| match e {
                ReloadrError::Timeout(_) => e,
                other => ReloadrError::NavigationFailed(other.to_string()),
            })?;

        Ok((browser, page, alive))
    }

    /// Wait for the page's in-flight navigation, bounded by the implicit wait.
    async fn settle(page: &Page, implicit_wait: Duration) -> Result<()> {
        match tokio::time::timeout(implicit_wait, page.wait_for_navigation()).await {
            Err(_) => Err(ReloadrError::Timeout(format!(
                "navigation did not settle within {:.1}s",
                implicit_wait.as_secs_f64()
            ))),
            Ok(Err(e)) => Err(ReloadrError::NavigationFailed(e.to_string())),
            Ok(Ok(_)) => Ok(()),
        }
    }

    /// Reload the current page and wait for it to settle.
    pub async fn refresh(&mut self) -> Result<()> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| ReloadrError::SessionLost("no active page".to_string()))?;

        page.execute(ReloadParams::default())
            .await
            .map_err(|e| ReloadrError::RefreshFailed(e.to_string()))?;

        Self::settle(page, self.implicit_wait)
            .await
            .map_err(|e| ReloadrError::RefreshFailed(e.to_string()))
    }

    /// Release the page, the CDP connection, and the browser process.
    /// Safe to call on every exit path; repeated calls are no-ops.
    pub async fn close(&mut self) -> Result<()> {
        // Mark as not alive first to prevent new operations
        self.alive.store(false, Ordering::Relaxed);

        if let Some(page) = self.page.take() {
            let _ = page.close().await;
        }

        if let Some(mut browser) = self.browser.take() {
            // Graceful close first (sends Browser.close over CDP)
            let _ = browser.close().await;
        }

        if let Some(child) = self.child.take() {
            reap_child(child, Duration::from_millis(500)).await;
        }

        info!("Browser session closed");
        Ok(())
    }
}

/// Wait up to `grace` for the child to exit on its own (it usually does,
/// right after the graceful CDP close), then force-kill it. Returns whether
/// the process exited without being killed.
async fn reap_child(mut child: Child, grace: Duration) -> bool {
    let deadline = std::time::Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if std::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return false;
            }
        }
    }
}

#[async_trait]
impl ReloadTarget for Session {
    async fn refresh(&mut self) -> Result<()> {
        Session::refresh(self).await
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Relaxed) && self.page.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[cfg(unix)]
    #[tokio::test]
    async fn reap_waits_for_a_child_that_exits_on_its_own() {
        let child = Command::new("true").spawn().unwrap();
        let exited = reap_child(child, Duration::from_secs(2)).await;
        assert!(exited);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn reap_kills_a_child_that_outlives_the_grace_period() {
        let child = Command::new("sleep").arg("30").spawn().unwrap();

        let start = std::time::Instant::now();
        let exited = reap_child(child, Duration::from_millis(200)).await;

        assert!(!exited);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
