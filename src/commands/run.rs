use std::time::Duration;

use async_trait::async_trait;
use colored::Colorize;

use crate::browser::{Session, SessionConfig};
use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::report;
use crate::runner::{self, ReloadOutcome, ReloadPlan, ReloadTarget};

/// Arguments of the `run` subcommand after clap parsing.
pub struct RunOptions {
    pub url: String,
    pub count: u32,
    pub min_delay: Option<f64>,
    pub max_delay: Option<f64>,
    pub implicit_wait: Option<f64>,
    pub no_progress: bool,
    pub no_summary: bool,
}

/// A reload target that also owns releasable resources. Split out so the
/// open-drive-close sequence can be exercised without a real browser.
#[async_trait]
trait RunSession: ReloadTarget {
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl RunSession for Session {
    async fn close(&mut self) -> Result<()> {
        Session::close(self).await
    }
}

/// Drive the reload loop, then release the session. The close happens on
/// every path, before any run error surfaces to the caller.
async fn drive<S, F>(session: &mut S, plan: &ReloadPlan, on_record: F) -> Result<Vec<ReloadOutcome>>
where
    S: RunSession + Send,
    F: FnMut(&ReloadOutcome) + Send,
{
    let outcome = runner::run(session, plan, on_record).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser session cleanly: {}", e);
    }

    outcome
}

pub async fn run(cli: &Cli, options: &RunOptions) -> Result<()> {
    let config = Config::load()?;

    let plan = ReloadPlan {
        count: options.count,
        delay_min: options.min_delay.unwrap_or(config.run.min_delay),
        delay_max: options.max_delay.unwrap_or(config.run.max_delay),
    };
    // Fail fast: a bad plan must never open a browser.
    plan.validate()?;

    let headless = cli.headless || config.browser.headless;
    let session_config = SessionConfig {
        url: options.url.clone(),
        headless,
        implicit_wait: Duration::from_secs_f64(
            options
                .implicit_wait
                .unwrap_or(config.browser.implicit_wait_secs),
        ),
        browser_path: cli
            .browser_path
            .clone()
            .or_else(|| config.browser.executable.clone()),
        cdp_port: cli.cdp_port.unwrap_or(config.browser.cdp_port),
    };

    if !cli.json {
        report::print_banner(&options.url, &plan, headless);
    }

    let mut session = Session::open(&session_config).await?;

    if !cli.json {
        println!("{}", "Initial page load successful.".green());
    }

    let bar = (!cli.json && !options.no_progress).then(|| report::reload_bar(plan.count));
    let quiet = cli.json;
    let total = plan.count;

    let outcome = drive(&mut session, &plan, |record| {
        if let Some(pb) = &bar {
            report::tick_bar(pb, record);
        } else if !quiet {
            report::print_record_line(record, total);
        }
    })
    .await;

    if let Some(pb) = bar {
        pb.finish();
    }

    let records = outcome?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        if !options.no_summary {
            report::print_summary(&records);
        }
        println!("{}", "Browser closed. Exiting.".dimmed());
    }

    Ok(())
}
