//! The reload loop.
//!
//! Pure transformation from a live session handle plus a [`ReloadPlan`] to an
//! ordered sequence of [`ReloadOutcome`] records. Rendering (progress bar,
//! summary table) lives in the command layer and observes records through a
//! callback; nothing here prints.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::{ReloadrError, Result};

/// Anything the reload loop can drive: one refresh per iteration, plus a
/// liveness check so a dead browser aborts the run instead of burning through
/// the remaining iterations.
#[async_trait]
pub trait ReloadTarget {
    /// Perform one page refresh. A failure here is recorded, not fatal.
    async fn refresh(&mut self) -> Result<()>;

    /// Whether the underlying session is still usable.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Immutable parameters governing one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReloadPlan {
    /// Number of reload iterations. Zero is allowed and produces no output.
    pub count: u32,
    /// Lower delay bound in seconds.
    pub delay_min: f64,
    /// Upper delay bound in seconds.
    pub delay_max: f64,
}

/// Upper bound on a delay, in seconds. Keeps sampled delays well inside the
/// range `Duration::from_secs_f64` can represent.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

impl ReloadPlan {
    /// Validate the plan before anything expensive happens. Called by `run`
    /// as well, but the CLI calls it first so a bad plan never opens a
    /// browser session.
    pub fn validate(&self) -> Result<()> {
        if !self.delay_min.is_finite() || !self.delay_max.is_finite() {
            return Err(ReloadrError::InvalidPlan(
                "delay bounds must be finite numbers".to_string(),
            ));
        }
        if self.delay_min < 0.0 || self.delay_max < 0.0 {
            return Err(ReloadrError::InvalidPlan(format!(
                "delay bounds must not be negative (got {}..{})",
                self.delay_min, self.delay_max
            )));
        }
        if self.delay_min > self.delay_max {
            return Err(ReloadrError::InvalidPlan(format!(
                "min delay ({}) must not exceed max delay ({})",
                self.delay_min, self.delay_max
            )));
        }
        if self.delay_max > MAX_DELAY_SECS {
            return Err(ReloadrError::InvalidPlan(format!(
                "delay bounds must not exceed {} seconds (got {}..{})",
                MAX_DELAY_SECS, self.delay_min, self.delay_max
            )));
        }
        Ok(())
    }
}

/// Result of one reload attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadStatus {
    Success,
    Failure { error: String },
}

impl ReloadStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ReloadStatus::Success)
    }

    /// The error message, or `None` for a successful attempt.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ReloadStatus::Success => None,
            ReloadStatus::Failure { error } => Some(error),
        }
    }
}

/// One record per iteration, appended in iteration order.
#[derive(Debug, Clone, Serialize)]
pub struct ReloadOutcome {
    /// Iteration number, 1-based.
    pub seq: u32,
    /// The delay sampled for this iteration, in seconds.
    pub delay_secs: f64,
    #[serde(flatten)]
    pub status: ReloadStatus,
    /// Wall-clock time at which the attempt resolved.
    pub completed_at: DateTime<Local>,
}

/// Drive `plan.count` reload iterations against `target`.
///
/// Each iteration samples an independent uniform delay from
/// `[delay_min, delay_max]`, sleeps, then refreshes. Refresh failures are
/// recorded and the loop continues; a dead target aborts the whole run with
/// `SessionLost`. `on_record` fires once per completed iteration so the
/// caller can render progress.
pub async fn run<T, F>(target: &mut T, plan: &ReloadPlan, mut on_record: F) -> Result<Vec<ReloadOutcome>>
where
    T: ReloadTarget,
    F: FnMut(&ReloadOutcome),
{
    plan.validate()?;

    let mut records = Vec::with_capacity(plan.count as usize);
    // StdRng is Send, unlike thread_rng, so it can live across await points.
    let mut rng = StdRng::from_entropy();

    for seq in 1..=plan.count {
        let delay_secs = rng.gen_range(plan.delay_min..=plan.delay_max);
        tokio::time::sleep(Duration::from_secs_f64(delay_secs)).await;

        if !target.is_alive() {
            return Err(ReloadrError::SessionLost(format!(
                "browser disconnected before reload {}/{}",
                seq, plan.count
            )));
        }

        let status = match target.refresh().await {
            Ok(()) => ReloadStatus::Success,
            Err(e) => {
                tracing::debug!("reload {} failed: {}", seq, e);
                ReloadStatus::Failure {
                    error: e.to_string(),
                }
            }
        };

        let record = ReloadOutcome {
            seq,
            delay_secs,
            status,
            completed_at: Local::now(),
        };
        on_record(&record);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Target whose refresh results are scripted ahead of time. Once the
    /// script is exhausted every further refresh succeeds.
    struct ScriptedTarget {
        script: VecDeque<std::result::Result<(), String>>,
        refresh_calls: u32,
        dies_after: Option<u32>,
    }

    impl ScriptedTarget {
        fn always_ok() -> Self {
            Self {
                script: VecDeque::new(),
                refresh_calls: 0,
                dies_after: None,
            }
        }

        fn scripted(results: Vec<std::result::Result<(), String>>) -> Self {
            Self {
                script: results.into(),
                refresh_calls: 0,
                dies_after: None,
            }
        }
    }

    #[async_trait]
    impl ReloadTarget for ScriptedTarget {
        async fn refresh(&mut self) -> Result<()> {
            self.refresh_calls += 1;
            match self.script.pop_front() {
                Some(Ok(())) | None => Ok(()),
                Some(Err(msg)) => Err(ReloadrError::RefreshFailed(msg)),
            }
        }

        fn is_alive(&self) -> bool {
            match self.dies_after {
                Some(n) => self.refresh_calls < n,
                None => true,
            }
        }
    }

    fn plan(count: u32, delay_min: f64, delay_max: f64) -> ReloadPlan {
        ReloadPlan {
            count,
            delay_min,
            delay_max,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn produces_one_record_per_iteration_in_order() {
        let mut target = ScriptedTarget::always_ok();
        let records = run(&mut target, &plan(10, 0.0, 0.1), |_| {}).await.unwrap();

        assert_eq!(records.len(), 10);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.seq, i as u32 + 1);
        }
        assert_eq!(target.refresh_calls, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn sampled_delays_stay_within_bounds() {
        let mut target = ScriptedTarget::always_ok();
        let records = run(&mut target, &plan(20, 0.5, 1.5), |_| {}).await.unwrap();

        for record in &records {
            assert!(
                (0.5..=1.5).contains(&record.delay_secs),
                "delay {} out of bounds",
                record.delay_secs
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn equal_bounds_degenerate_to_fixed_delay() {
        let mut target = ScriptedTarget::always_ok();
        let records = run(&mut target, &plan(3, 1.0, 1.0), |_| {}).await.unwrap();

        assert_eq!(records.len(), 3);
        for record in &records {
            assert_eq!(record.delay_secs, 1.0);
            assert!(record.status.is_success());
        }
        for pair in records.windows(2) {
            assert!(pair[0].completed_at <= pair[1].completed_at);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_count_yields_empty_sequence_without_refreshing() {
        let mut target = ScriptedTarget::always_ok();
        let records = run(&mut target, &plan(0, 1.0, 2.0), |_| {}).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(target.refresh_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn inverted_bounds_fail_before_any_refresh() {
        let mut target = ScriptedTarget::always_ok();
        let result = run(&mut target, &plan(5, 2.0, 1.0), |_| {}).await;

        assert!(matches!(result, Err(ReloadrError::InvalidPlan(_))));
        assert_eq!(target.refresh_calls, 0);
    }

    #[test]
    fn negative_bounds_are_rejected() {
        let result = plan(1, -0.5, 1.0).validate();
        assert!(matches!(result, Err(ReloadrError::InvalidPlan(msg)) if msg.contains("negative")));
    }

    #[test]
    fn nan_bounds_are_rejected() {
        let result = plan(1, f64::NAN, 1.0).validate();
        assert!(matches!(result, Err(ReloadrError::InvalidPlan(_))));
    }

    #[test]
    fn bounds_beyond_the_delay_ceiling_are_rejected() {
        let result = plan(1, 1e20, 1e20).validate();
        assert!(matches!(result, Err(ReloadrError::InvalidPlan(msg)) if msg.contains("exceed")));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_delay_bounds_fail_instead_of_panicking() {
        // 1e20 seconds is finite, non-negative, and ordered, but cannot be
        // turned into a Duration; it must surface as a plan error.
        let mut target = ScriptedTarget::always_ok();
        let result = run(&mut target, &plan(1, 1e20, 1e20), |_| {}).await;

        assert!(matches!(result, Err(ReloadrError::InvalidPlan(_))));
        assert_eq!(target.refresh_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_is_recorded_and_loop_continues() {
        let mut target =
            ScriptedTarget::scripted(vec![Err("net::ERR_TIMEOUT".to_string()), Ok(())]);
        let records = run(&mut target, &plan(2, 0.5, 1.5), |_| {}).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].seq, 1);
        assert!(!records[0].status.is_success());
        assert!(records[0]
            .status
            .error_message()
            .unwrap()
            .contains("net::ERR_TIMEOUT"));
        assert_eq!(records[1].seq, 2);
        assert!(records[1].status.is_success());
        assert_eq!(records[1].status.error_message(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn dead_target_aborts_the_run() {
        let mut target = ScriptedTarget::always_ok();
        target.dies_after = Some(2);

        let result = run(&mut target, &plan(5, 0.0, 0.1), |_| {}).await;

        assert!(matches!(result, Err(ReloadrError::SessionLost(_))));
        // Two iterations refreshed, the third hit the liveness check.
        assert_eq!(target.refresh_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn observer_sees_every_record_as_it_lands() {
        let mut target = ScriptedTarget::scripted(vec![Ok(()), Err("boom".to_string()), Ok(())]);
        let mut seen = Vec::new();

        let records = run(&mut target, &plan(3, 0.0, 0.0), |r| seen.push(r.seq))
            .await
            .unwrap();

        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn outcome_serializes_with_tagged_status() {
        let record = ReloadOutcome {
            seq: 1,
            delay_secs: 1.25,
            status: ReloadStatus::Failure {
                error: "net::ERR_TIMEOUT".to_string(),
            },
            completed_at: Local::now(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["seq"], 1);
        assert_eq!(json["status"], "failure");
        assert_eq!(json["error"], "net::ERR_TIMEOUT");
    }
}
