//! Post scheduling.

use crate::config::DistributionConfig;
use crate::error::{Error, Result};
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One scheduled post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPost {
    pub platform: String,
    pub scheduled_time: DateTime<Utc>,
    /// Index into the platform's content list.
    pub content_index: usize,
}

/// Spaces posts evenly with bounded random jitter.
///
/// Slot `i` lands at `start + spacing * (i + 1) + jitter` with
/// `0 <= jitter < max_jitter < spacing`, so slot times strictly increase.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    spacing: TimeDelta,
    max_jitter_secs: i64,
}

impl Scheduler {
    pub fn new(spacing: Duration, max_jitter: Duration) -> Result<Self> {
        let spacing = TimeDelta::from_std(spacing)
            .map_err(|_| Error::config("post spacing is out of range"))?;
        let max_jitter_secs = i64::try_from(max_jitter.as_secs())
            .map_err(|_| Error::config("post jitter is out of range"))?;
        if spacing <= TimeDelta::zero() {
            return Err(Error::config("post spacing must be positive"));
        }
        if max_jitter_secs >= spacing.num_seconds() {
            return Err(Error::config("post jitter must be below the post spacing"));
        }
        Ok(Self {
            spacing,
            max_jitter_secs,
        })
    }

    pub fn from_config(config: &DistributionConfig) -> Result<Self> {
        let spacing_secs = config
            .post_spacing_mins
            .checked_mul(60)
            .ok_or_else(|| Error::config("post spacing is out of range"))?;
        Self::new(
            Duration::from_secs(spacing_secs),
            Duration::from_secs(config.max_jitter_secs),
        )
    }

    /// `count` slots after `start`, cycling through `platforms` in order.
    ///
    /// Fails with `InvalidArgument` when a slot would fall outside the
    /// representable time range.
    pub fn slots<R: Rng + ?Sized>(
        &self,
        start: DateTime<Utc>,
        platforms: &[&str],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<ScheduledPost>> {
        if platforms.is_empty() {
            return Ok(Vec::new());
        }
        (0..count)
            .map(|i| {
                let jitter = if self.max_jitter_secs > 0 {
                    rng.gen_range(0..self.max_jitter_secs)
                } else {
                    0
                };
                let scheduled_time = i
                    .checked_add(1)
                    .and_then(|n| i32::try_from(n).ok())
                    .and_then(|n| self.spacing.checked_mul(n))
                    .and_then(|offset| offset.checked_add(&TimeDelta::seconds(jitter)))
                    .and_then(|offset| start.checked_add_signed(offset))
                    .ok_or_else(|| {
                        Error::invalid_argument(format!(
                            "post {} cannot be scheduled: time out of range",
                            i + 1
                        ))
                    })?;
                Ok(ScheduledPost {
                    platform: platforms[i % platforms.len()].to_string(),
                    scheduled_time,
                    content_index: i / platforms.len(),
                })
            })
            .collect()
    }
}
