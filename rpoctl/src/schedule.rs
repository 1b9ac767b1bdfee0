//! Periodic execution of the step runner.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{Instrument as _, Level, event, span};

/// When to repeat a run.
///
/// Runs are aligned on `from + k * every`; without `every` a run happens
/// once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scheduler {
    /// An RFC3339 timestamp to align runs on (if omitted, the first run is immediate)
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub from: Option<OffsetDateTime>,
    /// How often to run
    #[serde(with = "humantime_serde::option", default)]
    pub every: Option<Duration>,
}

/// The first aligned instant at or after `now`
pub fn next_anchor(
    from: Option<OffsetDateTime>,
    now: OffsetDateTime,
    every: Duration,
) -> OffsetDateTime {
    match from {
        Some(from) if from < now && !every.is_zero() => {
            let periods = ((now - from) / every).ceil() as u32;
            from + every * periods
        }
        Some(from) => from,
        None => now,
    }
}

impl Scheduler {
    /// Execute `f` at every scheduled instant.
    ///
    /// Returns `Ok(())` immediately when no interval is configured, and the
    /// first error returned by `f` otherwise.
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use rpoctl::Scheduler;
    ///
    /// # async fn example() -> Result<(), String> {
    /// let scheduler = Scheduler {
    ///     from: None,
    ///     every: Some(Duration::from_secs(7 * 24 * 3600)),
    /// };
    /// scheduler
    ///     .schedule(async |at| {
    ///         println!("pricing run at {at}");
    ///         Ok::<(), String>(())
    ///     })
    ///     .await
    /// # }
    /// ```
    pub async fn schedule<T, E>(
        &self,
        f: impl AsyncFn(OffsetDateTime) -> Result<T, E>,
    ) -> Result<(), E> {
        let Some(every) = self.every else {
            return Ok(());
        };

        let now = OffsetDateTime::now_utc();
        let mut anchor = next_anchor(self.from, now, every);

        // a negative wait means the anchor is already due
        let wait: Duration = (anchor - now).try_into().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;

            let span = span!(Level::INFO, "scheduled run");
            async {
                event!(Level::INFO, at = %anchor, "starting scheduled run");
                f(anchor).await
            }
            .instrument(span)
            .await?;

            anchor += every;
        }
    }
}
