//! Cancellable one-shot renewal timers.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::task::JoinHandle;

/// A renewal scheduled for one specific access credential.
///
/// The timer is keyed by the epoch of the credential it was scheduled for.
/// When that credential is superseded the timer is cancelled; a timer that
/// still fires late is recognised as stale by its epoch and ignored.
#[derive(Debug)]
pub(crate) struct ScheduledRenewal {
    epoch: u64,
    renew_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

impl ScheduledRenewal {
    /// Spawn `task` to run after `delay`.
    pub(crate) fn spawn(
        epoch: u64,
        renew_at: DateTime<Utc>,
        delay: Duration,
        task: BoxFuture<'static, ()>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });

        Self {
            epoch,
            renew_at,
            handle,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn renew_at(&self) -> DateTime<Utc> {
        self.renew_at
    }

    /// Abort the timer. Has no effect if it already fired.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}

/// Compute when to renew a credential expiring at `expires_at` (Unix
/// seconds), and how long to wait from `now`.
///
/// A deadline already in the past yields a zero delay.
pub(crate) fn renewal_deadline(
    expires_at: i64,
    skew: Duration,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, Duration) {
    let expiry = DateTime::from_timestamp(expires_at, 0).unwrap_or(DateTime::<Utc>::MIN_UTC);
    let skew = chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::zero());
    let renew_at = expiry.checked_sub_signed(skew).unwrap_or(expiry);
    let delay = (renew_at - now).to_std().unwrap_or(Duration::ZERO);
    (renew_at, delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn renews_skew_before_expiry() {
        let now = at(1_000_000);
        let (renew_at, delay) = renewal_deadline(1_000_000 + 3600, Duration::from_secs(60), now);
        assert_eq!(renew_at, at(1_000_000 + 3540));
        assert_eq!(delay, Duration::from_secs(3540));
    }

    #[test]
    fn past_deadline_renews_immediately() {
        let now = at(1_000_000);
        let (renew_at, delay) = renewal_deadline(1_000_000 + 30, Duration::from_secs(60), now);
        assert_eq!(renew_at, at(1_000_000 - 30));
        assert_eq!(delay, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_runs() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
        let renewal = ScheduledRenewal::spawn(
            1,
            at(0),
            Duration::from_secs(10),
            Box::pin(async move {
                let _ = tx.send(());
            }),
        );
        assert_eq!(renewal.epoch(), 1);
        renewal.cancel();

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(rx.recv().await.is_none());
    }
}
