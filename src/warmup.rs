//! Daily warmup of the active-contracts snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};

use crate::enrichment::TalanaService;

pub struct WarmupWorker {
    talana: Arc<TalanaService>,
    hour_utc: u32,
}

impl WarmupWorker {
    pub fn new(talana: Arc<TalanaService>, hour_utc: u32) -> Self {
        Self { talana, hour_utc }
    }

    /// Sleeps until the configured hour, refreshes the snapshot and repeats.
    /// A failed refresh is logged and the loop continues.
    pub async fn run(self) {
        tracing::info!("Warmup worker started, runs daily at {:02}:00 UTC", self.hour_utc);
        loop {
            let wait = duration_until_next_run(Utc::now(), self.hour_utc);
            tracing::debug!("Next active contracts warmup in {:?}", wait);
            tokio::time::sleep(wait).await;

            match self.talana.refresh_active_contracts().await {
                Ok(count) => tracing::info!("Warmup loaded {} active contracts", count),
                Err(e) => tracing::warn!("Active contracts warmup failed: {}", e),
            }
        }
    }
}

/// Time from `now` until the next `hour:00:00` UTC. At exactly that instant the next
/// run is a day later.
pub fn duration_until_next_run(now: DateTime<Utc>, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date_naive().and_time(at).and_utc();
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 5, 30, 0).unwrap();
        assert_eq!(
            duration_until_next_run(now, 8),
            Duration::from_secs(2 * 3600 + 30 * 60)
        );
    }

    #[test]
    fn test_next_run_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 8, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 8), Duration::from_secs(24 * 3600));

        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(duration_until_next_run(now, 8), Duration::from_secs(9 * 3600));
    }
}
