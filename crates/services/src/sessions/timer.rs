use std::time::Duration;

use quiz_core::session::ElapsedCounter;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval_at, Instant};

/// Background tick source feeding an `ElapsedCounter`.
///
/// Dropping the timer stops it.
#[derive(Debug)]
pub struct SessionTimer {
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Tick `counter` once every `period`, starting one period from now.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(counter: ElapsedCounter, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                counter.tick();
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_period() {
        let counter = ElapsedCounter::new();
        let timer = SessionTimer::start(counter.clone(), Duration::from_secs(1));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(counter.seconds(), 3);

        timer.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_ticking() {
        let counter = ElapsedCounter::new();
        drop(SessionTimer::start(counter.clone(), Duration::from_secs(1)));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.seconds(), 0);
    }
}
