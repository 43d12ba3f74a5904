use std::{future::pending, time::Duration};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

/// Tracks the single outstanding pong deadline of a connection.
#[derive(Debug)]
pub struct PongMonitor {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl PongMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Arms the deadline unless one is already pending.
    pub fn ping_sent(&mut self) {
        if self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.timeout);
        }
    }

    pub fn pong_received(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

pub fn heartbeat_interval(period: Option<Duration>) -> Option<Interval> {
    period.map(|period| {
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        heartbeat
    })
}

/// Ticks forever-pending when there is no heartbeat.
pub async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => pending::<()>().await,
    }
}

pub async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}
