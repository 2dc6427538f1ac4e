//! Guard timer: a cancellable, movable deadline on tokio's clock.
//!
//! When the deadline passes the turn's [`CancellationToken`] is cancelled.
//! The deadline can be pushed back while the backend shows signs of life,
//! or disarmed once it is done.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct GuardTimer {
    deadline: watch::Sender<Option<Instant>>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl GuardTimer {
    /// Arms a timer that fires at `deadline`. Must be called inside a
    /// tokio runtime.
    pub fn arm(deadline: Instant) -> Self {
        let (tx, rx) = watch::channel(Some(deadline));
        let token = CancellationToken::new();
        let task = tokio::spawn(run(rx, token.clone()));
        Self {
            deadline: tx,
            token,
            task,
        }
    }

    /// Moves the deadline. Has no effect once fired.
    pub fn reset(&self, deadline: Instant) {
        self.deadline.send_replace(Some(deadline));
    }

    /// Moves the deadline only if `deadline` is later. Does not re-arm a
    /// disarmed timer.
    pub fn extend(&self, deadline: Instant) {
        self.deadline.send_if_modified(|current| match current {
            Some(at) if *at < deadline => {
                *at = deadline;
                true
            }
            _ => false,
        });
    }

    pub fn disarm(&self) {
        self.deadline.send_replace(None);
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn has_fired(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for GuardTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(mut deadline: watch::Receiver<Option<Instant>>, token: CancellationToken) {
    loop {
        let current = *deadline.borrow_and_update();
        match current {
            None => {
                if deadline.changed().await.is_err() {
                    return;
                }
            }
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {
                        warn!("Guard timer fired");
                        token.cancel();
                        return;
                    }
                    changed = deadline.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
        }
    }
}
