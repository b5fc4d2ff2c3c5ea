use std::fmt;

use tokio::sync::watch;

/// Why the service is stopping. The first reason recorded wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupt,
    Terminate,
    ServerExited,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Interrupt => "interrupt",
            StopReason::Terminate => "terminate",
            StopReason::ServerExited => "server exited",
        })
    }
}

#[derive(Clone)]
pub struct Shutdown {
    sender: watch::Sender<Option<StopReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Records `reason` unless a stop is already under way.
    pub fn trigger(&self, reason: StopReason) {
        self.sender.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
    }

    pub fn reason(&self) -> Option<StopReason> {
        *self.sender.borrow()
    }

    /// Resolves once a stop is triggered, including one triggered before the
    /// call. Fits `axum::serve(..).with_graceful_shutdown`.
    pub fn stopped(&self) -> impl std::future::Future<Output = StopReason> + Send + 'static {
        let mut receiver = self.sender.subscribe();
        async move {
            match receiver.wait_for(Option::is_some).await {
                Ok(reason) => (*reason).unwrap_or(StopReason::ServerExited),
                Err(_) => StopReason::ServerExited,
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

pub fn install_signal_handlers(shutdown: Shutdown) {
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!(target: "lifecycle", "ctrl-c received");
            interrupt.trigger(StopReason::Interrupt);
        }
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        tokio::spawn(async move {
            if let Ok(mut term) = signal(SignalKind::terminate()) {
                term.recv().await;
                tracing::info!(target: "lifecycle", "SIGTERM received");
                shutdown.trigger(StopReason::Terminate);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn waiters_see_the_first_reason() {
        let shutdown = Shutdown::new();
        let early = tokio::spawn(shutdown.stopped());

        shutdown.trigger(StopReason::Terminate);
        shutdown.trigger(StopReason::ServerExited);

        let reason = tokio::time::timeout(Duration::from_secs(1), early)
            .await
            .expect("waiter woke")
            .unwrap();
        assert_eq!(reason, StopReason::Terminate);
        assert_eq!(shutdown.reason(), Some(StopReason::Terminate));

        let late = tokio::time::timeout(Duration::from_secs(1), shutdown.stopped())
            .await
            .expect("late waiter sees the stop");
        assert_eq!(late, StopReason::Terminate);
    }

    #[tokio::test]
    async fn nothing_resolves_before_a_trigger() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.reason(), None);
        assert!(
            tokio::time::timeout(Duration::from_millis(50), shutdown.stopped())
                .await
                .is_err()
        );
    }
}
