//! Stop flag for the daemon's run loop.

use tokio::sync::watch;

/// Owns the stop flag. Once tripped it stays tripped, so a listener created
/// after [`Shutdown::trigger`] still stops.
pub struct Shutdown {
    flag: watch::Sender<bool>,
}

/// One loop's view of the stop flag.
#[derive(Clone)]
pub struct StopListener {
    flag: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            flag: watch::Sender::new(false),
        }
    }

    pub fn listener(&self) -> StopListener {
        StopListener {
            flag: self.flag.subscribe(),
        }
    }

    pub fn trigger(&self) {
        self.flag.send_replace(true);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl StopListener {
    /// Resolves once the flag is tripped, or the [`Shutdown`] is dropped.
    pub async fn stopped(&mut self) {
        let _ = self.flag.wait_for(|stop| *stop).await;
    }
}

/// Wait for an OS stop request and report which one arrived.
pub async fn os_signal() -> &'static str {
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                tracing::warn!(error = %e, "SIGINT handler unavailable");
            }
            "SIGINT"
        }
        _ = terminate => "SIGTERM",
    }
}
