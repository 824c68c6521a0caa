//! Ctrl-C handling for a run.
//!
//! The first Ctrl-C latches a flag. Every later phase can check it or wait
//! on it, so an interrupt that lands between two awaits is not lost.

use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct Interrupt {
    raised: watch::Receiver<bool>,
    listener: Option<JoinHandle<()>>,
}

impl Interrupt {
    /// Listen for Ctrl-C until this value is dropped.
    pub fn ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        let listener = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, putting the work tree back");
                let _ = tx.send(true);
            }
        });
        Self {
            raised: rx,
            listener: Some(listener),
        }
    }

    /// Raised by whoever holds the matching sender.
    pub fn from_receiver(raised: watch::Receiver<bool>) -> Self {
        Self {
            raised,
            listener: None,
        }
    }

    pub fn is_raised(&self) -> bool {
        *self.raised.borrow()
    }

    /// Resolves once the interrupt is raised. Pending forever if the sender
    /// goes away without raising it.
    pub async fn raised(&self) {
        let mut rx = self.raised.clone();
        if rx.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for Interrupt {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_raise_is_latched() {
        let (tx, rx) = watch::channel(false);
        let interrupt = Interrupt::from_receiver(rx);
        assert!(!interrupt.is_raised());

        tx.send(true).unwrap();
        assert!(interrupt.is_raised());
        // Waiting after the fact still resolves
        tokio::time::timeout(Duration::from_secs(1), interrupt.raised())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), interrupt.raised())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_never_raises() {
        let (tx, rx) = watch::channel(false);
        let interrupt = Interrupt::from_receiver(rx);
        drop(tx);

        let waited = tokio::time::timeout(Duration::from_millis(50), interrupt.raised()).await;
        assert!(waited.is_err());
        assert!(!interrupt.is_raised());
    }
}
