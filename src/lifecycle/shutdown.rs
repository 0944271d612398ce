//! Graceful stop for a served application.

use std::future::Future;

use tokio::sync::broadcast;

/// Stop handle shared by the signal forwarder, the server and tests.
///
/// Every [`Shutdown::signalled`] future registered before
/// [`Shutdown::trigger`] completes; later ones wait for the next trigger.
#[derive(Clone, Default)]
pub struct Shutdown {
    stop: Option<broadcast::Sender<()>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stop, _) = broadcast::channel(1);
        Self { stop: Some(stop) }
    }

    pub fn trigger(&self) {
        if let Some(stop) = &self.stop {
            let _ = stop.send(());
        }
    }

    /// Completes once `trigger` is called.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let waiter = self.stop.as_ref().map(broadcast::Sender::subscribe);
        async move {
            match waiter {
                Some(mut rx) => {
                    let _ = rx.recv().await;
                }
                None => std::future::pending().await,
            }
        }
    }

    /// Futures currently waiting on this handle.
    pub fn waiters(&self) -> usize {
        self.stop.as_ref().map_or(0, broadcast::Sender::receiver_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_completes_waiters() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn(shutdown.signalled());
        let second = tokio::spawn(shutdown.clone().signalled());
        assert_eq!(shutdown.waiters(), 2);

        shutdown.trigger();
        first.await.unwrap();
        second.await.unwrap();
    }

    #[test]
    fn test_default_handle_never_fires() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        assert_eq!(shutdown.waiters(), 0);
    }
}
