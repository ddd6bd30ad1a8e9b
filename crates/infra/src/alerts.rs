//! Low-stock alert adapters.

use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;

use tracing::{info, warn};

use stockcast_forecast::{AlertError, AlertSink, LowStockAlert};

/// Writes every alert as a structured `warn!` line.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError> {
        warn!(
            unit = %alert.unit_id,
            product = %alert.product_name,
            current_stock = alert.current_stock,
            reorder_quantity = alert.reorder_quantity,
            "low stock"
        );
        Ok(())
    }
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAlertSink {
    inner: Mutex<Vec<LowStockAlert>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<LowStockAlert> {
        self.inner.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl AlertSink for InMemoryAlertSink {
    fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError> {
        self.inner
            .lock()
            .map_err(|_| AlertError::Delivery("alert store lock poisoned".to_string()))?
            .push(alert.clone());
        Ok(())
    }
}

#[derive(Debug)]
enum Message {
    Alert(LowStockAlert),
    Shutdown,
}

/// Hands alerts to a dispatcher thread through a bounded queue.
///
/// `alert` never blocks: when the queue is full the alert is dropped and
/// `AlertError::QueueFull` is returned.
#[derive(Debug, Clone)]
pub struct ChannelAlertSink {
    tx: SyncSender<Message>,
}

/// Handle for the dispatcher thread.
#[derive(Debug)]
pub struct ChannelAlertSinkHandle {
    tx: SyncSender<Message>,
    join: Option<thread::JoinHandle<()>>,
}

impl ChannelAlertSink {
    /// Spawn the dispatcher thread delivering into `inner`.
    pub fn spawn(
        inner: Arc<dyn AlertSink>,
        capacity: usize,
    ) -> Result<(Self, ChannelAlertSinkHandle), AlertError> {
        let (tx, rx) = mpsc::sync_channel::<Message>(capacity.max(1));

        let join = thread::Builder::new()
            .name("stockcast-alerts".to_string())
            .spawn(move || dispatch_loop(rx, inner))
            .map_err(|e| AlertError::Delivery(format!("failed to spawn alert dispatcher: {e}")))?;

        Ok((
            Self { tx: tx.clone() },
            ChannelAlertSinkHandle {
                tx,
                join: Some(join),
            },
        ))
    }
}

impl AlertSink for ChannelAlertSink {
    fn alert(&self, alert: &LowStockAlert) -> Result<(), AlertError> {
        match self.tx.try_send(Message::Alert(alert.clone())) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!(unit = %alert.unit_id, product = %alert.product_name, "alert queue full; alert dropped");
                Err(AlertError::QueueFull)
            }
            Err(TrySendError::Disconnected(_)) => Err(AlertError::Closed),
        }
    }
}

impl ChannelAlertSinkHandle {
    /// Deliver everything already queued, then stop the dispatcher thread.
    pub fn shutdown(mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

fn dispatch_loop(rx: mpsc::Receiver<Message>, inner: Arc<dyn AlertSink>) {
    info!("alert dispatcher started");
    let mut delivered: u64 = 0;

    while let Ok(message) = rx.recv() {
        match message {
            Message::Alert(alert) => match inner.alert(&alert) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(unit = %alert.unit_id, product = %alert.product_name, error = %e, "alert delivery failed")
                }
            },
            Message::Shutdown => break,
        }
    }

    info!(delivered, "alert dispatcher stopped");
}
