//! Subscription notification sinks and value formatting
//!
//! Notifications are delivered on the client's receive path. A sink
//! invoked there must return immediately; [`QueuedSink`] moves slow
//! handlers onto their own worker task.

use std::sync::Arc;

use opcua::types::{DataValue, NodeId, Variant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Default capacity of the hand-off queue in [`QueuedSink`]
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Metadata accompanying a data change
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemInfo {
    /// Client handle assigned when the item was created
    pub client_handle: u32,
    /// Server-side monitored item id
    pub monitored_item_id: u32,
}

/// Receiver for subscription deliveries
pub trait SubscriptionSink: Send + Sync {
    fn on_data_change(&self, node: &NodeId, value: &DataValue, item: &MonitoredItemInfo);

    fn on_event(&self, fields: &[Variant]);
}

/// Sink that only logs what it receives
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl SubscriptionSink for LoggingSink {
    fn on_data_change(&self, node: &NodeId, value: &DataValue, item: &MonitoredItemInfo) {
        let rendered = value
            .value
            .as_ref()
            .map(format_variant)
            .unwrap_or_else(|| "---".to_string());
        tracing::info!("Data change on {} (handle {}): {}", node, item.client_handle, rendered);
    }

    fn on_event(&self, fields: &[Variant]) {
        let rendered: Vec<String> = fields.iter().map(format_variant).collect();
        tracing::info!("Event: [{}]", rendered.join(", "));
    }
}

#[derive(Debug)]
enum Notification {
    DataChange(NodeId, DataValue, MonitoredItemInfo),
    Event(Vec<Variant>),
}

/// Non-blocking front for a possibly slow sink
///
/// Deliveries are pushed onto a bounded queue and replayed against the
/// inner sink by a dedicated task. When the queue is full the delivery is
/// dropped with a warning; the receive path never waits.
pub struct QueuedSink {
    tx: mpsc::Sender<Notification>,
    cancel: CancellationToken,
    worker: JoinHandle<u64>,
}

impl QueuedSink {
    /// Spawn the worker on the current runtime
    pub fn spawn(inner: Arc<dyn SubscriptionSink>, capacity: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<Notification>(capacity.max(1));
        let cancel = CancellationToken::new();
        let worker_cancel = cancel.clone();

        let worker = tokio::spawn(async move {
            let mut delivered = 0u64;
            loop {
                let next = tokio::select! {
                    _ = worker_cancel.cancelled() => None,
                    n = rx.recv() => n,
                };
                let Some(notification) = next else { break };

                let sink = inner.clone();
                // Handlers are synchronous and may block
                let _ = tokio::task::spawn_blocking(move || match notification {
                    Notification::DataChange(node, value, item) => sink.on_data_change(&node, &value, &item),
                    Notification::Event(fields) => sink.on_event(&fields),
                })
                .await;
                delivered += 1;
            }
            tracing::debug!("Notification worker stopped after {} deliveries", delivered);
            delivered
        });

        Self { tx, cancel, worker }
    }

    fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            tracing::warn!("Dropping subscription notification: {}", e);
        }
    }

    /// Stop accepting deliveries, drain what is queued, return the delivered count
    pub async fn shutdown(self) -> u64 {
        let Self { tx, cancel, worker } = self;
        drop(tx);
        let delivered = worker.await.unwrap_or_default();
        cancel.cancel();
        delivered
    }

    /// Stop the worker without draining the queue
    pub fn abort(&self) {
        self.cancel.cancel();
    }
}

impl SubscriptionSink for QueuedSink {
    fn on_data_change(&self, node: &NodeId, value: &DataValue, item: &MonitoredItemInfo) {
        self.enqueue(Notification::DataChange(node.clone(), value.clone(), item.clone()));
    }

    fn on_event(&self, fields: &[Variant]) {
        self.enqueue(Notification::Event(fields.to_vec()));
    }
}

/// Format a Variant for display
pub fn format_variant(variant: &Variant) -> String {
    match variant {
        Variant::Empty => "Empty".to_string(),
        Variant::Boolean(b) => b.to_string(),
        Variant::SByte(v) => v.to_string(),
        Variant::Byte(v) => v.to_string(),
        Variant::Int16(v) => v.to_string(),
        Variant::UInt16(v) => v.to_string(),
        Variant::Int32(v) => v.to_string(),
        Variant::UInt32(v) => v.to_string(),
        Variant::Int64(v) => v.to_string(),
        Variant::UInt64(v) => v.to_string(),
        Variant::Float(v) => format!("{:.4}", v),
        Variant::Double(v) => format!("{:.6}", v),
        Variant::String(s) => s.to_string(),
        Variant::ByteString(bs) => format!("[{} bytes]", bs.len()),
        Variant::LocalizedText(lt) => lt.text.to_string(),
        Variant::NodeId(id) => id.to_string(),
        Variant::StatusCode(sc) => format!("{:?}", sc),
        Variant::Array(array) => {
            let items: Vec<String> = array.values.iter().map(format_variant).collect();
            format!("[{}]", items.join(", "))
        }
        _ => format!("{:?}", variant),
    }
}
