use crate::models::InventoryEvent;
use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, Sender};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

const CHANNEL_CAPACITY: usize = 100;

/// Fan-out of inventory writes to every connected client.
pub struct NotificationHub {
    sender: Sender<InventoryEvent>,
}

impl NotificationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn sender(&self) -> Sender<InventoryEvent> {
        self.sender.clone()
    }

    /// Streams events to one WebSocket as JSON text frames until either side hangs up.
    /// Incoming frames are read and discarded. A client that falls behind the channel
    /// skips the missed events.
    pub async fn handle_socket(socket: WebSocket, sender: Sender<InventoryEvent>) {
        let (mut sender_ws, mut receiver) = socket.split();
        let mut receiver_stream = BroadcastStream::new(sender.subscribe());

        let mut send_task = tokio::spawn(async move {
            while let Some(next) = receiver_stream.next().await {
                let event = match next {
                    Ok(event) => event,
                    Err(lagged) => {
                        warn!(error = %lagged, "websocket client lagging");
                        continue;
                    }
                };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender_ws.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to encode event"),
                }
            }
        });

        let mut recv_task = tokio::spawn(async move {
            while let Some(Ok(_)) = receiver.next().await {}
        });

        tokio::select! {
            _ = &mut send_task => recv_task.abort(),
            _ = &mut recv_task => send_task.abort(),
        }
        debug!("websocket closed");
    }
}

/// Logs every event until the channel closes and returns how many were seen. Events
/// dropped while lagging are skipped with a warning.
pub async fn log_events(mut events: BroadcastStream<InventoryEvent>) -> usize {
    let mut seen = 0;
    while let Some(next) = events.next().await {
        match next {
            Ok(InventoryEvent::Created(item)) => debug!(code = %item.code, "item created"),
            Ok(InventoryEvent::Updated(item)) => debug!(code = %item.code, "item updated"),
            Ok(InventoryEvent::Deleted(id)) => debug!(%id, "item deleted"),
            Err(lagged) => {
                warn!(error = %lagged, "event log lagging");
                continue;
            }
        }
        seen += 1;
    }
    seen
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inventory::{Category, CategoryDetails, InventoryItem};
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    fn create_test_item(id: &str) -> InventoryItem {
        InventoryItem {
            id: Some(id.to_string()),
            code: format!("E-{id}"),
            piece: format!("Disjoncteur {id}"),
            marque: "Schneider".into(),
            reference: "C60N".into(),
            quantite: 10,
            emplacement: "Rayon B-03".into(),
            observation: None,
            stock_initial: None,
            stock_actuel: None,
            seuil_alerte: None,
            details: CategoryDetails::empty(Category::Electrical),
        }
    }

    #[tokio::test]
    async fn test_notification_hub_creation() {
        let hub = NotificationHub::new();
        assert_eq!(hub.sender.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_event_broadcasting() {
        let hub = NotificationHub::new();
        let sender = hub.sender();
        let mut receiver1 = sender.subscribe();
        let mut receiver2 = sender.subscribe();

        let item = create_test_item("1");
        sender.send(InventoryEvent::Created(item.clone())).unwrap();

        let timeout = tokio::time::Duration::from_secs(1);
        for receiver in [&mut receiver1, &mut receiver2] {
            match tokio::time::timeout(timeout, receiver.recv()).await {
                Ok(Ok(InventoryEvent::Created(received))) => {
                    assert_eq!(received.id.as_deref(), Some("1"));
                    assert_eq!(received.piece, "Disjoncteur 1");
                }
                other => panic!("expected Created event, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_multiple_events_in_order() {
        let hub = NotificationHub::new();
        let sender = hub.sender();
        let mut receiver = sender.subscribe();
        let timeout = tokio::time::Duration::from_secs(1);

        let events = vec![
            InventoryEvent::Created(create_test_item("1")),
            InventoryEvent::Updated(create_test_item("2")),
            InventoryEvent::Deleted("1".to_string()),
        ];
        for event in &events {
            sender.send(event.clone()).unwrap();
        }

        for expected in events {
            let received = tokio::time::timeout(timeout, receiver.recv())
                .await
                .expect("receiver timed out")
                .expect("channel closed");
            assert_eq!(received, expected);
        }
    }

    #[tokio::test]
    async fn test_receiver_after_sender_dropped() {
        let hub = NotificationHub::new();
        let sender = hub.sender();
        let mut receiver = sender.subscribe();

        sender
            .send(InventoryEvent::Deleted("abc".to_string()))
            .unwrap();
        assert_eq!(
            receiver.try_recv().unwrap(),
            InventoryEvent::Deleted("abc".to_string())
        );

        drop(sender);
        drop(hub);
        assert!(matches!(receiver.try_recv(), Err(TryRecvError::Closed)));
    }

    #[tokio::test]
    async fn test_event_log_survives_lagging() {
        let (sender, receiver) = broadcast::channel(2);
        for id in ["1", "2", "3", "4", "5"] {
            sender.send(InventoryEvent::Deleted(id.to_string())).unwrap();
        }
        drop(sender);

        let seen = log_events(BroadcastStream::new(receiver)).await;
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let hub = NotificationHub::new();
        let sender = hub.sender();
        let _keep_alive = sender.subscribe();

        sender
            .send(InventoryEvent::Created(create_test_item("1")))
            .unwrap();
        let mut late_receiver = sender.subscribe();

        let expected = InventoryEvent::Created(create_test_item("2"));
        sender.send(expected.clone()).unwrap();
        assert_eq!(late_receiver.try_recv().unwrap(), expected);
    }

    #[test]
    fn test_event_wire_format() {
        let value = serde_json::to_value(InventoryEvent::Deleted("abc".into())).unwrap();
        assert_eq!(value, json!({"type": "Deleted", "payload": "abc"}));

        let value = serde_json::to_value(InventoryEvent::Created(create_test_item("7"))).unwrap();
        assert_eq!(value["type"], "Created");
        assert_eq!(value["payload"]["categorie"], "electrical");
        assert_eq!(value["payload"]["code"], "E-7");
    }
}
