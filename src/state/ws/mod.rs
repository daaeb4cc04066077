pub mod backoff;
pub mod error;
pub mod listeners;
pub mod types;
mod utils;

use std::sync::{Arc, PoisonError, RwLock};

use async_tungstenite::tungstenite::protocol::Message;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;

pub use self::backoff::Backoff;
use self::error::{Error, RelayError, Result};
use self::listeners::{ListenerId, Listeners};
use self::types::{EntityEvent, Inbound, InboundMessage};
pub use self::utils::ws_url;
use self::utils::{connect, WsStream};
use crate::session::SessionState;

enum Disconnect {
    SessionEnded,
    Dropped(Error),
}

/// Relays backend entity events from the websocket to registered listeners.
pub struct RealtimeRelay {
    url: String,
    backoff: Backoff,
    listeners: RwLock<Listeners>,
}

impl RealtimeRelay {
    pub fn new(url: &str, backoff: Backoff) -> Self {
        Self {
            url: url.to_string(),
            backoff,
            listeners: RwLock::new(Listeners::default()),
        }
    }

    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&EntityEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .on(event, Arc::new(callback))
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .off(event, id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Handles one text frame, returns how many callbacks ran.
    pub fn dispatch(&self, text: &str) -> usize {
        let message = match serde_json::from_str::<InboundMessage>(text) {
            Ok(message) => message,
            Err(why) => {
                log::warn!("[Relay] Dropping unparsable message: {why}");

                return 0;
            }
        };

        let event = match Inbound::from(message) {
            Inbound::Entity(event) => event,
            Inbound::System(kind) => {
                log::trace!("[Relay] System message: {kind}");

                return 0;
            }
            Inbound::Unknown(kind) => {
                log::debug!("[Relay] Ignoring message of type `{kind}`");

                return 0;
            }
        };

        // callbacks run outside the lock so they may register listeners
        let callbacks = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind);

        log::debug!(
            "[Relay] {} -> {} listener(s)",
            event.kind,
            callbacks.len()
        );

        for callback in &callbacks {
            callback(&event);
        }

        callbacks.len()
    }

    /// Keeps the socket connected while the session is authenticated.
    ///
    /// Returns `Ok` once the session channel closes, or
    /// [`RelayError::ReconnectFailure`] when the backoff attempts run out.
    pub async fn run(&self, mut session: watch::Receiver<SessionState>) -> Result<()> {
        let mut attempt = 0;

        loop {
            while !session.borrow_and_update().is_authenticated() {
                log::debug!("[Relay] Waiting for an authenticated session");

                if session.changed().await.is_err() {
                    return Ok(());
                }
            }

            match connect(&self.url).await {
                Ok(stream) => {
                    log::info!("Connected to {}", self.url);

                    attempt = 0;

                    match self.pump(stream, &mut session).await {
                        Disconnect::SessionEnded => {
                            log::debug!("[Relay] Session ended, disconnected");

                            continue;
                        }

                        Disconnect::Dropped(why) => {
                            log::warn!("[Relay] Connection lost: {why}");
                        }
                    }
                }

                Err(why) => {
                    log::warn!("[Relay] Failed to connect: {why}");
                }
            }

            attempt += 1;

            let Some(delay) = self.backoff.delay(attempt) else {
                log::error!("Giving up on realtime updates after {} attempts", attempt - 1);

                return Err(RelayError::ReconnectFailure.into());
            };

            log::info!("Reconnecting in {delay:?} (attempt {attempt})");

            tokio::time::sleep(delay).await;
        }
    }

    async fn pump(
        &self,
        stream: WsStream,
        session: &mut watch::Receiver<SessionState>,
    ) -> Disconnect {
        let (mut sender, mut receiver) = stream.split();

        loop {
            tokio::select! {
                message = receiver.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        self.dispatch(&text);
                    }

                    Some(Ok(Message::Binary(binary))) => match String::from_utf8(binary) {
                        Ok(text) => {
                            self.dispatch(&text);
                        }
                        Err(why) => log::warn!("[Relay] Dropping non utf-8 message: {why}"),
                    },

                    Some(Ok(Message::Close(frame))) => {
                        return Disconnect::Dropped(RelayError::Closed(frame).into());
                    }

                    // pings are answered by tungstenite
                    Some(Ok(_)) => {}

                    Some(Err(why)) => return Disconnect::Dropped(why.into()),

                    None => return Disconnect::Dropped(RelayError::Closed(None).into()),
                },

                changed = session.changed() => {
                    if changed.is_err() || !session.borrow().is_authenticated() {
                        sender.close().await.ok();

                        return Disconnect::SessionEnded;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_tungstenite::tokio::accept_async;
    use serde_json::json;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::{mpsc, oneshot};

    use super::*;
    use crate::session::{CoarseRole, Session, User};

    fn authenticated() -> SessionState {
        SessionState::Authenticated(Session {
            user: User {
                id: "ana".to_string(),
                email: None,
                name: "ana".to_string(),
            },
            access_token: String::new(),
            refresh_token: String::new(),
            id_token: None,
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(5),
            roles: vec![],
            role: CoarseRole::Seller,
        })
    }

    async fn local_server() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());

        (listener, url)
    }

    /// Sends one entity event, closes, and waits for the client to go away.
    async fn serve_and_hang_up(stream: TcpStream, id: u32) {
        let mut ws = accept_async(stream).await.unwrap();

        ws.send(Message::Text(format!(r#"{{"type":"order:updated","id":{id}}}"#)))
            .await
            .unwrap();
        ws.close(None).await.ok();

        while let Some(Ok(_)) = ws.next().await {}
    }

    fn relay() -> RealtimeRelay {
        RealtimeRelay::new("ws://127.0.0.1:9/ws", Backoff::default())
    }

    fn counter(relay: &RealtimeRelay, event: &str) -> (Arc<AtomicUsize>, ListenerId) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();

        let id = relay.on(event, move |_| {
            inner.fetch_add(1, Ordering::SeqCst);
        });

        (count, id)
    }

    #[test]
    fn test_dispatch_exact_event() {
        let relay = relay();

        let (created, _) = counter(&relay, "customer:created");
        let (created_too, _) = counter(&relay, "customer:created");
        let (updated, _) = counter(&relay, "customer:updated");

        let ran = relay.dispatch(r#"{"type":"customer:created","id":7}"#);

        assert_eq!(ran, 2);
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert_eq!(created_too.load(Ordering::SeqCst), 1);
        assert_eq!(updated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_payload() {
        let relay = relay();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let inner = seen.clone();

        relay.on("team:deleted", move |event| {
            *inner.lock().unwrap() = Some(event.clone());
        });

        relay.dispatch(r#"{"type":"team:deleted","id":3,"payload":{"name":"Sul"}}"#);

        let event = seen.lock().unwrap().clone().unwrap();
        assert_eq!(event.entity, "team");
        assert_eq!(event.operation, "deleted");
        assert_eq!(event.id, Some(json!(3)));
        assert_eq!(event.payload, Some(json!({ "name": "Sul" })));
    }

    #[test]
    fn test_system_and_broken_messages() {
        let relay = relay();
        let (count, _) = counter(&relay, "connected");

        assert_eq!(relay.dispatch(r#"{"type":"connected"}"#), 0);
        assert_eq!(relay.dispatch(r#"{"type":"ack"}"#), 0);
        assert_eq!(relay.dispatch("{not json"), 0);
        assert_eq!(relay.dispatch(r#"{"id":1}"#), 0);
        assert_eq!(relay.dispatch(r#"{"type":"customer:"}"#), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off() {
        let relay = relay();

        let (kept, _) = counter(&relay, "seller:updated");
        let (removed, id) = counter(&relay, "seller:updated");

        assert!(relay.off("seller:updated", id));
        assert!(!relay.off("seller:updated", id));
        assert_eq!(relay.listener_count(), 1);

        relay.dispatch(r#"{"type":"seller:updated","id":1}"#);

        assert_eq!(kept.load(Ordering::SeqCst), 1);
        assert_eq!(removed.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_waits_for_session() {
        let relay = relay();
        let (tx, rx) = watch::channel(SessionState::Unauthenticated);

        // never authenticated, so it never dials and ends with the channel
        let run = relay.run(rx);
        drop(tx);

        assert!(tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .is_ok());
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let relay = RealtimeRelay::new(
            "ws://127.0.0.1:9/ws",
            Backoff {
                base: Duration::from_millis(1),
                max: Duration::from_millis(2),
                max_attempts: 2,
            },
        );

        let (_tx, rx) = watch::channel(authenticated());

        let result = tokio::time::timeout(Duration::from_secs(30), relay.run(rx))
            .await
            .unwrap();

        assert!(matches!(
            result,
            Err(Error::Relay(RelayError::ReconnectFailure))
        ));
    }

    #[tokio::test]
    async fn test_live_socket_until_session_ends() {
        let (listener, url) = local_server().await;
        let (closed_tx, closed_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            ws.send(Message::Text(r#"{"type":"connected"}"#.to_string()))
                .await
                .unwrap();
            ws.send(Message::Text(r#"{"type":"customer:created","id":7}"#.to_string()))
                .await
                .unwrap();

            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }

            closed_tx.send(()).ok();
        });

        let relay = RealtimeRelay::new(&url, Backoff::default());
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        relay.on("customer:created", move |event| {
            seen_tx.send(event.id.clone()).ok();
        });

        let (tx, rx) = watch::channel(authenticated());
        let run = relay.run(rx);
        tokio::pin!(run);

        let id = tokio::select! {
            id = seen_rx.recv() => id.unwrap(),
            _ = &mut run => panic!("relay stopped before the event arrived"),
            _ = tokio::time::sleep(Duration::from_secs(5)) => panic!("no event received"),
        };
        assert_eq!(id, Some(json!(7)));

        // signing out hangs up the socket but keeps the relay waiting
        tx.send(SessionState::Unauthenticated).unwrap();

        tokio::select! {
            closed = closed_rx => closed.unwrap(),
            _ = &mut run => panic!("relay stopped instead of waiting"),
            _ = tokio::time::sleep(Duration::from_secs(5)) => panic!("socket was not closed"),
        }

        drop(tx);

        assert!(tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .unwrap()
            .is_ok());
    }

    #[tokio::test]
    async fn test_attempts_reset_after_connect() {
        let (listener, url) = local_server().await;

        tokio::spawn(async move {
            for id in 1..=2 {
                let (stream, _) = listener.accept().await.unwrap();
                serve_and_hang_up(stream, id).await;
            }

            let (stream, _) = listener.accept().await.unwrap();
            drop(listener);
            serve_and_hang_up(stream, 3).await;
        });

        // a single attempt per outage, so every drop must start over
        let relay = RealtimeRelay::new(
            &url,
            Backoff {
                base: Duration::from_millis(1),
                max: Duration::from_millis(1),
                max_attempts: 1,
            },
        );
        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();

        relay.on("order:updated", move |event| {
            seen_tx.send(event.id.clone()).ok();
        });

        let (_tx, rx) = watch::channel(authenticated());

        let result = tokio::time::timeout(Duration::from_secs(30), relay.run(rx))
            .await
            .unwrap();

        assert!(matches!(
            result,
            Err(Error::Relay(RelayError::ReconnectFailure))
        ));

        let mut seen = vec![];
        while let Ok(id) = seen_rx.try_recv() {
            seen.push(id);
        }

        assert_eq!(seen, vec![Some(json!(1)), Some(json!(2)), Some(json!(3))]);
    }
}
