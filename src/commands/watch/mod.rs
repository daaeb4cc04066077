use anyhow::{Context as _, Result};
use clap::Parser;
use serde_json::Value;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::watch;

use crate::config::EXEC_NAME;
use crate::resources::Resource;
use crate::session::SessionState;
use crate::state::ws::{ws_url, Backoff, RealtimeRelay};
use crate::state::State;
use crate::store::cache::Caches;
use crate::store::Store;

#[derive(Debug, Parser)]
#[clap(about = "Stay connected, keep the session fresh and the cache in sync")]
pub struct Options {
    #[clap(long, help = "Override the websocket URL derived from the API URL")]
    pub url: Option<String>,
}

pub async fn handle(options: Options, state: State) -> Result<()> {
    let url = match options.url {
        Some(url) => url,
        None => ws_url(&state.ctx.api_url()).context("Failed to build the websocket URL")?,
    };

    let relay = RealtimeRelay::new(&url, Backoff::default());
    let evictions = register_invalidations(&relay);

    log::info!("Watching for changes, press Ctrl-C to stop");

    let session = state.session.clone();

    tokio::select! {
        () = session.run_keeper() => {
            log::info!("Your session ended, run `{EXEC_NAME} auth login` to login again");
        }

        () = session.watch_storage() => {
            log::info!("You were logged out from another instance");
        }

        () = realtime(&relay, session.subscribe()) => {}

        result = evict(evictions) => {
            result?;
        }

        _ = tokio::signal::ctrl_c() => {
            log::info!("Stopped watching");
        }
    }

    Ok(())
}

/// Runs the relay and, once it gives up, stays pending so the session
/// keeper outlives the socket.
async fn realtime(relay: &RealtimeRelay, session: watch::Receiver<SessionState>) {
    if let Err(why) = relay.run(session).await {
        log::error!("Realtime updates stopped: {why}, the cache will not be invalidated");
    }

    std::future::pending::<()>().await;
}

/// Every resource's events evict its cache key.
fn register_invalidations(relay: &RealtimeRelay) -> UnboundedReceiver<Resource> {
    let (tx, rx) = unbounded_channel();

    for resource in Resource::ALL.iter().copied() {
        for event in resource.events() {
            let tx = tx.clone();

            relay.on(&event, move |changed| {
                log::info!("{} {}", changed.kind, describe_id(changed.id.as_ref()));

                tx.send(resource).ok();
            });
        }
    }

    rx
}

async fn evict(mut evictions: UnboundedReceiver<Resource>) -> Result<()> {
    while let Some(resource) = evictions.recv().await {
        let mut caches = Caches::new().await?;

        if caches.evict(resource.cache_key()) {
            caches.save().await?;

            log::debug!("Invalidated {}", resource.cache_key());
        }
    }

    Ok(())
}

fn describe_id(id: Option<&Value>) -> String {
    match id {
        Some(Value::String(id)) => id.clone(),
        Some(id) => id.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_invalidation_listeners() {
        let relay = RealtimeRelay::new("ws://localhost/ws", Backoff::default());
        let mut evictions = register_invalidations(&relay);

        assert_eq!(relay.listener_count(), Resource::ALL.len() * 3);

        relay.dispatch(r#"{"type":"deal:updated","id":12}"#);
        relay.dispatch(r#"{"type":"customer:created","id":7}"#);
        relay.dispatch(r#"{"type":"ack"}"#);

        assert_eq!(evictions.try_recv().unwrap(), Resource::Pipeline);
        assert_eq!(evictions.try_recv().unwrap(), Resource::Customers);
        assert!(evictions.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_failure_keeps_watching() {
        use crate::session::{CoarseRole, Session, User};

        let relay = RealtimeRelay::new(
            "ws://127.0.0.1:9/ws",
            Backoff {
                base: Duration::from_millis(1),
                max: Duration::from_millis(1),
                max_attempts: 1,
            },
        );

        let (_tx, rx) = watch::channel(SessionState::Authenticated(Session {
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
        }));

        assert!(relay.run(rx.clone()).await.is_err());

        // giving up on the socket does not end the watch
        let watching = tokio::time::timeout(Duration::from_secs(2), realtime(&relay, rx));

        assert!(watching.await.is_err());
    }

    #[test]
    fn test_describe_id() {
        assert_eq!(describe_id(Some(&json!(7))), "7");
        assert_eq!(describe_id(Some(&json!("abc"))), "abc");
        assert_eq!(describe_id(None), "-");
    }
}
