use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetch::HotlistClient;
use crate::store::HotlistStore;

/// Manual refresh requests. Capacity 1, so requests arriving mid-fetch collapse into one follow-up.
pub fn refresh_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(1)
}

/// Run the pipeline once and publish the outcome. Returns whether the fetch succeeded.
pub async fn refresh_once(client: &HotlistClient, store: &HotlistStore) -> bool {
    store.set_loading(true);
    match client.fetch_hotlist().await {
        Ok(result) => {
            let count = result.data.len();
            store.set_items(result);
            info!(items = count, "hot list published");
            true
        }
        Err(e) => {
            warn!(error = %e, items = store.item_count(), "hot list refresh failed, keeping previous items");
            store.set_error(e.to_string());
            false
        }
    }
}

/// Hot list polling loop. Fetches immediately, then on every interval tick or refresh request.
pub async fn polling_loop(
    client: HotlistClient,
    store: HotlistStore,
    interval: Duration,
    mut refresh: mpsc::Receiver<()>,
    cancel: CancellationToken,
) {
    info!(interval = %humantime::format_duration(interval), "hot list poller started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("hot list poller shutting down");
                return;
            }
            _ = refresh_once(&client, &store) => {}
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("hot list poller shutting down");
                return;
            }
            _ = tokio::time::sleep(interval) => {
                debug!("poll interval elapsed");
            }
            Some(()) = refresh.recv() => {
                info!("manual refresh requested");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::tests::{OK_BODY, ScriptedTransport, client};

    #[tokio::test(start_paused = true)]
    async fn refresh_once_publishes_and_records_errors() {
        let transport = ScriptedTransport::new(vec![Ok(OK_BODY), Err("down"), Err("down"), Err("down")]);
        let client = client(transport);
        let store = HotlistStore::new();

        assert!(refresh_once(&client, &store).await);
        assert_eq!(store.item_count(), 2);

        assert!(!refresh_once(&client, &store).await);
        let snap = store.snapshot();
        assert_eq!(snap.items.len(), 2);
        assert!(snap.error.unwrap().contains("after 3 attempts"));
        assert!(!snap.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_fetches_at_start_on_refresh_and_stops_on_cancel() {
        let transport = ScriptedTransport::new(vec![Ok(OK_BODY), Err("down"), Err("down"), Err("down")]);
        let store = HotlistStore::new();
        let cancel = CancellationToken::new();
        let (tx, rx) = refresh_channel();

        let handle = tokio::spawn(polling_loop(
            client(transport.clone()),
            store.clone(),
            Duration::from_secs(300),
            rx,
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.item_count(), 2);
        assert_eq!(transport.calls().len(), 1);

        tx.send(()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.calls().len(), 4);
        let snap = store.snapshot();
        assert_eq!(snap.items.len(), 2);
        assert!(snap.error.is_some());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn loop_refetches_after_interval() {
        let transport = ScriptedTransport::new(vec![Ok(OK_BODY), Ok(OK_BODY)]);
        let store = HotlistStore::new();
        let cancel = CancellationToken::new();
        let (_tx, rx) = refresh_channel();

        let handle = tokio::spawn(polling_loop(
            client(transport.clone()),
            store.clone(),
            Duration::from_secs(60),
            rx,
            cancel.clone(),
        ));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(transport.calls().len(), 1);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(transport.calls().len(), 2);

        cancel.cancel();
        handle.await.unwrap();
    }
}
