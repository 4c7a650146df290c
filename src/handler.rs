//! Orchestrating façade over the relay connection, key material, and the
//! saved relay list.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::Value;
use tracing::debug;

use crate::config::Settings;
use crate::error::Error;
use crate::event::{self, Event};
use crate::filter::Filter;
use crate::keys;
use crate::relay::RelayConnection;
use crate::store::RelayStore;

/// The surface the caller drives: saved-relay management, one relay session,
/// bounded subscriptions, and note publishing.
pub struct RelayHandler {
    store: RelayStore,
    conn: Option<RelayConnection>,
    collect_window: Duration,
}

impl RelayHandler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            store: RelayStore::new(
                settings.relays_path.clone(),
                settings.default_relay.clone(),
            ),
            conn: None,
            collect_window: settings.collect_window,
        }
    }

    /// Override the collection window for subsequent subscriptions.
    pub fn set_collect_window(&mut self, window: Duration) {
        self.collect_window = window;
    }

    /// Save a relay URL. Re-adding an existing URL is a no-op.
    pub fn add_relay(&self, url: &str) -> Result<Vec<String>, Error> {
        self.store.add(url)
    }

    /// Remove a saved relay URL.
    pub fn remove_relay(&self, url: &str) -> Result<Vec<String>, Error> {
        self.store.remove(url)
    }

    /// The saved relay list, seeding the default on first use.
    pub fn saved_relays(&self) -> Result<Vec<String>, Error> {
        self.store.load()
    }

    /// Open a session to `url`, closing any previous session first. The
    /// handler holds at most one live session; connecting to the current
    /// endpoint re-establishes it.
    pub async fn connect(&mut self, url: &str) -> Result<(), Error> {
        if let Some(prev) = self.conn.take() {
            debug!(endpoint = prev.endpoint(), "closing previous relay session");
            prev.close().await;
        }
        self.conn = Some(RelayConnection::connect(url).await?);
        Ok(())
    }

    /// Translate loosely-typed filter specs and collect matching events for
    /// the configured window over the active session.
    pub async fn subscribe(&mut self, specs: &[Value]) -> Result<Vec<Event>, Error> {
        let filters: Vec<Filter> = specs.iter().map(Filter::from_value).collect();
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
        conn.subscribe_collect(&filters, self.collect_window).await
    }

    /// Build, sign, verify, and publish a kind-1 text note; returns the
    /// event id. The private key is normalized per call and discarded.
    pub async fn send_note(&mut self, private_key: &str, message: &str) -> Result<String, Error> {
        let (secret, pubkey) = keys::derive_keys(private_key)?;
        let mut note = Event::text_note(&pubkey, unix_now(), message)?;
        event::sign_event(&mut note, &secret)?;
        // a freshly signed event that does not verify is a codec defect
        match event::verify_event(&note) {
            Ok(true) => {}
            _ => return Err(Error::VerificationFault),
        }
        let conn = self.conn.as_mut().ok_or(Error::NotConnected)?;
        conn.publish(&note).await?;
        Ok(note.id)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
