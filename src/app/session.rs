//! ANCS session: the application-level owner of the client.
//!
//! [`AncsSession`] lives as long as the application.  It creates an
//! [`AncsClient`] when the ANCS service is discovered and destroys it when
//! the service or the link goes away; the app-name cache and the lifetime
//! counters survive across connections.
//!
//! ```text
//!  GATT stack ──▶ ┌───────────────────────────────┐
//!                 │          AncsSession           │
//!  ActionMailbox ▶│  Option<AncsClient> · Cache    │──▶ ClientPorts
//!                 └───────────────────────────────┘
//! ```
//!
//! Every entry point is a no-op while no client exists, so callbacks that
//! arrive after a disconnect are harmless.

use log::{debug, info, warn};

use crate::cache::AppNameCache;
use crate::config::AncsConfig;
use crate::diagnostics::AncsCounters;
use crate::error::{GattError, Result};
use crate::fsm::ClientState;
use crate::protocol::{ActionId, NotificationUid};

use super::client::{AncsClient, CharacteristicSet};
use super::events::AncsEvent;
use super::mailbox::ActionMailbox;
use super::ports::{AttHandle, Characteristic, ClientPorts, SubscriptionKind, TimerId};

// ───────────────────────────────────────────────────────────────
// AncsSession
// ───────────────────────────────────────────────────────────────

pub struct AncsSession<'m> {
    config: AncsConfig,
    client: Option<AncsClient>,
    cache: AppNameCache,
    mailbox: &'m ActionMailbox,
    ios9_or_newer: bool,
    /// Totals from clients already destroyed.
    retired: AncsCounters,
}

impl<'m> AncsSession<'m> {
    /// Validate `config` and create a session with no client.
    pub fn new(config: AncsConfig, mailbox: &'m ActionMailbox) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client: None,
            cache: AppNameCache::new(),
            mailbox,
            ios9_or_newer: false,
            retired: AncsCounters::default(),
        })
    }

    // ── Service lifecycle ─────────────────────────────────────

    /// The ANCS service was found on the peer.
    ///
    /// Replaces any existing client.  Returns an error, and leaves the
    /// session without a client, if the characteristics do not form a
    /// usable service.
    pub fn service_discovered(
        &mut self,
        characteristics: &[Characteristic],
        ports: &mut impl ClientPorts,
    ) -> Result<()> {
        self.destroy_client(ports);

        let set = CharacteristicSet::from_discovered(characteristics).map_err(|e| {
            warn!("ANCS: unusable service: {}", e);
            e
        })?;
        info!(
            "ANCS: service discovered (NS={} DS={} CP={})",
            set.notification_source.0, set.data_source.0, set.control_point.0
        );

        let mut client = AncsClient::new(set, &self.config, self.ios9_or_newer);
        client.start(ports);
        self.client = Some(client);
        Ok(())
    }

    /// The peer removed the ANCS service.
    pub fn service_removed(&mut self, ports: &mut impl ClientPorts) {
        info!("ANCS: service removed");
        self.destroy_client(ports);
    }

    /// The link dropped; every handle we hold is stale.
    pub fn invalidate_references(&mut self, ports: &mut impl ClientPorts) {
        debug!("ANCS: references invalidated");
        self.destroy_client(ports);
    }

    /// The peer runs iOS 9 or newer: request action labels from now on.
    pub fn ios9_or_newer_detected(&mut self) {
        self.ios9_or_newer = true;
        if let Some(client) = self.client.as_mut() {
            client.enable_action_labels();
        }
    }

    fn destroy_client(&mut self, ports: &mut impl ClientPorts) {
        if let Some(mut client) = self.client.take() {
            client.destroy(ports);
            self.retired.merge(client.counters());
            ports.emit(&AncsEvent::Disconnected);
        }
    }

    // ── Inbound traffic ───────────────────────────────────────

    /// Whether `handle` belongs to the current client.
    pub fn can_handle(&self, handle: AttHandle) -> bool {
        self.client
            .as_ref()
            .is_some_and(|c| c.characteristics().contains(handle))
    }

    pub fn handle_subscribe(
        &mut self,
        handle: AttHandle,
        kind: SubscriptionKind,
        result: core::result::Result<(), GattError>,
        ports: &mut impl ClientPorts,
    ) {
        if let Some(client) = self.client.as_mut() {
            client.handle_subscribe(handle, kind, result, ports);
        }
    }

    pub fn handle_write_response(
        &mut self,
        handle: AttHandle,
        result: core::result::Result<(), GattError>,
        ports: &mut impl ClientPorts,
    ) {
        if let Some(client) = self.client.as_mut() {
            client.handle_write_response(handle, result, ports);
        }
    }

    pub fn handle_notification_or_read(
        &mut self,
        handle: AttHandle,
        data: &[u8],
        result: core::result::Result<(), GattError>,
        ports: &mut impl ClientPorts,
    ) {
        if let Some(client) = self.client.as_mut() {
            client.handle_notification(handle, data, result, &mut self.cache, ports);
        }
    }

    pub fn handle_timer(&mut self, timer: TimerId, ports: &mut impl ClientPorts) {
        match self.client.as_mut() {
            Some(client) => client.handle_timer(timer, ports),
            None => debug!("ANCS: timer {} fired with no client", timer.name()),
        }
    }

    // ── Actions ───────────────────────────────────────────────

    /// Owner-context shortcut for [`ActionMailbox::perform_action`] followed
    /// by [`process_actions`](Self::process_actions).
    pub fn perform_action(
        &mut self,
        uid: NotificationUid,
        action: ActionId,
        ports: &mut impl ClientPorts,
    ) -> Result<()> {
        self.mailbox.perform_action(uid, action)?;
        self.process_actions(ports);
        Ok(())
    }

    /// Drain the mailbox into the client's queue, in posting order.
    /// Requests posted while no client exists are discarded.
    pub fn process_actions(&mut self, ports: &mut impl ClientPorts) -> usize {
        let mut drained = 0;
        while let Some(request) = self.mailbox.try_take() {
            drained += 1;
            match self.client.as_mut() {
                Some(client) => client.perform_action(request.uid, request.action, ports),
                None => warn!(
                    "ANCS: no client, dropping {:?} for uid {}",
                    request.action, request.uid
                ),
            }
        }
        drained
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn is_active(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&AncsClient> {
        self.client.as_ref()
    }

    pub fn state(&self) -> Option<ClientState> {
        self.client.as_ref().map(AncsClient::state)
    }

    pub fn config(&self) -> &AncsConfig {
        &self.config
    }

    pub fn app_names(&self) -> &AppNameCache {
        &self.cache
    }

    pub fn mailbox(&self) -> &'m ActionMailbox {
        self.mailbox
    }

    /// Lifetime counters, including the current client's.
    pub fn counters(&self) -> AncsCounters {
        let mut total = self.retired;
        if let Some(client) = self.client.as_ref() {
            total.merge(client.counters());
        }
        total
    }
}
