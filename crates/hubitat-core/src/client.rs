// ── Hub client facade ──
//
// Capability-semantic operations over the capability index, one of the two
// attribute stores, and the Remote Device API. Network calls never run
// while a cache lock is held: snapshots are fetched first and swapped in.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{CacheOptions, CacheStrategy};
use crate::error::CoreError;
use crate::model::{Capability, Device, DeviceId, Event, SecurityCommand, SecurityState};
use crate::reconcile::{Ignored, Outcome, resolve_alias};
use crate::remote::RemoteDeviceApi;
use crate::store::{AttributeSnapshot, CapabilityIndex, ReconciledCache, TtlCell};

// ── RoomBroadcast ────────────────────────────────────────────────

/// Per-device results of a room-wide speech command.
///
/// Each device is sent to independently; failures are collected, not
/// rolled back.
#[derive(Debug, Default)]
pub struct RoomBroadcast {
    pub sent: BTreeSet<String>,
    pub failed: Vec<(String, CoreError)>,
}

impl RoomBroadcast {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

// ── HubClient ────────────────────────────────────────────────────

enum AttributeStore {
    Pull(TtlCell<AttributeSnapshot>),
    Reconciled(ReconciledCache),
}

/// Handle to one hub's cached state.
///
/// Cheaply cloneable via `Arc`; clones share the same caches. Each client
/// owns its caches, so several hubs can be served from one process.
pub struct HubClient<A> {
    inner: Arc<HubClientInner<A>>,
}

struct HubClientInner<A> {
    api: A,
    options: CacheOptions,
    index: TtlCell<CapabilityIndex>,
    mode_ids: TtlCell<BTreeMap<String, i64>>,
    attributes: AttributeStore,
}

impl<A> Clone for HubClient<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A: RemoteDeviceApi> HubClient<A> {
    fn with_store(api: A, options: CacheOptions, attributes: AttributeStore) -> Self {
        Self {
            inner: Arc::new(HubClientInner {
                index: TtlCell::new(options.index_ttl),
                mode_ids: TtlCell::new(options.mode_ttl),
                api,
                options,
                attributes,
            }),
        }
    }

    /// A client that re-fetches attribute snapshots once they pass the
    /// attribute TTL. Nothing is fetched until the first query.
    pub fn pull(api: A, options: CacheOptions) -> Self {
        let snapshot = TtlCell::new(options.attribute_ttl);
        Self::with_store(api, options, AttributeStore::Pull(snapshot))
    }

    /// A client loaded once from the hub and then kept current by
    /// [`apply_event`](Self::apply_event).
    pub async fn reconciled(api: A, options: CacheOptions) -> Result<Self, CoreError> {
        let (devices, mode, security) = tokio::join!(
            api.list_devices(false),
            active_mode(&api),
            api.get_security_state(),
        );
        let devices = devices?;
        let cache = ReconciledCache::load(&devices, options.alias_key, mode?, Some(security?));

        let client = Self::with_store(api, options, AttributeStore::Reconciled(cache));
        client
            .inner
            .index
            .store(CapabilityIndex::build(&devices, client.inner.options.alias_key));
        info!(devices = devices.len(), "reconciled cache loaded");
        Ok(client)
    }

    /// Build a client using the strategy named in `options`.
    pub async fn connect(api: A, options: CacheOptions) -> Result<Self, CoreError> {
        match options.strategy {
            CacheStrategy::Pull => Ok(Self::pull(api, options)),
            CacheStrategy::Reconciled => Self::reconciled(api, options).await,
        }
    }

    pub fn api(&self) -> &A {
        &self.inner.api
    }

    pub fn options(&self) -> &CacheOptions {
        &self.inner.options
    }

    pub fn strategy(&self) -> CacheStrategy {
        match self.inner.attributes {
            AttributeStore::Pull(_) => CacheStrategy::Pull,
            AttributeStore::Reconciled(_) => CacheStrategy::Reconciled,
        }
    }

    // ── Snapshots ────────────────────────────────────────────────

    async fn index(&self) -> Result<Arc<CapabilityIndex>, CoreError> {
        let alias_key = self.inner.options.alias_key;
        self.inner
            .index
            .get_or_load(|| async {
                let devices = self.inner.api.list_devices(false).await?;
                debug!(devices = devices.len(), "capability index rebuilt");
                Ok::<_, CoreError>(CapabilityIndex::build(&devices, alias_key))
            })
            .await
    }

    async fn attribute_snapshot(
        &self,
        cell: &TtlCell<AttributeSnapshot>,
    ) -> Result<Arc<AttributeSnapshot>, CoreError> {
        let alias_key = self.inner.options.alias_key;
        cell.get_or_load(|| async {
            let devices = self.inner.api.list_devices(false).await?;
            // The same listing refreshes a stale index for free.
            if self.inner.index.fresh().is_none() {
                self.inner.index.store(CapabilityIndex::build(&devices, alias_key));
            }
            debug!(devices = devices.len(), "attribute snapshot refreshed");
            Ok::<_, CoreError>(AttributeSnapshot::build(&devices, alias_key))
        })
        .await
    }

    /// Drop every cached snapshot.
    ///
    /// A pulling client refetches lazily. A reconciled client reloads its
    /// tables from the hub immediately, discarding applied events; if that
    /// fetch fails, the old tables and index stay in service.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.inner.mode_ids.invalidate();
        match &self.inner.attributes {
            AttributeStore::Pull(cell) => {
                self.inner.index.invalidate();
                cell.invalidate();
                Ok(())
            }
            AttributeStore::Reconciled(cache) => {
                let api = &self.inner.api;
                let (devices, mode, security) = tokio::join!(
                    api.list_devices(false),
                    active_mode(api),
                    api.get_security_state(),
                );
                let (devices, mode, security) = (devices?, mode?, security?);
                let alias_key = self.inner.options.alias_key;
                cache.reload(&devices, alias_key, mode, Some(security));
                self.inner.index.store(CapabilityIndex::build(&devices, alias_key));
                Ok(())
            }
        }
    }

    // ── Generic queries ──────────────────────────────────────────

    /// Every device, fetched live.
    pub async fn devices(&self) -> Result<Vec<Device>, CoreError> {
        self.inner.api.list_devices(false).await
    }

    pub async fn devices_by_capability(
        &self,
        capability: &Capability,
    ) -> Result<BTreeSet<String>, CoreError> {
        self.index().await?.devices_by_capability(capability)
    }

    pub async fn devices_by_capability_and_room(
        &self,
        capability: &Capability,
        room: Option<&str>,
    ) -> Result<BTreeSet<String>, CoreError> {
        Ok(self
            .index()
            .await?
            .devices_by_capability_and_room(capability, room))
    }

    pub async fn devices_by_capability_and_attribute(
        &self,
        capability: &Capability,
        key: &str,
        value: &str,
    ) -> Result<BTreeSet<String>, CoreError> {
        match &self.inner.attributes {
            AttributeStore::Pull(cell) => self
                .attribute_snapshot(cell)
                .await?
                .devices_by_capability_and_attribute(capability, key, value),
            AttributeStore::Reconciled(cache) => {
                let aliases = cache.aliases_with(capability, key, value)?;
                self.index()
                    .await?
                    .ensure_unambiguous(capability, &aliases)?;
                Ok(aliases)
            }
        }
    }

    /// Current value of `key` for every alias under `capability`.
    pub async fn attribute_values(
        &self,
        capability: &Capability,
        key: &str,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        match &self.inner.attributes {
            AttributeStore::Pull(cell) => self
                .attribute_snapshot(cell)
                .await?
                .attribute_values(capability, key),
            AttributeStore::Reconciled(cache) => {
                let values = cache.attribute_values(capability, key)?;
                self.index()
                    .await?
                    .ensure_unambiguous(capability, values.keys())?;
                Ok(values)
            }
        }
    }

    /// Send `command` to the one device named `alias` under `capability`.
    pub async fn send_device_command_by_capability_and_alias(
        &self,
        capability: &Capability,
        alias: &str,
        command: &str,
        args: &[String],
    ) -> Result<Value, CoreError> {
        let id = self
            .index()
            .await?
            .resolve_command_target(capability, alias)?;
        debug!(%capability, alias, %id, command, "dispatching device command");
        self.inner.api.send_device_command(id, command, args).await
    }

    /// Capabilities the hub reports for a device, fetched live.
    pub async fn capabilities_for_device_id(
        &self,
        id: DeviceId,
    ) -> Result<BTreeSet<Capability>, CoreError> {
        let device = self.inner.api.get_device(id).await?;
        Ok(device.capabilities.into_iter().collect())
    }

    /// Last known value of `key` on `alias`.
    ///
    /// Only keys owned by a tracked capability are answered.
    pub async fn last_device_value(
        &self,
        alias: &str,
        key: &str,
    ) -> Result<Option<String>, CoreError> {
        match &self.inner.attributes {
            AttributeStore::Pull(cell) => self.attribute_snapshot(cell).await?.last_value(alias, key),
            AttributeStore::Reconciled(cache) => cache.last_value(alias, key),
        }
    }

    /// When `alias` last had `key` set to exactly `value`.
    ///
    /// A pulling client only knows the device's last activity, and only
    /// while the value is still current.
    pub async fn last_device_timestamp(
        &self,
        alias: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        match &self.inner.attributes {
            AttributeStore::Pull(cell) => self
                .attribute_snapshot(cell)
                .await?
                .last_timestamp(alias, key, value),
            AttributeStore::Reconciled(cache) => cache.last_timestamp(alias, key, value),
        }
    }

    // ── Events ───────────────────────────────────────────────────

    /// Apply a pushed event to the cache.
    ///
    /// The device alias comes from the capability index when it knows the
    /// event's device id (even past its TTL), otherwise from the event.
    pub fn apply_event(&self, event: &Event) -> Outcome {
        match &self.inner.attributes {
            AttributeStore::Pull(_) => {
                debug!(key = %event.key, "pulling client ignores events");
                Outcome::Ignored(Ignored::NotReconciling)
            }
            AttributeStore::Reconciled(cache) => {
                let alias = match self.inner.index.peek() {
                    Some(index) => resolve_alias(event, &index),
                    None => event.alias.clone(),
                };
                cache.apply(event, alias.as_deref())
            }
        }
    }

    /// Drain `events` into [`apply_event`](Self::apply_event) until the
    /// channel closes or `cancel` fires.
    pub fn spawn_event_pump(
        &self,
        mut events: mpsc::Receiver<Event>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        client.apply_event(&event);
                    }
                }
            }
            debug!("event pump stopped");
        })
    }

    // ── Capability accessors ─────────────────────────────────────

    pub async fn get_contact_sensors(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::ContactSensor).await
    }

    pub async fn get_door_controls(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::DoorControl).await
    }

    pub async fn get_locks(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::Lock).await
    }

    pub async fn get_motion_sensors(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::MotionSensor).await
    }

    pub async fn get_switches(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::Switch).await
    }

    /// Presence sensors, one per tracked person.
    pub async fn get_users(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability(&Capability::PresenceSensor).await
    }

    // ── Attribute accessors ──────────────────────────────────────

    pub async fn get_open_doors(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability_and_attribute(&Capability::ContactSensor, "contact", "open")
            .await
    }

    pub async fn get_unlocked_doors(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability_and_attribute(&Capability::Lock, "lock", "unlocked")
            .await
    }

    pub async fn get_active_motion(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability_and_attribute(&Capability::MotionSensor, "motion", "active")
            .await
    }

    pub async fn get_on_switches(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability_and_attribute(&Capability::Switch, "switch", "on")
            .await
    }

    pub async fn get_present_users(&self) -> Result<BTreeSet<String>, CoreError> {
        self.devices_by_capability_and_attribute(&Capability::PresenceSensor, "presence", "present")
            .await
    }

    /// Illuminance per sensor, in lux.
    pub async fn get_lux_readings(&self) -> Result<BTreeMap<String, i64>, CoreError> {
        self.attribute_values(&Capability::IlluminanceMeasurement, "illuminance")
            .await?
            .into_iter()
            .map(|(alias, raw)| parse_lux(&raw).map(|lux| (alias, lux)))
            .collect()
    }

    // ── Device commands ──────────────────────────────────────────

    async fn command(
        &self,
        capability: Capability,
        alias: &str,
        command: &str,
        args: &[String],
    ) -> Result<Value, CoreError> {
        self.send_device_command_by_capability_and_alias(&capability, alias, command, args)
            .await
    }

    pub async fn open_door(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::DoorControl, alias, "open", &[]).await
    }

    pub async fn close_door(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::DoorControl, alias, "close", &[]).await
    }

    pub async fn lock_door(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::Lock, alias, "lock", &[]).await
    }

    pub async fn unlock_door(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::Lock, alias, "unlock", &[]).await
    }

    pub async fn turn_on_switch(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::Switch, alias, "on", &[]).await
    }

    pub async fn turn_off_switch(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::Switch, alias, "off", &[]).await
    }

    pub async fn arrived(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::PresenceSensor, alias, "arrived", &[]).await
    }

    pub async fn departed(&self, alias: &str) -> Result<Value, CoreError> {
        self.command(Capability::PresenceSensor, alias, "departed", &[]).await
    }

    /// Set a virtual illuminance sensor's reading.
    pub async fn set_lux(&self, alias: &str, lux: i64) -> Result<Value, CoreError> {
        self.command(
            Capability::IlluminanceMeasurement,
            alias,
            "setLux",
            &[lux.to_string()],
        )
        .await
    }

    // ── Speech (Echo Speaks) ─────────────────────────────────────

    pub async fn echo_set_volume_and_speak(
        &self,
        alias: &str,
        volume: u8,
        message: &str,
    ) -> Result<Value, CoreError> {
        let args = [volume.to_string(), message.to_owned()];
        self.command(Capability::SpeechSynthesis, alias, "setVolumeAndSpeak", &args)
            .await
    }

    /// Have the device act on `message` as if it were spoken to it.
    pub async fn echo_voice_cmd_as_text(
        &self,
        alias: &str,
        message: &str,
    ) -> Result<Value, CoreError> {
        let args = [message.to_owned()];
        self.command(Capability::SpeechSynthesis, alias, "voiceCmdAsText", &args)
            .await
    }

    pub async fn echo_parallel_speak(&self, alias: &str, message: &str) -> Result<Value, CoreError> {
        let args = [message.to_owned()];
        self.command(Capability::SpeechSynthesis, alias, "parallelSpeak", &args)
            .await
    }

    pub async fn echo_set_volume_speak_and_restore(
        &self,
        alias: &str,
        volume: u8,
        message: &str,
        restore_volume: u8,
    ) -> Result<Value, CoreError> {
        let args = [
            volume.to_string(),
            message.to_owned(),
            restore_volume.to_string(),
        ];
        self.command(
            Capability::SpeechSynthesis,
            alias,
            "setVolumeSpeakAndRestore",
            &args,
        )
        .await
    }

    pub async fn echo_play_announcement(
        &self,
        alias: &str,
        message: &str,
    ) -> Result<Value, CoreError> {
        let args = [message.to_owned()];
        self.command(Capability::SpeechSynthesis, alias, "playAnnouncement", &args)
            .await
    }

    pub async fn echo_play_announcement_all(
        &self,
        alias: &str,
        message: &str,
    ) -> Result<Value, CoreError> {
        let args = [message.to_owned()];
        self.command(Capability::SpeechSynthesis, alias, "playAnnouncementAll", &args)
            .await
    }

    /// Play an announcement on every speech device in `room`.
    pub async fn echo_room_announce(
        &self,
        room: &str,
        message: &str,
    ) -> Result<RoomBroadcast, CoreError> {
        self.broadcast(room, "playAnnouncement", message).await
    }

    /// Speak `message` on every speech device in `room`.
    pub async fn echo_room_speak(&self, room: &str, message: &str) -> Result<RoomBroadcast, CoreError> {
        self.broadcast(room, "parallelSpeak", message).await
    }

    async fn broadcast(
        &self,
        room: &str,
        command: &str,
        message: &str,
    ) -> Result<RoomBroadcast, CoreError> {
        let speakers = self
            .devices_by_capability_and_room(&Capability::SpeechSynthesis, Some(room))
            .await?;
        let args = [message.to_owned()];

        let mut report = RoomBroadcast::default();
        for alias in speakers {
            match self
                .command(Capability::SpeechSynthesis, &alias, command, &args)
                .await
            {
                Ok(_) => {
                    report.sent.insert(alias);
                }
                Err(e) => {
                    warn!(room, alias = %alias, error = %e, "room broadcast send failed");
                    report.failed.push((alias, e));
                }
            }
        }
        Ok(report)
    }

    // ── Mode ─────────────────────────────────────────────────────

    /// Name of the active mode.
    ///
    /// Fetched live when pulling; served from the cache when reconciled.
    pub async fn get_mode(&self) -> Result<Option<String>, CoreError> {
        match &self.inner.attributes {
            AttributeStore::Pull(_) => active_mode(&self.inner.api).await,
            AttributeStore::Reconciled(cache) => Ok(cache.mode()),
        }
    }

    /// Activate the mode called `name`.
    pub async fn set_mode(&self, name: &str) -> Result<(), CoreError> {
        let ids = self
            .inner
            .mode_ids
            .get_or_load(|| async {
                let modes = self.inner.api.list_modes().await?;
                let ids: BTreeMap<String, i64> =
                    modes.into_iter().map(|m| (m.name, m.id)).collect();
                Ok::<_, CoreError>(ids)
            })
            .await?;
        let id = *ids.get(name).ok_or_else(|| CoreError::ModeNotFound {
            name: name.to_owned(),
        })?;
        debug!(mode = name, id, "setting mode");
        self.inner.api.set_mode(id).await
    }

    // ── Security (HSM) ───────────────────────────────────────────

    pub async fn get_hsm(&self) -> Result<SecurityState, CoreError> {
        if let AttributeStore::Reconciled(cache) = &self.inner.attributes {
            if let Some(state) = cache.security() {
                return Ok(state);
            }
        }
        self.inner.api.get_security_state().await
    }

    /// Request HSM move to `state`.
    pub async fn set_hsm(&self, state: SecurityState) -> Result<(), CoreError> {
        let command = state
            .command()
            .ok_or(CoreError::InvalidSecurityTarget { state })?;
        self.send_hsm_command(command).await
    }

    pub async fn send_hsm_command(&self, command: SecurityCommand) -> Result<(), CoreError> {
        debug!(%command, "sending hsm command");
        self.inner.api.send_security_command(command).await
    }
}

// ── Helpers ──────────────────────────────────────────────────────

async fn active_mode<A: RemoteDeviceApi>(api: &A) -> Result<Option<String>, CoreError> {
    let modes = api.list_modes().await?;
    Ok(modes.into_iter().find(|m| m.active).map(|m| m.name))
}

/// Parse an illuminance reading; decimal readings are rounded.
#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn parse_lux(raw: &str) -> Result<i64, CoreError> {
    let raw = raw.trim();
    if let Ok(lux) = raw.parse::<i64>() {
        return Ok(lux);
    }
    match raw.parse::<f64>() {
        Ok(lux) if lux.is_finite() => Ok(lux.round() as i64),
        _ => Err(CoreError::UnexpectedValue {
            field: "illuminance".into(),
            value: raw.to_owned(),
        }),
    }
}
