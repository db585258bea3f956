// Integration tests for `HubClient` against an in-memory hub.
#![allow(clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_test::assert_ok;
use tokio_util::sync::CancellationToken;

use hubitat_core::{
    AliasKey, CacheOptions, CacheStrategy, Capability, CoreError, Device, DeviceId, Event,
    HubClient, Ignored, Mode, Outcome, RemoteDeviceApi, SecurityCommand, SecurityState,
};

// ── Fake hub ────────────────────────────────────────────────────────

#[derive(Default)]
struct FakeHub {
    devices: Mutex<Vec<Device>>,
    modes: Mutex<Vec<Mode>>,
    hsm: Mutex<Option<SecurityState>>,
    failing: HashSet<DeviceId>,
    listing_down: AtomicBool,
    device_calls: AtomicUsize,
    commands: Mutex<Vec<(DeviceId, String, Vec<String>)>>,
    mode_calls: Mutex<Vec<i64>>,
    hsm_commands: Mutex<Vec<SecurityCommand>>,
}

impl FakeHub {
    fn commands(&self) -> Vec<(DeviceId, String, Vec<String>)> {
        self.commands.lock().unwrap().clone()
    }

    fn set_attribute(&self, id: i64, key: &str, value: &str) {
        let mut devices = self.devices.lock().unwrap();
        let device = devices.iter_mut().find(|d| d.id == DeviceId(id)).unwrap();
        device.attributes.insert(key.into(), value.into());
    }
}

fn unavailable() -> CoreError {
    CoreError::Api(hubitat_api::Error::Http {
        status: 503,
        body: "hub busy".into(),
    })
}

impl RemoteDeviceApi for FakeHub {
    async fn list_devices(&self, _brief: bool) -> Result<Vec<Device>, CoreError> {
        self.device_calls.fetch_add(1, Ordering::SeqCst);
        if self.listing_down.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn get_device(&self, id: DeviceId) -> Result<Device, CoreError> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| {
                CoreError::Api(hubitat_api::Error::Http {
                    status: 404,
                    body: String::new(),
                })
            })
    }

    async fn list_modes(&self) -> Result<Vec<Mode>, CoreError> {
        Ok(self.modes.lock().unwrap().clone())
    }

    async fn get_security_state(&self) -> Result<SecurityState, CoreError> {
        (*self.hsm.lock().unwrap()).ok_or_else(unavailable)
    }

    async fn send_device_command(
        &self,
        id: DeviceId,
        command: &str,
        args: &[String],
    ) -> Result<Value, CoreError> {
        if self.failing.contains(&id) {
            return Err(unavailable());
        }
        self.commands
            .lock()
            .unwrap()
            .push((id, command.to_owned(), args.to_vec()));
        Ok(json!({ "id": id.to_string(), "command": command }))
    }

    async fn set_mode(&self, mode_id: i64) -> Result<(), CoreError> {
        self.mode_calls.lock().unwrap().push(mode_id);
        Ok(())
    }

    async fn send_security_command(&self, command: SecurityCommand) -> Result<(), CoreError> {
        self.hsm_commands.lock().unwrap().push(command);
        Ok(())
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn device(id: i64, label: &str, room: Option<&str>, caps: &[Capability], attrs: &[(&str, &str)]) -> Device {
    Device {
        id: DeviceId(id),
        name: format!("Generic Device {id}"),
        label: Some(label.into()),
        room: room.map(Into::into),
        device_type: None,
        capabilities: caps.to_vec(),
        attributes: attrs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect(),
        last_activity: Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()),
    }
}

fn home() -> FakeHub {
    let hub = FakeHub::default();
    *hub.devices.lock().unwrap() = vec![
        device(1, "Kitchen Ceiling", Some("Kitchen"), &[Capability::Switch], &[("switch", "on")]),
        device(2, "Porch Light", None, &[Capability::Switch], &[("switch", "off")]),
        device(3, "Office", Some("Office"), &[Capability::IlluminanceMeasurement], &[("illuminance", "30")]),
        device(4, "Porch", None, &[Capability::IlluminanceMeasurement], &[("illuminance", "70")]),
        device(5, "Front Door", None, &[Capability::Lock, Capability::ContactSensor], &[("lock", "locked"), ("contact", "closed")]),
        device(6, "Kitchen Echo", Some("Kitchen"), &[Capability::SpeechSynthesis], &[]),
        device(7, "Kitchen Show", Some("Kitchen"), &[Capability::SpeechSynthesis], &[]),
        device(8, "Alex", None, &[Capability::PresenceSensor], &[("presence", "present")]),
    ];
    *hub.modes.lock().unwrap() = vec![
        Mode { id: 1, name: "Day".into(), active: true },
        Mode { id: 2, name: "Night".into(), active: false },
    ];
    *hub.hsm.lock().unwrap() = Some(SecurityState::Disarmed);
    hub
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| (*s).to_owned()).collect()
}

fn switch_event(alias: &str, value: &str) -> Event {
    Event::new("switch", value).with_alias(alias)
}

async fn reconciled(hub: FakeHub) -> HubClient<FakeHub> {
    HubClient::reconciled(hub, CacheOptions::default()).await.unwrap()
}

// ── Pull strategy ───────────────────────────────────────────────────

#[tokio::test]
async fn pull_answers_capability_queries() {
    let client = HubClient::pull(home(), CacheOptions::default());

    assert_eq!(client.get_switches().await.unwrap(), set(&["Kitchen Ceiling", "Porch Light"]));
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
    assert_eq!(client.get_locks().await.unwrap(), set(&["Front Door"]));
    assert!(client.get_unlocked_doors().await.unwrap().is_empty());
    assert!(client.get_open_doors().await.unwrap().is_empty());
    assert_eq!(client.get_present_users().await.unwrap(), set(&["Alex"]));
    assert_eq!(
        client.get_lux_readings().await.unwrap(),
        BTreeMap::from([("Office".to_owned(), 30), ("Porch".to_owned(), 70)])
    );
}

#[tokio::test(start_paused = true)]
async fn pull_refetches_after_attribute_ttl() {
    let client = HubClient::pull(home(), CacheOptions::default());

    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
    let calls = client.api().device_calls.load(Ordering::SeqCst);

    client.api().set_attribute(2, "switch", "on");
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
    assert_eq!(client.api().device_calls.load(Ordering::SeqCst), calls);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(
        client.get_on_switches().await.unwrap(),
        set(&["Kitchen Ceiling", "Porch Light"])
    );
    assert_eq!(client.api().device_calls.load(Ordering::SeqCst), calls + 1);
}

#[tokio::test(start_paused = true)]
async fn index_outlives_attribute_snapshot() {
    let client = HubClient::pull(home(), CacheOptions::default());

    client.get_switches().await.unwrap();
    client.get_on_switches().await.unwrap();
    let calls = client.api().device_calls.load(Ordering::SeqCst);

    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    client.get_switches().await.unwrap();
    assert_eq!(client.api().device_calls.load(Ordering::SeqCst), calls);

    tokio::time::advance(Duration::from_secs(24 * 60 * 60)).await;
    client.get_switches().await.unwrap();
    assert_eq!(client.api().device_calls.load(Ordering::SeqCst), calls + 1);
}

#[tokio::test]
async fn pull_ignores_events() {
    let client = HubClient::pull(home(), CacheOptions::default());
    assert_eq!(
        client.apply_event(&switch_event("Porch Light", "on")),
        Outcome::Ignored(Ignored::NotReconciling)
    );
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
}

#[tokio::test]
async fn pull_reads_mode_and_hsm_live() {
    let client = HubClient::pull(home(), CacheOptions::default());
    assert_eq!(client.get_mode().await.unwrap().as_deref(), Some("Day"));

    client.api().modes.lock().unwrap()[0].active = false;
    client.api().modes.lock().unwrap()[1].active = true;
    assert_eq!(client.get_mode().await.unwrap().as_deref(), Some("Night"));

    assert_eq!(client.get_hsm().await.unwrap(), SecurityState::Disarmed);
}

// ── Reconciled strategy ─────────────────────────────────────────────

#[tokio::test]
async fn reconciled_follows_switch_events() {
    let client = reconciled(home()).await;
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));

    client.apply_event(&switch_event("Kitchen Ceiling", "off"));
    client.apply_event(&switch_event("Porch Light", "on"));

    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Porch Light"]));
}

#[tokio::test]
async fn reconciled_never_repolls() {
    let client = reconciled(home()).await;
    let calls = client.api().device_calls.load(Ordering::SeqCst);

    client.api().set_attribute(2, "switch", "on");
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
    assert_eq!(client.api().device_calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn reconciled_mode_follows_events() {
    let client = reconciled(home()).await;
    assert_eq!(client.get_mode().await.unwrap().as_deref(), Some("Day"));

    client.apply_event(&Event::new("mode", "Night"));
    assert_eq!(client.get_mode().await.unwrap().as_deref(), Some("Night"));
}

#[tokio::test]
async fn reconciled_hsm_follows_events() {
    let client = reconciled(home()).await;
    assert_eq!(client.get_hsm().await.unwrap(), SecurityState::Disarmed);

    client.apply_event(&Event::new("hsmStatus", "armedNight"));
    assert_eq!(client.get_hsm().await.unwrap(), SecurityState::ArmedNight);
}

#[tokio::test]
async fn reconciled_records_value_timestamps() {
    let client = reconciled(home()).await;
    let at = Utc.with_ymd_and_hms(2024, 6, 2, 18, 30, 0).unwrap();

    assert_eq!(
        client.last_device_timestamp("Porch Light", "switch", "on").await.unwrap(),
        None
    );

    client.apply_event(&switch_event("Porch Light", "on").at(at));

    assert_eq!(
        client.last_device_timestamp("Porch Light", "switch", "on").await.unwrap(),
        Some(at)
    );
    assert_eq!(
        client.last_device_value("Porch Light", "switch").await.unwrap().as_deref(),
        Some("on")
    );
    // Snapshot values carry the device's last activity.
    assert_eq!(
        client.last_device_timestamp("Porch Light", "switch", "off").await.unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap())
    );
}

#[tokio::test]
async fn events_resolve_alias_through_device_id() {
    let hub = home();
    let options = CacheOptions::default()
        .with_alias_key(AliasKey::Name)
        .with_strategy(CacheStrategy::Reconciled);
    let client = HubClient::connect(hub, options).await.unwrap();
    assert_eq!(client.strategy(), CacheStrategy::Reconciled);

    let outcome = client.apply_event(
        &Event::new("switch", "on")
            .for_device(DeviceId(2))
            .with_alias("Porch Light"),
    );

    assert!(matches!(outcome, Outcome::Attribute { ref alias, .. } if alias == "Generic Device 2"));
    assert!(client.get_on_switches().await.unwrap().contains("Generic Device 2"));
}

#[tokio::test]
async fn refresh_reloads_reconciled_tables() {
    let client = reconciled(home()).await;
    client.apply_event(&switch_event("Porch Light", "on"));

    client.api().set_attribute(1, "switch", "off");
    assert_ok!(client.refresh().await);

    assert!(client.get_on_switches().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_refresh_keeps_index_for_events() {
    let options = CacheOptions::default().with_alias_key(AliasKey::Name);
    let client = HubClient::reconciled(home(), options).await.unwrap();
    client.api().listing_down.store(true, Ordering::SeqCst);

    assert!(client.refresh().await.is_err());

    // The event's display name must not leak in as a second alias.
    let outcome = client.apply_event(
        &Event::new("switch", "on")
            .for_device(DeviceId(2))
            .with_alias("Porch Light"),
    );
    assert!(matches!(outcome, Outcome::Attribute { ref alias, .. } if alias == "Generic Device 2"));
    assert_eq!(
        client.get_on_switches().await.unwrap(),
        set(&["Generic Device 1", "Generic Device 2"])
    );
}

#[tokio::test]
async fn event_pump_drains_channel_until_cancelled() {
    let client = reconciled(home()).await;
    let (tx, rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let pump = client.spawn_event_pump(rx, cancel.clone());

    tx.send(switch_event("Kitchen Ceiling", "off")).await.unwrap();
    tx.send(Event::new("mode", "Night")).await.unwrap();
    drop(tx);
    pump.await.unwrap();

    assert!(client.get_on_switches().await.unwrap().is_empty());
    assert_eq!(client.get_mode().await.unwrap().as_deref(), Some("Night"));

    let (_tx, rx) = mpsc::channel::<Event>(1);
    let pump = client.spawn_event_pump(rx, cancel.clone());
    cancel.cancel();
    pump.await.unwrap();
}

// ── Ambiguity & lookup failures ─────────────────────────────────────

fn duplicated() -> FakeHub {
    let hub = home();
    hub.devices.lock().unwrap().push(device(
        9,
        "Porch Light",
        None,
        &[Capability::Switch],
        &[("switch", "off")],
    ));
    hub
}

#[tokio::test]
async fn duplicate_alias_fails_queries_and_commands() {
    let client = HubClient::pull(duplicated(), CacheOptions::default());

    assert!(client.get_switches().await.unwrap_err().is_ambiguous());
    assert!(client.turn_on_switch("Porch Light").await.unwrap_err().is_ambiguous());
    assert_eq!(client.turn_on_switch("Kitchen Ceiling").await.unwrap()["command"], "on");
    // Only matching aliases are checked.
    assert_eq!(client.get_on_switches().await.unwrap(), set(&["Kitchen Ceiling"]));
    assert!(client.api().commands().len() == 1);
}

#[tokio::test]
async fn duplicate_alias_fails_reconciled_lookup() {
    let client = reconciled(duplicated()).await;

    assert!(client.get_on_switches().await.is_ok());
    // Without a device id the event cannot pick a Porch Light.
    assert_eq!(
        client.apply_event(&switch_event("Porch Light", "on")),
        Outcome::Ignored(Ignored::AmbiguousAlias)
    );
    client.apply_event(&switch_event("Porch Light", "on").for_device(DeviceId(9)));
    let err = client.get_on_switches().await.unwrap_err();
    assert!(matches!(err, CoreError::MultipleDevicesFound { ref aliases } if aliases == &["Porch Light"]));
}

#[tokio::test]
async fn shared_alias_with_split_values_is_ambiguous() {
    let lamps = || {
        let hub = home();
        hub.devices.lock().unwrap().extend([
            device(10, "Lamp", None, &[Capability::Switch], &[("switch", "on")]),
            device(11, "Lamp", None, &[Capability::Switch], &[("switch", "off")]),
        ]);
        hub
    };
    let pull = HubClient::pull(lamps(), CacheOptions::default());
    let reconciled = reconciled(lamps()).await;

    for client in [&pull, &reconciled] {
        let err = client.get_on_switches().await.unwrap_err();
        assert!(matches!(err, CoreError::MultipleDevicesFound { ref aliases } if aliases == &["Lamp"]));
        assert!(client.last_device_value("Lamp", "switch").await.unwrap_err().is_ambiguous());
    }
}

#[tokio::test]
async fn alias_under_other_capability_is_not_found() {
    let client = HubClient::pull(home(), CacheOptions::default());

    let err = client.open_door("Front Door").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::DeviceNotFound { capability: Capability::DoorControl, ref alias } if alias == "Front Door"
    ));
    assert!(client.api().commands().is_empty());
}

#[tokio::test]
async fn upstream_errors_propagate_unmodified() {
    let client = HubClient::pull(home(), CacheOptions::default());
    *client.api().hsm.lock().unwrap() = None;

    let err = client.get_hsm().await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Api(hubitat_api::Error::Http { status: 503, .. })
    ));
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn commands_resolve_alias_to_device_id() {
    let client = HubClient::pull(home(), CacheOptions::default());

    client.turn_on_switch("Porch Light").await.unwrap();
    client.lock_door("Front Door").await.unwrap();
    client.set_lux("Office", 45).await.unwrap();
    client.departed("Alex").await.unwrap();
    client
        .echo_set_volume_speak_and_restore("Kitchen Echo", 60, "dinner", 30)
        .await
        .unwrap();

    assert_eq!(
        client.api().commands(),
        vec![
            (DeviceId(2), "on".to_owned(), vec![]),
            (DeviceId(5), "lock".to_owned(), vec![]),
            (DeviceId(3), "setLux".to_owned(), vec!["45".to_owned()]),
            (DeviceId(8), "departed".to_owned(), vec![]),
            (
                DeviceId(6),
                "setVolumeSpeakAndRestore".to_owned(),
                vec!["60".to_owned(), "dinner".to_owned(), "30".to_owned()]
            ),
        ]
    );
}

#[tokio::test]
async fn room_broadcast_continues_past_failures() {
    let mut hub = home();
    hub.failing.insert(DeviceId(7));
    let client = HubClient::pull(hub, CacheOptions::default());

    let report = client.echo_room_announce("Kitchen", "dinner is ready").await.unwrap();

    assert_eq!(report.sent, set(&["Kitchen Echo"]));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Kitchen Show");
    assert!(!report.is_complete());
    assert_eq!(
        client.api().commands(),
        vec![(
            DeviceId(6),
            "playAnnouncement".to_owned(),
            vec!["dinner is ready".to_owned()]
        )]
    );
}

#[tokio::test]
async fn room_speak_in_empty_room_sends_nothing() {
    let client = HubClient::pull(home(), CacheOptions::default());
    let report = client.echo_room_speak("Attic", "hello").await.unwrap();
    assert!(report.sent.is_empty());
    assert!(report.is_complete());
}

#[tokio::test]
async fn set_mode_by_name() {
    let client = HubClient::pull(home(), CacheOptions::default());

    client.set_mode("Night").await.unwrap();
    assert_eq!(*client.api().mode_calls.lock().unwrap(), [2]);

    let err = client.set_mode("Vacation").await.unwrap_err();
    assert!(matches!(err, CoreError::ModeNotFound { ref name } if name == "Vacation"));
}

#[tokio::test]
async fn set_hsm_maps_state_to_command() {
    let client = HubClient::pull(home(), CacheOptions::default());

    client.set_hsm(SecurityState::ArmedAway).await.unwrap();
    client.set_hsm(SecurityState::AllDisarmed).await.unwrap();
    client.send_hsm_command(SecurityCommand::CancelAlerts).await.unwrap();

    let err = client.set_hsm(SecurityState::ArmingHome).await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidSecurityTarget { state: SecurityState::ArmingHome }
    ));
    assert_eq!(
        *client.api().hsm_commands.lock().unwrap(),
        [
            SecurityCommand::ArmAway,
            SecurityCommand::DisarmAll,
            SecurityCommand::CancelAlerts
        ]
    );
}

#[tokio::test]
async fn capabilities_for_device_id_are_fetched_live() {
    let client = HubClient::pull(home(), CacheOptions::default());

    let caps = client.capabilities_for_device_id(DeviceId(5)).await.unwrap();
    assert_eq!(
        caps,
        BTreeSet::from([Capability::ContactSensor, Capability::Lock])
    );
    assert!(client.capabilities_for_device_id(DeviceId(99)).await.unwrap_err().is_not_found());
}
