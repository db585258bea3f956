// ── Event-maintained attribute tables ──
//
// Loaded once from a device snapshot, then patched by events. The primary
// map and the inverted value index live behind one lock so a reader never
// sees an alias in both value buckets or in neither.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::convert::parse_security_state;
use crate::error::CoreError;
use crate::model::{AliasKey, Capability, Device, DeviceId, Event, SecurityState};
use crate::reconcile::{EventTarget, Ignored, Outcome};

/// One device's entry under a capability.
///
/// Devices the hub listed carry their id, so two devices sharing an alias
/// never collapse into one entry. Events for unlisted devices without an
/// id are keyed by alias alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct Slot {
    alias: String,
    id: Option<DeviceId>,
}

#[derive(Debug)]
struct AttributeState {
    value: String,
    /// Last time each value was set for this attribute.
    seen: HashMap<String, DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct CacheTables {
    /// capability -> device -> key -> state
    current: HashMap<Capability, HashMap<Slot, HashMap<String, AttributeState>>>,
    /// capability -> key -> value -> devices
    by_value: HashMap<Capability, HashMap<String, HashMap<String, BTreeSet<Slot>>>>,
    mode: Option<String>,
    security: Option<SecurityState>,
}

impl CacheTables {
    fn load(
        devices: &[Device],
        alias_key: AliasKey,
        mode: Option<String>,
        security: Option<SecurityState>,
    ) -> Self {
        let mut tables = Self {
            mode,
            security,
            ..Self::default()
        };
        for device in devices {
            let slot = Slot {
                alias: device.alias(alias_key).to_owned(),
                id: Some(device.id),
            };
            for (key, value) in &device.attributes {
                match Capability::for_attribute(key) {
                    // Event-tracked keys live only where events update them.
                    Some(owner) => {
                        if device.has_capability(&owner) {
                            tables.set_attribute(&owner, &slot, key, value, device.last_activity);
                        }
                    }
                    None => {
                        for capability in &device.capabilities {
                            tables.set_attribute(capability, &slot, key, value, device.last_activity);
                        }
                    }
                }
            }
        }
        tables
    }

    /// The entry an attribute event for `alias` lands on.
    ///
    /// Without a device id the alias must name at most one entry.
    fn slot_for(
        &self,
        capability: &Capability,
        alias: &str,
        id: Option<DeviceId>,
    ) -> Result<Slot, Ignored> {
        if id.is_some() {
            return Ok(Slot {
                alias: alias.to_owned(),
                id,
            });
        }
        let mut named = self.slots_named(capability, alias);
        match (named.next(), named.next()) {
            (Some(_), Some(_)) => Err(Ignored::AmbiguousAlias),
            (Some(slot), None) => Ok(slot.clone()),
            (None, _) => Ok(Slot {
                alias: alias.to_owned(),
                id: None,
            }),
        }
    }

    fn slots_named<'a>(
        &'a self,
        capability: &'a Capability,
        alias: &'a str,
    ) -> impl Iterator<Item = &'a Slot> {
        self.current
            .get(capability)
            .into_iter()
            .flat_map(HashMap::keys)
            .filter(move |slot| slot.alias == alias)
    }

    /// Fail if any of `aliases` names more than one entry under `capability`.
    fn ensure_unambiguous<'a>(
        &self,
        capability: &Capability,
        aliases: impl IntoIterator<Item = &'a String>,
    ) -> Result<(), CoreError> {
        let duplicates: Vec<String> = aliases
            .into_iter()
            .filter(|alias| self.slots_named(capability, alias).nth(1).is_some())
            .cloned()
            .collect();
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MultipleDevicesFound {
                aliases: duplicates,
            })
        }
    }

    /// Write one attribute value and move the entry to its new bucket.
    fn set_attribute(
        &mut self,
        capability: &Capability,
        slot: &Slot,
        key: &str,
        value: &str,
        at: Option<DateTime<Utc>>,
    ) -> Option<String> {
        let attributes = self
            .current
            .entry(capability.clone())
            .or_default()
            .entry(slot.clone())
            .or_default();

        let previous = if let Some(state) = attributes.get_mut(key) {
            Some(std::mem::replace(&mut state.value, value.to_owned()))
        } else {
            attributes.insert(
                key.to_owned(),
                AttributeState {
                    value: value.to_owned(),
                    seen: HashMap::new(),
                },
            );
            None
        };
        if let (Some(at), Some(state)) = (at, attributes.get_mut(key)) {
            state.seen.insert(value.to_owned(), at);
        }

        let buckets = self
            .by_value
            .entry(capability.clone())
            .or_default()
            .entry(key.to_owned())
            .or_default();
        if let Some(old) = previous.as_deref().filter(|old| *old != value) {
            if let Some(bucket) = buckets.get_mut(old) {
                bucket.remove(slot);
                if bucket.is_empty() {
                    buckets.remove(old);
                }
            }
        }
        buckets
            .entry(value.to_owned())
            .or_default()
            .insert(slot.clone());

        previous
    }

    fn state(&self, alias: &str, key: &str) -> Result<Option<&AttributeState>, CoreError> {
        let Some(capability) = Capability::for_attribute(key) else {
            return Ok(None);
        };
        let mut named = self.slots_named(&capability, alias);
        let first = named.next();
        if named.next().is_some() {
            return Err(CoreError::MultipleDevicesFound {
                aliases: vec![alias.to_owned()],
            });
        }
        Ok(first
            .and_then(|slot| self.current.get(&capability)?.get(slot))
            .and_then(|attrs| attrs.get(key)))
    }
}

/// Attribute cache for the reconciled strategy.
#[derive(Debug, Default)]
pub struct ReconciledCache {
    tables: RwLock<CacheTables>,
}

impl ReconciledCache {
    /// Build the tables from a snapshot plus the current mode and HSM status.
    pub fn load(
        devices: &[Device],
        alias_key: AliasKey,
        mode: Option<String>,
        security: Option<SecurityState>,
    ) -> Self {
        Self {
            tables: RwLock::new(CacheTables::load(devices, alias_key, mode, security)),
        }
    }

    /// Replace every table with a fresh snapshot.
    ///
    /// The new tables are built before the write lock is taken.
    pub fn reload(
        &self,
        devices: &[Device],
        alias_key: AliasKey,
        mode: Option<String>,
        security: Option<SecurityState>,
    ) {
        let fresh = CacheTables::load(devices, alias_key, mode, security);
        *self.write() = fresh;
        debug!(devices = devices.len(), "reconciled cache reloaded");
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheTables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheTables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Event application ────────────────────────────────────────────

    /// Apply one event. `alias` is the resolved device alias, if any; the
    /// event's device id picks the entry when present.
    ///
    /// Events are applied in arrival order; a late event overwrites a newer
    /// value regardless of its timestamp.
    pub fn apply(&self, event: &Event, alias: Option<&str>) -> Outcome {
        match EventTarget::classify(&event.key) {
            EventTarget::Mode => {
                let previous = self.write().mode.replace(event.value.clone());
                trace!(mode = %event.value, "mode updated");
                Outcome::Mode { previous }
            }
            EventTarget::Security => match parse_security_state(&event.value) {
                Ok(state) => {
                    let previous = self.write().security.replace(state);
                    trace!(%state, "hsm status updated");
                    Outcome::Security { previous }
                }
                Err(_) => {
                    warn!(value = %event.value, "ignoring unknown hsm status");
                    Outcome::Ignored(Ignored::UnknownSecurityState)
                }
            },
            EventTarget::Attribute(capability) => {
                let Some(alias) = alias else {
                    warn!(key = %event.key, device_id = ?event.device_id, "ignoring event for unknown device");
                    return Outcome::Ignored(Ignored::UnresolvedAlias);
                };
                let mut tables = self.write();
                let slot = match tables.slot_for(&capability, alias, event.device_id) {
                    Ok(slot) => slot,
                    Err(reason) => {
                        warn!(%capability, alias, key = %event.key, "ignoring event for shared alias");
                        return Outcome::Ignored(reason);
                    }
                };
                let previous = tables.set_attribute(
                    &capability,
                    &slot,
                    &event.key,
                    &event.value,
                    Some(event.timestamp),
                );
                drop(tables);
                trace!(%capability, alias, key = %event.key, value = %event.value, "attribute updated");
                Outcome::Attribute {
                    capability,
                    alias: alias.to_owned(),
                    previous,
                }
            }
            EventTarget::Unmapped => {
                debug!(key = %event.key, "ignoring untracked event key");
                Outcome::Ignored(Ignored::UnmappedKey)
            }
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Aliases under `capability` whose `key` currently equals `value`.
    ///
    /// Fails if a matching alias names more than one cached device.
    pub fn aliases_with(
        &self,
        capability: &Capability,
        key: &str,
        value: &str,
    ) -> Result<BTreeSet<String>, CoreError> {
        let tables = self.read();
        let aliases: BTreeSet<String> = tables
            .by_value
            .get(capability)
            .and_then(|keys| keys.get(key))
            .and_then(|values| values.get(value))
            .map(|slots| slots.iter().map(|slot| slot.alias.clone()).collect())
            .unwrap_or_default();
        tables.ensure_unambiguous(capability, &aliases)?;
        Ok(aliases)
    }

    /// Current value of `key` for every alias under `capability` that has it.
    pub fn attribute_values(
        &self,
        capability: &Capability,
        key: &str,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        let tables = self.read();
        let values: BTreeMap<String, String> = tables
            .current
            .get(capability)
            .map(|slots| {
                slots
                    .iter()
                    .filter_map(|(slot, attrs)| {
                        attrs.get(key).map(|s| (slot.alias.clone(), s.value.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        tables.ensure_unambiguous(capability, values.keys())?;
        Ok(values)
    }

    pub fn last_value(&self, alias: &str, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.read().state(alias, key)?.map(|s| s.value.clone()))
    }

    pub fn last_timestamp(
        &self,
        alias: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        Ok(self
            .read()
            .state(alias, key)?
            .and_then(|s| s.seen.get(value).copied()))
    }

    pub fn mode(&self) -> Option<String> {
        self.read().mode.clone()
    }

    pub fn security(&self) -> Option<SecurityState> {
        self.read().security
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;

    fn switch(id: i64, label: &str, state: &str) -> Device {
        Device {
            id: DeviceId(id),
            name: format!("switch-{id}"),
            label: Some(label.into()),
            room: None,
            device_type: None,
            capabilities: vec![Capability::Switch],
            attributes: BTreeMap::from([("switch".to_owned(), state.to_owned())]),
            last_activity: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }

    fn cache() -> ReconciledCache {
        ReconciledCache::load(
            &[switch(1, "Kitchen Ceiling", "on"), switch(2, "Porch Light", "off")],
            AliasKey::Label,
            Some("Day".into()),
            Some(SecurityState::Disarmed),
        )
    }

    /// Every primary entry sits in exactly its value's bucket, and every
    /// bucket member has that value in the primary map.
    fn assert_consistent(cache: &ReconciledCache) {
        let tables = cache.read();
        for (capability, slots) in &tables.current {
            for (slot, attrs) in slots {
                for (key, state) in attrs {
                    let buckets = &tables.by_value[capability][key];
                    for (value, members) in buckets {
                        assert_eq!(
                            members.contains(slot),
                            *value == state.value,
                            "{capability}/{slot:?}/{key} misplaced in bucket {value}"
                        );
                    }
                }
            }
        }
        for (capability, keys) in &tables.by_value {
            for (key, values) in keys {
                for (value, members) in values {
                    assert!(!members.is_empty(), "empty bucket left behind");
                    for slot in members {
                        assert_eq!(&tables.current[capability][slot][key].value, value);
                    }
                }
            }
        }
    }

    fn on_switches(cache: &ReconciledCache) -> Vec<String> {
        cache
            .aliases_with(&Capability::Switch, "switch", "on")
            .unwrap()
            .into_iter()
            .collect()
    }

    #[test]
    fn snapshot_populates_buckets() {
        let cache = cache();
        assert_eq!(on_switches(&cache), ["Kitchen Ceiling"]);
        assert_eq!(cache.mode().as_deref(), Some("Day"));
        assert_eq!(cache.security(), Some(SecurityState::Disarmed));
        assert_consistent(&cache);
    }

    #[test]
    fn switch_events_move_aliases_between_buckets() {
        let cache = cache();

        cache.apply(&Event::new("switch", "off"), Some("Kitchen Ceiling"));
        assert_consistent(&cache);
        assert!(on_switches(&cache).is_empty());

        let outcome = cache.apply(&Event::new("switch", "on"), Some("Porch Light"));
        assert_consistent(&cache);
        assert_eq!(on_switches(&cache), ["Porch Light"]);
        assert_eq!(
            outcome,
            Outcome::Attribute {
                capability: Capability::Switch,
                alias: "Porch Light".into(),
                previous: Some("off".into()),
            }
        );
        assert_eq!(
            cache
                .aliases_with(&Capability::Switch, "switch", "off")
                .unwrap()
                .into_iter()
                .collect::<Vec<_>>(),
            ["Kitchen Ceiling"]
        );
    }

    #[test]
    fn repeated_value_keeps_single_membership() {
        let cache = cache();
        cache.apply(&Event::new("switch", "on"), Some("Kitchen Ceiling"));
        cache.apply(&Event::new("switch", "on"), Some("Kitchen Ceiling"));
        assert_eq!(on_switches(&cache), ["Kitchen Ceiling"]);
        assert_consistent(&cache);
    }

    #[test]
    fn event_for_new_alias_creates_entry() {
        let cache = cache();
        let outcome = cache.apply(&Event::new("contact", "open"), Some("Back Door"));
        assert!(matches!(outcome, Outcome::Attribute { previous: None, .. }));
        assert_eq!(
            cache
                .aliases_with(&Capability::ContactSensor, "contact", "open")
                .unwrap()
                .len(),
            1
        );
        assert_consistent(&cache);
    }

    #[test]
    fn mode_and_hsm_events_overwrite_singletons() {
        let cache = cache();

        let outcome = cache.apply(&Event::new("mode", "Night"), None);
        assert_eq!(outcome, Outcome::Mode { previous: Some("Day".into()) });
        assert_eq!(cache.mode().as_deref(), Some("Night"));

        cache.apply(&Event::new("hsmStatus", "armedAway"), None);
        assert_eq!(cache.security(), Some(SecurityState::ArmedAway));

        let outcome = cache.apply(&Event::new("hsmStatus", "bogus"), None);
        assert_eq!(outcome, Outcome::Ignored(Ignored::UnknownSecurityState));
        assert_eq!(cache.security(), Some(SecurityState::ArmedAway));
    }

    #[test]
    fn unmapped_and_unresolved_events_are_ignored() {
        let cache = cache();
        assert_eq!(
            cache.apply(&Event::new("battery", "80"), Some("Kitchen Ceiling")),
            Outcome::Ignored(Ignored::UnmappedKey)
        );
        assert_eq!(
            cache.apply(&Event::new("switch", "off"), None),
            Outcome::Ignored(Ignored::UnresolvedAlias)
        );
        assert_eq!(on_switches(&cache), ["Kitchen Ceiling"]);
    }

    #[test]
    fn timestamps_track_each_value() {
        let cache = cache();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 0).unwrap();

        assert!(cache.last_timestamp("Porch Light", "switch", "on").unwrap().is_none());

        cache.apply(&Event::new("switch", "on").at(t1), Some("Porch Light"));
        cache.apply(&Event::new("switch", "off").at(t2), Some("Porch Light"));

        assert_eq!(cache.last_timestamp("Porch Light", "switch", "on").unwrap(), Some(t1));
        assert_eq!(cache.last_timestamp("Porch Light", "switch", "off").unwrap(), Some(t2));
        assert_eq!(cache.last_value("Porch Light", "switch").unwrap().as_deref(), Some("off"));
    }

    #[test]
    fn late_event_overwrites_newer_value() {
        let cache = cache();
        let newer = Utc.with_ymd_and_hms(2024, 6, 1, 9, 5, 0).unwrap();
        let older = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        cache.apply(&Event::new("switch", "on").at(newer), Some("Porch Light"));
        cache.apply(&Event::new("switch", "off").at(older), Some("Porch Light"));

        assert_eq!(cache.last_value("Porch Light", "switch").unwrap().as_deref(), Some("off"));
    }

    #[test]
    fn reload_replaces_tables() {
        let cache = cache();
        cache.apply(&Event::new("switch", "on"), Some("Porch Light"));
        cache.reload(
            &[switch(3, "Den Lamp", "on")],
            AliasKey::Label,
            Some("Away".into()),
            None,
        );
        assert_eq!(on_switches(&cache), ["Den Lamp"]);
        assert_eq!(cache.mode().as_deref(), Some("Away"));
        assert_consistent(&cache);
    }

    #[test]
    fn shared_alias_keeps_one_entry_per_device() {
        let cache = ReconciledCache::load(
            &[switch(1, "Lamp", "on"), switch(2, "Lamp", "off")],
            AliasKey::Label,
            None,
            None,
        );
        assert_consistent(&cache);

        let err = cache
            .aliases_with(&Capability::Switch, "switch", "on")
            .unwrap_err();
        assert!(matches!(err, CoreError::MultipleDevicesFound { ref aliases } if aliases == &["Lamp"]));
        assert!(cache.attribute_values(&Capability::Switch, "switch").unwrap_err().is_ambiguous());
        assert!(cache.last_value("Lamp", "switch").unwrap_err().is_ambiguous());

        // An alias alone cannot say which lamp changed.
        assert_eq!(
            cache.apply(&Event::new("switch", "on"), Some("Lamp")),
            Outcome::Ignored(Ignored::AmbiguousAlias)
        );

        let outcome = cache.apply(&Event::new("switch", "on").for_device(DeviceId(2)), Some("Lamp"));
        assert!(matches!(outcome, Outcome::Attribute { previous: Some(ref v), .. } if v == "off"));
        assert_consistent(&cache);
        assert_eq!(cache.read().by_value[&Capability::Switch]["switch"]["on"].len(), 2);
        assert!(!cache.read().by_value[&Capability::Switch]["switch"].contains_key("off"));
    }

    #[test]
    fn tracked_keys_load_under_their_own_capability() {
        let level = Capability::from("SwitchLevel");
        let mut dimmer = switch(7, "Dimmer", "off");
        dimmer.capabilities.push(level.clone());
        dimmer.attributes.insert("level".into(), "40".into());
        // A tracked key the device has no capability for is not cached.
        dimmer.attributes.insert("motion".into(), "active".into());

        let cache = ReconciledCache::load(&[dimmer], AliasKey::Label, None, None);
        cache.apply(&Event::new("switch", "on"), Some("Dimmer"));

        assert_eq!(on_switches(&cache), ["Dimmer"]);
        assert!(cache.aliases_with(&level, "switch", "off").unwrap().is_empty());
        assert!(cache.attribute_values(&level, "switch").unwrap().is_empty());
        assert!(cache.aliases_with(&Capability::MotionSensor, "motion", "active").unwrap().is_empty());
        // Untracked keys stay readable under every capability.
        assert_eq!(
            cache.attribute_values(&level, "level").unwrap(),
            BTreeMap::from([("Dimmer".to_owned(), "40".to_owned())])
        );
        assert_eq!(
            cache.attribute_values(&Capability::Switch, "level").unwrap().len(),
            1
        );
        assert_consistent(&cache);
    }

    #[test]
    fn concurrent_events_keep_tables_consistent() {
        let cache = Arc::new(cache());
        let writers: Vec<_> = (0..4)
            .map(|n| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..200 {
                        let value = if (i + n) % 2 == 0 { "on" } else { "off" };
                        let alias = if n % 2 == 0 { "Kitchen Ceiling" } else { "Porch Light" };
                        cache.apply(&Event::new("switch", value), Some(alias));
                    }
                })
            })
            .collect();

        for _ in 0..200 {
            let values = cache.attribute_values(&Capability::Switch, "switch").unwrap();
            assert_eq!(values.len(), 2);
        }
        for writer in writers {
            writer.join().unwrap();
        }
        assert_consistent(&cache);
    }
}
