// ── Pulled attribute snapshot ──
//
// Capability to alias to attributes, rebuilt from `/devices/all` whenever
// the short attribute TTL lapses. Events never touch it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::error::CoreError;
use crate::model::{AliasKey, Capability, Device};

#[derive(Debug)]
struct Entry {
    alias: String,
    attributes: BTreeMap<String, String>,
    last_activity: Option<DateTime<Utc>>,
}

/// Attribute values as of one device listing.
#[derive(Debug, Default)]
pub struct AttributeSnapshot {
    entries: HashMap<Capability, Vec<Entry>>,
}

impl AttributeSnapshot {
    pub fn build(devices: &[Device], alias_key: AliasKey) -> Self {
        let mut entries: HashMap<Capability, Vec<Entry>> = HashMap::new();
        for device in devices {
            for capability in &device.capabilities {
                entries.entry(capability.clone()).or_default().push(Entry {
                    alias: device.alias(alias_key).to_owned(),
                    attributes: device.attributes.clone(),
                    last_activity: device.last_activity,
                });
            }
        }
        Self { entries }
    }

    fn entries(&self, capability: &Capability) -> &[Entry] {
        self.entries.get(capability).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fail if any of `aliases` names more than one device under `capability`,
    /// whether or not the other devices matched the query.
    fn ensure_unambiguous<'a>(
        &self,
        capability: &Capability,
        aliases: impl IntoIterator<Item = &'a String>,
    ) -> Result<(), CoreError> {
        let entries = self.entries(capability);
        let duplicates: Vec<String> = aliases
            .into_iter()
            .filter(|alias| entries.iter().filter(|e| e.alias == **alias).count() > 1)
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

    /// The one entry for `alias` under the capability that owns `key`.
    fn entry_for(&self, alias: &str, key: &str) -> Result<Option<&Entry>, CoreError> {
        let Some(capability) = Capability::for_attribute(key) else {
            return Ok(None);
        };
        let mut matches = self.entries(&capability).iter().filter(|e| e.alias == alias);
        let first = matches.next();
        if matches.next().is_some() {
            return Err(CoreError::MultipleDevicesFound {
                aliases: vec![alias.to_owned()],
            });
        }
        Ok(first)
    }

    pub fn devices_by_capability_and_attribute(
        &self,
        capability: &Capability,
        key: &str,
        value: &str,
    ) -> Result<BTreeSet<String>, CoreError> {
        let aliases: BTreeSet<String> = self
            .entries(capability)
            .iter()
            .filter(|e| e.attributes.get(key).is_some_and(|v| v == value))
            .map(|e| e.alias.clone())
            .collect();
        self.ensure_unambiguous(capability, &aliases)?;
        Ok(aliases)
    }

    /// Current value of `key` for every alias under `capability` that has it.
    pub fn attribute_values(
        &self,
        capability: &Capability,
        key: &str,
    ) -> Result<BTreeMap<String, String>, CoreError> {
        let values: BTreeMap<String, String> = self
            .entries(capability)
            .iter()
            .filter_map(|e| e.attributes.get(key).map(|v| (e.alias.clone(), v.clone())))
            .collect();
        self.ensure_unambiguous(capability, values.keys())?;
        Ok(values)
    }

    pub fn last_value(&self, alias: &str, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self
            .entry_for(alias, key)?
            .and_then(|e| e.attributes.get(key).cloned()))
    }

    /// The device's last activity, if `key` currently holds `value`.
    pub fn last_timestamp(
        &self,
        alias: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<DateTime<Utc>>, CoreError> {
        Ok(self.entry_for(alias, key)?.and_then(|e| {
            e.attributes
                .get(key)
                .filter(|v| *v == value)
                .and(e.last_activity)
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::DeviceId;

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

    #[test]
    fn filters_by_attribute_value() {
        let snapshot = AttributeSnapshot::build(
            &[switch(1, "Kitchen Ceiling", "on"), switch(2, "Porch Light", "off")],
            AliasKey::Label,
        );

        let on = snapshot
            .devices_by_capability_and_attribute(&Capability::Switch, "switch", "on")
            .unwrap();
        assert_eq!(on.into_iter().collect::<Vec<_>>(), ["Kitchen Ceiling"]);
        assert!(
            snapshot
                .devices_by_capability_and_attribute(&Capability::Lock, "lock", "unlocked")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn duplicate_matching_aliases_fail() {
        let snapshot = AttributeSnapshot::build(
            &[switch(1, "Lamp", "on"), switch(2, "Lamp", "on"), switch(3, "Fan", "off")],
            AliasKey::Label,
        );

        let err = snapshot
            .devices_by_capability_and_attribute(&Capability::Switch, "switch", "on")
            .unwrap_err();
        assert!(err.is_ambiguous());
        // Aliases that match nothing are not checked.
        assert!(
            snapshot
                .devices_by_capability_and_attribute(&Capability::Switch, "switch", "off")
                .is_ok()
        );
    }

    #[test]
    fn shared_alias_fails_even_when_one_device_matches() {
        let snapshot = AttributeSnapshot::build(
            &[switch(1, "Lamp", "on"), switch(2, "Lamp", "off")],
            AliasKey::Label,
        );

        for value in ["on", "off"] {
            let err = snapshot
                .devices_by_capability_and_attribute(&Capability::Switch, "switch", value)
                .unwrap_err();
            assert!(matches!(err, CoreError::MultipleDevicesFound { ref aliases } if aliases == &["Lamp"]));
        }
        assert!(snapshot.attribute_values(&Capability::Switch, "switch").unwrap_err().is_ambiguous());
    }

    #[test]
    fn last_value_and_timestamp() {
        let snapshot =
            AttributeSnapshot::build(&[switch(1, "Kitchen Ceiling", "on")], AliasKey::Label);

        assert_eq!(
            snapshot.last_value("Kitchen Ceiling", "switch").unwrap().as_deref(),
            Some("on")
        );
        assert!(snapshot.last_value("Kitchen Ceiling", "battery").unwrap().is_none());
        assert!(
            snapshot
                .last_timestamp("Kitchen Ceiling", "switch", "on")
                .unwrap()
                .is_some()
        );
        assert!(
            snapshot
                .last_timestamp("Kitchen Ceiling", "switch", "off")
                .unwrap()
                .is_none()
        );
    }
}
