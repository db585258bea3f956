// ── Capability index ──
//
// Which devices hold which capability, keyed by alias. Built in one pass
// from a full device snapshot and replaced wholesale on refresh.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::CoreError;
use crate::model::{AliasKey, Capability, Device, DeviceId};

/// Capability to alias to device ids, capability to room to aliases, and
/// device id to alias.
///
/// Aliases are not unique on the hub. Duplicates are kept here and only
/// reported when a query touches them.
#[derive(Debug, Default)]
pub struct CapabilityIndex {
    by_alias: HashMap<Capability, BTreeMap<String, Vec<DeviceId>>>,
    by_room: HashMap<Capability, BTreeMap<Option<String>, BTreeSet<String>>>,
    aliases: HashMap<DeviceId, String>,
}

impl CapabilityIndex {
    pub fn build(devices: &[Device], alias_key: AliasKey) -> Self {
        let mut index = Self::default();

        for device in devices {
            let alias = device.alias(alias_key);
            index.aliases.insert(device.id, alias.to_owned());

            for capability in &device.capabilities {
                let ids = index
                    .by_alias
                    .entry(capability.clone())
                    .or_default()
                    .entry(alias.to_owned())
                    .or_default();
                if !ids.contains(&device.id) {
                    ids.push(device.id);
                }

                index
                    .by_room
                    .entry(capability.clone())
                    .or_default()
                    .entry(device.room.clone())
                    .or_default()
                    .insert(alias.to_owned());
            }
        }

        index
    }

    /// Number of distinct devices in the snapshot.
    pub fn device_count(&self) -> usize {
        self.aliases.len()
    }

    /// Every alias holding `capability`.
    ///
    /// Fails if any of them names more than one device.
    pub fn devices_by_capability(
        &self,
        capability: &Capability,
    ) -> Result<BTreeSet<String>, CoreError> {
        let Some(by_alias) = self.by_alias.get(capability) else {
            return Ok(BTreeSet::new());
        };

        let duplicates: Vec<String> = by_alias
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(alias, _)| alias.clone())
            .collect();
        if !duplicates.is_empty() {
            return Err(CoreError::MultipleDevicesFound {
                aliases: duplicates,
            });
        }

        Ok(by_alias.keys().cloned().collect())
    }

    /// Aliases holding `capability` in `room`; `None` selects devices that
    /// have no room assigned.
    pub fn devices_by_capability_and_room(
        &self,
        capability: &Capability,
        room: Option<&str>,
    ) -> BTreeSet<String> {
        self.by_room
            .get(capability)
            .and_then(|rooms| rooms.get(&room.map(str::to_owned)))
            .cloned()
            .unwrap_or_default()
    }

    /// The single device named `alias` under `capability`.
    pub fn resolve_command_target(
        &self,
        capability: &Capability,
        alias: &str,
    ) -> Result<DeviceId, CoreError> {
        let ids = self
            .by_alias
            .get(capability)
            .and_then(|by_alias| by_alias.get(alias))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match ids {
            [] => Err(CoreError::DeviceNotFound {
                capability: capability.clone(),
                alias: alias.to_owned(),
            }),
            [id] => Ok(*id),
            _ => Err(CoreError::MultipleDevicesFound {
                aliases: vec![alias.to_owned()],
            }),
        }
    }

    /// Fail if any of `aliases` names more than one device under `capability`.
    pub fn ensure_unambiguous<'a>(
        &self,
        capability: &Capability,
        aliases: impl IntoIterator<Item = &'a String>,
    ) -> Result<(), CoreError> {
        let Some(by_alias) = self.by_alias.get(capability) else {
            return Ok(());
        };

        let duplicates: Vec<String> = aliases
            .into_iter()
            .filter(|alias| by_alias.get(alias.as_str()).is_some_and(|ids| ids.len() > 1))
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

    /// The alias a device id was indexed under.
    pub fn alias_for(&self, id: DeviceId) -> Option<&str> {
        self.aliases.get(&id).map(String::as_str)
    }
}
