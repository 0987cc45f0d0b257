use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::engine::error::{MarkerError, Result};
use crate::engine::record::capabilities::{Positioned, Stylable};
use crate::engine::record::kind::KindTag;
use crate::engine::record::{Record, RecordId};

/// Expiry deadlines (scene seconds), one slot per record.
#[derive(Debug, Default)]
pub struct TtlTimers {
    deadlines: HashMap<RecordId, f64>,
}

impl TtlTimers {
    /// Replaces any previous timer for `id`. Returns the cancelled deadline.
    pub fn set(&mut self, id: RecordId, deadline: f64) -> Option<f64> {
        let previous = self.cancel(&id);
        self.deadlines.insert(id, deadline);
        previous
    }

    pub fn cancel(&mut self, id: &RecordId) -> Option<f64> {
        self.deadlines.remove(id)
    }

    pub fn deadline(&self, id: &RecordId) -> Option<f64> {
        self.deadlines.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Ids whose deadline has passed, earliest first.
    pub fn due(&self, now: f64) -> Vec<RecordId> {
        let mut due: Vec<(f64, &RecordId)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, deadline)| (*deadline, id))
            .collect();
        due.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
        due.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

/// Longitude/latitude box in degrees, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn contains(&self, longitude: f64, latitude: f64) -> bool {
        longitude >= self.west && longitude <= self.east && latitude >= self.south && latitude <= self.north
    }
}

/// Registry query criteria. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordQuery {
    pub group: Option<String>,
    pub kind: Option<KindTag>,
    pub draggable: Option<bool>,
    pub selected: Option<bool>,
    pub hidden: Option<bool>,
    pub bounds: Option<GeoBounds>,
}

impl RecordQuery {
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn of_kind(mut self, kind: KindTag) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = Some(draggable);
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = Some(selected);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn within(mut self, bounds: GeoBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn matches(&self, record: &Record) -> bool {
        let position = record.position();
        self.group.as_deref().is_none_or(|g| record.group() == Some(g))
            && self.kind.is_none_or(|k| record.kind().tag() == k)
            && self.draggable.is_none_or(|d| record.is_draggable() == d)
            && self.selected.is_none_or(|s| record.is_selected() == s)
            && self.hidden.is_none_or(|h| record.is_hidden() == h)
            && self
                .bounds
                .is_none_or(|b| b.contains(position.longitude, position.latitude))
    }
}

/// Records by id plus the indexes kept in step with them.
///
/// ```text
///   records       id    → Record
///   groups        group → {id}          mirrors record.group
///   compositions  owner → [id]          mount order
///   ttl           id    → deadline
/// ```
///
/// Every mutation touches all affected indexes before returning.
#[derive(Debug, Default)]
pub struct Registry {
    records: BTreeMap<RecordId, Record>,
    groups: HashMap<String, BTreeSet<RecordId>>,
    compositions: HashMap<RecordId, Vec<RecordId>>,
    ttl: TtlTimers,
}

impl Registry {
    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &RecordId) -> Option<&mut Record> {
        self.records.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.values_mut()
    }

    pub fn ttl(&self) -> &TtlTimers {
        &self.ttl
    }

    pub(crate) fn insert(&mut self, record: Record, now: f64) -> Result<()> {
        if self.records.contains_key(&record.id) {
            return Err(MarkerError::DuplicateId(record.id.clone()));
        }
        let id = record.id.clone();
        if let Some(group) = &record.group {
            self.groups.entry(group.clone()).or_default().insert(id.clone());
        }
        if let Some(owner) = &record.composition {
            let members = self.compositions.entry(owner.clone()).or_default();
            if !members.contains(&id) {
                members.push(id.clone());
            }
        }
        if let Some(ttl) = record.ttl {
            self.ttl.set(id.clone(), now + ttl);
        }
        self.records.insert(id, record);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let record = self.records.remove(id)?;
        if let Some(group) = &record.group {
            self.unindex_group(group, id);
        }
        if let Some(owner) = &record.composition {
            if let Some(members) = self.compositions.get_mut(owner) {
                members.retain(|member| member != id);
                if members.is_empty() {
                    self.compositions.remove(owner);
                }
            }
        }
        self.ttl.cancel(id);
        Some(record)
    }

    fn unindex_group(&mut self, group: &str, id: &RecordId) {
        if let Some(members) = self.groups.get_mut(group) {
            members.remove(id);
            if members.is_empty() {
                self.groups.remove(group);
            }
        }
    }

    /// Moves a record between groups, keeping the group index in step.
    pub(crate) fn regroup(&mut self, id: &RecordId, group: Option<String>) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        let previous = record.group.take();
        record.set_group(group);
        let current = record.group.clone();
        if let Some(previous) = previous {
            self.unindex_group(&previous, id);
        }
        if let Some(current) = current {
            self.groups.entry(current).or_default().insert(id.clone());
        }
        true
    }

    /// Sets or clears a record's time-to-live, cancelling the old timer first.
    pub(crate) fn retime(&mut self, id: &RecordId, ttl: Option<f64>, now: f64) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            return false;
        };
        record.ttl = ttl;
        match ttl {
            Some(ttl) => {
                self.ttl.set(id.clone(), now + ttl);
            }
            None => {
                self.ttl.cancel(id);
            }
        }
        true
    }

    pub fn group(&self, name: &str) -> Vec<RecordId> {
        self.groups
            .get(name)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every member of the record's composition collection, itself included.
    pub fn composition_of(&self, id: &RecordId) -> Vec<RecordId> {
        self.records
            .get(id)
            .and_then(|record| record.composition.as_ref())
            .and_then(|owner| self.compositions.get(owner))
            .cloned()
            .unwrap_or_else(|| {
                if self.records.contains_key(id) {
                    vec![id.clone()]
                } else {
                    Vec::new()
                }
            })
    }

    /// Attaches an already registered record to `owner`'s composition collection.
    pub(crate) fn join_composition(&mut self, id: &RecordId, owner: &RecordId) {
        let Some(record) = self.records.get_mut(id) else {
            return;
        };
        record.composition = Some(owner.clone());
        let members = self.compositions.entry(owner.clone()).or_default();
        if !members.contains(id) {
            members.push(id.clone());
        }
    }

    pub fn query(&self, criteria: &RecordQuery) -> Vec<RecordId> {
        let candidates: Box<dyn Iterator<Item = &Record> + '_> = match &criteria.group {
            Some(group) => Box::new(
                self.groups
                    .get(group)
                    .into_iter()
                    .flatten()
                    .filter_map(|id| self.records.get(id)),
            ),
            None => Box::new(self.records.values()),
        };
        candidates
            .filter(|record| criteria.matches(record))
            .map(|record| record.id.clone())
            .collect()
    }

    pub fn expired(&self, now: f64) -> Vec<RecordId> {
        self.ttl.due(now)
    }

    /// Group index consistency, for tests.
    #[cfg(test)]
    fn groups_consistent(&self) -> bool {
        let indexed: usize = self.groups.values().map(BTreeSet::len).sum();
        let grouped = self.records.values().filter(|r| r.group.is_some()).count();
        indexed == grouped
            && self.groups.iter().all(|(group, ids)| {
                ids.iter()
                    .all(|id| self.records.get(id).and_then(|r| r.group.as_deref()) == Some(group))
            })
    }
}
