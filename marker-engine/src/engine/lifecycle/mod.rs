//! Mount, update and delete.
//!
//! ```text
//!   add(bundle)     validate all → sort by layer → mount each (adopt | replace | create)
//!                   → suppress duplicates in the group
//!   update(fields)  per field: composition setter | field setter | pass-through
//!                   then push the primitive; duration > 0 hands off to animate
//!   delete(id)      unsubscribe → cancel animation → unregister → destroy
//!                   → cascade to composition peers
//! ```

pub mod registry;

use std::collections::HashSet;

use bevy::log::{debug, warn};
use constants::animation::MIN_ANIMATION_SECONDS;

use crate::engine::animation::builder::PendingAnimation;
use crate::engine::core::scene::MarkerScene;
use crate::engine::error::{MarkerError, Result};
use crate::engine::geodesy::Cartographic;
use crate::engine::record::capabilities::Animatable;
use crate::engine::record::fields::{Field, FieldMap, FieldRoute, FieldValue};
use crate::engine::record::kind::KindTag;
use crate::engine::record::options::{BillboardOptions, LabelOptions, MarkerBundle};
use crate::engine::record::{Record, RecordId};
use crate::engine::render::{PrimitiveSpec, RenderEngine};

impl<E: RenderEngine> MarkerScene<E> {
    /// Mounts a record (or a whole composition bundle). Returns the primary id.
    pub fn add(&mut self, bundle: impl Into<MarkerBundle>) -> Result<RecordId> {
        self.add_excluding(bundle, &[])
    }

    /// Like [`MarkerScene::add`], but never suppresses the ids in `exclude`.
    pub fn add_excluding(&mut self, bundle: impl Into<MarkerBundle>, exclude: &[RecordId]) -> Result<RecordId> {
        let MarkerBundle { primary, mut members } = bundle.into();

        let mut seen = HashSet::new();
        for member in &members {
            member.validate()?;
            if self.registry.contains(&member.id) || !seen.insert(member.id.clone()) {
                return Err(MarkerError::DuplicateId(member.id.clone()));
            }
        }

        members.sort_by_key(|member| member.kind.layer());
        for member in members {
            self.mount(member)?;
        }

        self.suppress_duplicates(&primary, exclude);
        Ok(primary)
    }

    fn mount(&mut self, mut record: Record) -> Result<()> {
        record.handle = None;
        record.animation = None;
        record.saved_state = None;
        record.hovered = false;
        record.selected = false;

        self.heights.resolve(&mut record, &mut self.engine, self.clock);
        if let Some(range) = record.visibility.height_range {
            record.height_subscription = Some(self.camera_feed.subscribe(record.id.clone(), range));
            record.visibility.height_range_visible = range.contains(self.engine.camera_height());
        }

        let spec = PrimitiveSpec::from_record(&record);
        let hash = spec.config_hash();
        let handle = match self.engine.find_primitive(&record.id) {
            Some((handle, retained)) if retained == hash => {
                debug!("Adopting existing primitive for {}", record.id);
                handle
            }
            Some((handle, _)) => {
                debug!("Replacing stale primitive for {}", record.id);
                self.engine.destroy_primitive(handle);
                self.engine.create_primitive(&spec)
            }
            None => self.engine.create_primitive(&spec),
        };
        record.handle = Some(handle);

        debug!("Mounted {} ({:?})", record.id, record.kind.tag());
        let id = record.id.clone();
        let subscription = record.height_subscription;
        if let Err(err) = self.registry.insert(record, self.clock) {
            if let Some(subscription) = subscription {
                self.camera_feed.unsubscribe(subscription);
            }
            self.engine.destroy_primitive(handle);
            warn!("Mount of {} aborted: {}", id, err);
            return Err(err);
        }
        Ok(())
    }

    /// Applies field changes now, or animates them when `duration` > 0.
    pub fn update(&mut self, id: &RecordId, changes: FieldMap, duration: f64) -> Result<()> {
        let record = self
            .registry
            .get(id)
            .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?;
        if duration > MIN_ANIMATION_SECONDS {
            return self.animate(
                id,
                PendingAnimation {
                    duration,
                    mode: None,
                    easing: None,
                    changes,
                },
            );
        }

        // Kind first, so shape fields of the new kind can follow it.
        let mut ordered: Vec<(Field, &FieldValue)> = changes.iter().collect();
        ordered.sort_by_key(|(field, _)| *field != Field::Kind);

        // Dry run on copies so a bad field leaves the registry untouched.
        let mut probe = record.clone();
        for (field, value) in &ordered {
            if field.route() == FieldRoute::Composition {
                self.check_composition(id, *field, value)?;
            } else {
                probe.write_field(*field, value)?;
            }
        }
        probe.validate()?;

        let mut moved = false;
        for (field, value) in ordered {
            self.apply_field(id, field, value)?;
            moved |= field == Field::Position;
        }
        self.push(id);
        if moved {
            self.suppress_duplicates(id, &[]);
        }
        Ok(())
    }

    /// Moves a record, sparing `exclude` from duplicate suppression.
    pub fn move_to(&mut self, id: &RecordId, position: Cartographic, exclude: &[RecordId]) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(MarkerError::UnknownRecord(id.clone()));
        }
        self.apply_field(id, Field::Position, &position.into())?;
        self.push(id);
        self.suppress_duplicates(id, exclude);
        Ok(())
    }

    /// Routes one field through the same path for updates, animation and interaction.
    pub(crate) fn apply_field(&mut self, id: &RecordId, field: Field, value: &FieldValue) -> Result<()> {
        match field.route() {
            FieldRoute::Composition => self.apply_composition(id, field, value),
            FieldRoute::Setter => self.apply_setter(id, field, value),
            FieldRoute::PassThrough => self
                .registry
                .get_mut(id)
                .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?
                .write_field(field, value),
        }
    }

    fn apply_setter(&mut self, id: &RecordId, field: Field, value: &FieldValue) -> Result<()> {
        let record = self
            .registry
            .get_mut(id)
            .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?;

        match field {
            Field::Group => {
                let group = match value {
                    FieldValue::Group(group) => group.clone(),
                    FieldValue::Text(group) => Some(group.clone()),
                    _ => return Err(MarkerError::validation(id, format!("group does not accept {value:?}"))),
                };
                self.registry.regroup(id, group);
            }
            Field::Ttl => {
                record.write_field(field, value)?;
                let ttl = record.ttl;
                self.registry.retime(id, ttl, self.clock);
            }
            Field::Kind => {
                let before = record.kind.tag();
                record.write_field(field, value)?;
                if record.kind.tag() != before {
                    self.remount(id);
                }
            }
            Field::HeightRange => {
                record.write_field(field, value)?;
                if let Some(subscription) = record.height_subscription.take() {
                    self.camera_feed.unsubscribe(subscription);
                }
                if let Some(range) = record.visibility.height_range {
                    record.height_subscription = Some(self.camera_feed.subscribe(id.clone(), range));
                    record.visibility.height_range_visible = range.contains(self.engine.camera_height());
                }
                self.sync_peers(id);
            }
            Field::Position | Field::HeightMode | Field::HeightOffset => {
                record.write_field(field, value)?;
                self.heights.resolve(record, &mut self.engine, self.clock);
                self.sync_peers(id);
            }
            _ => record.write_field(field, value)?,
        }
        Ok(())
    }

    /// Copies placement from a record to the other members of its composition.
    fn sync_peers(&mut self, id: &RecordId) {
        let Some(source) = self.registry.get(id) else {
            return;
        };
        let (position, mode, offset, range) = (
            source.position,
            source.height_mode,
            source.height_offset,
            source.visibility.height_range,
        );
        for peer in self.registry.composition_of(id) {
            if &peer == id {
                continue;
            }
            let Some(record) = self.registry.get_mut(&peer) else {
                continue;
            };
            let range_changed = record.visibility.height_range != range;
            record.position = position;
            record.height_mode = mode;
            record.height_offset = offset;
            record.visibility.height_range = range;
            if range_changed {
                if let Some(subscription) = record.height_subscription.take() {
                    self.camera_feed.unsubscribe(subscription);
                }
                match range {
                    Some(range) => {
                        record.height_subscription = Some(self.camera_feed.subscribe(peer.clone(), range));
                        record.visibility.height_range_visible = range.contains(self.engine.camera_height());
                    }
                    None => record.visibility.height_range_visible = true,
                }
            }
            self.heights.resolve(record, &mut self.engine, self.clock);
            self.push(&peer);
        }
    }

    /// Validates a label/billboard payload against a copy of the peer it
    /// would create or change.
    fn check_composition(&self, id: &RecordId, field: Field, value: &FieldValue) -> Result<()> {
        let owner = self.composition_owner(id)?;
        let (role, fields) = composition_fields(id, field, value)?;
        let Some(fields) = fields else {
            return Ok(());
        };

        if let Some(existing) = self.registry.get(&owner.peer(role)) {
            let mut probe = existing.clone();
            for (field, value) in fields.iter() {
                probe.write_field(field, value)?;
            }
            return probe.validate();
        }
        let owner_record = self
            .registry
            .get(&owner)
            .ok_or_else(|| MarkerError::UnknownRecord(owner.clone()))?;
        match value {
            FieldValue::Label(Some(options)) => Record::label_peer(owner_record, options).map(drop),
            FieldValue::Billboard(Some(options)) => Record::billboard_peer(owner_record, options).map(drop),
            _ => Ok(()),
        }
    }

    fn composition_owner(&self, id: &RecordId) -> Result<RecordId> {
        let record = self
            .registry
            .get(id)
            .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?;
        Ok(record.composition.clone().unwrap_or_else(|| id.clone()))
    }

    fn apply_composition(&mut self, id: &RecordId, field: Field, value: &FieldValue) -> Result<()> {
        self.check_composition(id, field, value)?;
        let owner = self.composition_owner(id)?;
        let (role, fields) = composition_fields(id, field, value)?;
        let peer = owner.peer(role);

        let Some(fields) = fields else {
            self.unmount(&peer);
            return Ok(());
        };

        if self.registry.contains(&peer) {
            for (field, value) in fields.iter() {
                self.apply_field(&peer, field, value)?;
            }
            self.push(&peer);
            return Ok(());
        }

        let owner_record = self
            .registry
            .get(&owner)
            .ok_or_else(|| MarkerError::UnknownRecord(owner.clone()))?;
        let record = match value {
            FieldValue::Label(Some(options)) => Record::label_peer(owner_record, options)?,
            FieldValue::Billboard(Some(options)) => Record::billboard_peer(owner_record, options)?,
            _ => return Ok(()),
        };
        self.registry.join_composition(&owner, &owner);
        self.mount(record)
    }

    /// Pushes the record's static fields to its primitive.
    pub(crate) fn push(&mut self, id: &RecordId) {
        let Some(record) = self.registry.get(id) else {
            return;
        };
        if let Some(handle) = record.handle {
            self.engine.update_primitive(handle, &PrimitiveSpec::from_record(record));
        }
    }

    /// Replaces the primitive after a kind change.
    fn remount(&mut self, id: &RecordId) {
        let Some(record) = self.registry.get_mut(id) else {
            return;
        };
        if let Some(handle) = record.handle.take() {
            self.engine.destroy_primitive(handle);
        }
        record.handle = Some(self.engine.create_primitive(&PrimitiveSpec::from_record(record)));
        debug!("Remounted {} as {:?}", id, record.kind.tag());
    }

    /// Changes the kind of a mounted record in place.
    pub fn retag(&mut self, id: &RecordId, tag: KindTag) -> Result<()> {
        self.update(id, FieldMap::new().with(Field::Kind, tag), 0.0)
    }

    /// Deletes a record together with every other member of its composition
    /// collection. Returns `false` if it was already gone.
    pub fn delete(&mut self, id: &RecordId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        let members = self.registry.composition_of(id);
        self.unmount(id);
        for member in members.iter().filter(|member| *member != id) {
            self.unmount(member);
        }
        true
    }

    /// Removes a single record: unsubscribe, cancel its animation, unregister,
    /// destroy its primitive. Composition peers are left alone.
    fn unmount(&mut self, id: &RecordId) -> bool {
        if let Some(subscription) = self
            .registry
            .get_mut(id)
            .and_then(|record| record.height_subscription.take())
        {
            self.camera_feed.unsubscribe(subscription);
        }
        self.cancel_animation(id);

        let Some(mut record) = self.registry.remove(id) else {
            return false;
        };
        if let Some(handle) = record.handle.take() {
            self.engine.destroy_primitive(handle);
        }
        self.events.clear_record(id);
        if self.interaction.forget(id) {
            self.engine.set_cursor(Default::default());
        }
        debug!("Deleted {}", id);
        true
    }

    /// Snapshots color, opacity, scale and hidden into the record's single slot.
    pub fn save_state(&mut self, id: &RecordId) -> Result<()> {
        let record = self
            .registry
            .get_mut(id)
            .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?;
        record.saved_state = Some(record.snapshot(&Field::SAVED_STATE));
        Ok(())
    }

    /// Applies and consumes the saved snapshot. `false` if there was none.
    pub fn restore_state(&mut self, id: &RecordId) -> Result<bool> {
        let saved = self
            .registry
            .get_mut(id)
            .ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?
            .saved_state
            .take();
        let Some(saved) = saved else {
            return Ok(false);
        };
        for (field, value) in saved.iter() {
            self.apply_field(id, field, value)?;
        }
        self.push(id);
        Ok(true)
    }

    /// Removes records of the same group standing on this record's spot.
    ///
    /// The record itself, its composition peers and `exclude` are spared.
    pub(crate) fn suppress_duplicates(&mut self, id: &RecordId, exclude: &[RecordId]) -> Vec<RecordId> {
        let Some(record) = self.registry.get(id) else {
            return Vec::new();
        };
        let Some(group) = record.group.clone() else {
            return Vec::new();
        };
        let position = record.position;
        let tolerance = self.config.duplicate_tolerance_deg;

        let mut spared: HashSet<RecordId> = exclude.iter().cloned().collect();
        spared.extend(self.registry.composition_of(id));
        spared.insert(id.clone());

        let victims: Vec<RecordId> = self
            .registry
            .group(&group)
            .into_iter()
            .filter(|other| !spared.contains(other))
            .filter(|other| {
                self.registry
                    .get(other)
                    .is_some_and(|r| r.position.same_spot(&position, tolerance))
            })
            .collect();
        for victim in &victims {
            debug!("Suppressing {} under {} in group {}", victim, id, group);
            self.delete(victim);
        }
        victims
    }
}

/// Peer role and the fields to write on it; `None` fields detach the peer.
fn composition_fields(id: &RecordId, field: Field, value: &FieldValue) -> Result<(&'static str, Option<FieldMap>)> {
    match (field, value) {
        (Field::Label, FieldValue::Label(options)) => Ok(("label", options.as_ref().map(LabelOptions::to_fields))),
        (Field::Billboard, FieldValue::Billboard(options)) => {
            Ok(("billboard", options.as_ref().map(BillboardOptions::to_fields)))
        }
        _ => Err(MarkerError::validation(id, format!("{field} does not accept {value:?}"))),
    }
}
