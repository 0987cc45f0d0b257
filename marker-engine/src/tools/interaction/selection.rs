use bevy::log::{debug, warn};

use crate::engine::core::scene::MarkerScene;
use crate::engine::error::{MarkerError, Result};
use crate::engine::events::{EventKind, MarkerEvent};
use crate::engine::record::RecordId;
use crate::engine::record::fields::{Field, FieldValue};
use crate::engine::render::RenderEngine;

impl<E: RenderEngine> MarkerScene<E> {
    /// Selects a record, deselecting the previous one first.
    ///
    /// The record's style is snapshotted before the highlight is applied so
    /// deselecting restores exactly what was there.
    pub fn select(&mut self, id: &RecordId) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(MarkerError::UnknownRecord(id.clone()));
        }
        if self.interaction.selected.as_ref() == Some(id) {
            return Ok(());
        }
        self.deselect();

        self.save_state(id)?;
        let scale = self
            .registry
            .get(id)
            .map(|record| record.style.scale * self.config.selection.scale)
            .unwrap_or(self.config.selection.scale);
        let color = FieldValue::color(self.config.selection.color.clone());
        self.apply_field(id, Field::Color, &color)?;
        self.apply_field(id, Field::Scale, &FieldValue::Number(scale))?;
        self.push(id);

        if let Some(record) = self.registry.get_mut(id) {
            record.selected = true;
        }
        self.interaction.selected = Some(id.clone());
        debug!("Selected {}", id);
        self.emit(MarkerEvent::for_record(EventKind::Select, id.clone()));
        Ok(())
    }

    /// Clears the selection, restoring the record's saved style. Returns the
    /// record that was selected.
    pub fn deselect(&mut self) -> Option<RecordId> {
        let id = self.interaction.selected.take()?;
        if !self.registry.contains(&id) {
            return None;
        }
        if let Err(err) = self.restore_state(&id) {
            warn!("Could not restore {} after deselect: {}", id, err);
        }
        if let Some(record) = self.registry.get_mut(&id) {
            record.selected = false;
        }
        debug!("Deselected {}", id);
        self.emit(MarkerEvent::for_record(EventKind::Deselect, id.clone()));
        Some(id)
    }

    /// Deletes the selected record (and its composition peers).
    pub fn delete_selected(&mut self) -> Option<RecordId> {
        let id = self.interaction.selected.take()?;
        self.delete(&id).then_some(id)
    }
}
