//! Shape registry.
//!
//! Owns every shape instance on one surface, routes raw input to the
//! instance that should see it and enforces that at most one instance is
//! being edited at a time.

use std::sync::Arc;

use crate::color::{ColorError, CssColor};
use crate::config::PlotConfig;
use crate::editor::{
    CreateOptions, EditorContext, EditorError, EditorResponse, EditorState, PlotEvent, ShapeEditor,
};
use crate::geodesy::Wgs84;
use crate::geometry::{GeometryKernel, PlotArrows};
use crate::host::{PickedEntity, Picker, Renderer, ScreenPos, ShapeKey, Tooltip};
use crate::kind::ShapeKind;
use crate::record::{validate_all, RecordError, ShapeRecord};
use crate::selection::SelectionStore;
use crate::style::{StyleField, StyleOverrides};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no shape {0}")]
    UnknownShape(ShapeKey),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("failed to encode records: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raw pointer input at a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    LeftClick(ScreenPos),
    LeftDown(ScreenPos),
    LeftUp(ScreenPos),
    MouseMove(ScreenPos),
    RightClick(ScreenPos),
}

pub struct ShapeRegistry<S, T> {
    scene: S,
    tooltip: T,
    kernel: GeometryKernel,
    config: Arc<PlotConfig>,
    /// Instances in creation order.
    shapes: Vec<ShapeEditor>,
    selected: Option<ShapeKey>,
    drawing: Option<ShapeKey>,
    selection: SelectionStore,
}

impl<S, T> std::fmt::Debug for ShapeRegistry<S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("shapes", &self.shapes)
            .field("selected", &self.selected)
            .field("drawing", &self.drawing)
            .finish_non_exhaustive()
    }
}

impl<S, T> ShapeRegistry<S, T>
where
    S: Renderer + Picker,
    T: Tooltip,
{
    pub fn new(scene: S, tooltip: T) -> Self {
        Self::with_config(scene, tooltip, PlotConfig::default())
    }

    pub fn with_config(scene: S, tooltip: T, config: PlotConfig) -> Self {
        let kernel = GeometryKernel::new(
            Arc::new(Wgs84),
            Arc::new(PlotArrows::default()),
            config.geometry.clone(),
        );
        Self::with_kernel(scene, tooltip, kernel, config)
    }

    pub fn with_kernel(scene: S, tooltip: T, kernel: GeometryKernel, config: PlotConfig) -> Self {
        Self {
            scene,
            tooltip,
            kernel,
            config: Arc::new(config),
            shapes: Vec::new(),
            selected: None,
            drawing: None,
            selection: SelectionStore::new(),
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn tooltip(&self) -> &T {
        &self.tooltip
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn kernel(&self) -> &GeometryKernel {
        &self.kernel
    }

    /// Store shared with a property panel.
    pub fn selection(&self) -> SelectionStore {
        self.selection.clone()
    }

    pub fn get(&self, key: ShapeKey) -> Option<&ShapeEditor> {
        self.shapes.iter().find(|e| e.key() == key)
    }

    pub fn shapes(&self) -> impl Iterator<Item = &ShapeEditor> {
        self.shapes.iter()
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Instance in an edit session.
    pub fn selected(&self) -> Option<ShapeKey> {
        self.selected
    }

    /// Instance still collecting points.
    pub fn drawing(&self) -> Option<ShapeKey> {
        self.drawing
    }

    /// Start drawing a new shape, finishing whatever was active.
    pub fn create(&mut self, kind: ShapeKind, options: CreateOptions) -> ShapeKey {
        self.finish();
        let editor = ShapeEditor::new(kind, options, self.kernel.clone(), Arc::clone(&self.config));
        let key = editor.key();
        self.shapes.push(editor);
        self.drawing = Some(key);
        tracing::info!("[registry] drawing {key}");
        key
    }

    /// Recreate a committed shape from a record.
    pub fn init_from_record(&mut self, record: &ShapeRecord) -> Result<ShapeKey, RecordError> {
        let editor = ShapeEditor::from_record(
            record,
            self.kernel.clone(),
            Arc::clone(&self.config),
            &mut self.scene,
        )
        .inspect_err(|e| tracing::warn!("[registry] rejected {} record: {e}", record.shape))?;
        let key = editor.key();
        self.shapes.push(editor);
        Ok(key)
    }

    /// Validate every record, then append one committed instance per record.
    pub fn rebuild_all(&mut self, records: &[ShapeRecord]) -> Result<Vec<ShapeKey>, RecordError> {
        validate_all(records).inspect_err(|e| tracing::warn!("[registry] rebuild rejected: {e}"))?;
        let keys = records
            .iter()
            .map(|record| self.init_from_record(record))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!("[registry] rebuilt {} shapes", keys.len());
        Ok(keys)
    }

    /// Records of every persisted instance, in creation order.
    pub fn serialize_all(&self) -> Vec<ShapeRecord> {
        self.shapes
            .iter()
            .filter(|e| e.is_valid() && e.state() != EditorState::Drawing)
            .map(ShapeEditor::to_record)
            .collect()
    }

    pub fn export_json(&self) -> Result<String, RegistryError> {
        Ok(serde_json::to_string_pretty(&self.serialize_all())?)
    }

    pub fn import_json(&mut self, json: &str) -> Result<Vec<ShapeKey>, RecordError> {
        let records = ShapeRecord::list_from_json(json)?;
        self.rebuild_all(&records)
    }

    /// Handle a pick result from a primary click outside drawing.
    ///
    /// A different plot instance is edited after the current one is saved;
    /// anything else saves and deselects. The selected instance keeps its
    /// session when one of its own primitives is picked.
    pub fn pick(&mut self, entity: Option<PickedEntity>) {
        if self.drawing.is_some() {
            return;
        }
        let picked = entity
            .map(|e| e.tag.key())
            .filter(|key| self.get(*key).is_some_and(ShapeEditor::is_valid));
        match picked {
            Some(key) if self.selected == Some(key) => {}
            Some(key) => {
                self.save();
                self.send(key, PlotEvent::Edit);
            }
            None => self.save(),
        }
    }

    /// Start editing `key`, saving the current session first.
    pub fn edit(&mut self, key: ShapeKey) -> Result<(), RegistryError> {
        if self.get(key).is_none() {
            return Err(RegistryError::UnknownShape(key));
        }
        self.finish();
        self.dispatch(key, PlotEvent::Edit)
    }

    /// Commit the instance being edited, if any.
    pub fn save(&mut self) {
        if let Some(key) = self.selected {
            self.send(key, PlotEvent::Save);
        }
    }

    /// Restore the selected instance to where its session began.
    pub fn revert(&mut self) {
        if let Some(key) = self.selected {
            self.send(key, PlotEvent::Revert);
        }
    }

    pub fn delete(&mut self, key: ShapeKey) -> Result<(), RegistryError> {
        self.dispatch(key, PlotEvent::Delete)?;
        tracing::info!("[registry] deleted {key}");
        Ok(())
    }

    pub fn delete_selected(&mut self) -> Option<ShapeKey> {
        let key = self.selected?;
        self.delete(key).ok()?;
        Some(key)
    }

    /// Delete every instance.
    pub fn clear(&mut self) {
        let keys: Vec<ShapeKey> = self.shapes.iter().map(ShapeEditor::key).collect();
        for key in keys {
            self.send(key, PlotEvent::Delete);
        }
        self.shapes.clear();
        self.drawing = None;
        if self.selected.take().is_some() {
            self.selection.notify(None);
        }
        tracing::info!("[registry] cleared");
    }

    /// Re-issue every valid instance's primitives.
    pub fn plot_shapes(&mut self) {
        let keys: Vec<ShapeKey> = self
            .shapes
            .iter()
            .filter(|e| e.is_valid())
            .map(ShapeEditor::key)
            .collect();
        for key in keys {
            self.send(key, PlotEvent::Redraw);
        }
    }

    pub fn set_style(&mut self, key: ShapeKey, overrides: &StyleOverrides) -> Result<(), RegistryError> {
        self.with_editor(key, |editor, scene| editor.set_style(overrides, scene))
    }

    pub fn set_color(&mut self, key: ShapeKey, field: StyleField, css: &str) -> Result<(), RegistryError> {
        let color = CssColor::parse(css)?;
        self.with_editor(key, |editor, scene| editor.set_color(field, color, scene))
    }

    pub fn set_label_text(&mut self, key: ShapeKey, text: &str) -> Result<(), RegistryError> {
        self.with_editor(key, |editor, scene| editor.set_label_text(text, scene))
    }

    /// Route raw input. A drawing instance receives everything.
    pub fn handle_input(&mut self, input: InputEvent) {
        match (self.drawing, input) {
            (Some(key), InputEvent::LeftClick(screen)) => {
                let world = self.scene.pick_terrain(screen);
                self.send(key, PlotEvent::Click { screen, world });
            }
            (Some(key), InputEvent::MouseMove(screen)) => {
                let world = self.scene.pick_terrain(screen);
                self.send(key, PlotEvent::Move { screen, world });
            }
            (Some(key), InputEvent::RightClick(_)) => self.send(key, PlotEvent::Cancel),
            (Some(_), InputEvent::LeftDown(_) | InputEvent::LeftUp(_)) => {}

            (None, InputEvent::LeftClick(screen)) => {
                let entity = self.scene.pick_entity(screen);
                self.pick(entity);
            }
            (None, InputEvent::LeftDown(screen)) => {
                let Some(key) = self.selected else { return };
                let world = self.scene.pick_terrain(screen);
                let picked = self.scene.pick_entity(screen);
                self.send(key, PlotEvent::Press { screen, world, picked });
            }
            (None, InputEvent::LeftUp(screen)) => {
                let Some(key) = self.selected else { return };
                let world = self.scene.pick_terrain(screen);
                self.send(key, PlotEvent::Release { screen, world });
            }
            (None, InputEvent::MouseMove(screen)) => {
                let Some(key) = self.selected else { return };
                let world = self.scene.pick_terrain(screen);
                self.send(key, PlotEvent::Move { screen, world });
            }
            (None, InputEvent::RightClick(_)) => {}
        }
    }

    /// Finish the drawing instance under the cancel rule and commit any edit session.
    pub fn finish(&mut self) {
        if let Some(key) = self.drawing {
            self.send(key, PlotEvent::Save);
        }
        self.save();
    }

    /// Dispatch to an instance that is known to exist.
    fn send(&mut self, key: ShapeKey, event: PlotEvent) {
        if let Err(e) = self.dispatch(key, event) {
            tracing::warn!("[registry] dropped {event:?}: {e}");
        }
    }

    fn dispatch(&mut self, key: ShapeKey, event: PlotEvent) -> Result<(), RegistryError> {
        let mut responses = Vec::new();
        {
            let editor = self
                .shapes
                .iter_mut()
                .find(|e| e.key() == key)
                .ok_or(RegistryError::UnknownShape(key))?;
            let mut ctx = EditorContext {
                renderer: &mut self.scene,
                tooltip: &mut self.tooltip,
            };
            editor.handle(event, &mut ctx, &mut responses);
        }
        self.apply(responses);
        Ok(())
    }

    fn with_editor(
        &mut self,
        key: ShapeKey,
        f: impl FnOnce(&mut ShapeEditor, &mut S) -> Result<(), EditorError>,
    ) -> Result<(), RegistryError> {
        let editor = self
            .shapes
            .iter_mut()
            .find(|e| e.key() == key)
            .ok_or(RegistryError::UnknownShape(key))?;
        f(editor, &mut self.scene)?;
        Ok(())
    }

    fn apply(&mut self, responses: Vec<EditorResponse>) {
        for response in responses {
            match response {
                EditorResponse::EditingStarted(key) => {
                    if self.drawing == Some(key) {
                        self.drawing = None;
                    }
                    self.selected = Some(key);
                    self.selection.notify(Some(key));
                }
                EditorResponse::EditingEnded(key) => {
                    if self.selected == Some(key) {
                        self.selected = None;
                        self.selection.notify(None);
                    }
                }
                EditorResponse::Deleted(key) => {
                    self.shapes.retain(|e| e.key() != key);
                    if self.drawing == Some(key) {
                        self.drawing = None;
                    }
                    if self.selected == Some(key) {
                        self.selected = None;
                        self.selection.notify(None);
                    }
                }
            }
        }
    }
}
