//! Draw, edit and commit lifecycle of one shape instance.
//!
//! ```text
//!            click (arity reached) / cancel (enough points)
//!  Drawing ───────────────────────────────────────────────▶ Editing ◀──┐
//!     │ cancel (too few points)                  press on handle │     │ release
//!     ▼                                                          ▼     │
//!  Deleted ◀──── delete (any state)                          Dragging ─┘
//!                                            save │   ▲ edit
//!                                                 ▼   │
//!                                              Committed
//! ```

mod layers;
mod model;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::color::{ColorError, CssColor};
use crate::config::PlotConfig;
use crate::geometry::GeometryKernel;
use crate::host::{
    Geometry, HandleFlag, MarkerStyle, PickedEntity, PrimitiveDescription, PrimitiveId, PrimitiveTag,
    Renderer, ScreenPos, ShapeId, ShapeKey, Tooltip,
};
use crate::kind::ShapeKind;
use crate::position::Position;
use crate::record::{RecordError, ShapeRecord};
use crate::style::{Style, StyleField, StyleOverrides};
use crate::topology::AnchorTopology;

use layers::LayerPainter;
use model::{ShapeModel, SharedModel};

/// Initial style and label text for a new shape.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    pub style: StyleOverrides,
    pub label: Option<String>,
}

/// Host-independent input to an editor. Picks are already resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlotEvent {
    Click {
        screen: ScreenPos,
        world: Option<Position>,
    },
    Move {
        screen: ScreenPos,
        world: Option<Position>,
    },
    Press {
        screen: ScreenPos,
        world: Option<Position>,
        picked: Option<PickedEntity>,
    },
    Release {
        screen: ScreenPos,
        world: Option<Position>,
    },
    Cancel,
    Save,
    Edit,
    Revert,
    Delete,
    Redraw,
}

/// Lifecycle changes the owner of an editor has to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorResponse {
    EditingStarted(ShapeKey),
    EditingEnded(ShapeKey),
    Deleted(ShapeKey),
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("shape {0} has been deleted")]
    Deleted(ShapeKey),
    #[error("{0} shapes carry no label text")]
    NotALabel(ShapeKind),
    #[error(transparent)]
    Color(#[from] ColorError),
}

/// Host surfaces lent to an editor for the duration of one event.
pub struct EditorContext<'a> {
    pub renderer: &'a mut dyn Renderer,
    pub tooltip: &'a mut dyn Tooltip,
}

/// Handle grabbed by a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragHandle {
    pub handle: PrimitiveId,
    /// Index into the expanded handle sequence.
    pub index: usize,
    pub flag: HandleFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Drawing,
    Editing,
    Dragging(DragHandle),
    Committed,
    Deleted,
}

impl EditorState {
    pub fn is_editing(self) -> bool {
        matches!(self, EditorState::Editing | EditorState::Dragging(_))
    }

    #[must_use]
    fn transition(
        self,
        event: PlotEvent,
        data: &mut EditorData,
        ctx: &mut EditorContext<'_>,
        responses: &mut Vec<EditorResponse>,
    ) -> Self {
        use EditorState::*;

        match (self, event) {
            (Deleted, _) => Deleted,
            (_, PlotEvent::Delete) => {
                data.teardown(ctx);
                responses.push(EditorResponse::Deleted(data.key));
                Deleted
            }

            // Drawing
            (Drawing, PlotEvent::Click { screen, world: Some(position) }) => {
                let placed = data.place_anchor(position, ctx.renderer);
                if data.kind().spec().fixed_arity.is_some_and(|arity| placed >= arity) {
                    data.start_editing(ctx, responses);
                    Editing
                } else {
                    ctx.tooltip.show_at(screen, &data.drawing_hint());
                    Drawing
                }
            }
            (Drawing, PlotEvent::Move { screen, world: Some(position) }) => {
                data.move_floating(position, ctx.renderer);
                ctx.tooltip.show_at(screen, &data.drawing_hint());
                Drawing
            }
            (Drawing, PlotEvent::Move { world: None, .. }) => {
                ctx.tooltip.set_visible(false);
                Drawing
            }
            (Drawing, PlotEvent::Cancel) => {
                if data.placed() < data.kind().spec().cancel_arity {
                    tracing::debug!("[editor] {} aborted with {} points", data.key, data.placed());
                    data.teardown(ctx);
                    responses.push(EditorResponse::Deleted(data.key));
                    Deleted
                } else {
                    data.start_editing(ctx, responses);
                    Editing
                }
            }
            (Drawing, PlotEvent::Save) => match Drawing.transition(PlotEvent::Cancel, data, ctx, responses) {
                Editing => Editing.transition(PlotEvent::Save, data, ctx, responses),
                other => other,
            },
            (Drawing, PlotEvent::Redraw) => {
                data.redraw_drawing(ctx.renderer);
                Drawing
            }
            (Drawing, _) => Drawing,

            // Editing
            (Editing, PlotEvent::Press { screen, world: Some(_), picked: Some(entity) }) => {
                let Some(handle) = data.grab(entity) else {
                    return Editing;
                };
                ctx.renderer.set_camera_navigation(false);
                ctx.tooltip.show_at(screen, data.drag_hint(handle));
                Dragging(handle)
            }
            (Editing, PlotEvent::Save) => {
                data.commit(ctx);
                responses.push(EditorResponse::EditingEnded(data.key));
                Committed
            }
            (Editing, PlotEvent::Revert) => {
                data.revert(ctx);
                Editing
            }
            (Editing, PlotEvent::Redraw) => {
                data.open_session(ctx, false);
                Editing
            }
            (Editing, _) => Editing,

            // Dragging
            (Dragging(handle), PlotEvent::Move { screen, world }) => {
                if let Some(position) = world {
                    data.drag_to(handle, position, ctx.renderer);
                }
                ctx.tooltip.show_at(screen, data.drag_hint(handle));
                Dragging(handle)
            }
            (Dragging(handle), PlotEvent::Release { world, .. }) => {
                data.release(handle, world, ctx);
                Editing
            }
            (Dragging(handle), PlotEvent::Save | PlotEvent::Revert | PlotEvent::Redraw) => {
                data.release(handle, None, ctx);
                Editing.transition(event, data, ctx, responses)
            }
            (Dragging(handle), _) => Dragging(handle),

            // Committed
            (Committed, PlotEvent::Edit) => {
                data.start_editing(ctx, responses);
                Editing
            }
            (Committed, PlotEvent::Redraw) => {
                data.redraw_committed(ctx.renderer);
                Committed
            }
            (Committed, _) => Committed,
        }
    }
}

struct EditorData {
    key: ShapeKey,
    model: SharedModel,
    painter: LayerPainter,
    valid: bool,
    /// Control points when the current edit session began.
    restore_point: Vec<Position>,
    topology: Option<AnchorTopology>,
    /// Shape body layers.
    body: Vec<PrimitiveId>,
    /// Anchor markers placed while drawing.
    anchors: Vec<PrimitiveId>,
    floating: Option<PrimitiveId>,
}

fn tag(key: ShapeKey, flag: HandleFlag) -> PrimitiveTag {
    PrimitiveTag {
        kind: key.kind,
        instance_id: key.id,
        flag,
    }
}

fn marker(position: Position, style: MarkerStyle, pixel_size: f32) -> PrimitiveDescription {
    PrimitiveDescription::Static(Geometry::Marker {
        position,
        style,
        pixel_size,
    })
}

impl EditorData {
    fn kind(&self) -> ShapeKind {
        self.key.kind
    }

    fn config(&self) -> &PlotConfig {
        &self.painter.config
    }

    fn marker_size(&self) -> f32 {
        self.config().render.marker_pixel_size
    }

    fn placed(&self) -> usize {
        self.model.read().positions.len()
    }

    fn drawing_hint(&self) -> String {
        self.config()
            .hints
            .for_prompt(self.kind().draw_prompt(self.placed()))
    }

    fn drag_hint(&self, handle: DragHandle) -> &str {
        let hints = &self.config().hints;
        if handle.flag == HandleFlag::MidAnchor {
            &hints.split_segment
        } else {
            &hints.move_control_point
        }
    }

    fn add_live_body(&mut self, renderer: &mut dyn Renderer) {
        for &layer in self.kind().spec().layers {
            let callback = self.painter.live(layer, Arc::clone(&self.model));
            let id = renderer.add_primitive(tag(self.key, HandleFlag::None), PrimitiveDescription::Live(callback));
            self.body.push(id);
        }
    }

    fn add_static_body(&mut self, renderer: &mut dyn Renderer) {
        let geometries: Vec<Geometry> = {
            let model = self.model.read();
            self.kind()
                .spec()
                .layers
                .iter()
                .filter_map(|&layer| {
                    self.painter
                        .geometry(layer, &model.positions, &model.style, &model.label)
                })
                .collect()
        };
        for geometry in geometries {
            let id = renderer.add_primitive(tag(self.key, HandleFlag::None), PrimitiveDescription::Static(geometry));
            self.body.push(id);
        }
    }

    fn add_handles(&mut self, renderer: &mut dyn Renderer) {
        let (key, size) = (self.key, self.marker_size());
        let Some(topology) = self.topology.as_mut() else {
            return;
        };
        let handles: Vec<(usize, Position, HandleFlag)> = topology
            .expanded()
            .iter()
            .enumerate()
            .map(|(index, &position)| (index, position, topology.flag(index)))
            .collect();
        for (index, position, flag) in handles {
            let style = match flag {
                HandleFlag::MidAnchor => MarkerStyle::MidAnchor,
                _ => MarkerStyle::Anchor,
            };
            let id = renderer.add_primitive(tag(key, flag), marker(position, style, size));
            topology.bind(id, index);
        }
    }

    fn remove_handles(&mut self, renderer: &mut dyn Renderer) {
        if let Some(topology) = self.topology.as_mut() {
            for id in topology.unbind_all() {
                renderer.remove_primitive(id);
            }
        }
    }

    fn clear_scene(&mut self, renderer: &mut dyn Renderer) {
        for id in self.body.drain(..).chain(self.anchors.drain(..)) {
            renderer.remove_primitive(id);
        }
        if let Some(id) = self.floating.take() {
            renderer.remove_primitive(id);
        }
        self.remove_handles(renderer);
    }

    /// Append a control point while drawing. Returns the number placed.
    fn place_anchor(&mut self, position: Position, renderer: &mut dyn Renderer) -> usize {
        let placed = {
            let mut model = self.model.write();
            model.positions.push(position);
            model.floating.get_or_insert(position);
            model.positions.len()
        };
        let id = renderer.add_primitive(
            tag(self.key, HandleFlag::Anchor),
            marker(position, MarkerStyle::Anchor, self.marker_size()),
        );
        self.anchors.push(id);
        if self.body.is_empty() {
            self.add_live_body(renderer);
        }
        placed
    }

    fn move_floating(&mut self, position: Position, renderer: &mut dyn Renderer) {
        {
            let mut model = self.model.write();
            if model.positions.is_empty() {
                return;
            }
            model.floating = Some(position);
        }
        match self.floating {
            Some(id) => renderer.move_marker(id, position),
            None => {
                let id = renderer.add_primitive(
                    tag(self.key, HandleFlag::None),
                    marker(position, MarkerStyle::Floating, self.marker_size()),
                );
                self.floating = Some(id);
            }
        }
    }

    fn redraw_drawing(&mut self, renderer: &mut dyn Renderer) {
        self.clear_scene(renderer);
        let (positions, floating) = {
            let model = self.model.read();
            (model.positions.clone(), model.floating)
        };
        if positions.is_empty() {
            return;
        }
        self.add_live_body(renderer);
        for position in positions {
            let id = renderer.add_primitive(
                tag(self.key, HandleFlag::Anchor),
                marker(position, MarkerStyle::Anchor, self.marker_size()),
            );
            self.anchors.push(id);
        }
        if let Some(position) = floating {
            let id = renderer.add_primitive(
                tag(self.key, HandleFlag::None),
                marker(position, MarkerStyle::Floating, self.marker_size()),
            );
            self.floating = Some(id);
        }
    }

    fn redraw_committed(&mut self, renderer: &mut dyn Renderer) {
        self.clear_scene(renderer);
        self.add_static_body(renderer);
    }

    fn start_editing(&mut self, ctx: &mut EditorContext<'_>, responses: &mut Vec<EditorResponse>) {
        self.open_session(ctx, true);
        tracing::debug!("[editor] {} editing {} points", self.key, self.restore_point.len());
        responses.push(EditorResponse::EditingStarted(self.key));
    }

    /// (Re)build the handle set and live primitives from the control points.
    fn open_session(&mut self, ctx: &mut EditorContext<'_>, snapshot: bool) {
        self.clear_scene(ctx.renderer);
        let positions = {
            let mut model = self.model.write();
            model.floating = None;
            model.preview_split = None;
            model.positions.clone()
        };
        self.topology = Some(AnchorTopology::build(
            &positions,
            self.kind().spec().handles,
            self.painter.kernel.geodesy(),
        ));
        if snapshot {
            self.restore_point = positions;
        }
        self.add_live_body(ctx.renderer);
        self.add_handles(ctx.renderer);
        ctx.tooltip.set_visible(false);
    }

    fn revert(&mut self, ctx: &mut EditorContext<'_>) {
        self.model.write().positions.clone_from(&self.restore_point);
        self.open_session(ctx, false);
    }

    fn grab(&self, entity: PickedEntity) -> Option<DragHandle> {
        if entity.tag.key() != self.key || !entity.tag.is_handle() {
            return None;
        }
        let topology = self.topology.as_ref()?;
        let index = topology.index_of(entity.id)?;
        Some(DragHandle {
            handle: entity.id,
            index,
            flag: topology.flag(index),
        })
    }

    fn drag_to(&mut self, handle: DragHandle, position: Position, renderer: &mut dyn Renderer) {
        let geodesy = self.painter.kernel.geodesy();
        let Some(topology) = self.topology.as_mut() else {
            return;
        };
        let moves: Vec<(PrimitiveId, Position)> = if topology.is_midpoint(handle.index) {
            topology.move_handle(handle.index, position);
            self.model.write().preview_split = Some(((handle.index - 1) / 2 + 1, position));
            vec![(handle.handle, position)]
        } else {
            let changed = {
                let mut model = self.model.write();
                topology.move_control(&mut model.positions, handle.index, position, geodesy)
            };
            changed
                .into_iter()
                .filter_map(|i| Some((topology.handle_at(i)?, *topology.expanded().get(i)?)))
                .collect()
        };
        for (id, position) in moves {
            renderer.move_marker(id, position);
        }
    }

    fn release(&mut self, handle: DragHandle, world: Option<Position>, ctx: &mut EditorContext<'_>) {
        let position = world.or_else(|| {
            self.topology
                .as_ref()
                .and_then(|t| t.expanded().get(handle.index).copied())
        });
        if let Some(position) = position {
            self.drag_to(handle, position, ctx.renderer);
        }

        if handle.flag == HandleFlag::MidAnchor {
            let promoted = {
                let geodesy = self.painter.kernel.geodesy();
                let mut model = self.model.write();
                model.preview_split = None;
                self.topology
                    .as_mut()
                    .and_then(|t| t.promote(&mut model.positions, handle.index, geodesy))
            };
            self.remove_handles(ctx.renderer);
            if promoted.is_none() {
                let positions = self.model.read().positions.clone();
                self.topology = Some(AnchorTopology::build(
                    &positions,
                    self.kind().spec().handles,
                    self.painter.kernel.geodesy(),
                ));
            }
            self.add_handles(ctx.renderer);
        }

        ctx.renderer.set_camera_navigation(true);
        ctx.tooltip.set_visible(false);
    }

    fn commit(&mut self, ctx: &mut EditorContext<'_>) {
        self.clear_scene(ctx.renderer);
        self.topology = None;
        {
            let mut model = self.model.write();
            model.floating = None;
            model.preview_split = None;
        }
        self.add_static_body(ctx.renderer);
        ctx.tooltip.set_visible(false);
        tracing::info!("[editor] {} committed with {} points", self.key, self.placed());
    }

    fn teardown(&mut self, ctx: &mut EditorContext<'_>) {
        self.clear_scene(ctx.renderer);
        self.topology = None;
        self.valid = false;
        ctx.renderer.set_camera_navigation(true);
        ctx.tooltip.set_visible(false);
    }
}

/// One shape instance and its lifecycle.
pub struct ShapeEditor {
    state: EditorState,
    data: EditorData,
}

impl std::fmt::Debug for ShapeEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapeEditor")
            .field("key", &self.data.key)
            .field("state", &self.state)
            .field("positions", &self.data.model.read().positions.len())
            .finish_non_exhaustive()
    }
}

impl ShapeEditor {
    /// Start drawing a new shape. Nothing is rendered until the first input.
    pub fn new(kind: ShapeKind, options: CreateOptions, kernel: GeometryKernel, config: Arc<PlotConfig>) -> Self {
        Self::with_id(kind, uuid::Uuid::new_v4(), options, kernel, config)
    }

    pub fn with_id(
        kind: ShapeKind,
        id: ShapeId,
        options: CreateOptions,
        kernel: GeometryKernel,
        config: Arc<PlotConfig>,
    ) -> Self {
        let mut style = Style::default();
        style.apply(&options.style);
        let model = ShapeModel {
            style,
            label: options.label.unwrap_or_default(),
            ..ShapeModel::default()
        };
        let key = ShapeKey { kind, id };
        tracing::debug!("[editor] {key} drawing");

        Self {
            state: EditorState::Drawing,
            data: EditorData {
                key,
                model: Arc::new(RwLock::new(model)),
                painter: LayerPainter { kind, kernel, config },
                valid: true,
                restore_point: Vec::new(),
                topology: None,
                body: Vec::new(),
                anchors: Vec::new(),
                floating: None,
            },
        }
    }

    /// Recreate a committed shape from a persisted record.
    pub fn from_record(
        record: &ShapeRecord,
        kernel: GeometryKernel,
        config: Arc<PlotConfig>,
        renderer: &mut dyn Renderer,
    ) -> Result<Self, RecordError> {
        record.validate()?;
        let options = CreateOptions {
            style: record.style.restricted(record.shape.spec().style_fields),
            label: record.label.clone(),
        };
        let mut editor = Self::new(record.shape, options, kernel, config);
        editor.data.model.write().positions.clone_from(&record.positions);
        editor.data.add_static_body(renderer);
        editor.state = EditorState::Committed;
        Ok(editor)
    }

    pub fn handle(&mut self, event: PlotEvent, ctx: &mut EditorContext<'_>, responses: &mut Vec<EditorResponse>) {
        let old = self.state;
        self.state = old.transition(event, &mut self.data, ctx, responses);
        if self.state != old {
            tracing::debug!("[editor] {}: {old:?} -> {:?}", self.data.key, self.state);
        }
    }

    pub fn key(&self) -> ShapeKey {
        self.data.key
    }

    pub fn kind(&self) -> ShapeKind {
        self.data.key.kind
    }

    pub fn id(&self) -> ShapeId {
        self.data.key.id
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.data.valid
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing()
    }

    /// Control points, excluding any floating anchor.
    pub fn positions(&self) -> Vec<Position> {
        self.data.model.read().positions.clone()
    }

    /// Control points when the current edit session began.
    pub fn restore_point(&self) -> &[Position] {
        &self.data.restore_point
    }

    /// Displayed handle positions while editing.
    pub fn handle_positions(&self) -> Option<Vec<Position>> {
        self.data.topology.as_ref().map(|t| t.expanded().to_vec())
    }

    pub fn style(&self) -> Style {
        self.data.model.read().style.clone()
    }

    pub fn label_text(&self) -> String {
        self.data.model.read().label.clone()
    }

    /// Persistable snapshot.
    pub fn to_record(&self) -> ShapeRecord {
        let model = self.data.model.read();
        ShapeRecord::new(
            self.kind(),
            model.positions.clone(),
            &model.style,
            Some(&model.label),
        )
    }

    pub fn set_color(&mut self, field: StyleField, color: CssColor, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.ensure_alive()?;
        self.data.model.write().style.set(field, color);
        self.refresh_static(renderer);
        Ok(())
    }

    pub fn set_line_color(&mut self, css: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.set_color(StyleField::LineColor, CssColor::parse(css)?, renderer)
    }

    pub fn set_fill_color(&mut self, css: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.set_color(StyleField::FillColor, CssColor::parse(css)?, renderer)
    }

    pub fn set_edge_color(&mut self, css: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.set_color(StyleField::EdgeColor, CssColor::parse(css)?, renderer)
    }

    pub fn set_text_color(&mut self, css: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.set_color(StyleField::TextColor, CssColor::parse(css)?, renderer)
    }

    pub fn set_bg_color(&mut self, css: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.set_color(StyleField::BgColor, CssColor::parse(css)?, renderer)
    }

    pub fn set_style(&mut self, overrides: &StyleOverrides, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.ensure_alive()?;
        self.data.model.write().style.apply(overrides);
        self.refresh_static(renderer);
        Ok(())
    }

    pub fn set_label_text(&mut self, text: &str, renderer: &mut dyn Renderer) -> Result<(), EditorError> {
        self.ensure_alive()?;
        if !self.kind().spec().has_label_text {
            return Err(EditorError::NotALabel(self.kind()));
        }
        text.clone_into(&mut self.data.model.write().label);
        self.refresh_static(renderer);
        Ok(())
    }

    fn ensure_alive(&self) -> Result<(), EditorError> {
        if self.state == EditorState::Deleted {
            return Err(EditorError::Deleted(self.data.key));
        }
        Ok(())
    }

    /// Live states pick style changes up on the next frame.
    fn refresh_static(&mut self, renderer: &mut dyn Renderer) {
        if self.state == EditorState::Committed {
            self.data.redraw_committed(renderer);
        }
    }
}
