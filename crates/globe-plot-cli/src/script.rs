//! Replay scripts: scripted pointer sessions against the headless host.

use globe_plot_core::{
    CreateOptions, HeadlessScene, HeadlessTooltip, InputEvent, PlotConfig, ScreenPos, ScreenProjection,
    ShapeKey, ShapeKind, ShapeRecord, ShapeRegistry, StyleField, StyleOverrides,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Script {
    pub projection: ScreenProjection,
    /// Shapes present before the first step.
    pub records: Vec<ShapeRecord>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Create {
        shape: ShapeKind,
        #[serde(default)]
        style: StyleOverrides,
        #[serde(default)]
        label: Option<String>,
    },
    LeftClick {
        x: f64,
        y: f64,
    },
    LeftDown {
        x: f64,
        y: f64,
    },
    MouseMove {
        x: f64,
        y: f64,
    },
    LeftUp {
        x: f64,
        y: f64,
    },
    RightClick,
    Save,
    DeleteSelected,
    SetColor {
        field: StyleField,
        color: String,
    },
    SetLabel {
        text: String,
    },
    PlotShapes,
    Clear,
}

pub type Registry = ShapeRegistry<HeadlessScene, HeadlessTooltip>;

/// Runs steps and remembers which shape style edits apply to.
pub struct Replay {
    registry: Registry,
    /// Most recently created shape.
    last: Option<ShapeKey>,
}

impl Replay {
    pub fn new(projection: ScreenProjection, config: PlotConfig) -> Self {
        Self {
            registry: ShapeRegistry::with_config(HeadlessScene::new(projection), HeadlessTooltip::default(), config),
            last: None,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn load(&mut self, records: &[ShapeRecord]) -> anyhow::Result<()> {
        let keys = self.registry.rebuild_all(records)?;
        tracing::info!("[replay] loaded {} records", keys.len());
        Ok(())
    }

    pub fn run(&mut self, index: usize, step: Step) -> anyhow::Result<()> {
        tracing::debug!("[replay] step {index}: {step:?}");
        match step {
            Step::Create { shape, style, label } => {
                self.last = Some(self.registry.create(shape, CreateOptions { style, label }));
            }
            Step::LeftClick { x, y } => self.input(InputEvent::LeftClick(ScreenPos::new(x, y))),
            Step::LeftDown { x, y } => self.input(InputEvent::LeftDown(ScreenPos::new(x, y))),
            Step::MouseMove { x, y } => self.input(InputEvent::MouseMove(ScreenPos::new(x, y))),
            Step::LeftUp { x, y } => self.input(InputEvent::LeftUp(ScreenPos::new(x, y))),
            Step::RightClick => self.input(InputEvent::RightClick(ScreenPos::ZERO)),
            Step::Save => self.registry.save(),
            Step::DeleteSelected => {
                if self.registry.delete_selected().is_none() {
                    tracing::warn!("[replay] step {index}: nothing selected to delete");
                }
            }
            Step::SetColor { field, color } => {
                let key = self.target(index)?;
                self.registry.set_color(key, field, &color)?;
            }
            Step::SetLabel { text } => {
                let key = self.target(index)?;
                self.registry.set_label_text(key, &text)?;
            }
            Step::PlotShapes => self.registry.plot_shapes(),
            Step::Clear => {
                self.registry.clear();
                self.last = None;
            }
        }
        let rendered = self.registry.scene_mut().render_frame();
        tracing::debug!("[replay] frame after step {index}: {rendered} primitives");
        Ok(())
    }

    /// Finish any open session and return the persisted records.
    pub fn finish(mut self) -> Vec<ShapeRecord> {
        self.registry.finish();
        self.registry.serialize_all()
    }

    fn input(&mut self, event: InputEvent) {
        self.registry.handle_input(event);
    }

    /// Selected shape, else the last one created.
    fn target(&self, index: usize) -> anyhow::Result<ShapeKey> {
        self.registry
            .selected()
            .or(self.last.filter(|key| self.registry.get(*key).is_some()))
            .ok_or_else(|| anyhow::anyhow!("step {index}: no shape to apply to"))
    }
}
