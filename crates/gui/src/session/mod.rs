//! The live viewer: owns at most one session built from a model source.
//!
//! Loading a source tears down the running session first (listeners
//! removed, render loop cancelled), then evaluates, tessellates and frames
//! the new model. Any failure leaves the viewer without a session and the
//! error on the overlay; stale geometry is never shown.

mod listeners;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::{ParameterDefinition, ParameterOverride};

pub use listeners::{ListenerId, ListenerRegistry};

use crate::build::{tessellate_all, SolidMesh, DEFAULT_MODEL_COLOR};
use crate::evaluator::{EvaluationError, EvaluationLimits, Evaluator};
use crate::export::{self, ExportArtifact, ExportError, Snapshot, SnapshotError};
use crate::model::{GeneratedSource, Solid};
use crate::scene::{build_scene, frame_camera, Scene, SceneSettings};
use crate::state::generation::GenerationServiceError;
use crate::viewport::camera::CameraState;
use crate::viewport::navigation::{InputEvent, InputKind, NavigationController, DEFAULT_ORBIT_SPEED};
use crate::viewport::render_loop::{FrameOutcome, LoopHandle, RenderLoop};

const LISTENED_KINDS: [InputKind; 3] = [InputKind::Pointer, InputKind::Wheel, InputKind::Resize];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    GenerationService(#[from] GenerationServiceError),
}

impl ViewerError {
    /// Short label for the overlay title.
    pub fn kind(&self) -> &'static str {
        match self {
            ViewerError::Evaluation(_) => "evaluation",
            ViewerError::Export(_) => "export",
            ViewerError::Snapshot(_) => "snapshot",
            ViewerError::GenerationService(_) => "generation",
        }
    }
}

/// Viewer preferences, persisted as part of the app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub background_color: [u8; 3],
    pub model_color: [f32; 3],
    pub show_grid: bool,
    pub show_axes: bool,
    pub grid_opacity: f32,
    /// Radians per pixel of pointer drag
    pub orbit_speed: f32,
    pub invert_wheel: bool,
    /// Script operation budget per evaluation
    pub max_operations: u64,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            background_color: [30, 30, 35],
            model_color: DEFAULT_MODEL_COLOR,
            show_grid: true,
            show_axes: true,
            grid_opacity: 0.6,
            orbit_speed: DEFAULT_ORBIT_SPEED,
            invert_wheel: false,
            max_operations: EvaluationLimits::default().max_operations,
        }
    }
}

impl ViewerSettings {
    fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            show_grid: self.show_grid,
            show_axes: self.show_axes,
            grid_opacity: self.grid_opacity,
        }
    }

    fn limits(&self) -> EvaluationLimits {
        EvaluationLimits {
            max_operations: self.max_operations,
            ..EvaluationLimits::default()
        }
    }
}

/// One loaded model with its camera, navigation and render loop.
pub struct ViewerSession {
    source: GeneratedSource,
    solids: Vec<Solid>,
    meshes: Vec<SolidMesh>,
    parameters: Vec<ParameterDefinition>,
    values: BTreeMap<String, f64>,
    scene: Scene,
    camera: CameraState,
    navigation: NavigationController,
    render_loop: RenderLoop,
    listeners: Vec<ListenerId>,
    torn_down: bool,
}

impl ViewerSession {
    pub fn source(&self) -> &GeneratedSource {
        &self.source
    }

    pub fn solids(&self) -> &[Solid] {
        &self.solids
    }

    pub fn meshes(&self) -> &[SolidMesh] {
        &self.meshes
    }

    pub fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    pub fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.navigation
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render_loop
    }

    pub fn loop_handle(&self) -> LoopHandle {
        self.render_loop.handle()
    }

    pub fn listeners(&self) -> &[ListenerId] {
        &self.listeners
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancel the render loop and detach every listener. Safe to repeat.
    pub fn teardown(&mut self, registry: &mut ListenerRegistry) {
        if self.torn_down {
            return;
        }
        self.render_loop.handle().cancel();
        for id in self.listeners.drain(..) {
            registry.unregister(id);
        }
        self.torn_down = true;
        tracing::debug!(solids = self.solids.len(), "Session torn down");
    }

    fn handle_input(&mut self, event: InputEvent) {
        self.navigation.apply(&mut self.camera, event);
        if matches!(event, InputEvent::Wheel { .. }) {
            self.camera.fit_depth_range(self.scene.bounds.bounding_radius().max(0.0));
        }
    }
}

pub struct Viewer {
    evaluator: Evaluator,
    settings: ViewerSettings,
    registry: ListenerRegistry,
    session: Option<ViewerSession>,
    /// Last source handed to the viewer, kept after a failed evaluation
    source: Option<GeneratedSource>,
    overrides: BTreeMap<String, ParameterOverride>,
    overlay: Option<ViewerError>,
    viewport: (u32, u32),
    export_seq: u64,
    /// Frames drawn across every session of this viewer
    frame_seq: u64,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new(ViewerSettings::default())
    }
}

impl Viewer {
    pub fn new(settings: ViewerSettings) -> Self {
        Self {
            evaluator: Evaluator::new(settings.limits()),
            settings,
            registry: ListenerRegistry::new(),
            session: None,
            source: None,
            overrides: BTreeMap::new(),
            overlay: None,
            viewport: (800, 600),
            export_seq: 0,
            frame_seq: 0,
        }
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn settings(&self) -> &ViewerSettings {
        &self.settings
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        self.session.as_ref()
    }

    pub fn source(&self) -> Option<&GeneratedSource> {
        self.source.as_ref()
    }

    /// Solids of the running session; empty when there is none.
    pub fn solids(&self) -> &[Solid] {
        self.session.as_ref().map(|s| s.solids()).unwrap_or(&[])
    }

    pub fn camera(&self) -> Option<&CameraState> {
        self.session.as_ref().map(|s| s.camera())
    }

    pub fn overrides(&self) -> &BTreeMap<String, ParameterOverride> {
        &self.overrides
    }

    pub fn overlay(&self) -> Option<&ViewerError> {
        self.overlay.as_ref()
    }

    pub fn set_overlay(&mut self, error: impl Into<ViewerError>) {
        self.overlay = Some(error.into());
    }

    pub fn dismiss_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    // ── Session lifecycle ────────────────────────────────────

    /// Replace the current model with `source`, using its default parameters.
    pub fn load_source(&mut self, source: GeneratedSource) -> Result<(), ViewerError> {
        self.overrides.clear();
        self.source = Some(source);
        self.rebuild()
    }

    /// Re-evaluate the current source with new parameter overrides.
    pub fn set_overrides(&mut self, overrides: BTreeMap<String, ParameterOverride>) -> Result<(), ViewerError> {
        self.overrides = overrides;
        self.rebuild()
    }

    /// Drop the running session, if any.
    pub fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown(&mut self.registry);
        }
    }

    /// Switch to new settings. Changes that affect evaluation or the scene
    /// rebuild the session; view-only changes are applied to the running
    /// session so the camera stays where the user left it.
    pub fn apply_settings(&mut self, settings: ViewerSettings) -> Result<(), ViewerError> {
        let rebuild = settings.max_operations != self.settings.max_operations
            || settings.model_color != self.settings.model_color
            || settings.scene_settings() != self.settings.scene_settings();
        if settings.max_operations != self.settings.max_operations {
            self.evaluator = Evaluator::new(settings.limits());
        }
        self.settings = settings;
        if rebuild && self.source.is_some() {
            return self.rebuild();
        }
        if let Some(session) = self.session.as_mut() {
            session.navigation.set_orbit_speed(self.settings.orbit_speed);
            session.navigation.set_inverted_wheel(self.settings.invert_wheel);
            session.render_loop.set_background(self.settings.background_color);
        }
        Ok(())
    }

    fn rebuild(&mut self) -> Result<(), ViewerError> {
        self.teardown();
        let Some(source) = self.source.clone() else {
            return Ok(());
        };

        match self.create_session(source) {
            Ok(session) => {
                tracing::info!(
                    solids = session.solids.len(),
                    triangles = session.meshes.iter().map(|m| m.mesh.triangle_count()).sum::<usize>(),
                    "Session created"
                );
                self.session = Some(session);
                self.overlay = None;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Model evaluation failed: {e}");
                let error = ViewerError::from(e);
                self.overlay = Some(error.clone());
                Err(error)
            }
        }
    }

    fn create_session(&mut self, source: GeneratedSource) -> Result<ViewerSession, EvaluationError> {
        let evaluation = self.evaluator.evaluate_with(&source, &self.overrides)?;
        let meshes = tessellate_all(&evaluation.solids, self.settings.model_color).map_err(|e| {
            EvaluationError::ExecutionFailed {
                message: e.to_string(),
            }
        })?;

        let scene = build_scene(&meshes, &self.settings.scene_settings());
        let camera = frame_camera(&scene.bounds, self.viewport.0, self.viewport.1);
        let navigation = NavigationController::new(self.settings.orbit_speed)
            .with_inverted_wheel(self.settings.invert_wheel);
        let render_loop = RenderLoop::new(self.viewport.0, self.viewport.1, self.settings.background_color);
        let listeners = LISTENED_KINDS.iter().map(|k| self.registry.register(*k)).collect();

        Ok(ViewerSession {
            source,
            solids: evaluation.solids,
            meshes,
            parameters: evaluation.parameters,
            values: evaluation.values,
            scene,
            camera,
            navigation,
            render_loop,
            listeners,
            torn_down: false,
        })
    }

    /// Put the camera back to the framed default view.
    pub fn reset_camera(&mut self) {
        let (w, h) = self.viewport;
        if let Some(session) = self.session.as_mut() {
            session.camera = frame_camera(&session.scene.bounds, w, h);
        }
    }

    // ── Input and drawing ────────────────────────────────────

    /// Deliver an input event. Returns false when no listener took it.
    pub fn handle_input(&mut self, event: InputEvent) -> bool {
        if let InputEvent::Resize { width, height } = event {
            self.viewport = (width.max(1), height.max(1));
        }
        if !self.registry.listens_for(event.kind()) {
            return false;
        }
        match self.session.as_mut() {
            Some(session) => {
                session.handle_input(event);
                true
            }
            None => false,
        }
    }

    /// Draw one frame of the running session.
    ///
    /// Drawn frames are numbered per viewer, so a number is never reused
    /// after a reload or a resize restarts the session's own count.
    pub fn tick(&mut self) -> Option<FrameOutcome> {
        let session = self.session.as_mut()?;
        match session.render_loop.tick(&session.scene, &session.camera) {
            FrameOutcome::Drawn { .. } => {
                self.frame_seq += 1;
                Some(FrameOutcome::Drawn { frame: self.frame_seq })
            }
            FrameOutcome::Cancelled => Some(FrameOutcome::Cancelled),
        }
    }

    // ── Export ───────────────────────────────────────────────

    pub fn export_stl(&mut self, identifier: &str) -> Result<ExportArtifact, ViewerError> {
        let meshes = self.session.as_ref().map(|s| s.meshes()).unwrap_or(&[]);
        let artifact = export::export_stl(meshes, identifier, self.export_seq)?;
        self.export_seq += 1;
        Ok(artifact)
    }

    pub fn snapshot(&self) -> Result<Snapshot, ViewerError> {
        let session = self.session.as_ref().ok_or(SnapshotError::NoModel)?;
        Ok(export::snapshot(session.render_loop.surface())?)
    }
}
