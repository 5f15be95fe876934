pub mod generation;
pub mod settings;
pub mod sketch;

use std::collections::BTreeMap;

use shared::{GenerateRequest, ParameterOverride, PrintabilityReport};

pub use generation::{ChatMessage, ChatRole, GenerationClient, GenerationServiceError};
pub use settings::AppSettings;
pub use sketch::SketchPad;

use crate::export::ExportArtifact;
use crate::model::GeneratedSource;
use crate::session::{Viewer, ViewerError};

/// Panel visibility flags
pub struct PanelVisibility {
    pub sketch: bool,
    pub parameters: bool,
    pub report: bool,
    pub source: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            sketch: true,
            parameters: true,
            report: true,
            source: false,
        }
    }
}

/// Combined application state
pub struct AppState {
    pub viewer: Viewer,
    pub sketch: SketchPad,
    /// `None` when the background runtime could not be started
    pub generation: Option<GenerationClient>,
    pub settings: AppSettings,
    pub panels: PanelVisibility,
    pub prompt: String,
    /// Printability report for the current source
    pub report: Option<PrintabilityReport>,
    /// Text of the parameter override fields, keyed by parameter name
    pub override_inputs: BTreeMap<String, String>,
    pub show_settings_window: bool,
    /// Source editor contents
    pub source_text: String,
}

impl AppState {
    pub fn new(settings: AppSettings) -> Self {
        let generation = match GenerationClient::new(&settings.service.url) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!("Failed to start generation runtime: {e}");
                None
            }
        };
        let mut sketch = SketchPad::new(settings.sketch.canvas_size);
        sketch.brush_size = settings.sketch.brush_size;

        Self {
            viewer: Viewer::new(settings.viewer.clone()),
            sketch,
            generation,
            settings,
            panels: PanelVisibility::default(),
            prompt: String::new(),
            report: None,
            override_inputs: BTreeMap::new(),
            show_settings_window: false,
            source_text: String::new(),
        }
    }

    // ── Generation ───────────────────────────────────────────

    /// Send the sketch and prompt to the generation service.
    ///
    /// The current source is attached so the service can iterate on it.
    pub fn submit_generation(&mut self) {
        let mut request = GenerateRequest::new(self.prompt.trim());
        if !self.sketch.is_empty() {
            match self.sketch.to_png_base64() {
                Ok(png) => request.image_base64 = Some(png),
                Err(e) => {
                    self.viewer.set_overlay(e);
                    return;
                }
            }
        }
        request.previous_code = self.viewer.source().map(|s| s.as_str().to_string());

        let result = match self.generation.as_mut() {
            Some(client) => client.request(request),
            None => Err(GenerationServiceError::Unreachable("generation runtime unavailable".into())),
        };
        if let Err(e) = result {
            self.viewer.set_overlay(e);
        }
    }

    /// Check for a finished generation request. Call once per frame.
    pub fn poll_generation(&mut self) {
        let Some(result) = self.generation.as_mut().and_then(|c| c.poll()) else {
            return;
        };
        match result {
            Ok(response) => {
                let _ = self.apply_source(GeneratedSource::new(response.code));
            }
            Err(e) => self.viewer.set_overlay(e),
        }
    }

    /// Resend the last request that failed.
    pub fn retry_generation(&mut self) {
        let result = match self.generation.as_mut() {
            Some(client) => client.retry(),
            None => Err(GenerationServiceError::Unreachable("generation runtime unavailable".into())),
        };
        if let Err(e) = result {
            self.viewer.set_overlay(e);
        }
    }

    pub fn can_retry_generation(&self) -> bool {
        self.generation
            .as_ref()
            .is_some_and(|c| !c.is_loading() && c.last_failed_request.is_some())
    }

    pub fn is_generating(&self) -> bool {
        self.generation.as_ref().is_some_and(|c| c.is_loading())
    }

    // ── Model ────────────────────────────────────────────────

    /// Load a new source into the viewer and check its printability.
    pub fn apply_source(&mut self, source: GeneratedSource) -> Result<(), ViewerError> {
        self.report = Some(shared::printability::check(source.as_str()));
        self.source_text = source.as_str().to_string();
        self.override_inputs.clear();
        let result = self.viewer.load_source(source);
        self.sync_override_inputs();
        if let Err(e) = &result {
            self.report_failure("evaluation", e);
        }
        result
    }

    /// Re-run the model with the values typed into the parameter fields.
    ///
    /// Numeric text becomes a number override, anything else a formula.
    pub fn apply_overrides(&mut self) -> Result<(), ViewerError> {
        let overrides: BTreeMap<String, ParameterOverride> = self
            .override_inputs
            .iter()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(name, text)| {
                let text = text.trim();
                let value = match text.parse::<f64>() {
                    Ok(value) => ParameterOverride::Number { value },
                    Err(_) => ParameterOverride::Formula {
                        expression: text.to_string(),
                    },
                };
                (name.clone(), value)
            })
            .collect();
        let result = self.viewer.set_overrides(overrides);
        if let Err(e) = &result {
            self.report_failure("parameters", e);
        }
        result
    }

    /// Drop all overrides and go back to the declared initial values.
    pub fn reset_overrides(&mut self) -> Result<(), ViewerError> {
        self.override_inputs.clear();
        let result = self.viewer.set_overrides(BTreeMap::new());
        self.sync_override_inputs();
        result
    }

    /// Fill empty parameter fields with the current values.
    fn sync_override_inputs(&mut self) {
        if let Some(session) = self.viewer.session() {
            for (name, value) in session.values() {
                self.override_inputs
                    .entry(name.clone())
                    .or_insert_with(|| format!("{}", value));
            }
        }
    }

    fn report_failure(&self, source: &str, error: &ViewerError) {
        if !self.settings.service.report_errors {
            return;
        }
        if let Some(client) = &self.generation {
            client.report_error(source, &error.to_string(), self.viewer.source().map(|s| s.as_str()));
        }
    }

    // ── Export ───────────────────────────────────────────────

    /// File stem for exports, derived from the prompt.
    pub fn model_identifier(&self) -> String {
        let words: Vec<&str> = self.prompt.split_whitespace().take(3).collect();
        if words.is_empty() {
            "model".to_string()
        } else {
            words.join("_")
        }
    }

    pub fn export_stl(&mut self) -> Result<ExportArtifact, ViewerError> {
        let identifier = self.model_identifier();
        let result = self.viewer.export_stl(&identifier);
        if let Err(e) = &result {
            self.viewer.set_overlay(e.clone());
        }
        result
    }

    /// Use the current frame as the sketch background for the next iteration.
    pub fn snapshot_to_sketch(&mut self) -> Result<(), ViewerError> {
        let result = self
            .viewer
            .snapshot()
            .and_then(|snapshot| self.sketch.seed_from_snapshot(&snapshot).map_err(ViewerError::from));
        if let Err(e) = &result {
            self.viewer.set_overlay(e.clone());
        }
        result
    }

    /// Push edited settings into the viewer and persist them.
    pub fn apply_settings(&mut self) {
        if let Some(client) = self.generation.as_mut() {
            client.set_base_url(&self.settings.service.url);
        }
        self.sketch.brush_size = self.settings.sketch.brush_size;
        crate::i18n::set_lang(self.settings.ui.language);
        if let Err(e) = self.viewer.apply_settings(self.settings.viewer.clone()) {
            tracing::warn!("Re-evaluation after settings change failed: {e}");
        }
        self.settings.save();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppSettings::load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        let mut settings = AppSettings::default();
        settings.service.report_errors = false;
        AppState::new(settings)
    }

    #[test]
    fn test_apply_source_fills_report_and_inputs() {
        let mut state = state();
        let source = r#"
            fn parameter_definitions() { [#{ name: "size", initial: 12.0 }] }
            fn main(params) { cube(params.size) }
        "#;
        state.apply_source(source.into()).unwrap();
        assert!(state.report.is_some());
        assert_eq!(state.override_inputs.get("size").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_overrides_numbers_and_formulas() {
        let mut state = state();
        let source = r#"
            fn parameter_definitions() { [#{ name: "a", initial: 2.0 }, #{ name: "b", initial: 3.0 }] }
            fn main(params) { cuboid([params.a, params.b, 1.0]) }
        "#;
        state.apply_source(source.into()).unwrap();
        state.override_inputs.insert("a".into(), "4".into());
        state.override_inputs.insert("b".into(), "a * 2".into());
        state.apply_overrides().unwrap();
        let values = state.viewer.session().unwrap().values();
        assert_eq!(values["a"], 4.0);
        assert_eq!(values["b"], 8.0);
    }

    #[test]
    fn test_model_identifier() {
        let mut state = state();
        assert_eq!(state.model_identifier(), "model");
        state.prompt = "  small phone stand with cable slot ".into();
        assert_eq!(state.model_identifier(), "small_phone_stand");
    }

    #[test]
    fn test_export_without_model_sets_overlay() {
        let mut state = state();
        assert!(state.export_stl().is_err());
        assert_eq!(state.viewer.overlay().map(|e| e.kind()), Some("export"));
    }
}
