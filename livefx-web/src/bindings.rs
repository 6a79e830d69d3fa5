//! `wasm-bindgen` facade for the single-page UI.
//!
//! Exposes the session and control surface under the names the page scripts
//! use: `startCapture`/`stopCapture`, `setCompressorParameter(name, value)`,
//! `setBandGain(index, value)`, plus slider metadata so the page renders
//! controls without hardcoding ranges.

use std::sync::Arc;

use wasm_bindgen::prelude::*;
use web_sys::HtmlAudioElement;

use livefx_core::{
    CaptureSession, CompressorParam, ControlPanel, SessionConfig, SessionDelegate, SessionPhase,
    CaptureError, EQ_BAND_FREQUENCIES_HZ,
};

use crate::engine::WebAudioEngine;
use crate::graph::{js_error_message, WebGraph};

/// Route `log` output to the browser console. Call once, before anything
/// else; repeated calls are harmless.
#[wasm_bindgen(js_name = initDiagnostics)]
pub fn init_diagnostics() {
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// Forwards lifecycle changes to a page callback; errors stay in the
/// console log only.
struct JsDelegate {
    on_state: js_sys::Function,
}

impl SessionDelegate for JsDelegate {
    fn on_state_changed(&self, phase: SessionPhase) {
        let capturing = JsValue::from_bool(phase.is_capturing());
        if let Err(e) = self.on_state.call1(&JsValue::NULL, &capturing) {
            log::warn!("state-change callback threw: {}", js_error_message(&e));
        }
    }

    fn on_error(&self, error: &CaptureError) {
        log::error!("{error}");
    }
}

/// The application object the page instantiates: one capture session plus
/// its control panel.
#[wasm_bindgen]
pub struct CaptureApp {
    session: CaptureSession<WebAudioEngine>,
    panel: ControlPanel<WebGraph>,
}

#[wasm_bindgen]
impl CaptureApp {
    /// `config` is an optional `{enableOutputRouting, exposeAllCompressorControls}`
    /// object; `playback_element` is the `<audio>` element processed audio is
    /// replayed through when output routing is enabled.
    #[wasm_bindgen(constructor)]
    pub fn new(
        config: JsValue,
        playback_element: Option<HtmlAudioElement>,
    ) -> Result<CaptureApp, JsValue> {
        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&format!("{e}")))?
        };

        let engine = match playback_element {
            Some(element) => WebAudioEngine::with_playback_element(element),
            None => WebAudioEngine::new(),
        };
        let session = CaptureSession::new(engine, config);
        let panel = session.control_panel();
        Ok(CaptureApp { session, panel })
    }

    /// Install a `(capturing: boolean) => void` callback driving the
    /// start/stop affordance.
    #[wasm_bindgen(js_name = onStateChanged)]
    pub fn on_state_changed(&mut self, callback: js_sys::Function) {
        self.session
            .set_delegate(Arc::new(JsDelegate { on_state: callback }));
    }

    /// Build the processing graph and request tab/system audio capture.
    /// Failures are logged only; the page observes state via the callback.
    #[wasm_bindgen(js_name = startCapture)]
    pub fn start_capture(&mut self) {
        if let Err(e) = self.session.start() {
            log::error!("capture start failed: {e}");
        }
    }

    #[wasm_bindgen(js_name = stopCapture)]
    pub fn stop_capture(&mut self) {
        self.session.stop();
    }

    #[wasm_bindgen(js_name = isCapturing)]
    pub fn is_capturing(&self) -> bool {
        self.session.phase().is_capturing()
    }

    /// Set a compressor parameter by its slider name ("threshold", "ratio",
    /// "attack", "release"). Returns whether the value was applied.
    #[wasm_bindgen(js_name = setCompressorParameter)]
    pub fn set_compressor_parameter(&mut self, name: &str, value: f64) -> bool {
        match CompressorParam::from_name(name) {
            Some(param) => self.panel.set_compressor(param, value),
            None => {
                log::warn!("unknown compressor parameter {name:?}");
                false
            }
        }
    }

    /// Set one EQ band's gain in dB. Returns whether the value was applied.
    #[wasm_bindgen(js_name = setBandGain)]
    pub fn set_band_gain(&mut self, index: usize, value: f64) -> bool {
        self.panel.set_band_gain(index, value)
    }

    /// Center frequencies of the six gain sliders, in band order.
    #[wasm_bindgen(js_name = bandFrequencies)]
    pub fn band_frequencies(&self) -> Vec<f64> {
        EQ_BAND_FREQUENCIES_HZ.to_vec()
    }

    /// Slider metadata (`{name, min, max, default}[]`) for the compressor
    /// controls this configuration exposes.
    #[wasm_bindgen(js_name = compressorControls)]
    pub fn compressor_controls(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.panel.compressor_descriptors())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }

    /// The control values as last applied (rendered defaults until then).
    #[wasm_bindgen(js_name = controlValues)]
    pub fn control_values(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.panel.values())
            .map_err(|e| JsValue::from_str(&format!("{e}")))
    }
}
