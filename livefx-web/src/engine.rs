//! `AudioEngine` implementation over the browser's Web Audio and
//! `getDisplayMedia` capabilities.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{DisplayMediaStreamConstraints, DomException, HtmlAudioElement, MediaDevices,
    MediaStream};

use livefx_core::{AudioEngine, CaptureCompletion, CaptureError};

use crate::graph::{js_error_message, WebGraph};

/// Web Audio engine. One instance serves any number of consecutive
/// sessions; each session gets its own `AudioContext`.
#[derive(Default)]
pub struct WebAudioEngine {
    playback: Option<HtmlAudioElement>,
}

impl WebAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine whose stream sinks replay through `element`.
    pub fn with_playback_element(element: HtmlAudioElement) -> Self {
        Self {
            playback: Some(element),
        }
    }
}

fn media_devices() -> Result<MediaDevices, CaptureError> {
    let window = web_sys::window().ok_or(CaptureError::CaptureUnavailable)?;
    window
        .navigator()
        .media_devices()
        .map_err(|_| CaptureError::CaptureUnavailable)
}

/// Map a `getDisplayMedia` rejection onto the capture error taxonomy.
fn capture_error_from_js(err: &JsValue) -> CaptureError {
    match err.dyn_ref::<DomException>() {
        Some(exception) => match exception.name().as_str() {
            "NotAllowedError" | "SecurityError" => CaptureError::CaptureDenied,
            "NotFoundError" | "NotSupportedError" | "AbortError" => {
                CaptureError::CaptureUnavailable
            }
            _ => CaptureError::EngineFailure(js_error_message(err)),
        },
        None => CaptureError::EngineFailure(js_error_message(err)),
    }
}

impl AudioEngine for WebAudioEngine {
    type Context = WebGraph;

    fn capture_supported(&self) -> bool {
        media_devices().is_ok()
    }

    fn create_context(&mut self) -> Result<WebGraph, CaptureError> {
        WebGraph::new(self.playback.clone())
    }

    fn request_capture(&mut self, completion: CaptureCompletion<MediaStream>) {
        let devices = match media_devices() {
            Ok(devices) => devices,
            Err(e) => {
                completion(Err(e));
                return;
            }
        };

        let constraints = DisplayMediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);
        constraints.set_video(&JsValue::FALSE);

        let promise = match devices.get_display_media_with_constraints(&constraints) {
            Ok(promise) => promise,
            Err(e) => {
                completion(Err(capture_error_from_js(&e)));
                return;
            }
        };

        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(value) => match value.dyn_into::<MediaStream>() {
                    Ok(stream) => completion(Ok(stream)),
                    Err(other) => completion(Err(CaptureError::EngineFailure(format!(
                        "unexpected capture result: {other:?}"
                    )))),
                },
                Err(e) => completion(Err(capture_error_from_js(&e))),
            }
        });
    }
}
