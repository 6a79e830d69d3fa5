//! `ProcessingContext` implementation over a Web Audio `AudioContext`.
//!
//! Node handles minted by this graph index into an internal store; the
//! destination node occupies index 0 from construction. Closing the graph
//! closes the `AudioContext`, which releases every node with it.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioContext, AudioDestinationNode, AudioNode, AudioParam, BiquadFilterNode, BiquadFilterType,
    DomException, DynamicsCompressorNode, HtmlAudioElement, MediaStream,
    MediaStreamAudioDestinationNode, MediaStreamAudioSourceNode,
};

use livefx_core::{BandSpec, CaptureError, CompressorParam, NodeId, ProcessingContext};

/// Human-readable message out of a thrown `JsValue`.
pub(crate) fn js_error_message(value: &JsValue) -> String {
    if let Some(exception) = value.dyn_ref::<DomException>() {
        format!("{}: {}", exception.name(), exception.message())
    } else if let Some(text) = value.as_string() {
        text
    } else {
        format!("{value:?}")
    }
}

pub(crate) fn engine_failure(what: &str, err: JsValue) -> CaptureError {
    CaptureError::EngineFailure(format!("{what}: {}", js_error_message(&err)))
}

enum WebNode {
    Destination(AudioDestinationNode),
    Compressor(DynamicsCompressorNode),
    Filter(BiquadFilterNode),
    Source(MediaStreamAudioSourceNode),
    Sink(MediaStreamAudioDestinationNode),
}

impl WebNode {
    fn as_audio_node(&self) -> &AudioNode {
        match self {
            WebNode::Destination(n) => n.as_ref(),
            WebNode::Compressor(n) => n.as_ref(),
            WebNode::Filter(n) => n.as_ref(),
            WebNode::Source(n) => n.as_ref(),
            WebNode::Sink(n) => n.as_ref(),
        }
    }
}

/// One live `AudioContext` and the nodes created inside it.
pub struct WebGraph {
    context: AudioContext,
    nodes: Vec<WebNode>,
    playback: Option<HtmlAudioElement>,
}

impl WebGraph {
    pub(crate) fn new(playback: Option<HtmlAudioElement>) -> Result<Self, CaptureError> {
        let context =
            AudioContext::new().map_err(|e| engine_failure("audio context creation", e))?;
        let nodes = vec![WebNode::Destination(context.destination())];
        Ok(Self {
            context,
            nodes,
            playback,
        })
    }

    fn push(&mut self, node: WebNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> Result<&WebNode, CaptureError> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| CaptureError::EngineFailure(format!("unknown node id {}", id.0)))
    }

    fn compressor_node(&self, id: NodeId) -> Result<&DynamicsCompressorNode, CaptureError> {
        match self.node(id)? {
            WebNode::Compressor(node) => Ok(node),
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a compressor",
                id.0
            ))),
        }
    }

    fn filter_node(&self, id: NodeId) -> Result<&BiquadFilterNode, CaptureError> {
        match self.node(id)? {
            WebNode::Filter(node) => Ok(node),
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a filter",
                id.0
            ))),
        }
    }
}

fn compressor_audio_param(node: &DynamicsCompressorNode, param: CompressorParam) -> AudioParam {
    match param {
        CompressorParam::Threshold => node.threshold(),
        CompressorParam::Ratio => node.ratio(),
        CompressorParam::Attack => node.attack(),
        CompressorParam::Release => node.release(),
    }
}

impl ProcessingContext for WebGraph {
    type Stream = MediaStream;

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn create_compressor(&mut self) -> Result<NodeId, CaptureError> {
        let node = self
            .context
            .create_dynamics_compressor()
            .map_err(|e| engine_failure("compressor creation", e))?;
        Ok(self.push(WebNode::Compressor(node)))
    }

    fn create_peaking_filter(&mut self, band: BandSpec) -> Result<NodeId, CaptureError> {
        let node = self
            .context
            .create_biquad_filter()
            .map_err(|e| engine_failure("filter creation", e))?;
        node.set_type(BiquadFilterType::Peaking);
        node.frequency().set_value(band.frequency_hz as f32);
        node.q().set_value(band.q as f32);
        node.gain().set_value(band.gain_db as f32);
        Ok(self.push(WebNode::Filter(node)))
    }

    fn create_capture_source(&mut self, stream: MediaStream) -> Result<NodeId, CaptureError> {
        let node = self
            .context
            .create_media_stream_source(&stream)
            .map_err(|e| engine_failure("capture source creation", e))?;
        Ok(self.push(WebNode::Source(node)))
    }

    fn create_stream_sink(&mut self) -> Result<NodeId, CaptureError> {
        let node = self
            .context
            .create_media_stream_destination()
            .map_err(|e| engine_failure("stream sink creation", e))?;
        Ok(self.push(WebNode::Sink(node)))
    }

    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<(), CaptureError> {
        let from = self.node(source)?.as_audio_node();
        let to = self.node(target)?.as_audio_node();
        from.connect_with_audio_node(to)
            .map_err(|e| engine_failure("node connection", e))?;
        Ok(())
    }

    fn set_compressor_param(
        &mut self,
        compressor: NodeId,
        param: CompressorParam,
        value: f64,
    ) -> Result<(), CaptureError> {
        compressor_audio_param(self.compressor_node(compressor)?, param).set_value(value as f32);
        Ok(())
    }

    fn compressor_param(
        &self,
        compressor: NodeId,
        param: CompressorParam,
    ) -> Result<f64, CaptureError> {
        Ok(compressor_audio_param(self.compressor_node(compressor)?, param).value() as f64)
    }

    fn set_band_gain(&mut self, filter: NodeId, gain_db: f64) -> Result<(), CaptureError> {
        self.filter_node(filter)?.gain().set_value(gain_db as f32);
        Ok(())
    }

    fn band_gain(&self, filter: NodeId) -> Result<f64, CaptureError> {
        Ok(self.filter_node(filter)?.gain().value() as f64)
    }

    fn start_playback(&mut self, sink: NodeId) -> Result<(), CaptureError> {
        let stream = match self.node(sink)? {
            WebNode::Sink(node) => node.stream(),
            _ => {
                return Err(CaptureError::EngineFailure(format!(
                    "node {} is not a stream sink",
                    sink.0
                )))
            }
        };
        let element = self
            .playback
            .as_ref()
            .ok_or_else(|| CaptureError::PlaybackFailure("no playback element bound".into()))?;

        element.set_src_object(Some(&stream));
        let promise = element
            .play()
            .map_err(|e| CaptureError::PlaybackFailure(js_error_message(&e)))?;

        // play() reports most refusals (e.g. autoplay policy) through its
        // promise; observe it so they reach the diagnostic log.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::error!("playback rejected: {}", js_error_message(&e));
            }
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(element) = &self.playback {
            element.set_src_object(None);
        }
        if let Err(e) = self.context.close() {
            log::warn!("audio context close failed: {}", js_error_message(&e));
        }
        self.nodes.clear();
    }
}
