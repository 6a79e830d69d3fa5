use crate::models::error::CaptureError;
use crate::models::params::{BandSpec, CompressorParam};

/// Handle to a node created within a [`ProcessingContext`].
///
/// Ids are only meaningful inside the context that minted them; a fresh
/// session gets a fresh context and fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// One-shot completion invoked when a capture acquisition resolves.
///
/// Fires later on the same thread that issued the request; there is no
/// parallel delivery.
pub type CaptureCompletion<S> = Box<dyn FnOnce(Result<S, CaptureError>) + 'static>;

/// Interface to one live instance of the host audio engine.
///
/// A context owns every node created through it; closing the context
/// releases them all. The engine reads node parameters live, so writes take
/// effect on the next processed block whether or not an input is connected
/// yet.
pub trait ProcessingContext: 'static {
    /// Live capture stream handed over by the engine's capture capability.
    type Stream: 'static;

    /// The default output destination (speakers).
    fn destination(&self) -> NodeId;

    fn create_compressor(&mut self) -> Result<NodeId, CaptureError>;

    fn create_peaking_filter(&mut self, band: BandSpec) -> Result<NodeId, CaptureError>;

    /// Wrap a capture stream into a source node feeding this context.
    fn create_capture_source(&mut self, stream: Self::Stream) -> Result<NodeId, CaptureError>;

    /// A secondary stream destination that a playback element can be bound to.
    fn create_stream_sink(&mut self) -> Result<NodeId, CaptureError>;

    /// Connect `source`'s output into `target`'s input.
    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<(), CaptureError>;

    fn set_compressor_param(
        &mut self,
        compressor: NodeId,
        param: CompressorParam,
        value: f64,
    ) -> Result<(), CaptureError>;

    fn compressor_param(
        &self,
        compressor: NodeId,
        param: CompressorParam,
    ) -> Result<f64, CaptureError>;

    fn set_band_gain(&mut self, filter: NodeId, gain_db: f64) -> Result<(), CaptureError>;

    fn band_gain(&self, filter: NodeId) -> Result<f64, CaptureError>;

    /// Start replaying `sink`'s stream through the bound playback element.
    fn start_playback(&mut self, sink: NodeId) -> Result<(), CaptureError>;

    /// Release the context and every node it owns. Must be safe to call on a
    /// context whose capture source never arrived.
    fn close(&mut self);
}

/// Factory boundary to the host audio engine and its capture capability.
///
/// Implemented by platform backends (Web Audio via `livefx-web`) and by the
/// in-crate mock for tests.
pub trait AudioEngine: 'static {
    type Context: ProcessingContext;

    /// Whether a display/tab audio capture capability exists at all.
    fn capture_supported(&self) -> bool;

    /// Allocate a fresh processing context.
    fn create_context(&mut self) -> Result<Self::Context, CaptureError>;

    /// Request a capture stream. The completion fires exactly once, later,
    /// on the same thread; it must tolerate the requesting session having
    /// been torn down in the meantime.
    fn request_capture(
        &mut self,
        completion: CaptureCompletion<<Self::Context as ProcessingContext>::Stream>,
    );
}
