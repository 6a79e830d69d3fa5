use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::models::params::{BandSpec, EQ_BAND_COUNT, EQ_BAND_FREQUENCIES_HZ};
use crate::traits::engine::{NodeId, ProcessingContext};

/// The fixed processing topology, addressed by node ids inside one context:
///
/// ```text
/// [capture source] → [compressor] → [band 0] → … → [band 5] ─┬→ [destination]
///      (late)                                                 └→ [stream sink]
/// ```
///
/// The source is attached only once acquisition resolves; until then the
/// chain runs silent. Topology never changes after build.
#[derive(Debug)]
pub struct EffectChain {
    compressor: NodeId,
    bands: [NodeId; EQ_BAND_COUNT],
    sink: Option<NodeId>,
}

impl EffectChain {
    /// Build the chain into `context`: compressor, the six fixed peaking
    /// bands in series, the tail wired to the destination and, with
    /// `route_output`, additionally into a stream sink whose playback is
    /// started immediately. A playback element that refuses to start is
    /// logged and does not fail the build.
    pub fn build<C: ProcessingContext>(
        context: &mut C,
        route_output: bool,
    ) -> Result<Self, CaptureError> {
        let compressor = context.create_compressor()?;

        let mut bands = [compressor; EQ_BAND_COUNT];
        for (slot, frequency) in bands.iter_mut().zip(EQ_BAND_FREQUENCIES_HZ) {
            *slot = context.create_peaking_filter(BandSpec::peaking(frequency))?;
        }

        let mut upstream = compressor;
        for &band in &bands {
            context.connect(upstream, band)?;
            upstream = band;
        }

        let destination = context.destination();
        context.connect(upstream, destination)?;

        let sink = if route_output {
            let sink = context.create_stream_sink()?;
            context.connect(upstream, sink)?;
            if let Err(e) = context.start_playback(sink) {
                log::error!("processed playback failed to start: {e}");
            }
            Some(sink)
        } else {
            None
        };

        Ok(Self {
            compressor,
            bands,
            sink,
        })
    }

    /// Attach a resolved capture stream as the chain input.
    pub fn attach_source<C: ProcessingContext>(
        &self,
        context: &mut C,
        stream: C::Stream,
    ) -> Result<(), CaptureError> {
        let source = context.create_capture_source(stream)?;
        context.connect(source, self.compressor)
    }

    pub fn compressor(&self) -> NodeId {
        self.compressor
    }

    /// The band at `index`, or `None` outside [0, 5].
    pub fn band(&self, index: usize) -> Option<NodeId> {
        self.bands.get(index).copied()
    }

    pub fn sink(&self) -> Option<NodeId> {
        self.sink
    }
}

/// A built graph together with the context that owns it and the generation
/// id of the `start()` that produced it.
pub(crate) struct ActiveGraph<C: ProcessingContext> {
    pub context: C,
    pub chain: EffectChain,
    pub generation: u64,
}

/// Shared slot holding the active graph, if any.
///
/// The session owns the slot's contents; the control panel holds the same
/// slot non-owningly and turns inert once `stop()` empties it.
pub(crate) type GraphSlot<C> = Arc<Mutex<Option<ActiveGraph<C>>>>;
