//! # livefx-core
//!
//! Engine-agnostic core for live capture effects processing.
//!
//! Captured system/tab audio is routed through a dynamics compressor and a
//! six-band peaking equalizer built from host audio-engine primitives. This
//! crate owns the graph lifecycle and the parameter-update model; the DSP
//! itself stays behind the engine boundary. Platform backends (Web Audio via
//! `livefx-web`) implement the `AudioEngine`/`ProcessingContext` traits and
//! plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! livefx-core (this crate)
//! ├── traits/    ← AudioEngine, ProcessingContext, SessionDelegate
//! ├── models/    ← CaptureError, SessionPhase, SessionConfig, parameters
//! ├── graph/     ← EffectChain (fixed compressor → 6-band topology)
//! ├── session/   ← CaptureSession (lifecycle, acquisition/teardown race)
//! └── control/   ← ControlPanel (live, clamped parameter writes)
//! ```

pub mod control;
pub mod graph;
pub mod models;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use control::panel::ControlPanel;
pub use graph::chain::EffectChain;
pub use models::config::SessionConfig;
pub use models::error::CaptureError;
pub use models::params::{
    BandSpec, CompressorParam, ControlValues, ParamDescriptor, EQ_BAND_COUNT,
    EQ_BAND_FREQUENCIES_HZ, EQ_BAND_Q,
};
pub use models::state::SessionPhase;
pub use session::capture::CaptureSession;
pub use traits::delegate::SessionDelegate;
pub use traits::engine::{AudioEngine, CaptureCompletion, NodeId, ProcessingContext};
