//! # livefx-web
//!
//! Web Audio backend for livefx.
//!
//! Provides:
//! - `WebAudioEngine` — `AudioEngine` over `AudioContext` + `getDisplayMedia`
//! - `WebGraph` — `ProcessingContext` over Web Audio nodes
//! - `CaptureApp` — `wasm-bindgen` facade for the single-page UI
//!
//! ## Platform Requirements
//! - A browser with `getDisplayMedia` audio capture (tab/system audio)
//! - Built for `wasm32-unknown-unknown` (e.g. via `wasm-pack`)
//!
//! ## Usage
//! ```ignore
//! use livefx_core::{CaptureSession, SessionConfig};
//! use livefx_web::WebAudioEngine;
//!
//! let engine = WebAudioEngine::new();
//! let mut session = CaptureSession::new(engine, SessionConfig::default());
//! let mut panel = session.control_panel();
//! session.start()?;
//! ```

#[cfg(target_arch = "wasm32")]
pub mod bindings;
#[cfg(target_arch = "wasm32")]
pub mod engine;
#[cfg(target_arch = "wasm32")]
pub mod graph;

#[cfg(target_arch = "wasm32")]
pub use bindings::CaptureApp;
#[cfg(target_arch = "wasm32")]
pub use engine::WebAudioEngine;
#[cfg(target_arch = "wasm32")]
pub use graph::WebGraph;
