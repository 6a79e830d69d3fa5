//! Recording mock of the engine boundary for session/panel/chain tests.
//!
//! `MockEngine` hands out `MockContext`s whose operations are journaled into
//! a shared [`ContextLog`], and holds capture completions until the test
//! resolves them, so the acquisition/teardown race can be driven from a
//! test.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::delegate::SessionDelegate;
use super::engine::{AudioEngine, CaptureCompletion, NodeId, ProcessingContext};
use crate::models::error::CaptureError;
use crate::models::params::{BandSpec, CompressorParam};
use crate::models::state::SessionPhase;

/// Opaque stand-in for a live capture stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MockStream(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockNode {
    Destination,
    Compressor {
        threshold: f64,
        ratio: f64,
        attack: f64,
        release: f64,
    },
    Filter(BandSpec),
    Source(MockStream),
    Sink,
}

/// Everything one context observed, shared between the context and the test.
#[derive(Debug, Default)]
pub(crate) struct ContextLog {
    pub nodes: Vec<MockNode>,
    pub connections: Vec<(NodeId, NodeId)>,
    pub playback_started: Vec<NodeId>,
    pub closed: bool,
    fail_create_at: Option<usize>,
    creates: usize,
    fail_playback: bool,
}

impl ContextLog {
    pub fn compressor_id(&self) -> NodeId {
        self.nodes
            .iter()
            .position(|n| matches!(n, MockNode::Compressor { .. }))
            .map(NodeId)
            .expect("no compressor in context")
    }

    pub fn filters(&self) -> Vec<(NodeId, BandSpec)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match n {
                MockNode::Filter(spec) => Some((NodeId(i), *spec)),
                _ => None,
            })
            .collect()
    }

    pub fn sources(&self) -> Vec<MockStream> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                MockNode::Source(stream) => Some(*stream),
                _ => None,
            })
            .collect()
    }

    pub fn sink_id(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| matches!(n, MockNode::Sink))
            .map(NodeId)
    }

    pub fn has_connection(&self, source: NodeId, target: NodeId) -> bool {
        self.connections.contains(&(source, target))
    }
}

pub(crate) struct MockContext {
    log: Rc<RefCell<ContextLog>>,
}

impl MockContext {
    fn create_node(&mut self, node: MockNode) -> Result<NodeId, CaptureError> {
        let mut log = self.log.borrow_mut();
        if log.fail_create_at == Some(log.creates) {
            log.creates += 1;
            return Err(CaptureError::EngineFailure("node creation refused".into()));
        }
        log.creates += 1;
        log.nodes.push(node);
        Ok(NodeId(log.nodes.len() - 1))
    }

    fn check_node(&self, id: NodeId) -> Result<(), CaptureError> {
        if id.0 < self.log.borrow().nodes.len() {
            Ok(())
        } else {
            Err(CaptureError::EngineFailure(format!(
                "unknown node id {}",
                id.0
            )))
        }
    }
}

impl ProcessingContext for MockContext {
    type Stream = MockStream;

    fn destination(&self) -> NodeId {
        NodeId(0)
    }

    fn create_compressor(&mut self) -> Result<NodeId, CaptureError> {
        // Engine-default parameter values, distinct from the rendered
        // slider defaults, so tests can observe that nothing pushes the
        // latter into a fresh node.
        self.create_node(MockNode::Compressor {
            threshold: -24.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        })
    }

    fn create_peaking_filter(&mut self, band: BandSpec) -> Result<NodeId, CaptureError> {
        self.create_node(MockNode::Filter(band))
    }

    fn create_capture_source(&mut self, stream: MockStream) -> Result<NodeId, CaptureError> {
        self.create_node(MockNode::Source(stream))
    }

    fn create_stream_sink(&mut self) -> Result<NodeId, CaptureError> {
        self.create_node(MockNode::Sink)
    }

    fn connect(&mut self, source: NodeId, target: NodeId) -> Result<(), CaptureError> {
        self.check_node(source)?;
        self.check_node(target)?;
        self.log.borrow_mut().connections.push((source, target));
        Ok(())
    }

    fn set_compressor_param(
        &mut self,
        compressor: NodeId,
        param: CompressorParam,
        value: f64,
    ) -> Result<(), CaptureError> {
        self.check_node(compressor)?;
        match &mut self.log.borrow_mut().nodes[compressor.0] {
            MockNode::Compressor {
                threshold,
                ratio,
                attack,
                release,
            } => {
                match param {
                    CompressorParam::Threshold => *threshold = value,
                    CompressorParam::Ratio => *ratio = value,
                    CompressorParam::Attack => *attack = value,
                    CompressorParam::Release => *release = value,
                }
                Ok(())
            }
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a compressor",
                compressor.0
            ))),
        }
    }

    fn compressor_param(
        &self,
        compressor: NodeId,
        param: CompressorParam,
    ) -> Result<f64, CaptureError> {
        self.check_node(compressor)?;
        match &self.log.borrow().nodes[compressor.0] {
            MockNode::Compressor {
                threshold,
                ratio,
                attack,
                release,
            } => Ok(match param {
                CompressorParam::Threshold => *threshold,
                CompressorParam::Ratio => *ratio,
                CompressorParam::Attack => *attack,
                CompressorParam::Release => *release,
            }),
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a compressor",
                compressor.0
            ))),
        }
    }

    fn set_band_gain(&mut self, filter: NodeId, gain_db: f64) -> Result<(), CaptureError> {
        self.check_node(filter)?;
        match &mut self.log.borrow_mut().nodes[filter.0] {
            MockNode::Filter(spec) => {
                spec.gain_db = gain_db;
                Ok(())
            }
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a filter",
                filter.0
            ))),
        }
    }

    fn band_gain(&self, filter: NodeId) -> Result<f64, CaptureError> {
        self.check_node(filter)?;
        match &self.log.borrow().nodes[filter.0] {
            MockNode::Filter(spec) => Ok(spec.gain_db),
            _ => Err(CaptureError::EngineFailure(format!(
                "node {} is not a filter",
                filter.0
            ))),
        }
    }

    fn start_playback(&mut self, sink: NodeId) -> Result<(), CaptureError> {
        self.check_node(sink)?;
        let mut log = self.log.borrow_mut();
        if log.fail_playback {
            return Err(CaptureError::PlaybackFailure("element refused to play".into()));
        }
        log.playback_started.push(sink);
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed = true;
    }
}

#[derive(Default)]
struct EngineState {
    capture_supported: bool,
    fail_context: bool,
    fail_create_at: Option<usize>,
    fail_playback: bool,
    contexts: Vec<Rc<RefCell<ContextLog>>>,
    pending: VecDeque<CaptureCompletion<MockStream>>,
}

pub(crate) struct MockEngine {
    state: Rc<RefCell<EngineState>>,
}

/// Test-side handle onto a [`MockEngine`] that has been moved into a session.
#[derive(Clone)]
pub(crate) struct MockHandle {
    state: Rc<RefCell<EngineState>>,
}

impl MockEngine {
    pub fn new() -> (Self, MockHandle) {
        let state = Rc::new(RefCell::new(EngineState {
            capture_supported: true,
            ..Default::default()
        }));
        (
            Self {
                state: Rc::clone(&state),
            },
            MockHandle { state },
        )
    }
}

impl AudioEngine for MockEngine {
    type Context = MockContext;

    fn capture_supported(&self) -> bool {
        self.state.borrow().capture_supported
    }

    fn create_context(&mut self) -> Result<MockContext, CaptureError> {
        let mut state = self.state.borrow_mut();
        if state.fail_context {
            return Err(CaptureError::EngineFailure(
                "context allocation refused".into(),
            ));
        }
        let log = Rc::new(RefCell::new(ContextLog {
            nodes: vec![MockNode::Destination],
            fail_create_at: state.fail_create_at.take(),
            fail_playback: state.fail_playback,
            ..Default::default()
        }));
        state.contexts.push(Rc::clone(&log));
        Ok(MockContext { log })
    }

    fn request_capture(&mut self, completion: CaptureCompletion<MockStream>) {
        self.state.borrow_mut().pending.push_back(completion);
    }
}

impl MockHandle {
    pub fn set_capture_supported(&self, supported: bool) {
        self.state.borrow_mut().capture_supported = supported;
    }

    pub fn set_fail_context(&self, fail: bool) {
        self.state.borrow_mut().fail_context = fail;
    }

    /// Make the next context refuse its `n`th node creation (0-based).
    pub fn fail_create_at(&self, n: usize) {
        self.state.borrow_mut().fail_create_at = Some(n);
    }

    pub fn set_fail_playback(&self, fail: bool) {
        self.state.borrow_mut().fail_playback = fail;
    }

    pub fn contexts_created(&self) -> usize {
        self.state.borrow().contexts.len()
    }

    pub fn context(&self, index: usize) -> Rc<RefCell<ContextLog>> {
        Rc::clone(&self.state.borrow().contexts[index])
    }

    pub fn pending_captures(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Resolve the oldest outstanding capture request.
    pub fn resolve_capture(&self, result: Result<MockStream, CaptureError>) {
        let completion = self
            .state
            .borrow_mut()
            .pending
            .pop_front()
            .expect("no pending capture request");
        completion(result);
    }
}

/// Delegate that journals every notification, for transition-order tests.
#[derive(Default)]
pub(crate) struct RecordingDelegate {
    events: RefCell<Vec<DelegateEvent>>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DelegateEvent {
    State(SessionPhase),
    Error(CaptureError),
}

impl RecordingDelegate {
    pub fn events(&self) -> Vec<DelegateEvent> {
        self.events.borrow().clone()
    }
}

impl SessionDelegate for RecordingDelegate {
    fn on_state_changed(&self, phase: SessionPhase) {
        self.events.borrow_mut().push(DelegateEvent::State(phase));
    }

    fn on_error(&self, error: &CaptureError) {
        self.events
            .borrow_mut()
            .push(DelegateEvent::Error(error.clone()));
    }
}
