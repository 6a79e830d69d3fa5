use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::control::panel::ControlPanel;
use crate::graph::chain::{ActiveGraph, EffectChain, GraphSlot};
use crate::models::config::SessionConfig;
use crate::models::error::CaptureError;
use crate::models::state::SessionPhase;
use crate::traits::delegate::SessionDelegate;
use crate::traits::engine::{AudioEngine, ProcessingContext};

/// Owns one capture-and-process lifecycle at a time.
///
/// `start()` builds the whole node graph synchronously (context, compressor,
/// six peaking bands, destination wiring) and only then issues the
/// asynchronous capture request. The capture completion may fire long after
/// further parameter changes, or after `stop()`; a generation counter decides
/// whether the resolved stream may still be connected.
///
/// Everything runs on one cooperative event thread; the shared slot and
/// atomic exist so the completion callback and the control panel can reach
/// the graph without owning it.
pub struct CaptureSession<E: AudioEngine> {
    engine: E,
    config: SessionConfig,
    graph: GraphSlot<E::Context>,
    /// Generation of the most recent `start()`; bumped again by `stop()` so
    /// an in-flight acquisition can detect it has been superseded.
    live_generation: Arc<AtomicU64>,
    delegate: Option<Arc<dyn SessionDelegate>>,
}

impl<E: AudioEngine> CaptureSession<E> {
    pub fn new(engine: E, config: SessionConfig) -> Self {
        Self {
            engine,
            config,
            graph: Arc::new(Mutex::new(None)),
            live_generation: Arc::new(AtomicU64::new(0)),
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn SessionDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn phase(&self) -> SessionPhase {
        if self.graph.lock().is_some() {
            SessionPhase::Capturing
        } else {
            SessionPhase::Idle
        }
    }

    /// A control surface over this session's live graph. The panel holds the
    /// graph non-owningly and turns inert whenever the session is idle.
    pub fn control_panel(&self) -> ControlPanel<E::Context> {
        ControlPanel::new(
            Arc::clone(&self.graph),
            self.config.exposed_compressor_params(),
        )
    }

    /// Build the processing graph and request the capture stream.
    ///
    /// The graph (context, compressor, bands, destination and optional sink
    /// wiring) is complete before this returns; the capture source is
    /// attached later, when acquisition resolves. A host without a capture
    /// capability, or one that denies it, is logged and reported to the
    /// delegate; the graph stays up, silent, and the session stays
    /// capturing. Only a synchronous engine failure while building leaves
    /// the session idle.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.graph.lock().is_some() {
            log::debug!("start() ignored: session already capturing");
            return Ok(());
        }

        let generation = self.live_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut context = match self.engine.create_context() {
            Ok(context) => context,
            Err(e) => {
                log::error!("failed to allocate processing context: {e}");
                self.notify_error(&e);
                return Err(e);
            }
        };

        let chain = match EffectChain::build(&mut context, self.config.enable_output_routing) {
            Ok(chain) => chain,
            Err(e) => {
                log::error!("failed to build effect chain: {e}");
                context.close();
                self.notify_error(&e);
                return Err(e);
            }
        };

        *self.graph.lock() = Some(ActiveGraph {
            context,
            chain,
            generation,
        });
        self.notify_state(SessionPhase::Capturing);

        if !self.engine.capture_supported() {
            let e = CaptureError::CaptureUnavailable;
            log::error!("display audio capture is not available: {e}");
            self.notify_error(&e);
            return Ok(());
        }

        let slot = Arc::clone(&self.graph);
        let live = Arc::clone(&self.live_generation);
        let delegate = self.delegate.clone();
        self.engine.request_capture(Box::new(move |result| {
            let stream = match result {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("capture acquisition failed: {e}");
                    if let Some(delegate) = &delegate {
                        delegate.on_error(&e);
                    }
                    return;
                }
            };

            if live.load(Ordering::SeqCst) != generation {
                log::debug!("discarding capture stream for superseded generation {generation}");
                return;
            }

            let mut guard = slot.lock();
            let graph = match guard.as_mut() {
                Some(graph) if graph.generation == generation => graph,
                _ => {
                    log::debug!("discarding capture stream: session already stopped");
                    return;
                }
            };

            if let Err(e) = graph.chain.attach_source(&mut graph.context, stream) {
                log::error!("failed to connect capture source: {e}");
                if let Some(delegate) = &delegate {
                    delegate.on_error(&e);
                }
            }
        }));

        Ok(())
    }

    /// Tear down the active graph, releasing the context and every node.
    ///
    /// Idempotent. Invalidates any in-flight capture acquisition before
    /// releasing, so a grant resolving afterwards is dropped instead of
    /// being connected to freed nodes.
    pub fn stop(&mut self) {
        self.live_generation.fetch_add(1, Ordering::SeqCst);

        let released = {
            let mut guard = self.graph.lock();
            match guard.take() {
                Some(mut graph) => {
                    graph.context.close();
                    true
                }
                None => false,
            }
        };

        if released {
            self.notify_state(SessionPhase::Idle);
        } else {
            log::debug!("stop() ignored: session already idle");
        }
    }

    fn notify_state(&self, phase: SessionPhase) {
        if let Some(delegate) = &self.delegate {
            delegate.on_state_changed(phase);
        }
    }

    fn notify_error(&self, error: &CaptureError) {
        if let Some(delegate) = &self.delegate {
            delegate.on_error(error);
        }
    }
}

impl<E: AudioEngine> Drop for CaptureSession<E> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::params::{CompressorParam, EQ_BAND_COUNT, EQ_BAND_FREQUENCIES_HZ};
    use crate::traits::engine::NodeId;
    use crate::traits::mock::{
        DelegateEvent, MockEngine, MockHandle, MockStream, RecordingDelegate,
    };
    use approx::assert_relative_eq;

    fn started_session() -> (CaptureSession<MockEngine>, MockHandle) {
        let (engine, handle) = MockEngine::new();
        let mut session = CaptureSession::new(engine, SessionConfig::default());
        session.start().unwrap();
        (session, handle)
    }

    #[test]
    fn start_builds_graph_before_requesting_capture() {
        let (session, handle) = started_session();

        assert!(session.phase().is_capturing());
        let log = handle.context(0);
        let log = log.borrow();
        assert_eq!(log.filters().len(), EQ_BAND_COUNT);
        assert!(log.has_connection(log.filters()[5].0, NodeId(0)));
        // The graph was complete before acquisition even resolved.
        assert!(log.sources().is_empty());
        assert_eq!(handle.pending_captures(), 1);
    }

    #[test]
    fn bands_start_flat_at_the_fixed_frequencies() {
        let (_session, handle) = started_session();

        let log = handle.context(0);
        for ((_, spec), expected) in log.borrow().filters().iter().zip(EQ_BAND_FREQUENCIES_HZ) {
            assert_relative_eq!(spec.frequency_hz, expected);
            assert_relative_eq!(spec.gain_db, 0.0);
        }
    }

    #[test]
    fn resolved_capture_connects_into_the_compressor() {
        let (_session, handle) = started_session();

        handle.resolve_capture(Ok(MockStream(1)));

        let log = handle.context(0);
        let log = log.borrow();
        assert_eq!(log.sources(), vec![MockStream(1)]);
        let source = NodeId(log.nodes.len() - 1);
        assert!(log.has_connection(source, log.compressor_id()));
    }

    #[test]
    fn stop_before_resolution_discards_the_stream() {
        let (mut session, handle) = started_session();

        session.stop();
        handle.resolve_capture(Ok(MockStream(1)));

        let log = handle.context(0);
        assert!(log.borrow().closed);
        assert!(log.borrow().sources().is_empty());
        assert!(session.phase().is_idle());
    }

    #[test]
    fn stream_resolving_into_a_restarted_session_is_discarded() {
        let (mut session, handle) = started_session();

        session.stop();
        session.start().unwrap();
        // Oldest pending request belongs to the torn-down first generation.
        handle.resolve_capture(Ok(MockStream(1)));

        assert!(handle.context(0).borrow().sources().is_empty());
        assert!(handle.context(1).borrow().sources().is_empty());

        // The second generation's own grant still lands.
        handle.resolve_capture(Ok(MockStream(2)));
        assert_eq!(handle.context(1).borrow().sources(), vec![MockStream(2)]);
    }

    #[test]
    fn restart_builds_an_independent_graph() {
        let (mut session, handle) = started_session();
        let mut panel = session.control_panel();
        assert!(panel.set_compressor(CompressorParam::Ratio, 10.0));

        session.stop();
        session.start().unwrap();

        assert_eq!(handle.contexts_created(), 2);
        let first = handle.context(0);
        let second = handle.context(1);
        assert!(first.borrow().closed);
        assert!(!second.borrow().closed);
        // The first session's mutation never reached the fresh compressor.
        let second = second.borrow();
        let ratio = match &second.nodes[second.compressor_id().0] {
            crate::traits::mock::MockNode::Compressor { ratio, .. } => *ratio,
            _ => unreachable!(),
        };
        assert_relative_eq!(ratio, 12.0);
    }

    #[test]
    fn acquisition_failure_leaves_session_capturing() {
        let (engine, handle) = MockEngine::new();
        let mut session = CaptureSession::new(engine, SessionConfig::default());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());
        session.start().unwrap();

        handle.resolve_capture(Err(CaptureError::CaptureDenied));

        assert!(session.phase().is_capturing());
        assert!(handle.context(0).borrow().sources().is_empty());
        assert!(delegate
            .events()
            .contains(&DelegateEvent::Error(CaptureError::CaptureDenied)));
    }

    #[test]
    fn missing_capture_capability_is_reported_but_graph_persists() {
        let (engine, handle) = MockEngine::new();
        handle.set_capture_supported(false);
        let mut session = CaptureSession::new(engine, SessionConfig::default());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());

        session.start().unwrap();

        assert!(session.phase().is_capturing());
        assert_eq!(handle.pending_captures(), 0);
        assert!(delegate
            .events()
            .contains(&DelegateEvent::Error(CaptureError::CaptureUnavailable)));
    }

    #[test]
    fn engine_refusal_during_start_leaves_session_idle() {
        let (engine, handle) = MockEngine::new();
        handle.set_fail_context(true);
        let mut session = CaptureSession::new(engine, SessionConfig::default());

        assert!(session.start().is_err());
        assert!(session.phase().is_idle());
    }

    #[test]
    fn chain_failure_during_start_closes_the_partial_context() {
        let (engine, handle) = MockEngine::new();
        handle.fail_create_at(4);
        let mut session = CaptureSession::new(engine, SessionConfig::default());

        assert!(session.start().is_err());
        assert!(session.phase().is_idle());
        assert!(handle.context(0).borrow().closed);
    }

    #[test]
    fn start_while_capturing_is_a_no_op() {
        let (mut session, handle) = started_session();

        session.start().unwrap();

        assert_eq!(handle.contexts_created(), 1);
        assert_eq!(handle.pending_captures(), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let (mut session, _handle) = started_session();

        session.stop();
        session.stop();

        assert!(session.phase().is_idle());
    }

    #[test]
    fn delegate_sees_lifecycle_transitions_in_order() {
        let (engine, _handle) = MockEngine::new();
        let mut session = CaptureSession::new(engine, SessionConfig::default());
        let delegate = Arc::new(RecordingDelegate::default());
        session.set_delegate(delegate.clone());

        session.start().unwrap();
        session.stop();

        assert_eq!(
            delegate.events(),
            vec![
                DelegateEvent::State(SessionPhase::Capturing),
                DelegateEvent::State(SessionPhase::Idle),
            ]
        );
    }

    #[test]
    fn output_routing_config_reaches_the_chain() {
        let (engine, handle) = MockEngine::new();
        let config = SessionConfig {
            enable_output_routing: true,
            ..Default::default()
        };
        let mut session = CaptureSession::new(engine, config);
        session.start().unwrap();

        let log = handle.context(0);
        assert!(log.borrow().sink_id().is_some());
        assert_eq!(log.borrow().playback_started.len(), 1);
    }

    #[test]
    fn dropping_the_session_tears_down_the_graph() {
        let (session, handle) = started_session();

        drop(session);

        assert!(handle.context(0).borrow().closed);
        handle.resolve_capture(Ok(MockStream(9)));
        assert!(handle.context(0).borrow().sources().is_empty());
    }
}
