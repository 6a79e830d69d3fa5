use crate::graph::chain::GraphSlot;
use crate::models::params::{
    clamp_band_gain, CompressorParam, ControlValues, ParamDescriptor, EQ_BAND_COUNT,
    EQ_BAND_FREQUENCIES_HZ,
};
use crate::traits::engine::ProcessingContext;

/// Live control surface over the session's node graph.
///
/// Holds the graph non-owningly: every setter is a no-op while the session
/// is idle, and again after teardown empties the slot. Writes are clamped to
/// the slider ranges and take effect on the next processed block.
pub struct ControlPanel<C: ProcessingContext> {
    graph: GraphSlot<C>,
    exposed: &'static [CompressorParam],
    values: ControlValues,
}

impl<C: ProcessingContext> ControlPanel<C> {
    pub(crate) fn new(graph: GraphSlot<C>, exposed: &'static [CompressorParam]) -> Self {
        Self {
            graph,
            exposed,
            values: ControlValues::default(),
        }
    }

    /// Compressor parameters this panel exposes (threshold only, unless the
    /// session config exposes all four).
    pub fn compressor_params(&self) -> &'static [CompressorParam] {
        self.exposed
    }

    /// Slider metadata for the exposed compressor controls.
    pub fn compressor_descriptors(&self) -> Vec<ParamDescriptor> {
        self.exposed.iter().map(|p| p.descriptor()).collect()
    }

    /// Center frequencies of the six gain sliders, in band order.
    pub fn band_frequencies(&self) -> [f64; EQ_BAND_COUNT] {
        EQ_BAND_FREQUENCIES_HZ
    }

    /// Values as last applied to a live graph (rendered defaults until then).
    pub fn values(&self) -> &ControlValues {
        &self.values
    }

    /// Write a compressor parameter on the live graph. Returns whether the
    /// write was applied: hidden parameters, an idle session, and engine
    /// refusals all leave everything untouched.
    pub fn set_compressor(&mut self, param: CompressorParam, value: f64) -> bool {
        if !self.exposed.contains(&param) {
            log::debug!("compressor parameter {param} is not exposed");
            return false;
        }
        let value = param.clamp(value);

        let mut guard = self.graph.lock();
        let Some(graph) = guard.as_mut() else {
            return false;
        };
        match graph
            .context
            .set_compressor_param(graph.chain.compressor(), param, value)
        {
            Ok(()) => {
                self.values.set_compressor(param, value);
                true
            }
            Err(e) => {
                log::warn!("failed to set compressor {param}: {e}");
                false
            }
        }
    }

    /// Write one band's gain on the live graph. Returns whether the write
    /// was applied; an out-of-range index or idle session is a no-op.
    pub fn set_band_gain(&mut self, index: usize, gain_db: f64) -> bool {
        let gain_db = clamp_band_gain(gain_db);

        let mut guard = self.graph.lock();
        let Some(graph) = guard.as_mut() else {
            return false;
        };
        let Some(band) = graph.chain.band(index) else {
            log::debug!("ignoring gain change for nonexistent band {index}");
            return false;
        };
        match graph.context.set_band_gain(band, gain_db) {
            Ok(()) => {
                self.values.band_gains_db[index] = gain_db;
                true
            }
            Err(e) => {
                log::warn!("failed to set band {index} gain: {e}");
                false
            }
        }
    }

    /// Read a compressor parameter back from the live graph, if any.
    pub fn compressor_value(&self, param: CompressorParam) -> Option<f64> {
        let guard = self.graph.lock();
        let graph = guard.as_ref()?;
        graph
            .context
            .compressor_param(graph.chain.compressor(), param)
            .ok()
    }

    /// Read one band's gain back from the live graph, if any.
    pub fn band_gain(&self, index: usize) -> Option<f64> {
        let guard = self.graph.lock();
        let graph = guard.as_ref()?;
        graph.context.band_gain(graph.chain.band(index)?).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::SessionConfig;
    use crate::session::capture::CaptureSession;
    use crate::traits::mock::MockEngine;
    use approx::assert_relative_eq;

    fn capturing_panel() -> (
        CaptureSession<MockEngine>,
        ControlPanel<crate::traits::mock::MockContext>,
        crate::traits::mock::MockHandle,
    ) {
        let (engine, handle) = MockEngine::new();
        let mut session = CaptureSession::new(engine, SessionConfig::default());
        session.start().unwrap();
        let panel = session.control_panel();
        (session, panel, handle)
    }

    #[test]
    fn setters_are_inert_before_start() {
        let (engine, handle) = MockEngine::new();
        let session = CaptureSession::new(engine, SessionConfig::default());
        let mut panel = session.control_panel();

        for param in CompressorParam::ALL {
            assert!(!panel.set_compressor(param, -5.0));
        }
        assert!(!panel.set_band_gain(0, 3.0));
        assert_eq!(handle.contexts_created(), 0);
        // The rendered defaults are untouched by rejected writes.
        assert_eq!(*panel.values(), ControlValues::default());
    }

    #[test]
    fn scenario_ratio_then_band_two() {
        let (_session, mut panel, _handle) = capturing_panel();

        assert!(panel.set_compressor(CompressorParam::Ratio, 10.0));
        assert_relative_eq!(
            panel.compressor_value(CompressorParam::Ratio).unwrap(),
            10.0
        );

        assert!(panel.set_band_gain(2, -12.0));
        assert_relative_eq!(panel.band_gain(2).unwrap(), -12.0);
        assert_relative_eq!(panel.band_gain(0).unwrap(), 0.0);
    }

    #[test]
    fn out_of_range_band_index_is_a_no_op() {
        let (_session, mut panel, handle) = capturing_panel();

        assert!(!panel.set_band_gain(EQ_BAND_COUNT, -12.0));
        assert!(!panel.set_band_gain(usize::MAX, -12.0));

        let log = handle.context(0);
        for (_, spec) in log.borrow().filters() {
            assert_relative_eq!(spec.gain_db, 0.0);
        }
    }

    #[test]
    fn only_the_indexed_band_changes() {
        let (_session, mut panel, handle) = capturing_panel();

        assert!(panel.set_band_gain(3, 6.0));

        let log = handle.context(0);
        for (index, (_, spec)) in log.borrow().filters().iter().enumerate() {
            let expected = if index == 3 { 6.0 } else { 0.0 };
            assert_relative_eq!(spec.gain_db, expected);
        }
    }

    #[test]
    fn values_are_clamped_to_slider_ranges() {
        let (_session, mut panel, _handle) = capturing_panel();

        assert!(panel.set_compressor(CompressorParam::Threshold, 40.0));
        assert_relative_eq!(
            panel.compressor_value(CompressorParam::Threshold).unwrap(),
            0.0
        );

        assert!(panel.set_band_gain(1, -99.0));
        assert_relative_eq!(panel.band_gain(1).unwrap(), -30.0);
    }

    #[test]
    fn applied_values_update_the_snapshot() {
        let (_session, mut panel, _handle) = capturing_panel();

        assert!(panel.set_compressor(CompressorParam::Attack, 0.4));
        assert!(panel.set_band_gain(5, 9.0));

        assert_relative_eq!(panel.values().attack_secs, 0.4);
        assert_relative_eq!(panel.values().band_gains_db[5], 9.0);
        // Untouched parameters keep showing their rendered defaults.
        assert_relative_eq!(panel.values().ratio, 4.0);
    }

    #[test]
    fn fresh_compressor_keeps_engine_defaults() {
        let (_session, panel, _handle) = capturing_panel();

        // Rendered defaults (threshold 0, ratio 4, ...) are never pushed;
        // the node reports whatever the engine created it with.
        assert_relative_eq!(
            panel.compressor_value(CompressorParam::Ratio).unwrap(),
            12.0
        );
        assert_relative_eq!(
            panel.compressor_value(CompressorParam::Threshold).unwrap(),
            -24.0
        );
    }

    #[test]
    fn panel_turns_inert_after_stop() {
        let (mut session, mut panel, handle) = capturing_panel();

        session.stop();

        assert!(!panel.set_compressor(CompressorParam::Ratio, 10.0));
        assert!(!panel.set_band_gain(0, 5.0));
        assert!(panel.compressor_value(CompressorParam::Ratio).is_none());
        assert!(panel.band_gain(0).is_none());
        assert!(handle.context(0).borrow().closed);
    }

    #[test]
    fn panel_reattaches_to_a_restarted_session() {
        let (mut session, mut panel, handle) = capturing_panel();

        session.stop();
        session.start().unwrap();

        assert!(panel.set_compressor(CompressorParam::Ratio, 7.0));
        let log = handle.context(1);
        let log = log.borrow();
        let id = log.compressor_id();
        match &log.nodes[id.0] {
            crate::traits::mock::MockNode::Compressor { ratio, .. } => {
                assert_relative_eq!(*ratio, 7.0)
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn hidden_parameters_are_inert() {
        let (engine, _handle) = MockEngine::new();
        let config = SessionConfig {
            expose_all_compressor_controls: false,
            ..Default::default()
        };
        let mut session = CaptureSession::new(engine, config);
        session.start().unwrap();
        let mut panel = session.control_panel();

        assert!(panel.set_compressor(CompressorParam::Threshold, -20.0));
        assert!(!panel.set_compressor(CompressorParam::Ratio, 10.0));
        assert_relative_eq!(
            panel.compressor_value(CompressorParam::Ratio).unwrap(),
            12.0
        );
        assert_eq!(panel.compressor_params(), &[CompressorParam::Threshold]);
    }

    #[test]
    fn descriptors_follow_exposure() {
        let (_session, panel, _handle) = capturing_panel();
        let descriptors = panel.compressor_descriptors();
        assert_eq!(descriptors.len(), 4);
        assert_eq!(descriptors[0].name, "threshold");
        assert_relative_eq!(panel.band_frequencies()[2], 350.0);
    }
}
