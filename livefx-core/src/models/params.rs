use serde::{Deserialize, Serialize};

/// Number of fixed equalizer bands in the chain.
pub const EQ_BAND_COUNT: usize = 6;

/// Center frequencies of the fixed peaking bands, in chain order.
pub const EQ_BAND_FREQUENCIES_HZ: [f64; EQ_BAND_COUNT] =
    [60.0, 170.0, 350.0, 1000.0, 3500.0, 10_000.0];

/// Q factor every band is created with.
pub const EQ_BAND_Q: f64 = 1.0;

/// Band gain slider range in dB.
pub const BAND_GAIN_MIN_DB: f64 = -30.0;
pub const BAND_GAIN_MAX_DB: f64 = 30.0;

/// Clamp a band gain to the slider range.
pub fn clamp_band_gain(gain_db: f64) -> f64 {
    gain_db.clamp(BAND_GAIN_MIN_DB, BAND_GAIN_MAX_DB)
}

/// Adjustable scalar parameters of the compressor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressorParam {
    Threshold,
    Ratio,
    Attack,
    Release,
}

impl CompressorParam {
    pub const ALL: [CompressorParam; 4] = [
        CompressorParam::Threshold,
        CompressorParam::Ratio,
        CompressorParam::Attack,
        CompressorParam::Release,
    ];

    /// The string key used by the control surface ("threshold", "ratio", ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::Threshold => "threshold",
            Self::Ratio => "ratio",
            Self::Attack => "attack",
            Self::Release => "release",
        }
    }

    /// Parse a control-surface key. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "threshold" => Some(Self::Threshold),
            "ratio" => Some(Self::Ratio),
            "attack" => Some(Self::Attack),
            "release" => Some(Self::Release),
            _ => None,
        }
    }

    /// Valid slider range: threshold in dB, ratio unitless, attack/release
    /// in seconds.
    pub fn range(self) -> (f64, f64) {
        match self {
            Self::Threshold => (-100.0, 0.0),
            Self::Ratio => (1.0, 20.0),
            Self::Attack => (0.0, 1.0),
            Self::Release => (0.0, 1.0),
        }
    }

    /// Clamp a value to the slider range.
    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        value.clamp(min, max)
    }

    /// Value the slider is rendered at before any user change.
    ///
    /// The threshold slider ships parked at 0, the very top of its range.
    pub fn default_value(self) -> f64 {
        match self {
            Self::Threshold => 0.0,
            Self::Ratio => 4.0,
            Self::Attack => 0.1,
            Self::Release => 0.25,
        }
    }

    /// Slider metadata for rendering a control without hardcoding ranges.
    pub fn descriptor(self) -> ParamDescriptor {
        let (min, max) = self.range();
        ParamDescriptor {
            name: self.name(),
            min,
            max,
            default: self.default_value(),
        }
    }
}

impl std::fmt::Display for CompressorParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Slider metadata exported to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

/// Creation-time description of one peaking filter band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSpec {
    pub frequency_hz: f64,
    pub q: f64,
    pub gain_db: f64,
}

impl BandSpec {
    /// A peaking band at `frequency_hz` with the fixed Q and flat gain.
    pub fn peaking(frequency_hz: f64) -> Self {
        Self {
            frequency_hz,
            q: EQ_BAND_Q,
            gain_db: 0.0,
        }
    }
}

/// Snapshot of the control surface: the rendered defaults until a value is
/// actually applied to a live graph.
///
/// Defaults are display values only; a freshly built compressor keeps the
/// engine's own parameter defaults until the user moves a slider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlValues {
    pub threshold_db: f64,
    pub ratio: f64,
    pub attack_secs: f64,
    pub release_secs: f64,
    pub band_gains_db: [f64; EQ_BAND_COUNT],
}

impl Default for ControlValues {
    fn default() -> Self {
        Self {
            threshold_db: CompressorParam::Threshold.default_value(),
            ratio: CompressorParam::Ratio.default_value(),
            attack_secs: CompressorParam::Attack.default_value(),
            release_secs: CompressorParam::Release.default_value(),
            band_gains_db: [0.0; EQ_BAND_COUNT],
        }
    }
}

impl ControlValues {
    pub fn compressor(&self, param: CompressorParam) -> f64 {
        match param {
            CompressorParam::Threshold => self.threshold_db,
            CompressorParam::Ratio => self.ratio,
            CompressorParam::Attack => self.attack_secs,
            CompressorParam::Release => self.release_secs,
        }
    }

    pub(crate) fn set_compressor(&mut self, param: CompressorParam, value: f64) {
        match param {
            CompressorParam::Threshold => self.threshold_db = value,
            CompressorParam::Ratio => self.ratio = value,
            CompressorParam::Attack => self.attack_secs = value,
            CompressorParam::Release => self.release_secs = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn band_table_is_fixed_and_ordered() {
        assert_eq!(EQ_BAND_FREQUENCIES_HZ.len(), EQ_BAND_COUNT);
        for pair in EQ_BAND_FREQUENCIES_HZ.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_relative_eq!(EQ_BAND_FREQUENCIES_HZ[0], 60.0);
        assert_relative_eq!(EQ_BAND_FREQUENCIES_HZ[5], 10_000.0);
    }

    #[test]
    fn param_names_round_trip() {
        for param in CompressorParam::ALL {
            assert_eq!(CompressorParam::from_name(param.name()), Some(param));
        }
        assert_eq!(CompressorParam::from_name("knee"), None);
        assert_eq!(CompressorParam::from_name("Threshold"), None);
    }

    #[test]
    fn clamping_hits_both_range_ends() {
        assert_relative_eq!(CompressorParam::Threshold.clamp(5.0), 0.0);
        assert_relative_eq!(CompressorParam::Threshold.clamp(-250.0), -100.0);
        assert_relative_eq!(CompressorParam::Ratio.clamp(0.0), 1.0);
        assert_relative_eq!(CompressorParam::Ratio.clamp(100.0), 20.0);
        assert_relative_eq!(CompressorParam::Attack.clamp(0.5), 0.5);
        assert_relative_eq!(clamp_band_gain(-40.0), -30.0);
        assert_relative_eq!(clamp_band_gain(31.0), 30.0);
    }

    #[test]
    fn rendered_defaults() {
        let values = ControlValues::default();
        assert_relative_eq!(values.threshold_db, 0.0);
        assert_relative_eq!(values.ratio, 4.0);
        assert_relative_eq!(values.attack_secs, 0.1);
        assert_relative_eq!(values.release_secs, 0.25);
        assert_eq!(values.band_gains_db, [0.0; EQ_BAND_COUNT]);
    }

    #[test]
    fn descriptor_carries_range_and_default() {
        let d = CompressorParam::Ratio.descriptor();
        assert_eq!(d.name, "ratio");
        assert_relative_eq!(d.min, 1.0);
        assert_relative_eq!(d.max, 20.0);
        assert_relative_eq!(d.default, 4.0);
    }

    #[test]
    fn control_values_serialize_camel_case() {
        let json = serde_json::to_value(ControlValues::default()).unwrap();
        assert!(json.get("thresholdDb").is_some());
        assert!(json.get("bandGainsDb").is_some());
    }
}
