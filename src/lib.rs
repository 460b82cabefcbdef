pub mod analysis;
pub mod dsp;

use crate::dsp::params::{
    DAMPING_RANGE, DECAY_RANGE, DRIVE_RANGE, MIX_RANGE, PRE_DELAY_RANGE, TENSION_RANGE,
    WOBBLE_RANGE,
};
use crate::dsp::{ReverbParams, SpringTankEngine};
use assert_no_alloc::permit_alloc;
use nih_plug::prelude::*;
use std::ops::RangeInclusive;
use std::sync::Arc;

const DEFAULT_SAMPLE_RATE: f64 = 44100.0;
const DEFAULT_BLOCK_SIZE: usize = 512;

/// Skew for the decay knob: more travel at short decay times.
const DECAY_SKEW: f32 = 0.4;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct SpringTankParams {
    #[id = "mix"]
    pub mix: FloatParam,

    #[id = "decay"]
    pub decay: FloatParam,

    #[id = "tension"]
    pub tension: FloatParam,

    #[id = "pre_delay"]
    pub pre_delay: FloatParam,

    #[id = "damping"]
    pub damping: FloatParam,

    #[id = "wobble"]
    pub wobble: FloatParam,

    #[id = "drive"]
    pub drive: FloatParam,
}

// Helper to format values as "50%" for the DAW display
fn format_percent(v: f32) -> String {
    format!("{:.0}%", v * 100.0)
}

fn format_seconds(v: f32) -> String {
    format!("{:.2} s", v)
}

fn format_ms(v: f32) -> String {
    format!("{:.1} ms", v)
}

fn linear(range: &RangeInclusive<f32>) -> FloatRange {
    FloatRange::Linear {
        min: *range.start(),
        max: *range.end(),
    }
}

fn percent_param(name: &str, default: f32, range: &RangeInclusive<f32>) -> FloatParam {
    FloatParam::new(name, default, linear(range)).with_value_to_string(Arc::new(format_percent))
}

impl Default for SpringTankParams {
    fn default() -> Self {
        let d = ReverbParams::default();
        Self {
            mix: percent_param("Mix", d.mix, &MIX_RANGE),

            decay: FloatParam::new(
                "Decay",
                d.decay,
                FloatRange::Skewed {
                    min: *DECAY_RANGE.start(),
                    max: *DECAY_RANGE.end(),
                    factor: DECAY_SKEW,
                },
            )
            .with_step_size(0.01)
            .with_value_to_string(Arc::new(format_seconds)),

            tension: percent_param("Tension", d.tension, &TENSION_RANGE),

            pre_delay: FloatParam::new("Pre-Delay", d.pre_delay, linear(&PRE_DELAY_RANGE))
                .with_step_size(0.1)
                .with_value_to_string(Arc::new(format_ms)),

            damping: percent_param("Damping", d.damping, &DAMPING_RANGE),

            wobble: percent_param("Wobble", d.wobble, &WOBBLE_RANGE),

            drive: percent_param("Drive", d.drive, &DRIVE_RANGE),
        }
    }
}

impl SpringTankParams {
    /// Plain values for one processing block.
    pub fn snapshot(&self) -> ReverbParams {
        ReverbParams {
            mix: self.mix.value(),
            decay: self.decay.value(),
            tension: self.tension.value(),
            pre_delay: self.pre_delay.value(),
            damping: self.damping.value(),
            wobble: self.wobble.value(),
            drive: self.drive.value(),
        }
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
struct SpringTankPlugin {
    params: Arc<SpringTankParams>,
    engine: SpringTankEngine,
}

impl Default for SpringTankPlugin {
    fn default() -> Self {
        let mut engine = SpringTankEngine::new();
        engine.prepare(DEFAULT_SAMPLE_RATE, DEFAULT_BLOCK_SIZE);
        Self {
            params: Arc::new(SpringTankParams::default()),
            engine,
        }
    }
}

impl Plugin for SpringTankPlugin {
    const NAME: &'static str = "Spring Tank";
    const VENDOR: &'static str = "springtank";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate as f64;
        let max_block = buffer_config.max_buffer_size as usize;

        permit_alloc(|| self.engine.prepare(sample_rate, max_block));

        nih_log!(
            "Spring Tank initialized: {} Hz, max block {}, {} output channel(s)",
            sample_rate,
            max_block,
            audio_io_layout
                .main_output_channels
                .map(NonZeroU32::get)
                .unwrap_or(0)
        );

        self.engine.is_prepared()
    }

    fn reset(&mut self) {
        self.engine.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let snapshot = self.params.snapshot();
        self.engine.process(buffer.as_slice(), &snapshot);
        ProcessStatus::Tail(self.engine.tail_samples())
    }
}

impl ClapPlugin for SpringTankPlugin {
    const CLAP_ID: &'static str = "com.springtank.reverb";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("Stereo spring tank reverb");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Reverb,
        ClapFeature::Stereo,
        ClapFeature::Mono,
    ];
}

impl Vst3Plugin for SpringTankPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"SpringTankReverb";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Reverb];
}

nih_export_clap!(SpringTankPlugin);
nih_export_vst3!(SpringTankPlugin);
