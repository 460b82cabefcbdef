pub mod allpass;
pub mod coeffs;
pub mod damping;
pub mod delay_store;
pub mod drive;
pub mod engine;
pub mod lfo;
pub mod params;
pub mod pre_delay;
pub mod smoother;
pub mod spring;
pub mod utils;

pub use allpass::AllpassSection;
pub use coeffs::{BlockCoefficients, RateConstants};
pub use damping::DampingFilter;
pub use delay_store::DelayStore;
pub use drive::{apply_drive, drive_gain};
pub use engine::SpringTankEngine;
pub use lfo::Lfo;
pub use params::ReverbParams;
pub use pre_delay::PreDelayLine;
pub use smoother::LinearSmoother;
pub use spring::{SpringString, StringTuning, STRING_A, STRING_B};
