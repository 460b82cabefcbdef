use anyhow::{Context, Result};
use ebur128::{EbuR128, Mode};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use springtank::analysis::{peak_abs, ImpulseReport};
use springtank::dsp::{ReverbParams, SpringTankEngine};
use std::path::{Path, PathBuf};

const BLOCK_SIZE: usize = 512;
const IMPULSE_SAMPLE_RATE: u32 = 48_000;

const USAGE: &str = "usage: springtank_render <input.wav> <output.wav> [settings.json]\n       springtank_render --impulse <output.wav> [settings.json]";

/// Deinterleaved audio, one `Vec` per channel.
struct Audio {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl Audio {
    fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next().context(USAGE)?;

    if first == "--impulse" {
        let output = args.next().map(PathBuf::from).context(USAGE)?;
        let params = load_settings(args.next().map(PathBuf::from).as_deref())?;
        return render_impulse(&output, &params);
    }

    let input = PathBuf::from(first);
    let output = args.next().map(PathBuf::from).context(USAGE)?;
    let params = load_settings(args.next().map(PathBuf::from).as_deref())?;

    let audio = read_wav(&input)?;
    let rendered = render(&audio, &params)?;
    write_wav(&output, &rendered)?;

    println!("Render summary for '{}':", input.display());
    println!("  output           : {}", output.display());
    print_summary(&rendered)?;
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<ReverbParams> {
    let Some(path) = path else {
        return Ok(ReverbParams::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings '{}'", path.display()))?;
    let params: ReverbParams = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse settings '{}'", path.display()))?;
    Ok(params.sanitized())
}

fn read_wav(path: &Path) -> Result<Audio> {
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    if spec.channels == 0 || spec.channels > 2 {
        anyhow::bail!(
            "only mono and stereo input is supported ('{}' has {} channels)",
            path.display(),
            spec.channels
        );
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .with_context(|| format!("failed to decode '{}'", path.display()))?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .with_context(|| format!("failed to decode '{}'", path.display()))?
        }
    };

    let count = spec.channels as usize;
    let mut channels = vec![Vec::with_capacity(interleaved.len() / count); count];
    for frame in interleaved.chunks_exact(count) {
        for (ch, &s) in channels.iter_mut().zip(frame) {
            ch.push(s);
        }
    }

    Ok(Audio {
        sample_rate: spec.sample_rate,
        channels,
    })
}

/// Run `audio` plus the reverb tail through a fresh engine.
fn render(audio: &Audio, params: &ReverbParams) -> Result<Audio> {
    let mut engine = SpringTankEngine::new();
    engine.prepare(audio.sample_rate as f64, BLOCK_SIZE);
    if !engine.is_prepared() {
        anyhow::bail!("unsupported sample rate {}", audio.sample_rate);
    }

    // No block has run yet, so the engine's tail does not include pre-delay.
    let tail = engine.tail_samples() as usize
        + (params.sanitized().pre_delay as f64 * 0.001 * audio.sample_rate as f64) as usize;
    let total = audio.frames() + tail;

    let mut channels: Vec<Vec<f32>> = audio
        .channels
        .iter()
        .map(|ch| {
            let mut padded = ch.clone();
            padded.resize(total, 0.0);
            padded
        })
        .collect();

    let mut start = 0;
    while start < total {
        let end = (start + BLOCK_SIZE).min(total);
        let mut block: Vec<&mut [f32]> = channels
            .iter_mut()
            .map(|ch| &mut ch[start..end])
            .collect();
        engine.process(&mut block, params);
        start = end;
    }

    Ok(Audio {
        sample_rate: audio.sample_rate,
        channels,
    })
}

fn render_impulse(output: &Path, params: &ReverbParams) -> Result<()> {
    let impulse = Audio {
        sample_rate: IMPULSE_SAMPLE_RATE,
        channels: vec![vec![1.0], vec![1.0]],
    };

    let rendered = render(&impulse, params)?;
    write_wav(output, &rendered)?;

    println!("Impulse response written to '{}':", output.display());
    for (name, ch) in ["left", "right"].iter().zip(&rendered.channels) {
        println!("[{}]", name);
        println!("{}", ImpulseReport::measure(ch, rendered.sample_rate as f64));
    }
    print_summary(&rendered)
}

fn write_wav(path: &Path, audio: &Audio) -> Result<()> {
    let spec = WavSpec {
        channels: audio.channels.len() as u16,
        sample_rate: audio.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create output WAV '{}'", path.display()))?;
    for n in 0..audio.frames() {
        for ch in &audio.channels {
            writer
                .write_sample(ch[n])
                .with_context(|| format!("failed to write '{}'", path.display()))?;
        }
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize '{}'", path.display()))?;
    Ok(())
}

fn print_summary(audio: &Audio) -> Result<()> {
    let count = audio.channels.len();
    let mut meter = EbuR128::new(count as u32, audio.sample_rate, Mode::I | Mode::TRUE_PEAK)
        .context("failed to create loudness meter")?;

    let mut interleaved = Vec::with_capacity(audio.frames() * count);
    for n in 0..audio.frames() {
        for ch in &audio.channels {
            interleaved.push(ch[n]);
        }
    }
    meter
        .add_frames_f32(&interleaved)
        .context("failed to measure loudness")?;

    let lufs = meter
        .loudness_global()
        .context("failed to read integrated loudness")?;
    let mut true_peak = 0.0f64;
    for ch in 0..count {
        let tp = meter
            .true_peak(ch as u32)
            .with_context(|| format!("failed to read true peak of channel {}", ch))?;
        true_peak = true_peak.max(tp);
    }
    let peak = audio
        .channels
        .iter()
        .map(|ch| peak_abs(ch))
        .fold(0.0f32, f32::max);

    println!("  frames rendered  : {}", audio.frames());
    println!("  sample peak      : {:.4}", peak);
    println!("  integrated       : {:.2} LUFS", lufs);
    println!("  true peak        : {:.2} dBTP", 20.0 * true_peak.max(1e-10).log10());
    Ok(())
}
