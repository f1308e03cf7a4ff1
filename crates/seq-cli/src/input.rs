//! Test signals: generated sine or WAV file via hound

use std::path::Path;

use anyhow::{Context, Result, bail};

/// Deinterleaved stereo buffer
#[derive(Debug, Clone)]
pub struct StereoSignal {
    pub left: Vec<f64>,
    pub right: Vec<f64>,
    pub sample_rate: u32,
}

impl StereoSignal {
    pub fn silence(len: usize, sample_rate: u32) -> Self {
        Self {
            left: vec![0.0; len],
            right: vec![0.0; len],
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }
}

/// Same sine on both channels
pub fn sine(freq: f64, amplitude: f64, sample_rate: u32, seconds: f64) -> StereoSignal {
    let len = (seconds * sample_rate as f64).round() as usize;
    let step = 2.0 * std::f64::consts::PI * freq / sample_rate as f64;
    let left: Vec<f64> = (0..len).map(|i| amplitude * (step * i as f64).sin()).collect();
    StereoSignal {
        right: left.clone(),
        left,
        sample_rate,
    }
}

/// Read a WAV file; mono is copied to both channels, extra channels ignored
pub fn read_wav(path: &Path) -> Result<StereoSignal> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        bail!("{} has no channels", path.display());
    }

    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let frames = interleaved.len() / channels;
    let mut signal = StereoSignal::silence(frames, spec.sample_rate);
    for (i, frame) in interleaved.chunks_exact(channels).enumerate() {
        signal.left[i] = frame[0];
        signal.right[i] = if channels > 1 { frame[1] } else { frame[0] };
    }

    log::info!(
        "Loaded {}: {} frames, {} ch, {} Hz",
        path.display(),
        frames,
        channels,
        spec.sample_rate
    );
    Ok(signal)
}

/// Write a 32-bit float stereo WAV
pub fn write_wav(path: &Path, signal: &StereoSignal) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: signal.sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for (l, r) in signal.left.iter().zip(&signal.right) {
        writer.write_sample(*l as f32)?;
        writer.write_sample(*r as f32)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_length_and_level() {
        let s = sine(1000.0, 0.5, 48000, 0.25);
        assert_eq!(s.len(), 12000);
        assert_eq!(s.left, s.right);
        let peak = s.left.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        assert!((peak - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_mono_int_wav_fills_both_channels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0i16, 16384, -16384, i16::MAX] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let signal = read_wav(&path).unwrap();
        assert_eq!(signal.sample_rate, 44100);
        assert_eq!(signal.left, signal.right);
        assert_eq!(signal.left[..3], [0.0, 0.5, -0.5]);
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let mut signal = sine(440.0, 0.25, 48000, 0.01);
        signal.right.iter_mut().for_each(|x| *x = -*x);
        write_wav(&path, &signal).unwrap();

        let back = read_wav(&path).unwrap();
        assert_eq!(back.len(), signal.len());
        assert!((back.right[17] + signal.left[17]).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_wav(Path::new("/nonexistent/input.wav")).unwrap_err();
        assert!(err.to_string().contains("input.wav"));
    }
}
