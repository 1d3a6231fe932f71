//! Sample format, channel, and rate conversion.
//!
//! Used to adapt decoded music content into the graph's format at attach
//! time. The live microphone path is never converted; a mismatched mic
//! handle is rejected instead.

/// Converts an i16 sample to f32 in [-1.0, 1.0].
#[inline]
pub fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

/// Converts an f32 sample in [-1.0, 1.0] to i16.
///
/// Uses x 32767 (not 32768) for symmetric scaling, the common convention
/// that avoids producing out-of-range values. Input outside [-1, 1] is
/// clamped.
#[inline]
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}

/// Mixes interleaved multi-channel samples down to mono by averaging each
/// frame's channels.
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Expands mono samples to interleaved multi-channel by duplication.
pub fn from_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let channels = channels as usize;
    samples
        .iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels))
        .collect()
}

/// Converts interleaved samples from one channel count to another.
///
/// Unequal counts go through a mono intermediate: channels are averaged
/// down, then duplicated up.
pub fn convert_channels(samples: &[f32], from: u16, to: u16) -> Vec<f32> {
    if from == to {
        return samples.to_vec();
    }
    let mono = to_mono(samples, from);
    from_mono(&mono, to)
}

/// Linearly resamples interleaved audio from one sample rate to another.
///
/// Linear interpolation is sufficient here: the resampled content is a
/// music bed behind speech, not archival audio.
pub fn resample_linear(samples: &[f32], channels: u16, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || channels == 0 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    let frames_in = samples.len() / channels;
    if frames_in == 0 {
        return Vec::new();
    }

    let frames_out =
        ((frames_in as u64 * u64::from(to_rate)) / u64::from(from_rate)).max(1) as usize;
    let step = f64::from(from_rate) / f64::from(to_rate);

    let mut out = Vec::with_capacity(frames_out * channels);
    for i in 0..frames_out {
        let pos = i as f64 * step;
        let base = pos as usize;
        let frac = (pos - base as f64) as f32;
        let base = base.min(frames_in - 1);
        let next = (base + 1).min(frames_in - 1);

        for ch in 0..channels {
            let a = samples[base * channels + ch];
            let b = samples[next * channels + ch];
            out.push(a + (b - a) * frac);
        }
    }
    out
}
