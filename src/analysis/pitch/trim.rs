// Trim module - leading/trailing silence removal
//
// Frames are centred on multiples of the hop size and zero-padded at the
// edges. A frame counts as sound when its mean-square power, in dB relative
// to the loudest frame, is above -top_db. The returned span runs from the
// first sounding frame to the end of the last one.

use std::ops::Range;

/// Power floor used before taking logarithms
const AMIN: f64 = 1e-10;

/// Mean-square power per centred frame
///
/// Returns `1 + len / hop_length` values for a non-empty signal.
pub fn frame_power(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    if samples.is_empty() || frame_length == 0 || hop_length == 0 {
        return Vec::new();
    }

    // prefix[i] = sum of squares of samples[..i]
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0_f64);
    let mut acc = 0.0_f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }

    let half = frame_length / 2;
    let n_frames = 1 + samples.len() / hop_length;

    (0..n_frames)
        .map(|i| {
            let centre = i * hop_length;
            let start = centre.saturating_sub(half).min(samples.len());
            let end = (centre + frame_length - half).min(samples.len());
            (prefix[end] - prefix[start]) / frame_length as f64
        })
        .collect()
}

/// Sample range left after trimming leading and trailing silence
///
/// An all-zero signal is its own reference level and comes back untrimmed.
pub fn trim_silence(
    samples: &[f32],
    top_db: f32,
    frame_length: usize,
    hop_length: usize,
) -> Range<usize> {
    let power = frame_power(samples, frame_length, hop_length);
    let Some(reference) = power.iter().copied().reduce(f64::max) else {
        return 0..0;
    };

    let ref_db = 10.0 * reference.max(AMIN).log10();
    let threshold = -(top_db as f64);
    let is_sound = |p: f64| 10.0 * p.max(AMIN).log10() - ref_db > threshold;

    let first = power.iter().position(|&p| is_sound(p));
    let last = power.iter().rposition(|&p| is_sound(p));

    match (first, last) {
        (Some(first), Some(last)) => {
            let start = (first * hop_length).min(samples.len());
            let end = ((last + 1) * hop_length).min(samples.len());
            start..end
        }
        _ => 0..0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::synth;

    const SR: u32 = 44_100;

    #[test]
    fn test_frame_count_matches_centred_framing() {
        let samples = vec![0.1_f32; 10_000];
        assert_eq!(frame_power(&samples, 2048, 512).len(), 1 + 10_000 / 512);
    }

    #[test]
    fn test_empty_signal_trims_to_nothing() {
        assert_eq!(trim_silence(&[], 20.0, 2048, 512), 0..0);
    }

    #[test]
    fn test_digital_silence_is_left_untrimmed() {
        let samples = vec![0.0_f32; SR as usize];
        assert_eq!(trim_silence(&samples, 20.0, 2048, 512), 0..samples.len());
    }

    #[test]
    fn test_padding_is_trimmed_around_tone() {
        let lead = synth::silence(SR, 0.5);
        let tone = synth::sine(220.0, SR, 1.0, 0.5);
        let tail = synth::silence(SR, 0.5);
        let samples: Vec<f32> = lead.iter().chain(&tone).chain(&tail).copied().collect();

        let span = trim_silence(&samples, 20.0, 2048, 512);
        let tone_start = lead.len();
        let tone_end = lead.len() + tone.len();

        // Frame granularity lets a frame's worth of silence in on either side
        assert!(span.start <= tone_start && tone_start - span.start <= 2048);
        assert!(span.end >= tone_end && span.end - tone_end <= 2048);
    }

    #[test]
    fn test_quiet_tail_below_threshold_is_removed() {
        let loud = synth::sine(220.0, SR, 1.0, 0.5);
        // 40 dB below the loud section
        let quiet = synth::sine(220.0, SR, 1.0, 0.005);
        let samples: Vec<f32> = loud.iter().chain(&quiet).copied().collect();

        let span = trim_silence(&samples, 20.0, 2048, 512);
        assert_eq!(span.start, 0);
        assert!(span.end < loud.len() + 2048);
    }
}
