//! Dual-tone chime synthesis and WAV helpers

use std::{f64::consts::PI, time::Duration};

pub const SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_CHIME_MS: u32 = 350;
const MIN_CHIME_MS: u32 = 50;
const MAX_CHIME_MS: u32 = 500;

const FUNDAMENTAL_HZ: f64 = 440.0;
const OVERTONE_HZ: f64 = 880.0;
const OVERTONE_GAIN: f64 = 0.6;
const MASTER_GAIN: f64 = 0.35;
const ATTACK_SECS: f64 = 0.010;
const RELEASE_SECS: f64 = 0.050;

// 16-bit mono PCM
const CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = CHANNELS * (BITS_PER_SAMPLE / 8);

/// Render an A4 + A5 chime with a short fade in and out.
///
/// `duration_ms` is clamped to 50..=500.
pub fn synthesize_chime(duration_ms: u32, sample_rate: u32) -> Vec<i16> {
    let duration_ms = duration_ms.clamp(MIN_CHIME_MS, MAX_CHIME_MS);
    let rate = f64::from(sample_rate);
    let total = (rate * f64::from(duration_ms) / 1000.0) as usize;
    let attack = ((rate * ATTACK_SECS) as usize).max(1);
    let release = ((rate * RELEASE_SECS) as usize).max(1);

    (0..total)
        .map(|i| {
            let t = i as f64 / rate;
            let raw = (2.0 * PI * FUNDAMENTAL_HZ * t).sin()
                + OVERTONE_GAIN * (2.0 * PI * OVERTONE_HZ * t).sin();
            let envelope = if i < attack {
                i as f64 / attack as f64
            } else if i > total.saturating_sub(release) {
                ((total - i) as f64 / release as f64).max(0.0)
            } else {
                1.0
            };
            let sample = raw * MASTER_GAIN * envelope * f64::from(i16::MAX);
            sample.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
        })
        .collect()
}

/// Wrap mono 16-bit samples in a RIFF/WAVE container
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * usize::from(BLOCK_ALIGN)) as u32;
    let byte_rate = sample_rate * u32::from(BLOCK_ALIGN);

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&BLOCK_ALIGN.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Playback length of a WAV file, read from its `fmt ` and `data` chunks
pub fn wav_duration(bytes: &[u8]) -> Option<Duration> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut byte_rate = None;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let len = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body = pos + 8;
        match id {
            b"fmt " if len >= 12 && body + 12 <= bytes.len() => {
                byte_rate = Some(u32::from_le_bytes(bytes[body + 8..body + 12].try_into().ok()?));
            }
            b"data" => {
                let rate = u64::from(byte_rate.filter(|r| *r > 0)?);
                return Some(Duration::from_nanos(len as u64 * 1_000_000_000 / rate));
            }
            _ => {}
        }
        // Chunks are word aligned
        pos = body + len + (len & 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_length_follows_clamped_duration() {
        assert_eq!(synthesize_chime(350, SAMPLE_RATE).len(), 15_435);
        assert_eq!(synthesize_chime(10, SAMPLE_RATE).len(), 2_205);
        assert_eq!(synthesize_chime(2_000, SAMPLE_RATE).len(), 22_050);
    }

    #[test]
    fn chime_fades_in_and_out() {
        let samples = synthesize_chime(DEFAULT_CHIME_MS, SAMPLE_RATE);
        assert_eq!(samples[0], 0);
        let peak_head = samples[..20].iter().map(|s| s.unsigned_abs()).max().unwrap();
        let peak_body = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak_head < peak_body / 4);
        let tail = samples.last().unwrap().unsigned_abs();
        assert!(tail < peak_body / 50);
        // 1.6 * 0.35 of full scale is the ceiling
        assert!(u32::from(peak_body) <= (f64::from(i16::MAX) * 0.56) as u32 + 1);
    }

    #[test]
    fn encoded_wav_reports_its_duration() {
        let samples = synthesize_chime(DEFAULT_CHIME_MS, SAMPLE_RATE);
        let wav = encode_wav(&samples, SAMPLE_RATE);
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let duration = wav_duration(&wav).unwrap();
        assert_eq!(duration.as_millis(), 350);
    }

    #[test]
    fn rejects_non_wav_bytes() {
        assert_eq!(wav_duration(b"ID3\x03\x00 definitely an mp3"), None);
        assert_eq!(wav_duration(&[]), None);
    }
}
