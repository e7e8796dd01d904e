/// Sound engine: procedural chiptune clips via rodio.
///
/// Every clip is rendered to an in-memory WAV buffer at init time. Cues
/// play fire-and-forget on their own Sink; the ambient tune loops on a
/// kept Sink at low volume.
///
/// Without the "sound" feature the stub SoundEngine does nothing.

use crate::sim::event::Clip;

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink, Source};

    use super::Clip;

    pub(super) const SAMPLE_RATE: u32 = 22050;
    const AMBIENT_VOLUME: f32 = 0.2;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        clips: HashMap<Clip, Arc<Vec<u8>>>,
        ambient: Option<Sink>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            let clips = [Clip::Ambient, Clip::Coin, Clip::Fx, Clip::Chest, Clip::Secret]
                .into_iter()
                .map(|c| (c, Arc::new(make_wav(&super::render(c)))))
                .collect();

            Some(SoundEngine { _stream: stream, handle, clips, ambient: None })
        }

        pub fn play(&self, clip: Clip) {
            let Some(buf) = self.clips.get(&clip) else { return };
            match Sink::try_new(&self.handle) {
                Ok(sink) => {
                    let cursor = Cursor::new(buf.as_ref().clone());
                    match rodio::Decoder::new(cursor) {
                        Ok(src) => {
                            sink.append(src);
                            sink.detach();
                        }
                        Err(e) => tracing::warn!(?clip, "clip decode failed: {e}"),
                    }
                }
                Err(e) => tracing::warn!(?clip, "no sink for clip: {e}"),
            }
        }

        /// Start the looping ambient tune. Calling again is a no-op.
        pub fn start_ambient(&mut self) {
            if self.ambient.is_some() {
                return;
            }
            let Some(buf) = self.clips.get(&Clip::Ambient) else { return };
            let sink = match Sink::try_new(&self.handle) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("no sink for ambient loop: {e}");
                    return;
                }
            };
            match rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                Ok(src) => {
                    sink.set_volume(AMBIENT_VOLUME);
                    sink.append(src.repeat_infinite());
                    self.ambient = Some(sink);
                }
                Err(e) => tracing::warn!("ambient decode failed: {e}"),
            }
        }
    }

    /// Wrap mono f32 samples into a 16-bit PCM WAV buffer.
    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play(&self, _clip: Clip) {}
    pub fn start_ambient(&mut self) {}
}

// ════════════════════════════════════════════════════════════
//  Clip synthesis: mono f32 samples at RATE
// ════════════════════════════════════════════════════════════

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const RATE: f32 = 22050.0;

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn render(clip: Clip) -> Vec<f32> {
    match clip {
        Clip::Ambient => gen_ambient(),
        Clip::Coin => gen_coin(),
        Clip::Fx => gen_fx(),
        Clip::Chest => gen_chest(),
        Clip::Secret => gen_secret(),
    }
}

/// Sequence of (frequency, seconds) notes, sine plus a touch of third
/// harmonic, each with its own decay.
fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
    let mut samples = Vec::new();
    for &(freq, dur) in seq {
        let n = (RATE * dur) as usize;
        for i in 0..n {
            let t = i as f32 / RATE;
            let env = 1.0 - (i as f32 / n as f32).powf(0.5);
            let wave = (t * freq * std::f32::consts::TAU).sin() * 0.7
                + (t * freq * 3.0 * std::f32::consts::TAU).sin() * 0.3;
            samples.push(wave * env * volume);
        }
    }
    samples
}

/// Slow pentatonic loop; ends on the tonic so the repeat is seamless.
fn gen_ambient() -> Vec<f32> {
    let melody = [
        (392.0, 0.4), (440.0, 0.4), (523.0, 0.8),
        (440.0, 0.4), (392.0, 0.4), (330.0, 0.8),
        (294.0, 0.4), (330.0, 0.4), (392.0, 1.2),
    ];
    notes(&melody, 0.3)
}

/// Two-note jingle, B5 → E6.
fn gen_coin() -> Vec<f32> {
    notes(&[(988.0, 0.06), (1319.0, 0.14)], 0.25)
}

/// Soft puff: filtered noise with a falling tone underneath.
fn gen_fx() -> Vec<f32> {
    let n = (RATE * 0.12) as usize;
    let mut seed: u32 = 0x5eed;
    let mut last = 0.0_f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let freq = 500.0 - t * 300.0;
            let tone = (i as f32 / RATE * freq * std::f32::consts::TAU).sin();
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            let noise = (seed as f32 / u32::MAX as f32) * 2.0 - 1.0;
            last = last * 0.7 + noise * 0.3;
            (tone * 0.5 + last * 0.5) * (1.0 - t).powf(0.8) * 0.3
        })
        .collect()
}

/// Rising arpeggio C5 E5 G5 C6.
fn gen_chest() -> Vec<f32> {
    notes(&[(523.0, 0.08), (659.0, 0.08), (784.0, 0.08), (1047.0, 0.3)], 0.3)
}

/// Shimmering ascent for hidden rewards.
fn gen_secret() -> Vec<f32> {
    let seq: Vec<(f32, f32)> = [784.0, 740.0, 622.0, 440.0, 415.0, 659.0, 831.0, 1047.0]
        .iter()
        .map(|&f| (f, 0.07))
        .collect();
    notes(&seq, 0.25)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_clip_renders_audible_samples() {
        for clip in [Clip::Ambient, Clip::Coin, Clip::Fx, Clip::Chest, Clip::Secret] {
            let s = render(clip);
            assert!(!s.is_empty(), "{clip:?}");
            assert!(s.iter().all(|v| v.abs() <= 1.0), "{clip:?}");
            assert!(s.iter().any(|v| v.abs() > 0.01), "{clip:?}");
        }
    }

    #[cfg(feature = "sound")]
    #[test]
    fn wav_header_matches_sample_count() {
        let wav = inner::make_wav(&[0.0, 0.5, -0.5]);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + 6);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 6);
    }
}
