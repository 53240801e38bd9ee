/// Sound engine: procedural beeps and chimes via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile with `--no-default-features` or without "sound" feature
/// to disable audio entirely (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    pub(super) const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_accept: Arc<Vec<u8>>,
        sfx_reject: Arc<Vec<u8>>,
        sfx_tick: Arc<Vec<u8>>,
        sfx_alarm: Arc<Vec<u8>>,
        sfx_expire: Arc<Vec<u8>>,
        sfx_reveal: Arc<Vec<u8>>,
        sfx_fanfare: Arc<Vec<u8>>,
        sfx_chime: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    log::warn!("no audio output, running silent: {e}");
                    return None;
                }
            };

            // ── Generate all sound buffers ──
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_accept: Arc::new(make_wav(&gen_accept())),
                sfx_reject: Arc::new(make_wav(&gen_reject())),
                sfx_tick: Arc::new(make_wav(&gen_blip(880.0, 0.03, 0.15))),
                sfx_alarm: Arc::new(make_wav(&gen_blip(1320.0, 0.08, 0.3))),
                sfx_expire: Arc::new(make_wav(&gen_expire())),
                sfx_reveal: Arc::new(make_wav(&gen_blip(660.0, 0.05, 0.2))),
                sfx_fanfare: Arc::new(make_wav(&gen_fanfare())),
                sfx_chime: Arc::new(make_wav(&gen_chime())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_accept(&self) { self.play(&self.sfx_accept); }
        pub fn play_reject(&self) { self.play(&self.sfx_reject); }
        /// Countdown second. `urgent` below the low-water mark.
        pub fn play_tick(&self, urgent: bool) {
            if urgent {
                self.play(&self.sfx_alarm);
            } else {
                self.play(&self.sfx_tick);
            }
        }
        pub fn play_expire(&self) { self.play(&self.sfx_expire); }
        pub fn play_reveal(&self) { self.play(&self.sfx_reveal); }
        pub fn play_fanfare(&self) { self.play(&self.sfx_fanfare); }
        pub fn play_chime(&self) { self.play(&self.sfx_chime); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: all produce Vec<f32> mono samples
    // ════════════════════════════════════════════════════════════

    fn sine(t: f32, freq: f32) -> f32 {
        (t * freq * TAU).sin()
    }

    /// Simple sine blip at given frequency and duration
    pub(super) fn gen_blip(freq: f32, duration: f32, volume: f32) -> Vec<f32> {
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32); // linear fade out
                sine(t, freq) * env * volume
            })
            .collect()
    }

    /// A run of notes, each `(freq, seconds)`, with a 2nd harmonic for body.
    pub(super) fn gen_notes(notes: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut samples = Vec::new();
        for &(freq, dur) in notes {
            let n = (SAMPLE_RATE as f32 * dur) as usize;
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32).powf(0.5);
                let wave = sine(t, freq) * 0.7 + sine(t, freq * 2.0) * 0.3;
                samples.push(wave * env * volume);
            }
        }
        samples
    }

    /// Correct answer: bright rising third C6→E6→G6
    fn gen_accept() -> Vec<f32> {
        gen_notes(&[(1047.0, 0.06), (1319.0, 0.06), (1568.0, 0.12)], 0.25)
    }

    /// Wrong answer: low square-ish buzz
    fn gen_reject() -> Vec<f32> {
        let duration = 0.25;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.5;
                let square = if sine(t, 140.0) >= 0.0 { 1.0 } else { -1.0 };
                square * env * 0.15
            })
            .collect()
    }

    /// Countdown ran out: falling whistle into a low thud
    fn gen_expire() -> Vec<f32> {
        let duration = 0.6;
        let n = (SAMPLE_RATE as f32 * duration) as usize;
        let mut phase = 0.0_f32;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let freq = 900.0 - t * 780.0; // 900Hz → 120Hz
                phase += freq / SAMPLE_RATE as f32;
                let env = (1.0 - t).powf(0.7);
                (phase * TAU).sin() * env * 0.3
            })
            .collect()
    }

    /// Grand total: ascending fanfare with a held top note
    fn gen_fanfare() -> Vec<f32> {
        gen_notes(
            &[(523.0, 0.12), (659.0, 0.12), (784.0, 0.12), (1047.0, 0.45)],
            0.3,
        )
    }

    /// Hidden message: soft bell pair
    fn gen_chime() -> Vec<f32> {
        let mut samples = gen_blip(1568.0, 0.35, 0.25);
        samples.extend(gen_blip(2093.0, 0.6, 0.2));
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2; // 16-bit = 2 bytes per sample
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        // RIFF header
        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        // fmt chunk
        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes()); // chunk size
        buf.extend_from_slice(&1u16.to_le_bytes());  // PCM format
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        // data chunk
        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_accept(&self) {}
    pub fn play_reject(&self) {}
    pub fn play_tick(&self, _urgent: bool) {}
    pub fn play_expire(&self) {}
    pub fn play_reveal(&self) {}
    pub fn play_fanfare(&self) {}
    pub fn play_chime(&self) {}
}
