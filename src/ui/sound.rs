/// Sound engine: procedural horror stings via rodio.
///
/// Every effect is synthesized into an in-memory WAV at start-up and played
/// fire-and-forget. `play_event` maps game events to effects.
///
/// Build without the "sound" feature to get the silent stub.

#[cfg(feature = "sound")]
mod inner {
    use std::collections::HashMap;
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use mazechase::sim::event::GameEvent;

    const SAMPLE_RATE: u32 = 22050;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum Sfx {
        Pickup,
        Unlock,
        Shot,
        Click,
        Growl,
        Capture,
        Jumpscare,
        Stun,
        Collapse,
        Clear,
        Drone,
        Switch,
    }

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        bank: HashMap<Sfx, Arc<Vec<u8>>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;

            let bank = [
                (Sfx::Pickup, gen_pickup()),
                (Sfx::Unlock, gen_unlock()),
                (Sfx::Shot, gen_shot()),
                (Sfx::Click, gen_click()),
                (Sfx::Growl, gen_growl()),
                (Sfx::Capture, gen_capture()),
                (Sfx::Jumpscare, gen_jumpscare()),
                (Sfx::Stun, gen_stun()),
                (Sfx::Collapse, gen_collapse()),
                (Sfx::Clear, gen_clear()),
                (Sfx::Drone, gen_drone()),
                (Sfx::Switch, gen_click()),
            ]
            .into_iter()
            .map(|(sfx, samples)| (sfx, Arc::new(make_wav(&samples))))
            .collect();

            Some(SoundEngine { _stream: stream, handle, bank })
        }

        fn play(&self, sfx: Sfx) {
            let Some(buf) = self.bank.get(&sfx) else { return };
            if let Ok(sink) = Sink::try_new(&self.handle) {
                if let Ok(src) = rodio::Decoder::new(Cursor::new(buf.as_ref().clone())) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_event(&self, event: &GameEvent) {
            let sfx = match event {
                GameEvent::KeyCollected { collected, needed, .. } if collected == needed => Sfx::Unlock,
                GameEvent::KeyCollected { .. }
                | GameEvent::WeaponCollected
                | GameEvent::AmmoCollected { .. } => Sfx::Pickup,
                GameEvent::ShotFired => Sfx::Shot,
                GameEvent::OutOfAmmo | GameEvent::ExitLocked { .. } => Sfx::Click,
                GameEvent::LightToggled { .. } | GameEvent::LightDied => Sfx::Switch,
                GameEvent::BossFelled => Sfx::Collapse,
                GameEvent::BossEmerged | GameEvent::PursuerShout { .. } | GameEvent::CharacterKilled { .. } => {
                    Sfx::Growl
                }
                GameEvent::BossStunned { .. } | GameEvent::Escaped => Sfx::Stun,
                GameEvent::Captured { .. } => Sfx::Capture,
                GameEvent::Jumpscare => Sfx::Jumpscare,
                GameEvent::LevelCleared { .. } => Sfx::Clear,
                GameEvent::AmbientCue => Sfx::Drone,
                GameEvent::GameOver => return,
            };
            self.play(sfx);
        }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples in [-1, 1]
    // ════════════════════════════════════════════════════════════

    fn samples_for(secs: f32) -> usize {
        (SAMPLE_RATE as f32 * secs) as usize
    }

    /// Deterministic white noise.
    struct Noise(u32);

    impl Noise {
        fn next(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(1664525).wrapping_add(1013904223);
            (self.0 >> 8) as f32 / (1u32 << 24) as f32 * 2.0 - 1.0
        }
    }

    /// A run of sine notes, each with a linear decay.
    fn notes(seq: &[(f32, f32)], volume: f32) -> Vec<f32> {
        let mut out = Vec::new();
        for &(freq, secs) in seq {
            let n = samples_for(secs);
            out.extend((0..n).map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                (t * freq * TAU).sin() * env * volume
            }));
        }
        out
    }

    /// Pitch glide from `from` to `to` Hz with some grit mixed in.
    fn glide(from: f32, to: f32, secs: f32, grit: f32, volume: f32, seed: u32) -> Vec<f32> {
        let n = samples_for(secs);
        let mut noise = Noise(seed);
        let mut phase = 0.0f32;
        (0..n)
            .map(|i| {
                let p = i as f32 / n as f32;
                phase += (from + (to - from) * p) / SAMPLE_RATE as f32;
                let tone = (phase * TAU).sin();
                let env = (1.0 - p).powf(0.7);
                (tone * (1.0 - grit) + noise.next() * grit) * env * volume
            })
            .collect()
    }

    fn gen_pickup() -> Vec<f32> {
        notes(&[(880.0, 0.05), (1175.0, 0.07)], 0.25)
    }

    fn gen_unlock() -> Vec<f32> {
        notes(&[(523.0, 0.08), (784.0, 0.08), (1047.0, 0.18)], 0.3)
    }

    fn gen_shot() -> Vec<f32> {
        glide(180.0, 40.0, 0.25, 0.85, 0.6, 7)
    }

    fn gen_click() -> Vec<f32> {
        glide(2000.0, 1500.0, 0.02, 0.5, 0.3, 3)
    }

    fn gen_growl() -> Vec<f32> {
        let n = samples_for(0.7);
        let mut noise = Noise(99);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let p = i as f32 / n as f32;
                // Low saw with a slow wobble.
                let freq = 70.0 + (t * 6.0 * TAU).sin() * 12.0;
                let saw = (t * freq).fract() * 2.0 - 1.0;
                let env = (p * 8.0).min(1.0) * (1.0 - p);
                (saw * 0.7 + noise.next() * 0.3) * env * 0.35
            })
            .collect()
    }

    fn gen_capture() -> Vec<f32> {
        // Two detuned tones beating against each other.
        let n = samples_for(0.6);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                ((t * 233.0 * TAU).sin() + (t * 247.0 * TAU).sin()) * 0.5 * env * 0.4
            })
            .collect()
    }

    fn gen_jumpscare() -> Vec<f32> {
        let mut out = glide(1400.0, 300.0, 0.9, 0.6, 0.9, 1313);
        for (i, s) in out.iter_mut().take(samples_for(0.05)).enumerate() {
            *s *= i as f32 / samples_for(0.05) as f32;
        }
        out
    }

    fn gen_stun() -> Vec<f32> {
        let n = samples_for(0.4);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let freq = 500.0 + (t * 18.0 * TAU).sin() * 150.0;
                (t * freq * TAU).sin() * env * 0.3
            })
            .collect()
    }

    fn gen_collapse() -> Vec<f32> {
        glide(300.0, 60.0, 1.0, 0.4, 0.45, 41)
    }

    fn gen_clear() -> Vec<f32> {
        notes(&[(392.0, 0.12), (523.0, 0.12), (659.0, 0.12), (784.0, 0.35)], 0.3)
    }

    fn gen_drone() -> Vec<f32> {
        let n = samples_for(2.0);
        (0..n)
            .map(|i| {
                let t = i as f32 / SAMPLE_RATE as f32;
                let p = i as f32 / n as f32;
                let env = (p * std::f32::consts::PI).sin();
                ((t * 55.0 * TAU).sin() * 0.6 + (t * 82.5 * TAU).sin() * 0.4) * env * 0.2
            })
            .collect()
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit mono PCM
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        const CHANNELS: u16 = 1;
        const BITS: u16 = 16;
        let block_align = CHANNELS * BITS / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_len = samples.len() as u32 * block_align as u32;

        let mut wav = Vec::with_capacity(44 + data_len as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_len).to_le_bytes());
        wav.extend_from_slice(b"WAVEfmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&CHANNELS.to_le_bytes());
        wav.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&BITS.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_len.to_le_bytes());
        for &s in samples {
            wav.extend_from_slice(&((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16).to_le_bytes());
        }
        wav
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn wav_header_matches_payload() {
            let wav = make_wav(&gen_pickup());
            assert_eq!(&wav[0..4], b"RIFF");
            assert_eq!(&wav[8..16], b"WAVEfmt ");
            let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]) as usize;
            assert_eq!(wav.len(), 44 + data_len);
        }

        #[test]
        fn generators_stay_in_range() {
            for samples in [gen_shot(), gen_growl(), gen_jumpscare(), gen_drone()] {
                assert!(!samples.is_empty());
                assert!(samples.iter().all(|s| s.abs() <= 1.0));
            }
        }
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
    pub fn play_event(&self, _event: &mazechase::sim::event::GameEvent) {}
}
