//! Sound effects
//!
//! Every sound is a short list of synth [`Tone`]s, so nothing needs asset
//! files. On wasm32 the [`AudioManager`] plays them through Web Audio;
//! elsewhere sounds go through [`crate::platform::Host`] and are recorded or
//! dropped.

use serde::Serialize;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sound {
    /// Snake eats food
    Eat,
    /// Round lost (twin squares, stray lines, simon)
    Lose,
    /// Snake crash
    GameOver,
    /// Best score beaten / simon round cleared
    Applause,
    /// Simon quadrant tone (0..4)
    Note(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wave {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One oscillator burst with an exponential decay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub wave: Wave,
    pub freq: f32,
    /// Frequency glided to by the end of the tone
    pub end_freq: Option<f32>,
    /// Start offset in seconds
    pub delay: f64,
    /// Seconds until the gain has decayed
    pub length: f64,
    /// Peak gain at full volume
    pub gain: f32,
}

impl Tone {
    const fn new(wave: Wave, freq: f32, delay: f64, length: f64, gain: f32) -> Self {
        Self {
            wave,
            freq,
            end_freq: None,
            delay,
            length,
            gain,
        }
    }

    const fn glide(mut self, end_freq: f32) -> Self {
        self.end_freq = Some(end_freq);
        self
    }
}

/// Simon tones, one per quadrant
const NOTE_FREQS: [f32; 4] = [330.0, 392.0, 494.0, 587.0];

impl Sound {
    pub fn tones(self) -> Vec<Tone> {
        match self {
            Sound::Eat => vec![Tone::new(Wave::Square, 300.0, 0.0, 0.08, 0.2).glide(700.0)],
            Sound::Lose => [400.0, 350.0, 300.0, 200.0]
                .iter()
                .enumerate()
                .map(|(i, f)| Tone::new(Wave::Sine, *f, i as f64 * 0.2, 0.3, 0.3))
                .collect(),
            Sound::GameOver => vec![Tone::new(Wave::Sawtooth, 220.0, 0.0, 0.5, 0.4).glide(40.0)],
            Sound::Applause => [500.0, 600.0, 700.0, 800.0, 1000.0]
                .iter()
                .enumerate()
                .map(|(i, f)| Tone::new(Wave::Triangle, *f, i as f64 * 0.08, 0.25, 0.25))
                .collect(),
            Sound::Note(i) => {
                let freq = NOTE_FREQS[usize::from(i) % NOTE_FREQS.len()];
                vec![Tone::new(Wave::Triangle, freq, 0.0, 0.35, 0.4)]
            }
        }
    }

    /// Seconds until the last tone has finished
    pub fn duration(self) -> f64 {
        self.tones()
            .iter()
            .map(|t| t.delay + t.length)
            .fold(0.0, f64::max)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, OscillatorType};

    use super::{Sound, Tone, Wave};

    /// Tail after the decay so the oscillator never clicks off
    const RELEASE: f64 = 0.05;

    fn oscillator_type(wave: Wave) -> OscillatorType {
        match wave {
            Wave::Sine => OscillatorType::Sine,
            Wave::Square => OscillatorType::Square,
            Wave::Sawtooth => OscillatorType::Sawtooth,
            Wave::Triangle => OscillatorType::Triangle,
        }
    }

    /// Audio output for the browser host
    pub struct AudioManager {
        ctx: Option<AudioContext>,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Fails outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Play `sound` at `vol` (already zero when muted)
        pub fn play(&self, sound: Sound, vol: f32) {
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            // Browsers keep the context suspended until a user gesture
            if ctx.state() == AudioContextState::Suspended {
                let _ = ctx.resume();
            }
            for tone in sound.tones() {
                if Self::play_tone(ctx, &tone, vol).is_none() {
                    log::debug!("Could not play {:?}", sound);
                }
            }
        }

        fn play_tone(ctx: &AudioContext, tone: &Tone, vol: f32) -> Option<()> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;
            osc.set_type(oscillator_type(tone.wave));
            osc.frequency().set_value(tone.freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            let t = ctx.current_time() + tone.delay;
            let end = t + tone.length;
            gain.gain().set_value_at_time(vol * tone.gain, t).ok()?;
            gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok()?;
            if let Some(to) = tone.end_freq {
                osc.frequency().exponential_ramp_to_value_at_time(to, end).ok()?;
            }
            osc.start_with_when(t).ok()?;
            osc.stop_with_when(end + RELEASE).ok()?;
            Some(())
        }
    }
}
