// src/mixer.rs

//! Record-and-mix: blends a live capture with a random background clip.

use crate::audio_buffer::{self, AudioBuffer};
use crate::audio_io::Recorder;
use crate::clip_store::ClipRef;
use crate::error::{Result, SoundboardError};
use crate::session::Volumes;
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Fixed capture format for a mix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mixer {
    pub sample_rate: u32,
    pub duration_seconds: f32,
}

impl Mixer {
    pub fn new(sample_rate: u32, duration_seconds: f32) -> Self {
        Self {
            sample_rate,
            duration_seconds,
        }
    }

    pub fn samples_to_capture(&self) -> Result<usize> {
        let n = self.duration_seconds as f64 * self.sample_rate as f64;
        if !n.is_finite() || n < 1.0 {
            return Err(SoundboardError::InvalidDuration(self.duration_seconds));
        }
        // f32 durations such as 0.01 widen to just under the intended count.
        Ok(n.round() as usize)
    }

    /// Records from `recorder`, then blends the capture with one clip picked at
    /// random from `background_clips`. The capture always happens first, so an
    /// empty library is only detected after recording.
    pub fn record_and_mix<R, G>(
        &self,
        recorder: &mut R,
        rng: &mut G,
        clip_dir: &Path,
        background_clips: &[ClipRef],
        volumes: Volumes,
    ) -> Result<AudioBuffer>
    where
        R: Recorder + ?Sized,
        G: Rng + ?Sized,
    {
        let n = self.samples_to_capture()?;
        info!("Recording...");
        let captured = AudioBuffer::mono(self.sample_rate, recorder.capture(n, self.sample_rate)?);

        let clip = background_clips
            .choose(rng)
            .ok_or_else(|| SoundboardError::EmptyLibrary {
                dir: clip_dir.to_path_buf(),
            })?;
        info!("Mixing against background clip '{}'", clip.name);

        let background = audio_buffer::load_wav(clip.path())?;
        if background.sample_rate != self.sample_rate {
            return Err(SoundboardError::RateMismatch {
                source_name: clip.path().display().to_string(),
                expected: self.sample_rate,
                found: background.sample_rate,
            });
        }
        if background.is_empty() {
            return Err(SoundboardError::EmptyClip {
                path: clip.path().to_path_buf(),
            });
        }

        mix_with_background(&captured, &background, volumes)
    }
}

/// Loops `background` from its start until it covers `n` samples, or cuts it
/// to its first `n` samples. Seams are not crossfaded.
/// An empty background yields an empty result.
pub fn align_background(background: &[f32], n: usize) -> Vec<f32> {
    if background.len() >= n {
        background[..n].to_vec()
    } else {
        background.iter().copied().cycle().take(n).collect()
    }
}

/// `clamp(fg * captured[i] + bg * background[i], -1, 1)` over the shorter input.
/// Out-of-range sums are flattened, not rescaled.
pub fn blend(captured: &[f32], background: &[f32], volumes: Volumes) -> Vec<f32> {
    captured
        .iter()
        .zip(background)
        .map(|(&fg, &bg)| (volumes.foreground * fg + volumes.background * bg).clamp(-1.0, 1.0))
        .collect()
}

/// Aligns `background` to the capture length and blends the two.
pub fn mix_with_background(
    captured: &AudioBuffer,
    background: &AudioBuffer,
    volumes: Volumes,
) -> Result<AudioBuffer> {
    if captured.sample_rate != background.sample_rate {
        return Err(SoundboardError::RateMismatch {
            source_name: "background".to_string(),
            expected: captured.sample_rate,
            found: background.sample_rate,
        });
    }
    let aligned = align_background(&background.samples, captured.samples.len());
    Ok(AudioBuffer::mono(
        captured.sample_rate,
        blend(&captured.samples, &aligned, volumes),
    ))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::audio_buffer::write_wav;
    use crate::clip_store::list_clips;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    /// Hands back a fixed waveform, looped to whatever length is requested.
    pub(crate) struct ScriptedRecorder {
        pub waveform: Vec<f32>,
        pub captures: usize,
    }

    impl ScriptedRecorder {
        pub(crate) fn new(waveform: Vec<f32>) -> Self {
            Self {
                waveform,
                captures: 0,
            }
        }
    }

    impl Recorder for ScriptedRecorder {
        fn capture(&mut self, num_samples: usize, _sample_rate: u32) -> Result<Vec<f32>> {
            self.captures += 1;
            Ok(self.waveform.iter().copied().cycle().take(num_samples).collect())
        }
    }

    fn ramp(len: usize, scale: f32) -> Vec<f32> {
        (0..len).map(|i| ((i % 200) as f32 / 200.0 - 0.5) * scale).collect()
    }

    fn volumes(foreground: f32, background: f32) -> Volumes {
        Volumes {
            foreground,
            background,
        }
    }

    #[test]
    fn short_background_is_tiled_then_truncated() {
        let background = vec![0.1, 0.2, 0.3];

        let aligned = align_background(&background, 8);

        assert_eq!(aligned.len(), 8);
        assert_eq!(&aligned[..3], &background[..]);
        assert_eq!(aligned, vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.3, 0.1, 0.2]);
    }

    #[test]
    fn long_background_keeps_its_first_samples() {
        let background: Vec<f32> = (0..10).map(|i| i as f32 / 10.0).collect();

        let aligned = align_background(&background, 4);

        assert_eq!(aligned, background[..4].to_vec());
    }

    #[test]
    fn equal_lengths_are_left_alone() {
        let background = vec![0.4, -0.4];
        assert_eq!(align_background(&background, 2), background);
    }

    #[test]
    fn blended_samples_never_leave_unit_range() {
        let captured = vec![1.0, -1.0, 0.9, -0.9, 0.0, 0.5];
        let background = vec![1.0, -1.0, 0.8, -0.95, 1.0, -0.5];

        for step_fg in 0..=10 {
            for step_bg in 0..=10 {
                let v = volumes(step_fg as f32 / 10.0, step_bg as f32 / 10.0);
                for sample in blend(&captured, &background, v) {
                    assert!((-1.0..=1.0).contains(&sample), "{} out of range", sample);
                }
            }
        }
    }

    #[test]
    fn clipping_flattens_instead_of_rescaling() {
        let mixed = blend(&[0.9, 0.2], &[0.9, 0.2], volumes(1.0, 1.0));
        assert_eq!(mixed, vec![1.0, 0.4]);
    }

    #[test]
    fn full_foreground_silent_background_returns_the_capture() {
        let captured = AudioBuffer::mono(44100, ramp(1000, 1.0));
        let background = AudioBuffer::mono(44100, ramp(300, 0.7));

        let mixed = mix_with_background(&captured, &background, volumes(1.0, 0.0)).unwrap();

        assert_eq!(mixed, captured);
    }

    #[test]
    fn five_second_capture_against_three_second_clip() {
        let captured = AudioBuffer::mono(44100, ramp(220_500, 1.6));
        let background = AudioBuffer::mono(44100, ramp(132_300, -1.9));

        let mixed = mix_with_background(&captured, &background, volumes(0.5, 0.5)).unwrap();

        assert_eq!(mixed.len(), 220_500);
        assert_eq!(mixed.sample_rate, 44100);
        let tiled = align_background(&background.samples, 220_500);
        assert_eq!(&tiled[..132_300], &background.samples[..]);
        assert_eq!(&tiled[132_300..], &background.samples[..88_200]);
        for (i, sample) in mixed.samples.iter().enumerate() {
            let expected = (0.5 * captured.samples[i] + 0.5 * tiled[i]).clamp(-1.0, 1.0);
            assert_eq!(*sample, expected, "sample {}", i);
        }
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let captured = AudioBuffer::mono(44100, vec![0.0; 4]);
        let background = AudioBuffer::mono(48000, vec![0.0; 4]);

        let result = mix_with_background(&captured, &background, volumes(0.5, 0.5));

        assert!(matches!(
            result,
            Err(SoundboardError::RateMismatch {
                expected: 44100,
                found: 48000,
                ..
            })
        ));
    }

    #[test]
    fn record_and_mix_uses_a_clip_from_the_library() {
        let dir = tempdir().unwrap();
        let clip_samples = vec![0.25, -0.25, 0.5];
        write_wav(&dir.path().join("caw.wav"), &AudioBuffer::mono(100, clip_samples)).unwrap();
        let clips = list_clips(dir.path()).unwrap();
        let decoded = audio_buffer::load_wav(&clips[0].path).unwrap();
        let mut recorder = ScriptedRecorder::new(vec![0.2, 0.4]);
        let mut rng = StdRng::seed_from_u64(7);

        let mixed = Mixer::new(100, 0.1)
            .record_and_mix(&mut recorder, &mut rng, dir.path(), &clips, volumes(0.5, 1.0))
            .unwrap();

        assert_eq!(recorder.captures, 1);
        assert_eq!(mixed.len(), 10);
        for (i, sample) in mixed.samples.iter().enumerate() {
            let fg = [0.2, 0.4][i % 2];
            let bg = decoded.samples[i % 3];
            assert_eq!(*sample, (0.5 * fg + bg).clamp(-1.0, 1.0));
        }
    }

    /// Writes one constant-valued clip per level and returns the library.
    fn constant_library(dir: &Path, levels: &[f32]) -> Vec<ClipRef> {
        for (i, level) in levels.iter().enumerate() {
            let clip = AudioBuffer::mono(100, vec![*level; 5]);
            write_wav(&dir.join(format!("clip{}.wav", i)), &clip).unwrap();
        }
        list_clips(dir).unwrap()
    }

    /// Mixes silence against the library so the output is the chosen clip.
    fn chosen_level(clips: &[ClipRef], dir: &Path, seed: u64) -> f32 {
        let mut recorder = ScriptedRecorder::new(vec![0.0]);
        let mut rng = StdRng::seed_from_u64(seed);
        let mixed = Mixer::new(100, 0.05)
            .record_and_mix(&mut recorder, &mut rng, dir, clips, volumes(0.0, 1.0))
            .unwrap();
        mixed.samples[0]
    }

    #[test]
    fn clip_choice_follows_the_random_source() {
        let dir = tempdir().unwrap();
        let clips = constant_library(dir.path(), &[0.25, 0.5, -0.5]);
        assert_eq!(clips.len(), 3);

        for seed in 0..8 {
            assert_eq!(
                chosen_level(&clips, dir.path(), seed),
                chosen_level(&clips, dir.path(), seed),
                "seed {}",
                seed
            );
        }

        let mut seen: Vec<f32> = Vec::new();
        for seed in 0..64 {
            let level = chosen_level(&clips, dir.path(), seed);
            assert!(
                [0.25, 0.5, -0.5]
                    .iter()
                    .any(|expected| approx::abs_diff_eq!(level, *expected, epsilon = 1e-3)),
                "unexpected level {}",
                level
            );
            if !seen.iter().any(|s| approx::abs_diff_eq!(*s, level, epsilon = 1e-3)) {
                seen.push(level);
            }
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn empty_library_fails_after_capture() {
        let dir = tempdir().unwrap();
        let mut recorder = ScriptedRecorder::new(vec![0.1]);
        let mut rng = StdRng::seed_from_u64(1);

        let result = Mixer::new(100, 0.5).record_and_mix(
            &mut recorder,
            &mut rng,
            dir.path(),
            &[],
            volumes(0.5, 0.5),
        );

        assert!(matches!(result, Err(SoundboardError::EmptyLibrary { .. })));
        assert_eq!(recorder.captures, 1);
    }

    #[test]
    fn clip_at_another_rate_is_not_resampled() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("owl.wav"), &AudioBuffer::mono(48000, vec![0.1; 10])).unwrap();
        let clips = list_clips(dir.path()).unwrap();
        let mut recorder = ScriptedRecorder::new(vec![0.1]);
        let mut rng = StdRng::seed_from_u64(3);

        let result = Mixer::new(44100, 0.01).record_and_mix(
            &mut recorder,
            &mut rng,
            dir.path(),
            &clips,
            volumes(0.5, 0.5),
        );

        assert!(matches!(
            result,
            Err(SoundboardError::RateMismatch {
                expected: 44100,
                found: 48000,
                ..
            })
        ));
    }

    #[test]
    fn silent_clip_file_is_rejected() {
        let dir = tempdir().unwrap();
        write_wav(&dir.path().join("empty.wav"), &AudioBuffer::mono(100, Vec::new())).unwrap();
        let clips = list_clips(dir.path()).unwrap();
        let mut recorder = ScriptedRecorder::new(vec![0.1]);
        let mut rng = StdRng::seed_from_u64(3);

        let result = Mixer::new(100, 0.1).record_and_mix(
            &mut recorder,
            &mut rng,
            dir.path(),
            &clips,
            volumes(0.5, 0.5),
        );

        assert!(matches!(result, Err(SoundboardError::EmptyClip { .. })));
    }

    #[test]
    fn sample_count_is_exact_for_long_and_fractional_durations() {
        assert_eq!(Mixer::new(44100, 5.0).samples_to_capture().unwrap(), 220_500);
        assert_eq!(Mixer::new(44100, 0.01).samples_to_capture().unwrap(), 441);
        assert_eq!(Mixer::new(48000, 3600.0).samples_to_capture().unwrap(), 172_800_000);
        assert_eq!(Mixer::new(44100, 3600.5).samples_to_capture().unwrap(), 158_782_050);
    }

    #[test]
    fn durations_below_one_sample_are_rejected_before_capture() {
        let mut recorder = ScriptedRecorder::new(vec![0.1]);
        let mut rng = StdRng::seed_from_u64(3);

        for duration in [0.0, -1.0, 0.001, f32::NAN, f32::INFINITY] {
            let result = Mixer::new(100, duration).record_and_mix(
                &mut recorder,
                &mut rng,
                Path::new("clips"),
                &[],
                volumes(0.5, 0.5),
            );
            assert!(matches!(result, Err(SoundboardError::InvalidDuration(_))));
        }
        assert_eq!(recorder.captures, 0);
    }
}
