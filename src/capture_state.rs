// src/capture_state.rs
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

/// Capture status shared between the engine thread, the input callback and the UI.
#[derive(Clone, Default)]
pub struct SharedCaptureState {
    is_recording: Arc<AtomicBool>,
    captured_samples: Arc<AtomicUsize>,
    target_samples: Arc<AtomicUsize>,
    input_peak: Arc<AtomicU32>,
}

impl SharedCaptureState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, target_samples: usize) {
        self.captured_samples.store(0, Ordering::Relaxed);
        self.target_samples.store(target_samples, Ordering::Relaxed);
        self.is_recording.store(true, Ordering::Relaxed);
    }

    pub fn finish(&self) {
        self.is_recording.store(false, Ordering::Relaxed);
        self.input_peak.store(0, Ordering::Relaxed);
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::Relaxed)
    }

    pub fn set_captured(&self, samples: usize) {
        self.captured_samples.store(samples, Ordering::Relaxed);
    }

    /// Fraction of the current capture already recorded, 0.0 when idle.
    pub fn progress(&self) -> f32 {
        let target = self.target_samples.load(Ordering::Relaxed);
        if target == 0 || !self.is_recording() {
            return 0.0;
        }
        let captured = self.captured_samples.load(Ordering::Relaxed);
        (captured as f32 / target as f32).clamp(0.0, 1.0)
    }

    pub fn set_peak(&self, peak: f32) {
        let scaled = (peak.clamp(0.0, 1.0) * u32::MAX as f32) as u32;
        self.input_peak.fetch_max(scaled, Ordering::Relaxed);
    }

    /// Reads and resets the peak seen since the last call.
    pub fn take_peak(&self) -> f32 {
        self.input_peak.swap(0, Ordering::Relaxed) as f32 / u32::MAX as f32
    }
}
