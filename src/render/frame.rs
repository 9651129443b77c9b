use std::time::{Duration, Instant};

pub const DEFAULT_FPS_INTERVAL: Duration = Duration::from_millis(250);

/// Frames-per-second sampler. Produces a reading once per `interval`.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    interval: Duration,
    last_sample: Instant,
    frames: u32,
    current: Option<f64>,
}

impl FpsCounter {
    pub fn new(now: Instant) -> Self {
        Self::with_interval(now, DEFAULT_FPS_INTERVAL)
    }

    pub fn with_interval(now: Instant, interval: Duration) -> Self {
        Self {
            interval,
            last_sample: now,
            frames: 0,
            current: None,
        }
    }

    /// Counts one frame. Returns a fresh fps value when the interval elapsed.
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.last_sample);
        if elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.last_sample = now;
        self.frames = 0;
        self.current = Some(fps);
        Some(fps)
    }

    pub fn current(&self) -> Option<f64> {
        self.current
    }
}

/// Per-window render state.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    pub frame_count: u64,
    pub fps: FpsCounter,
}

impl RenderContext {
    pub fn new(width: u32, height: u32, fullscreen: bool, now: Instant) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            fullscreen,
            frame_count: 0,
            fps: FpsCounter::new(now),
        }
    }

    /// Applies a framebuffer resize. Zero-sized (minimized) resizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width == self.width && height == self.height) {
            return false;
        }
        self.width = width;
        self.height = height;
        true
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        self.fullscreen = !self.fullscreen;
        self.fullscreen
    }

    /// Advances the frame counter; returns a new fps sample when one is due.
    pub fn end_frame(&mut self, now: Instant) -> Option<f64> {
        self.frame_count += 1;
        self.fps.tick(now)
    }

    pub fn title(&self, base: &str) -> String {
        match self.fps.current() {
            Some(fps) => format!("{} @ fps: {:.2}", base, fps),
            None => base.to_string(),
        }
    }
}
