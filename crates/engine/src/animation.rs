use crate::geometry::Vec2;

/// Playable sprite sequence handed out by the asset lookup service.
///
/// The handle carries only the timing and frame geometry the simulation needs;
/// textures stay with the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    name: String,
    frame_count: u32,
    speed: u32,
    size: Vec2,
    elapsed_ticks: u64,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            name: "none".to_string(),
            frame_count: 1,
            speed: 0,
            size: Vec2::ZERO,
            elapsed_ticks: 0,
        }
    }
}

impl Animation {
    /// `speed` is the number of ticks each frame stays on screen; 0 means static.
    pub fn new(name: impl Into<String>, frame_count: u32, speed: u32, size: Vec2) -> Self {
        Self {
            name: name.into(),
            frame_count: frame_count.max(1),
            speed,
            size,
            elapsed_ticks: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn update(&mut self) {
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
    }

    pub fn frame_index(&self) -> u32 {
        if self.speed == 0 {
            return 0;
        }
        ((self.elapsed_ticks / self.speed as u64) % self.frame_count as u64) as u32
    }

    pub fn has_ended(&self) -> bool {
        if self.speed == 0 {
            return false;
        }
        self.elapsed_ticks >= self.frame_count as u64 * self.speed as u64
    }
}
