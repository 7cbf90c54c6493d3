//! Capability interfaces consumed by the perception workers and the input
//! engine. The real implementations live in the platform layer; tests plug
//! in scripted fakes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise inclusive match: `|channel - target| <= tolerance`.
    pub fn matches(self, target: Rgb, tolerance: u8) -> bool {
        self.r.abs_diff(target.r) <= tolerance
            && self.g.abs_diff(target.g) <= tolerance
            && self.b.abs_diff(target.b) <= tolerance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub title: String,
    pub rect: Rect,
    /// Window covers the screen edge-to-edge with no caption or sizing
    /// border. Computed by the platform layer.
    pub fullscreen: bool,
}

/// Reads one screen pixel. `None` means "no observation this tick" and is
/// never an error.
pub trait PixelSampler: Send + Sync {
    fn sample(&self, x: i32, y: i32) -> Option<Rgb>;
}

/// Introspects the current foreground window.
pub trait WindowProbe: Send + Sync {
    fn foreground(&self) -> Option<WindowInfo>;
}

/// Injects physical input. Used only from the main-thread scheduler; presses
/// are expected to take effect immediately, failures are logged inside the
/// implementation and swallowed (the macro layer cannot do anything better).
pub trait InputBackend {
    fn press(&self, key: &str);
    fn release(&self, key: &str);
    fn tap(&self, key: &str) {
        self.press(key);
        self.release(key);
    }
    /// Left mouse button click.
    fn click(&self);
    /// Release every key this backend is currently holding down. Called when
    /// the session drops so nothing stays physically pressed.
    fn release_all(&self);
}
