//! Windows implementations of the capability interfaces: GDI pixel reads,
//! Win32 foreground-window probing, and rdev-based input injection plus the
//! global input hook.

use crate::capability::{InputBackend, PixelSampler, Rect, Rgb, WindowInfo, WindowProbe};
use crate::listener::{Edge, EventRoute, InputEvent};
use rdev::{simulate, Button, EventType, Key};
use std::cell::RefCell;
use std::collections::HashSet;
use std::thread;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Gdi::{GetDC, GetPixel, ReleaseDC, CLR_INVALID};
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetSystemMetrics, GetWindowLongW, GetWindowRect, GetWindowTextW,
    GWL_STYLE, SM_CXSCREEN, SM_CYSCREEN, WS_CAPTION, WS_THICKFRAME,
};

/// Desktop pixel reads through `GetPixel` on the screen DC.
pub struct GdiPixelSampler;

impl PixelSampler for GdiPixelSampler {
    fn sample(&self, x: i32, y: i32) -> Option<Rgb> {
        unsafe {
            let dc = GetDC(None);
            if dc.is_invalid() {
                return None;
            }
            let color = GetPixel(dc, x, y);
            ReleaseDC(None, dc);
            if color == CLR_INVALID {
                return None;
            }
            // COLORREF is 0x00BBGGRR.
            let raw = color.0;
            Some(Rgb::new(
                (raw & 0xff) as u8,
                ((raw >> 8) & 0xff) as u8,
                ((raw >> 16) & 0xff) as u8,
            ))
        }
    }
}

/// Foreground window title, rect and borderless-fullscreen check.
pub struct Win32WindowProbe;

impl WindowProbe for Win32WindowProbe {
    fn foreground(&self) -> Option<WindowInfo> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_invalid() {
                return None;
            }
            let mut title_buf = [0u16; 256];
            let len = GetWindowTextW(hwnd, &mut title_buf) as usize;
            let title = String::from_utf16_lossy(&title_buf[..len.min(title_buf.len())]);

            let mut raw = windows::Win32::Foundation::RECT::default();
            if GetWindowRect(hwnd, &mut raw).is_err() {
                return None;
            }
            let rect = Rect {
                left: raw.left,
                top: raw.top,
                right: raw.right,
                bottom: raw.bottom,
            };
            Some(WindowInfo {
                title,
                rect,
                fullscreen: is_fullscreen(hwnd, rect),
            })
        }
    }
}

fn is_fullscreen(hwnd: HWND, rect: Rect) -> bool {
    unsafe {
        let screen_w = GetSystemMetrics(SM_CXSCREEN);
        let screen_h = GetSystemMetrics(SM_CYSCREEN);
        let covers_screen = rect.left == 0
            && rect.top == 0
            && rect.right - rect.left == screen_w
            && rect.bottom - rect.top == screen_h;

        let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;
        let has_border = style & (WS_CAPTION.0 | WS_THICKFRAME.0) != 0;

        covers_screen && !has_border
    }
}

fn key_for(source: &str) -> Option<Key> {
    match source {
        "esc" => Some(Key::Escape),
        "enter" => Some(Key::Return),
        "space" => Some(Key::Space),
        "ctrl" => Some(Key::ControlLeft),
        "shift" => Some(Key::ShiftLeft),
        "e" => Some(Key::KeyE),
        "r" => Some(Key::KeyR),
        "q" => Some(Key::KeyQ),
        "f1" => Some(Key::F1),
        "f4" => Some(Key::F4),
        "f5" => Some(Key::F5),
        _ => None,
    }
}

fn source_for_key(key: Key) -> Option<&'static str> {
    match key {
        Key::F1 => Some("f1"),
        Key::F4 => Some("f4"),
        Key::F5 => Some("f5"),
        Key::KeyQ => Some("q"),
        Key::KeyE => Some("e"),
        Key::Space => Some("space"),
        Key::Escape => Some("esc"),
        Key::Return => Some("enter"),
        Key::ControlLeft | Key::ControlRight => Some("ctrl"),
        Key::ShiftLeft | Key::ShiftRight => Some("shift"),
        _ => None,
    }
}

fn source_for_button(button: Button) -> Option<&'static str> {
    match button {
        Button::Left => Some("left"),
        Button::Right => Some("right"),
        Button::Middle => Some("middle"),
        // XButton1/XButton2 arrive as raw codes.
        Button::Unknown(1) => Some("x1"),
        Button::Unknown(2) => Some("x2"),
        Button::Unknown(_) => None,
    }
}

/// rdev-backed key/button injection. Keeps a ledger of synthetically held
/// keys so `release_all` can clean up when the session drops mid-macro.
#[derive(Default)]
pub struct RdevInputBackend {
    held: RefCell<HashSet<String>>,
}

impl RdevInputBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn send(event: EventType) {
        if let Err(err) = simulate(&event) {
            tracing::warn!("input injection failed for {event:?}: {err:?}");
        }
    }
}

impl InputBackend for RdevInputBackend {
    fn press(&self, key: &str) {
        let Some(mapped) = key_for(key) else {
            tracing::warn!("cannot press unmapped key '{key}'");
            return;
        };
        Self::send(EventType::KeyPress(mapped));
        self.held.borrow_mut().insert(key.into());
    }

    fn release(&self, key: &str) {
        let Some(mapped) = key_for(key) else {
            tracing::warn!("cannot release unmapped key '{key}'");
            return;
        };
        Self::send(EventType::KeyRelease(mapped));
        self.held.borrow_mut().remove(key);
    }

    fn click(&self) {
        Self::send(EventType::ButtonPress(Button::Left));
        Self::send(EventType::ButtonRelease(Button::Left));
    }

    fn release_all(&self) {
        let held: Vec<String> = self.held.borrow_mut().drain().collect();
        for key in held {
            if let Some(mapped) = key_for(&key) {
                Self::send(EventType::KeyRelease(mapped));
            }
        }
    }
}

/// Install the global input hook on its own thread and forward mapped edges
/// into the scheduler through `route`. The hook lives for the whole process;
/// pausing happens at the gate, not here.
pub fn spawn_event_listener(route: EventRoute) {
    thread::spawn(move || {
        let result = rdev::listen(move |event| {
            let mapped = match event.event_type {
                EventType::KeyPress(key) => source_for_key(key).map(|s| InputEvent::down(s)),
                EventType::KeyRelease(key) => source_for_key(key).map(|s| InputEvent::up(s)),
                EventType::ButtonPress(button) => {
                    source_for_button(button).map(|s| InputEvent::down(s))
                }
                EventType::ButtonRelease(button) => {
                    source_for_button(button).map(|s| InputEvent::up(s))
                }
                _ => None,
            };
            if let Some(event) = mapped {
                route.feed(event);
            }
        });
        if let Err(err) = result {
            tracing::error!("input hook failed: {err:?}");
        }
    });
}
