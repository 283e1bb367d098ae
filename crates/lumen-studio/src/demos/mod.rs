//! Demo programs selectable from the command line.

pub mod composite;
pub mod fractal;
pub mod triangle;

use clap::ValueEnum;
use lumen_engine::input::{InputEvent, Key, KeyState};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum DemoKind {
    /// Vertex-colored triangle rotating on the full-resolution surface.
    Triangle,
    /// The triangle scene on a pixel-scaled backing surface.
    Composite,
    /// Pan/zoom Mandelbrot explorer.
    Fractal,
}

pub(crate) fn escape_pressed(event: &InputEvent) -> bool {
    matches!(
        event,
        InputEvent::Key {
            key: Key::Escape,
            state: KeyState::Pressed,
            ..
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_escape_press_exits() {
        let press = |key, state| InputEvent::Key {
            key,
            state,
            repeat: false,
        };

        assert!(escape_pressed(&press(Key::Escape, KeyState::Pressed)));
        assert!(!escape_pressed(&press(Key::Escape, KeyState::Released)));
        assert!(!escape_pressed(&press(Key::Space, KeyState::Pressed)));
        assert!(!escape_pressed(&InputEvent::PointerLeft));
    }
}
