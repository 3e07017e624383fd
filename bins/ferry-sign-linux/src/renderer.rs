//! Terminal stand-in for the LED matrix.
//!
//! Each draw is written to the log as one line so the sign can run on a
//! host without display hardware.

use ferry_core::display::UNIT_TEXT;
use ferry_core::settings::DEFAULT_COLOR;
use ferry_core::{DrawCommand, RenderError, Renderer};
use tracing::info;

/// Boat colors with a glyph bitmap on the device.
const BOAT_COLORS: &[&str] = &[
    "coral", "gray", "navy", "orange", "pink", "purple", "teal", "yellow",
];

#[derive(Debug)]
pub struct TerminalRenderer {
    color: String,
    frames: usize,
}

impl Default for TerminalRenderer {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            frames: 0,
        }
    }
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    fn draw(&mut self, kind: &str, command: &DrawCommand) {
        self.frames += 1;
        info!("[{}] {}", kind, describe(command, &self.color));
    }
}

impl Renderer for TerminalRenderer {
    fn relayout(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        self.draw("layout", command);
        Ok(())
    }

    fn refresh(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        self.draw("refresh", command);
        Ok(())
    }

    fn set_boat_color(&mut self, color: &str) -> Result<(), RenderError> {
        if !BOAT_COLORS.contains(&color) {
            return Err(RenderError::Glyph(format!("no boat bitmap for '{}'", color)));
        }
        self.color = color.to_string();
        Ok(())
    }
}

/// One-line summary of a frame.
pub fn describe(command: &DrawCommand, color: &str) -> String {
    match command {
        DrawCommand::Idle { glyph } => {
            format!("{} boat at ({}, {})", color, glyph.x, glyph.y)
        }
        DrawCommand::Countdown { text, glyph, .. } => format!(
            "{} {} | {} boat at ({}, {})",
            text, UNIT_TEXT, color, glyph.x, glyph.y
        ),
        DrawCommand::Error { text, .. } => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::{DisplayController, Geometry, Point};

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&DrawCommand::Idle { glyph: Point { x: 22, y: 10 } }, "teal"),
            "teal boat at (22, 10)"
        );
        assert_eq!(
            describe(
                &DrawCommand::Error { text: "ERR", number: Point { x: 2, y: 24 } },
                "teal"
            ),
            "ERR"
        );
    }

    #[test]
    fn test_countdown_frame() {
        let mut display = DisplayController::new(TerminalRenderer::new(), Geometry::default());
        display.set_boat_color("orange").unwrap();
        display.update(Some(12)).unwrap();
        display.update(Some(11)).unwrap();

        assert_eq!(display.renderer().frames(), 2);
        let command = display.command_for(ferry_core::DisplayMode::Countdown(11));
        let line = describe(&command, display.renderer().color());
        assert!(line.starts_with("11 min | orange boat"));
    }

    #[test]
    fn test_unknown_color_keeps_previous() {
        let mut renderer = TerminalRenderer::new();
        assert!(matches!(
            renderer.set_boat_color("plaid"),
            Err(RenderError::Glyph(_))
        ));
        assert_eq!(renderer.color(), "teal");
    }
}
