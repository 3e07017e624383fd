//! Display mode controller.
//!
//! Decides what the 64×32 matrix shows for the latest poll result and where
//! the boat glyph sits. Drawing itself is delegated to a [`Renderer`].
//!
//! Three modes:
//! - `Idle` - the boat glyph alone, centered.
//! - `Countdown(m)` - minutes readout, unit label, and the boat sliding from
//!   a far anchor (30+ minutes) to a near anchor (1 minute).
//! - `Error` - a fixed "ERR" readout with the unit label removed.
//!
//! Entering a different mode asks the renderer to re-layout; staying in the
//! same mode only refreshes text and position.

use std::mem;

use thiserror::Error;
use tracing::debug;

/// Minutes at or above which the boat sits at the far anchor.
pub const MAX_COUNTDOWN_MINUTES: i64 = 30;

/// Minutes at or below which the boat sits at the near anchor.
pub const MIN_COUNTDOWN_MINUTES: i64 = 1;

/// Readout shown in error mode.
pub const ERROR_TEXT: &str = "ERR";

/// Unit label shown next to the minutes readout.
pub const UNIT_TEXT: &str = "min";

/// Errors reported by a renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The display device rejected the update.
    #[error("Display device error: {0}")]
    Device(String),

    /// A glyph bitmap could not be loaded.
    #[error("Glyph unavailable: {0}")]
    Glyph(String),
}

/// What the sign should be showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Idle,
    Countdown(u32),
    Error,
}

impl DisplayMode {
    /// Mode for a minutes-remaining value.
    pub fn from_minutes(minutes: Option<i64>) -> Self {
        match minutes {
            Some(m) if m > 0 => DisplayMode::Countdown(u32::try_from(m).unwrap_or(u32::MAX)),
            _ => DisplayMode::Idle,
        }
    }

    fn same_kind(&self, other: &DisplayMode) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

/// A pixel position on the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Matrix and glyph dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
    pub glyph_width: i32,
    pub glyph_height: i32,
    /// Gap kept between the boat and the frame edge in countdown mode.
    pub margin: i32,
    /// Boat row in countdown mode.
    pub countdown_glyph_y: i32,
    /// Width of one character of the readout font, unscaled.
    pub char_width: i32,
    /// Scale applied to the minutes readout.
    pub number_scale: i32,
    /// Readout baseline position.
    pub number_origin: Point,
    /// Unit label row.
    pub unit_y: i32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            width: 64,
            height: 32,
            glyph_width: 20,
            glyph_height: 12,
            margin: 2,
            countdown_glyph_y: 2,
            char_width: 6,
            number_scale: 2,
            number_origin: Point { x: 2, y: 24 },
            unit_y: 26,
        }
    }
}

impl Geometry {
    /// Boat position when idle: centered in the frame.
    pub fn idle_glyph(&self) -> Point {
        Point {
            x: (self.width - self.glyph_width) / 2,
            y: (self.height - self.glyph_height) / 2,
        }
    }

    /// Boat position for a countdown of `minutes`.
    ///
    /// Minutes are clamped to `[1, 30]`, then mapped linearly from the far
    /// anchor (left) to the near anchor (right).
    pub fn countdown_glyph(&self, minutes: i64) -> Point {
        let clamped = minutes.clamp(MIN_COUNTDOWN_MINUTES, MAX_COUNTDOWN_MINUTES);
        let far = i64::from(self.margin);
        let near = i64::from(self.width - self.glyph_width - self.margin);
        let span = MAX_COUNTDOWN_MINUTES - MIN_COUNTDOWN_MINUTES;
        let x = far + (near - far) * (MAX_COUNTDOWN_MINUTES - clamped) / span;
        Point {
            x: x as i32,
            y: self.countdown_glyph_y,
        }
    }

    /// Unit label position, just right of the scaled readout.
    pub fn unit_label(&self, text: &str) -> Point {
        let text_width = self.char_width * text.chars().count() as i32;
        Point {
            x: self.number_origin.x + text_width * self.number_scale,
            y: self.unit_y,
        }
    }
}

/// Everything the renderer needs to draw one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Boat glyph only.
    Idle { glyph: Point },
    /// Readout, unit label and boat glyph.
    Countdown {
        minutes: u32,
        text: String,
        number: Point,
        unit: Point,
        glyph: Point,
    },
    /// Error readout, no unit label.
    Error { text: &'static str, number: Point },
}

/// Draws on the physical (or simulated) matrix.
pub trait Renderer {
    /// Rebuild the scene for a new mode (add/remove glyph and labels).
    fn relayout(&mut self, command: &DrawCommand) -> Result<(), RenderError>;

    /// Update text and positions within the current mode.
    fn refresh(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        self.relayout(command)
    }

    /// Switch the boat glyph to the given route color.
    fn set_boat_color(&mut self, color: &str) -> Result<(), RenderError> {
        Ok(())
    }
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn relayout(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        (**self).relayout(command)
    }

    fn refresh(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        (**self).refresh(command)
    }

    fn set_boat_color(&mut self, color: &str) -> Result<(), RenderError> {
        (**self).set_boat_color(color)
    }
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn relayout(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        (**self).relayout(command)
    }

    fn refresh(&mut self, command: &DrawCommand) -> Result<(), RenderError> {
        (**self).refresh(command)
    }

    fn set_boat_color(&mut self, color: &str) -> Result<(), RenderError> {
        (**self).set_boat_color(color)
    }
}

/// Tracks the current mode and drives a renderer.
#[derive(Debug)]
pub struct DisplayController<R> {
    renderer: R,
    geometry: Geometry,
    current: Option<DisplayMode>,
}

impl<R: Renderer> DisplayController<R> {
    pub fn new(renderer: R, geometry: Geometry) -> Self {
        Self {
            renderer,
            geometry,
            current: None,
        }
    }

    /// Mode last shown, if anything has been drawn.
    pub fn mode(&self) -> Option<DisplayMode> {
        self.current
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Show the result of a poll.
    pub fn update(&mut self, minutes: Option<i64>) -> Result<DisplayMode, RenderError> {
        let mode = DisplayMode::from_minutes(minutes);
        self.show(mode)?;
        Ok(mode)
    }

    /// Show the idle boat.
    pub fn show_idle(&mut self) -> Result<(), RenderError> {
        self.show(DisplayMode::Idle)
    }

    /// Show the error readout.
    pub fn show_error(&mut self) -> Result<(), RenderError> {
        self.show(DisplayMode::Error)
    }

    /// Use the boat glyph for a route color. Takes effect on the next draw.
    pub fn set_boat_color(&mut self, color: &str) -> Result<(), RenderError> {
        self.renderer.set_boat_color(color)
    }

    /// Draw command for a mode under this controller's geometry.
    pub fn command_for(&self, mode: DisplayMode) -> DrawCommand {
        match mode {
            DisplayMode::Idle => DrawCommand::Idle {
                glyph: self.geometry.idle_glyph(),
            },
            DisplayMode::Countdown(minutes) => {
                let text = minutes.to_string();
                DrawCommand::Countdown {
                    minutes,
                    number: self.geometry.number_origin,
                    unit: self.geometry.unit_label(&text),
                    glyph: self.geometry.countdown_glyph(i64::from(minutes)),
                    text,
                }
            }
            DisplayMode::Error => DrawCommand::Error {
                text: ERROR_TEXT,
                number: self.geometry.number_origin,
            },
        }
    }

    fn show(&mut self, mode: DisplayMode) -> Result<(), RenderError> {
        let command = self.command_for(mode);
        let relayout = !matches!(self.current, Some(current) if current.same_kind(&mode));

        if relayout {
            debug!("Display mode {:?} -> {:?}", self.current, mode);
            self.renderer.relayout(&command)?;
        } else {
            self.renderer.refresh(&command)?;
        }
        self.current = Some(mode);
        Ok(())
    }
}
