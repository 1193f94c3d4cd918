//! Signature capture surface.
//!
//! Turns a stream of pointer or touch events into strokes on a fixed-size
//! raster, and exports the result as a PNG data URL with the signing date
//! stamped in the bottom-right corner.
//!
//! Input is interpreted by a two-state pen (`Idle` → `Drawing` → `Idle`). Both
//! input sources go through the same [`SurfaceRect::to_local`] transform, so the
//! host only has to forward events as they arrive.
//!
//! ```
//! use checkin::signature::{InputEvent, Phase, SignaturePad, StrokeStyle, SurfaceRect};
//!
//! let rect = SurfaceRect::new(10.0, 20.0, 200, 100);
//! let mut pad = SignaturePad::mount(rect, StrokeStyle::default())?;
//! pad.handle(&InputEvent::pointer(Phase::Start, 30.0, 40.0));
//! pad.handle(&InputEvent::pointer(Phase::Move, 80.0, 60.0));
//! pad.handle(&InputEvent::pointer(Phase::End, 80.0, 60.0));
//! assert!(pad.can_save());
//! # Ok::<(), checkin::Error>(())
//! ```

mod font;
mod raster;

use chrono::{DateTime, Locale, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::registration::SignatureImage;

pub use raster::{Raster, Rgba, MAX_DIMENSION};

/// Placeholder shown on an untouched surface.
pub const PLACEHOLDER: &str = "Firme aquí";

/// Distance of the date stamp from the right and bottom edges, in pixels.
const STAMP_MARGIN: u32 = 10;

/// Glyph scale for the date stamp (7-row glyphs, 14 px tall).
const STAMP_SCALE: u32 = 2;

/// A position in client (screen) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientPoint {
    /// Horizontal client coordinate.
    pub x: f64,
    /// Vertical client coordinate.
    pub y: f64,
}

/// A position in surface-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Pixels from the left edge of the surface.
    pub x: f64,
    /// Pixels from the top edge of the surface.
    pub y: f64,
}

/// On-screen placement and size of the surface, captured once at mount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceRect {
    /// Client x of the surface's left edge.
    pub left: f64,
    /// Client y of the surface's top edge.
    pub top: f64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceRect {
    /// Describe a surface at `(left, top)` with the given size.
    #[must_use]
    pub fn new(left: f64, top: f64, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A surface anchored at the client origin.
    #[must_use]
    pub fn at_origin(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Translate a client position into surface coordinates.
    #[must_use]
    pub fn to_local(&self, client: ClientPoint) -> Point {
        Point {
            x: client.x - self.left,
            y: client.y - self.top,
        }
    }
}

/// Where an input event falls within a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Button pressed or finger down.
    Start,
    /// Pointer or finger moved.
    Move,
    /// Button released or finger lifted.
    End,
    /// Pointer left the surface.
    Leave,
}

/// A single input event forwarded by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum InputEvent {
    /// Mouse or pen input.
    Pointer {
        /// Stroke phase.
        phase: Phase,
        /// Client x.
        x: f64,
        /// Client y.
        y: f64,
    },
    /// Touch input; only the first active touch is interpreted.
    Touch {
        /// Stroke phase.
        phase: Phase,
        /// Active touches in client coordinates.
        #[serde(default)]
        touches: Vec<ClientPoint>,
    },
}

impl InputEvent {
    /// Build a pointer event.
    #[must_use]
    pub fn pointer(phase: Phase, x: f64, y: f64) -> Self {
        Self::Pointer { phase, x, y }
    }

    /// Build a single-finger touch event.
    #[must_use]
    pub fn touch(phase: Phase, x: f64, y: f64) -> Self {
        Self::Touch {
            phase,
            touches: vec![ClientPoint { x, y }],
        }
    }

    /// Build a touch event with no active touches (e.g. touch end).
    #[must_use]
    pub fn touch_released() -> Self {
        Self::Touch {
            phase: Phase::End,
            touches: Vec::new(),
        }
    }

    /// The stroke phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Pointer { phase, .. } | Self::Touch { phase, .. } => *phase,
        }
    }

    /// The client position this event refers to, if any.
    #[must_use]
    pub fn client_point(&self) -> Option<ClientPoint> {
        match self {
            Self::Pointer { x, y, .. } => Some(ClientPoint { x: *x, y: *y }),
            Self::Touch { touches, .. } => touches.first().copied(),
        }
    }

    fn is_touch(&self) -> bool {
        matches!(self, Self::Touch { .. })
    }
}

/// What the host should do after dispatching an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventResponse {
    /// Suppress the platform's default scroll/pan handling.
    pub prevent_default: bool,
}

/// Pen state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PenState {
    /// No stroke in progress.
    Idle,
    /// A stroke is in progress; `last` is the current path end.
    Drawing {
        /// Last point of the current path.
        last: Point,
    },
}

/// Colours and widths used on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    /// Stroke colour.
    pub color: Rgba,
    /// Stroke width in pixels.
    pub line_width: f64,
    /// Date stamp colour.
    pub stamp_color: Rgba,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: Rgba::SLATE_100,
            line_width: 2.0,
            stamp_color: Rgba::SLATE_400,
        }
    }
}

/// A freehand signature surface.
#[derive(Debug, Clone)]
pub struct SignaturePad {
    rect: SurfaceRect,
    style: StrokeStyle,
    raster: Raster,
    pen: PenState,
    has_drawn: bool,
}

impl SignaturePad {
    /// Mount a blank surface; its size is fixed from here on.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SurfaceSize`] if the surface cannot be allocated.
    pub fn mount(rect: SurfaceRect, style: StrokeStyle) -> Result<Self> {
        let raster = Raster::new(rect.width, rect.height)?;
        debug!(width = rect.width, height = rect.height, "signature surface mounted");
        Ok(Self {
            rect,
            style,
            raster,
            pen: PenState::Idle,
            has_drawn: false,
        })
    }

    /// Dispatch one host event.
    pub fn handle(&mut self, event: &InputEvent) -> EventResponse {
        match event.phase() {
            Phase::Start => {
                if let Some(client) = event.client_point() {
                    self.begin_stroke(self.rect.to_local(client));
                }
                EventResponse::default()
            }
            Phase::Move => {
                if !self.is_drawing() {
                    return EventResponse::default();
                }
                if let Some(client) = event.client_point() {
                    self.extend_stroke(self.rect.to_local(client));
                }
                EventResponse {
                    prevent_default: event.is_touch(),
                }
            }
            Phase::End | Phase::Leave => {
                self.end_stroke();
                EventResponse::default()
            }
        }
    }

    /// Start a new path at `at`.
    pub fn begin_stroke(&mut self, at: Point) {
        trace!(x = at.x, y = at.y, "stroke start");
        self.pen = PenState::Drawing { last: at };
        self.has_drawn = true;
    }

    /// Extend the current path to `to`, rendering the new segment.
    pub fn extend_stroke(&mut self, to: Point) {
        if let PenState::Drawing { last } = self.pen {
            self.raster
                .stroke_segment(last, to, self.style.line_width, self.style.color);
            self.pen = PenState::Drawing { last: to };
        }
    }

    /// Close the current path.
    pub fn end_stroke(&mut self) {
        self.pen = PenState::Idle;
    }

    /// Erase the surface.
    pub fn clear(&mut self) {
        self.raster.clear();
        self.pen = PenState::Idle;
        self.has_drawn = false;
    }

    /// Whether a stroke is in progress.
    #[must_use]
    pub fn is_drawing(&self) -> bool {
        matches!(self.pen, PenState::Drawing { .. })
    }

    /// Whether anything has been drawn since mount or the last clear.
    #[must_use]
    pub fn has_drawn(&self) -> bool {
        self.has_drawn
    }

    /// Whether the save action is enabled.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.has_drawn
    }

    /// Current pen state.
    #[must_use]
    pub fn pen(&self) -> PenState {
        self.pen
    }

    /// Surface placement.
    #[must_use]
    pub fn rect(&self) -> SurfaceRect {
        self.rect
    }

    /// The underlying raster.
    #[must_use]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Placeholder text to overlay, shown until something is drawn.
    #[must_use]
    pub fn placeholder(&self) -> Option<&'static str> {
        (!self.has_drawn).then_some(PLACEHOLDER)
    }

    /// Stamp the date and export the surface.
    ///
    /// Returns `Ok(None)` when nothing has been drawn (the save action is
    /// disabled in that state).
    ///
    /// # Errors
    ///
    /// Returns an error if PNG encoding fails.
    pub fn save<Tz>(&mut self, signed_at: &DateTime<Tz>) -> Result<Option<SignatureImage>>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if !self.can_save() {
            return Ok(None);
        }
        let stamp = stamp_date(signed_at);
        self.raster.draw_text_right(
            &stamp,
            self.rect.width.saturating_sub(STAMP_MARGIN),
            self.rect.height.saturating_sub(STAMP_MARGIN),
            STAMP_SCALE,
            self.style.stamp_color,
        );
        let data_url = self.raster.to_data_url()?;
        debug!(bytes = data_url.len(), stamp = %stamp, "signature exported");
        Ok(Some(SignatureImage::from_data_url(data_url)))
    }
}

/// Long-form Spanish date used for the stamp, e.g. `16 de octubre de 2026`.
#[must_use]
pub fn stamp_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format_localized("%-d de %B de %Y", Locale::es_ES)
        .to_string()
}
