//! Page payloads shipped with the crate.
//!
//! [`InkDrawing`] is a minimal stroke model used by the CLI and the tests. Hosts with a
//! real drawing surface either implement [`PagePayload`] for their own type or wrap its
//! serialized form in [`RawPage`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::warn;

use crate::error::{MathNotesError, Result};
use crate::model::PagePayload;

pub const DEFAULT_STROKE_COLOR: &str = "black";
pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// JSON has no NaN or infinity, so only finite points can be stored.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: String,
    pub width: f32,
    pub points: Vec<Point>,
}

impl Stroke {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            color: DEFAULT_STROKE_COLOR.to_string(),
            width: DEFAULT_STROKE_WIDTH,
            points,
        }
    }

    /// Like [`Stroke::new`], but rejects points that could not be stored.
    pub fn try_new(points: Vec<Point>) -> Result<Self> {
        let stroke = Self::new(points);
        stroke.validate()?;
        Ok(stroke)
    }

    /// Every coordinate finite, width finite and not negative.
    pub fn validate(&self) -> Result<()> {
        if !self.width.is_finite() || self.width < 0.0 {
            return Err(MathNotesError::Api(format!(
                "Stroke width must be a finite, non-negative number, got {}",
                self.width
            )));
        }
        if let Some(point) = self.points.iter().find(|p| !p.is_finite()) {
            return Err(MathNotesError::Api(format!(
                "Stroke points must be finite, got ({}, {})",
                point.x, point.y
            )));
        }
        Ok(())
    }

    fn is_encodable(&self) -> bool {
        self.width.is_finite() && self.points.iter().all(Point::is_finite)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InkDrawing {
    #[serde(default)]
    pub strokes: Vec<Stroke>,
}

impl InkDrawing {
    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.strokes.push(stroke);
        self
    }

    /// Append `stroke` after checking it can be stored.
    pub fn try_with_stroke(self, stroke: Stroke) -> Result<Self> {
        stroke.validate()?;
        Ok(self.with_stroke(stroke))
    }

    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// The drawing as it can be written: non-finite points dropped, non-finite widths
    /// reset to the default. Borrowed when nothing needs fixing.
    fn encodable(&self) -> Cow<'_, Self> {
        if self.strokes.iter().all(Stroke::is_encodable) {
            return Cow::Borrowed(self);
        }
        warn!("dropping non-finite stroke data before saving");
        let strokes = self
            .strokes
            .iter()
            .map(|s| Stroke {
                color: s.color.clone(),
                width: if s.width.is_finite() {
                    s.width
                } else {
                    DEFAULT_STROKE_WIDTH
                },
                points: s.points.iter().copied().filter(Point::is_finite).collect(),
            })
            .collect();
        Cow::Owned(Self { strokes })
    }
}

impl PagePayload for InkDrawing {
    fn is_blank(&self) -> bool {
        self.strokes.iter().all(|s| s.points.is_empty())
    }

    fn to_bytes(&self) -> Vec<u8> {
        // Strings and finite floats always serialize
        let drawing = self.encodable();
        serde_json::to_vec(&*drawing).unwrap_or_default()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| MathNotesError::Corrupt(format!("invalid drawing: {}", e)))
    }
}

/// Uninterpreted bytes from an external drawing surface. Empty means blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage(pub Vec<u8>);

impl PagePayload for RawPage {
    fn is_blank(&self) -> bool {
        self.0.is_empty()
    }

    fn to_bytes(&self) -> Vec<u8> {
        self.0.clone()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Stroke {
        Stroke::new(vec![Point { x: 0.0, y: 0.0 }, Point { x: 10.0, y: 5.0 }])
    }

    #[test]
    fn test_default_drawing_is_blank() {
        assert!(InkDrawing::default().is_blank());
    }

    #[test]
    fn test_stroke_without_points_is_still_blank() {
        let drawing = InkDrawing::default().with_stroke(Stroke::new(vec![]));
        assert!(drawing.is_blank());
    }

    #[test]
    fn test_drawing_with_points_is_not_blank() {
        assert!(!InkDrawing::default().with_stroke(line()).is_blank());
    }

    #[test]
    fn test_drawing_bytes_decode_back() {
        let drawing = InkDrawing::default().with_stroke(line());
        let decoded = InkDrawing::from_bytes(&drawing.to_bytes()).unwrap();
        assert_eq!(decoded, drawing);
    }

    #[test]
    fn test_garbage_bytes_are_corrupt() {
        let err = InkDrawing::from_bytes(b"\x00\x01not json").unwrap_err();
        assert!(matches!(err, MathNotesError::Corrupt(_)));
    }

    #[test]
    fn test_non_finite_points_are_rejected() {
        let err = Stroke::try_new(vec![Point { x: f32::NAN, y: 0.0 }]).unwrap_err();
        assert!(matches!(err, MathNotesError::Api(_)));

        let mut wide = line();
        wide.width = f32::INFINITY;
        assert!(InkDrawing::default().try_with_stroke(wide).is_err());

        let mut negative = line();
        negative.width = -1.0;
        assert!(negative.validate().is_err());

        assert!(InkDrawing::default().try_with_stroke(line()).is_ok());
    }

    #[test]
    fn test_non_finite_data_still_decodes() {
        let mut stroke = Stroke::new(vec![
            Point { x: 1.0, y: 2.0 },
            Point { x: f32::NAN, y: 0.0 },
            Point { x: 3.0, y: f32::NEG_INFINITY },
        ]);
        stroke.width = f32::NAN;
        let drawing = InkDrawing::default().with_stroke(stroke);

        let decoded = InkDrawing::from_bytes(&drawing.to_bytes()).unwrap();
        assert_eq!(decoded.strokes[0].points, vec![Point { x: 1.0, y: 2.0 }]);
        assert_eq!(decoded.strokes[0].width, DEFAULT_STROKE_WIDTH);
    }

    #[test]
    fn test_raw_page_blankness() {
        assert!(RawPage::default().is_blank());
        assert!(!RawPage(vec![1]).is_blank());
    }
}
