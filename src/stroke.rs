use egui::{Color32, Pos2, Rect};
use serde::{Deserialize, Serialize};

// Immutable stroke, as stored in a layer's content blob
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Pos2>,
    color: Color32,
    thickness: f32,
}

impl Stroke {
    pub fn new(color: Color32, thickness: f32, points: Vec<Pos2>) -> Self {
        Self {
            points,
            color,
            thickness,
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    /// Bounding box including half the thickness as padding
    pub fn bounds(&self) -> Rect {
        if self.points.is_empty() {
            return Rect::NOTHING;
        }
        Rect::from_points(&self.points).expand(self.thickness.max(0.0) / 2.0)
    }
}

/// The drawing blob understood by `StrokeRasterizer`: an ordered list of
/// strokes serialized as JSON. Empty bytes mean an empty drawing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    strokes: Vec<Stroke>,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_strokes(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Parses a blob, degrading to an empty drawing if it is unreadable
    pub fn from_bytes_lossy(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes).unwrap_or_else(|err| {
            log::warn!("Unreadable drawing data ({} bytes): {err}", bytes.len());
            Self::default()
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        if self.strokes.is_empty() {
            return Vec::new();
        }
        // Serializing plain data into a Vec cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Union of all stroke bounds, `Rect::NOTHING` when blank
    pub fn bounds(&self) -> Rect {
        self.strokes
            .iter()
            .map(Stroke::bounds)
            .fold(Rect::NOTHING, |acc, bounds| acc.union(bounds))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn line() -> Stroke {
        Stroke::new(Color32::RED, 4.0, vec![pos2(10.0, 10.0), pos2(30.0, 20.0)])
    }

    #[test]
    fn empty_bytes_are_an_empty_drawing() {
        let drawing = Drawing::from_bytes(&[]).unwrap();
        assert!(drawing.is_empty());
        assert!(drawing.to_bytes().is_empty());
    }

    #[test]
    fn garbage_degrades_to_empty_drawing() {
        assert!(Drawing::from_bytes(b"\xff\x00not json").is_err());
        assert!(Drawing::from_bytes_lossy(b"\xff\x00not json").is_empty());
    }

    #[test]
    fn bounds_include_thickness() {
        let drawing = Drawing::from_strokes(vec![line()]);
        let bounds = drawing.bounds();
        assert_eq!(bounds.min, pos2(8.0, 8.0));
        assert_eq!(bounds.max, pos2(32.0, 22.0));
    }

    #[test]
    fn blank_drawing_has_no_area() {
        assert!(!Drawing::new().bounds().is_positive());
    }
}
