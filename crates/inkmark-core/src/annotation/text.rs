//! Point-anchored text notes.

use super::SerializableColor;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for text annotations.
pub type TextId = Uuid;

/// Font family used when none is given.
pub const DEFAULT_FONT_FAMILY: &str = "Helvetica";

/// A text label anchored at `(x, y)` in document-native units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default = "Uuid::new_v4")]
    pub(crate) id: TextId,
    pub text: String,
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    #[serde(default)]
    pub color: SerializableColor,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_font_size() -> f64 {
    TextAnnotation::DEFAULT_FONT_SIZE
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

impl TextAnnotation {
    pub const DEFAULT_FONT_SIZE: f64 = 16.0;

    pub fn new(position: Point, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            x: position.x,
            y: position.y,
            font_size: Self::DEFAULT_FONT_SIZE,
            color: SerializableColor::black(),
            font_family: default_font_family(),
        }
    }

    pub fn id(&self) -> TextId {
        self.id
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Move the anchor to an absolute position.
    pub fn move_to(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    /// Move the anchor by a delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_and_edit() {
        let mut note = TextAnnotation::new(Point::new(10.0, 20.0), "hello");
        note.translate(Vec2::new(5.0, -5.0));
        assert_eq!(note.position(), Point::new(15.0, 15.0));
        note.move_to(Point::new(1.0, 2.0));
        note.set_text("bye");
        assert_eq!(note.position(), Point::new(1.0, 2.0));
        assert_eq!(note.text, "bye");
    }

    #[test]
    fn test_camel_case_fields() {
        let json = r##"{"text":"hi","x":1,"y":2,"fontSize":12,"color":"#336699"}"##;
        let note: TextAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(note.font_size, 12.0);
        assert_eq!(note.font_family, "Helvetica");
        assert!(serde_json::to_string(&note).unwrap().contains("\"fontFamily\""));
    }
}
