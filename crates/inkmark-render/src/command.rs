//! Backend-neutral drawing commands.

use inkmark_core::SerializableColor as Color;
use kurbo::{BezPath, Point, Rect, Vec2};

/// Shape of open path ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Round,
    Butt,
    Square,
}

/// One primitive to paint. Colors already carry their final alpha.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    StrokePath {
        path: BezPath,
        width: f64,
        color: Color,
        cap: LineCap,
    },
    FillPath {
        path: BezPath,
        color: Color,
    },
    FillCircle {
        center: Point,
        radius: f64,
        color: Color,
    },
    FillEllipse {
        center: Point,
        radii: Vec2,
        color: Color,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
}

impl DrawCommand {
    pub fn color(&self) -> Color {
        match self {
            DrawCommand::StrokePath { color, .. }
            | DrawCommand::FillPath { color, .. }
            | DrawCommand::FillCircle { color, .. }
            | DrawCommand::FillEllipse { color, .. }
            | DrawCommand::FillRect { color, .. } => *color,
        }
    }

    /// Conservative bounds of the painted area.
    pub fn bounds(&self) -> Rect {
        use kurbo::Shape;
        match self {
            DrawCommand::StrokePath { path, width, .. } => path.bounding_box().inflate(width / 2.0, width / 2.0),
            DrawCommand::FillPath { path, .. } => path.bounding_box(),
            DrawCommand::FillCircle { center, radius, .. } => {
                Rect::from_center_size(*center, (radius * 2.0, radius * 2.0))
            }
            DrawCommand::FillEllipse { center, radii, .. } => {
                Rect::from_center_size(*center, (radii.x * 2.0, radii.y * 2.0))
            }
            DrawCommand::FillRect { rect, .. } => *rect,
        }
    }
}
