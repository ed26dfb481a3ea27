//! Strokes and committed operations.

use serde::{Deserialize, Serialize};

pub use kurbo::Point;

/// Opaque stroke identifier, generated by the drawing client.
pub type OperationId = String;

/// Fewest points a stroke needs before it may be committed.
pub const MIN_STROKE_POINTS: usize = 2;

/// A finished stroke as submitted by a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: OperationId,
    /// CSS colour string, passed through untouched.
    pub color: String,
    pub width: f64,
    /// Points in drawing order.
    pub points: Vec<Point>,
}

impl Stroke {
    /// Create a stroke from its parts.
    pub fn new(
        id: impl Into<OperationId>,
        color: impl Into<String>,
        width: f64,
        points: Vec<Point>,
    ) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
            width,
            points,
        }
    }

    /// Whether the stroke has enough points to be committed.
    pub fn is_committable(&self) -> bool {
        self.points.len() >= MIN_STROKE_POINTS
    }
}

/// A stroke that has been committed to an operation log.
///
/// Everything except `active` is fixed at commit time. `active` is flipped
/// only by undo and redo; an inactive operation is a tombstone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub color: String,
    pub width: f64,
    pub points: Vec<Point>,
    pub active: bool,
}

impl Operation {
    /// Id of the stroke this operation was committed from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the operation is a tombstone.
    pub fn is_tombstone(&self) -> bool {
        !self.active
    }
}

impl From<Stroke> for Operation {
    fn from(stroke: Stroke) -> Self {
        Self {
            id: stroke.id,
            color: stroke.color,
            width: stroke.width,
            points: stroke.points,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committable_needs_two_points() {
        let mut stroke = Stroke::new("s1", "#000000", 2.0, vec![Point::new(0.0, 0.0)]);
        assert!(!stroke.is_committable());

        stroke.points.push(Point::new(1.0, 1.0));
        assert!(stroke.is_committable());
    }

    #[test]
    fn test_operation_starts_active() {
        let stroke = Stroke::new(
            "s1",
            "#ff0000",
            4.0,
            vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)],
        );
        let op = Operation::from(stroke.clone());

        assert!(op.active);
        assert!(!op.is_tombstone());
        assert_eq!(op.id(), "s1");
        assert_eq!(op.points, stroke.points);
    }

    #[test]
    fn test_stroke_ignores_unknown_fields() {
        let json = r##"{"id":"abc","color":"#123456","width":3,"points":[{"x":1,"y":2},{"x":3,"y":4}],"tool":"pen"}"##;
        let stroke: Stroke = serde_json::from_str(json).unwrap();

        assert_eq!(stroke.id, "abc");
        assert_eq!(stroke.width, 3.0);
        assert_eq!(stroke.points[1], Point::new(3.0, 4.0));
    }

    #[test]
    fn test_operation_json_shape() {
        let op = Operation::from(Stroke::new(
            "abc",
            "#123456",
            1.5,
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
        ));
        let value = serde_json::to_value(&op).unwrap();

        assert_eq!(value["id"], "abc");
        assert_eq!(value["active"], true);
        assert_eq!(value["points"][1]["x"], 1.0);
        assert_eq!(value["points"][1]["y"], 0.0);
    }
}
