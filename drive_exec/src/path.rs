//! # Path
//!
//! This module defines the reference path the vehicle is evaluated against.
//! Paths are authored in the host simulation as a collection of 3D waypoint
//! nodes; the harness consumes only their horizontal-plane projections.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

// Internal
use util::maths::norm;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path defining the desired trajectory of the vehicle.
///
/// Point 0 is the canonical start/reset point of the path.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Path {
    pub points_m: Vec<Vector2<f64>>,
}

/// A segment between two path points
#[derive(Default, Serialize, Deserialize)]
pub struct PathSegment {
    /// The target of the segment
    pub target_m: Vector2<f64>,

    /// The start point of the segment
    pub start_m: Vector2<f64>,

    /// The length of the segment
    pub length_m: f64,

    /// The slope (dy/dx) of the segment
    pub slope_m: f64,

    /// The intercept (the c in y = mx + c) of the segment
    pub intercept_m: f64,

    /// The heading (angle to the +ve x axis) of the segment
    pub heading_rad: f64,
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A path requires at least 2 points, found {0}")]
    TooFewPoints(usize),

    #[error("Cannot load the waypoint file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the waypoint file: {0}")]
    DeserialiseError(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Path {
    /// Create a path from a sequence of host waypoint nodes.
    ///
    /// Waypoints are `[x, y, z]` triples with `y` up. The first node is the
    /// collection's own root and carries no position of interest, so it is
    /// skipped. The remaining nodes are projected onto the horizontal plane
    /// in the order the host exposes them.
    pub fn from_waypoints(waypoints: &[[f64; 3]]) -> Result<Self, PathError> {
        let points_m: Vec<Vector2<f64>> = waypoints
            .iter()
            .skip(1)
            .map(|wp| Vector2::new(wp[0], wp[2]))
            .collect();

        if points_m.len() < 2 {
            return Err(PathError::TooFewPoints(points_m.len()));
        }

        Ok(Path { points_m })
    }

    /// Load a path from a JSON waypoint file.
    pub fn from_waypoint_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, PathError> {
        let file_str =
            std::fs::read_to_string(path).map_err(PathError::FileLoadError)?;

        let waypoints: Vec<[f64; 3]> =
            serde_json::from_str(&file_str).map_err(PathError::DeserialiseError)?;

        Self::from_waypoints(&waypoints)
    }

    /// Returns the path segment connecting the target point and the previous
    /// point.
    ///
    /// If no segment exists (the target is the first point in the sequence or
    /// is beyond the end of the sequence) then `None` will be returned
    pub fn get_segment_to_target(&self, target_index: usize) -> Option<PathSegment> {
        // If the path is invalid (not enough points)
        if self.points_m.len() < 2 {
            return None;
        }

        // Catch invalid targets
        if target_index == 0 || target_index >= self.points_m.len() {
            return None;
        }

        // Empty segment to start with
        let mut seg = PathSegment::default();

        // Set the target and start
        seg.target_m = self.points_m[target_index];
        seg.start_m = self.points_m[target_index - 1];

        // Set the length of the segment
        seg.length_m = (seg.target_m - seg.start_m).norm();

        let dx = seg.target_m[0] - seg.start_m[0];
        let dy = seg.target_m[1] - seg.start_m[1];

        // Slope is the change in y over the change in x
        seg.slope_m = dy / dx;

        // The heading is then the arctan of the slope
        seg.heading_rad = dy.atan2(dx);

        // The intercept is then targ_y - slope * targ_x
        seg.intercept_m = seg.target_m[1] - seg.slope_m * seg.target_m[0];

        // Return the segment
        Some(seg)
    }

    /// Return the length of the path in meters.
    ///
    /// If the path is empty (not enough points) then `None` is returned.
    pub fn get_length(&self) -> Option<f64> {
        // If the path is invalid (not enough points)
        if self.points_m.len() < 2 {
            return None;
        }

        let mut length_m = 0f64;

        for i in 1..self.points_m.len() {
            length_m += norm(
                self.points_m[i - 1].as_slice(),
                self.points_m[i].as_slice(),
            )
            .unwrap();
        }

        Some(length_m)
    }

    /// Get the number of points in the path
    pub fn get_num_points(&self) -> usize {
        self.points_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points_m.len() == 0
    }

    /// Get the heading from the point at the given index towards the next
    /// point on the path, used to orient the vehicle on a reset.
    ///
    /// Returns `None` if the index has no following point.
    pub fn heading_at(&self, index: usize) -> Option<f64> {
        self.get_segment_to_target(index + 1)
            .map(|seg| seg.heading_rad)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn straight_waypoints() -> Vec<[f64; 3]> {
        // Root node first, then a straight line along x at z = 1
        vec![
            [0.0, 0.0, 0.0],
            [0.0, 0.5, 1.0],
            [1.0, 0.5, 1.0],
            [2.0, 0.5, 1.0],
        ]
    }

    #[test]
    fn test_from_waypoints() {
        let path = Path::from_waypoints(&straight_waypoints()).unwrap();

        // Root node skipped, vertical axis discarded
        assert_eq!(path.get_num_points(), 3);
        assert_eq!(path.points_m[0], Vector2::new(0.0, 1.0));
        assert_eq!(path.points_m[2], Vector2::new(2.0, 1.0));

        // A root plus a single point is not a path
        assert!(matches!(
            Path::from_waypoints(&[[0.0; 3], [1.0, 0.0, 1.0]]),
            Err(PathError::TooFewPoints(1))
        ));
    }

    #[test]
    fn test_segments() {
        let path = Path::from_waypoints(&straight_waypoints()).unwrap();

        let seg = path.get_segment_to_target(1).unwrap();
        assert_eq!(seg.length_m, 1.0);
        assert_eq!(seg.slope_m, 0.0);
        assert_eq!(seg.intercept_m, 1.0);
        assert_eq!(seg.heading_rad, 0.0);

        assert!(path.get_segment_to_target(0).is_none());
        assert!(path.get_segment_to_target(3).is_none());

        assert_eq!(path.get_length(), Some(2.0));
        assert_eq!(path.heading_at(0), Some(0.0));
        assert!(path.heading_at(2).is_none());
    }
}
