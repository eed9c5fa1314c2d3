//! # Cross track error estimator
//!
//! Estimates the squared lateral deviation of the vehicle from the
//! reference path. The two path points nearest the query position are found
//! by a full linear scan, the line through them is fitted, and the squared
//! distance from the position to the foot of the perpendicular dropped onto
//! that line is returned.
//!
//! No adjacency is assumed between the two nearest points. On concave,
//! looped, or sparsely sampled paths the two globally nearest points may not
//! be neighbours and the fitted line is then meaningless. This is an
//! accepted approximation, the estimator is only valid for convex,
//! well-spaced, roughly straight path segments.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use ordered_float::NotNan;

// Internal
use crate::path::Path;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Potential errors that can occur while estimating the cross track error.
#[derive(Debug, thiserror::Error)]
pub enum TrackErrError {
    #[error("The path must have at least 2 points to estimate against, found {0}")]
    TooFewPoints(usize),

    #[error("The position is not a finite point")]
    NonFinitePosition,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Estimate the squared cross track error of `position_m` against `path`.
///
/// The result is always finite and non-negative. Degenerate nearest-point
/// lines (vertical, horizontal, or coincident points) are handled
/// explicitly rather than being allowed to produce NaN.
pub fn estimate(path: &Path, position_m: Vector2<f64>) -> Result<f64, TrackErrError> {
    if path.get_num_points() < 2 {
        return Err(TrackErrError::TooFewPoints(path.get_num_points()));
    }

    if !position_m[0].is_finite() || !position_m[1].is_finite() {
        return Err(TrackErrError::NonFinitePosition);
    }

    let (point_a, point_b) = nearest_two(path, position_m);

    let dx = point_b[0] - point_a[0];
    let dy = point_b[1] - point_a[1];

    // Coincident points, fall back to the distance to the point itself
    if dx.abs() <= std::f64::EPSILON && dy.abs() <= std::f64::EPSILON {
        return Ok((position_m - point_a).norm_squared());
    }

    // Vertical line, the error is the horizontal distance to it
    if dx.abs() <= std::f64::EPSILON {
        return Ok((position_m[0] - point_a[0]).powi(2));
    }

    // Horizontal line, the perpendicular through the position is vertical
    // and the error is the vertical distance to the line
    if dy.abs() <= std::f64::EPSILON {
        return Ok((position_m[1] - point_a[1]).powi(2));
    }

    // Fit the line through the two nearest points
    let slope = dy / dx;
    let intercept = point_a[1] - slope * point_a[0];

    // Get the slope and intercept of the line that passes through the
    // vehicle's position and is perpendicular to the fitted line.
    let lat_slope = -1f64 / slope;
    let lat_intercept = position_m[1] - lat_slope * position_m[0];

    // Find the point of intersection by equating the two lines
    let isect_x = (lat_intercept - intercept) / (slope - lat_slope);
    let isect_m = Vector2::new(isect_x, slope * isect_x + intercept);

    Ok((position_m - isect_m).norm_squared())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Find the two path points with the smallest squared distance to the
/// position.
///
/// A full linear scan with no spatial index, ties are broken by
/// first-encountered order.
fn nearest_two(path: &Path, position_m: Vector2<f64>) -> (Vector2<f64>, Vector2<f64>) {
    // Squared distance keyed by NotNan so points are totally ordered. The
    // position is checked finite by the caller so the distances cannot be
    // NaN.
    let dist_sq = |p: &Vector2<f64>| {
        NotNan::new((position_m - p).norm_squared())
            .expect("Non-finite distance in nearest point scan")
    };

    let mut best: (usize, NotNan<f64>) = (0, dist_sq(&path.points_m[0]));
    let mut second: Option<(usize, NotNan<f64>)> = None;

    for (i, point) in path.points_m.iter().enumerate().skip(1) {
        let d = dist_sq(point);

        if d < best.1 {
            second = Some(best);
            best = (i, d);
        }
        else if second.map_or(true, |(_, sd)| d < sd) {
            second = Some((i, d));
        }
    }

    // Safe since the caller guarantees at least 2 points
    let second = second.unwrap();

    (path.points_m[best.0], path.points_m[second.0])
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::path::Path;

    const TOL: f64 = 1e-9;

    fn path_from_points(points: &[(f64, f64)]) -> Path {
        Path {
            points_m: points
                .iter()
                .map(|(x, y)| Vector2::new(*x, *y))
                .collect(),
        }
    }

    #[test]
    fn test_on_line_is_zero() {
        // A straight diagonal line, query points exactly on it
        let path = path_from_points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);

        assert!(estimate(&path, Vector2::new(0.5, 0.5)).unwrap() < TOL);
        assert!(estimate(&path, Vector2::new(2.5, 2.5)).unwrap() < TOL);
    }

    #[test]
    fn test_perpendicular_distance() {
        // Line y = x, query offset perpendicular by sqrt(2)/2
        let path = path_from_points(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);

        let err = estimate(&path, Vector2::new(1.0, 0.0)).unwrap();
        assert!((err - 0.5).abs() < TOL);
    }

    #[test]
    fn test_square_path_symmetry() {
        // A square-ish path, the error of a position and of its reflection
        // across the nearest edge must match
        let path = path_from_points(&[(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)]);

        let inside = estimate(&path, Vector2::new(1.0, 0.3)).unwrap();
        let outside = estimate(&path, Vector2::new(1.0, -0.3)).unwrap();

        assert!((inside - outside).abs() < TOL);
    }

    #[test]
    fn test_vertical_line() {
        // The two nearest points share an x coordinate
        let path = path_from_points(&[(1.0, 0.0), (1.0, 1.0), (1.0, 2.0)]);

        let err = estimate(&path, Vector2::new(3.0, 0.5)).unwrap();
        assert!((err - 4.0).abs() < TOL);
        assert!(err.is_finite());
    }

    #[test]
    fn test_horizontal_line() {
        let path = path_from_points(&[(0.0, 1.0), (1.0, 1.0), (2.0, 1.0)]);

        let err = estimate(&path, Vector2::new(0.5, 3.0)).unwrap();
        assert!((err - 4.0).abs() < TOL);
    }

    #[test]
    fn test_coincident_points() {
        let path = path_from_points(&[(1.0, 1.0), (1.0, 1.0), (5.0, 5.0)]);

        let err = estimate(&path, Vector2::new(1.0, 2.0)).unwrap();
        assert!((err - 1.0).abs() < TOL);
    }

    #[test]
    fn test_too_few_points() {
        let path = path_from_points(&[(0.0, 0.0)]);

        assert!(matches!(
            estimate(&path, Vector2::new(0.0, 0.0)),
            Err(TrackErrError::TooFewPoints(1))
        ));
    }

    #[test]
    fn test_non_finite_position() {
        let path = path_from_points(&[(0.0, 0.0), (1.0, 1.0)]);

        assert!(matches!(
            estimate(&path, Vector2::new(f64::NAN, 0.0)),
            Err(TrackErrError::NonFinitePosition)
        ));
    }

    #[test]
    fn test_tie_break_first_encountered() {
        // Two points equidistant from the query, the earlier index must win
        // the nearest slot. With (0,0) and (2,0) tied the fitted pair is
        // ((0,0), (2,0)) either way, so check via a third farther point that
        // the scan prefers earlier points on equality.
        let path = path_from_points(&[(0.0, 0.0), (2.0, 0.0), (10.0, 10.0)]);

        let err = estimate(&path, Vector2::new(1.0, 1.0)).unwrap();
        assert!((err - 1.0).abs() < TOL);
    }
}
