// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Norm below which a normal is treated as numerically degenerate
pub const DEGENERATE_NORM: f64 = 1e-10;

/// Calculate the unit normal of a triangle given three vertices.
///
/// Returns the zero vector for degenerate (zero-area) triangles.
pub fn calculate_triangle_normal(
    p0: &Point3<f64>,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
) -> Vector3<f64> {
    let v1 = p1 - p0;
    let v2 = p2 - p0;
    let cross = v1.cross(&v2);
    let norm = cross.norm();
    if norm > DEGENERATE_NORM {
        cross / norm
    } else {
        Vector3::zeros()
    }
}

/// Normalize a vector, or `None` if it is too short to carry a direction
pub fn try_unit(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let norm = v.norm();
    (norm > DEGENERATE_NORM).then(|| v / norm)
}

/// Angle in radians between two unit vectors, robust to rounding outside [-1, 1]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, 0 for an empty slice
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_normal() {
        let n = calculate_triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(n, Vector3::new(0.0, 0.0, 1.0));

        // Collinear points carry no direction
        let n = calculate_triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
        );
        assert_eq!(n, Vector3::zeros());
    }

    #[test]
    fn test_angle_between() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert_relative_eq!(angle_between(&x, &y), std::f64::consts::FRAC_PI_2);
        assert_relative_eq!(angle_between(&x, &x), 0.0);
        // Slightly over-unit dot products must not produce NaN
        let almost = Vector3::new(1.0 + 1e-12, 0.0, 0.0);
        assert!(!angle_between(&almost, &x).is_nan());
    }

    #[test]
    fn test_statistics() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert_relative_eq!(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }
}
