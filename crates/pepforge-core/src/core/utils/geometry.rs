use nalgebra::{Point3, Rotation3, Vector3};

/// Arithmetic mean of a point set; `None` when empty.
pub fn centroid(points: &[Point3<f64>]) -> Option<Point3<f64>> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    Some(Point3::from(sum / points.len() as f64))
}

/// `count` points evenly spaced on a circle of `radius` in the xy-plane around `center`.
///
/// Point `i` sits at angle `2πi / count`, so the first point is always on the +x axis.
pub fn place_on_circle(center: &Point3<f64>, radius: f64, count: usize) -> Vec<Point3<f64>> {
    (0..count)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / count as f64;
            center + Vector3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
        })
        .collect()
}

/// Rotation from intrinsic roll/pitch/yaw angles given in degrees.
pub fn rotation_from_euler_degrees(angles: [f64; 3]) -> Rotation3<f64> {
    Rotation3::from_euler_angles(
        angles[0].to_radians(),
        angles[1].to_radians(),
        angles[2].to_radians(),
    )
}

/// Rotates `points` about their own centroid and then shifts them by `translation`.
///
/// Inter-point distances are preserved; the centroid moves by exactly `translation`.
pub fn rigid_perturbation(
    points: &[Point3<f64>],
    rotation: &Rotation3<f64>,
    translation: &Vector3<f64>,
) -> Vec<Point3<f64>> {
    let Some(center) = centroid(points) else {
        return Vec::new();
    };
    points
        .iter()
        .map(|p| center + rotation * (p - center) + *translation)
        .collect()
}

/// Shortest distance between any pair drawn from the two sets.
pub fn min_distance(a: &[Point3<f64>], b: &[Point3<f64>]) -> Option<f64> {
    a.iter()
        .flat_map(|p| b.iter().map(move |q| nalgebra::distance(p, q)))
        .min_by(f64::total_cmp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn centroid_of_empty_set_is_none() {
        assert!(centroid(&[]).is_none());
        let c = centroid(&[Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, -6.0)]).unwrap();
        assert_eq!(c, Point3::new(1.0, 2.0, -3.0));
    }

    #[test]
    fn circle_points_sit_at_radius_and_start_on_x_axis() {
        let center = Point3::new(1.0, 1.0, 1.0);
        let points = place_on_circle(&center, 5.0, 8);
        assert_eq!(points.len(), 8);
        for p in &points {
            assert!(f64_approx_equal(nalgebra::distance(p, &center), 5.0));
            assert!(f64_approx_equal(p.z, 1.0));
        }
        assert!(f64_approx_equal(points[0].x, 6.0));
        assert!(f64_approx_equal(centroid(&points).unwrap().x, 1.0));
    }

    #[test]
    fn rigid_perturbation_preserves_shape() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.8, 0.0, 0.0),
            Point3::new(3.8, 3.8, 1.0),
        ];
        let rotation = rotation_from_euler_degrees([10.0, -20.0, 35.0]);
        let shift = Vector3::new(0.5, -0.25, 1.0);
        let moved = rigid_perturbation(&points, &rotation, &shift);

        for i in 0..points.len() {
            for j in 0..points.len() {
                assert!(f64_approx_equal(
                    nalgebra::distance(&points[i], &points[j]),
                    nalgebra::distance(&moved[i], &moved[j])
                ));
            }
        }
        let delta = centroid(&moved).unwrap() - centroid(&points).unwrap();
        assert!(f64_approx_equal((delta - shift).norm(), 0.0));
    }

    #[test]
    fn min_distance_finds_closest_pair() {
        let a = [Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 0.0, 0.0)];
        let b = [Point3::new(13.0, 4.0, 0.0)];
        assert!(f64_approx_equal(min_distance(&a, &b).unwrap(), 5.0));
        assert!(min_distance(&a, &[]).is_none());
    }
}
