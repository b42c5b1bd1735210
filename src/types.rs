use opencv::core::Point2f;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A triangle as three indices into a point set.
///
/// The index is the identity used throughout: the triangulation produces
/// index triples, and the morph compositor reuses the same triple against two
/// different point arrays (one per image) to pair corresponding triangles.
///
/// Serializes as a bare `[a, b, c]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Triangle {
    pub indices: [usize; 3],
}

impl Triangle {
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self { indices: [a, b, c] }
    }

    /// Resolve the triangle against a point array.
    ///
    /// Fails if any index is out of range, so downstream warping never reads
    /// past the caller's landmarks.
    pub fn resolve(&self, points: &[Point2f]) -> Result<[Point2f; 3]> {
        let mut resolved = [Point2f::default(); 3];
        for (corner, &index) in resolved.iter_mut().zip(self.indices.iter()) {
            *corner = *points.get(index).ok_or(Error::IndexOutOfRange {
                index,
                len: points.len(),
            })?;
        }
        Ok(resolved)
    }
}

/// Unpack a flat `[x0, y0, x1, y1, ..]` array into points.
///
/// A trailing unpaired value is ignored.
pub fn points_from_flat(flat: &[f32]) -> Vec<Point2f> {
    flat.chunks_exact(2)
        .map(|pair| Point2f::new(pair[0], pair[1]))
        .collect()
}

/// Unpack a flat `[a0, b0, c0, a1, ..]` index array into triangles.
///
/// A trailing incomplete triple is ignored; negative entries are rejected.
pub fn triangles_from_flat(flat: &[i32]) -> Result<Vec<Triangle>> {
    flat.chunks_exact(3)
        .map(|triple| {
            let index =
                |value: i32| usize::try_from(value).map_err(|_| Error::NegativeIndex { value });
            Ok(Triangle::new(
                index(triple[0])?,
                index(triple[1])?,
                index(triple[2])?,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_picks_points_by_index() {
        let points = vec![
            Point2f::new(0.0, 0.0),
            Point2f::new(1.0, 0.0),
            Point2f::new(0.0, 1.0),
            Point2f::new(5.0, 5.0),
        ];
        let triangle = Triangle::new(3, 1, 0);
        let resolved = triangle.resolve(&points).unwrap();
        assert_eq!(resolved[0], Point2f::new(5.0, 5.0));
        assert_eq!(resolved[1], Point2f::new(1.0, 0.0));
        assert_eq!(resolved[2], Point2f::new(0.0, 0.0));
    }

    #[test]
    fn resolve_rejects_out_of_range_index() {
        let points = vec![Point2f::new(0.0, 0.0)];
        let err = Triangle::new(0, 0, 7).resolve(&points).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 7, len: 1 }));
    }

    #[test]
    fn flat_points_ignore_trailing_value() {
        let points = points_from_flat(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[1], Point2f::new(3.0, 4.0));
    }

    #[test]
    fn flat_triangles_reject_negative_indices() {
        assert!(triangles_from_flat(&[0, 1, 2]).is_ok());
        let err = triangles_from_flat(&[0, -1, 2]).unwrap_err();
        assert!(matches!(err, Error::NegativeIndex { value: -1 }));
    }
}
