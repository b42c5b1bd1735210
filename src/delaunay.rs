//! Delaunay triangulation of a planar point set, reported as index triples.
//!
//! The subdivision itself is OpenCV's `Subdiv2D`; this module feeds it the
//! caller's sites and converts the triangle list it hands back from raw
//! coordinates into stable indices into the input array.

use std::collections::HashMap;

use opencv::core::{Point2f, Rect, Vec6f, Vector};
use opencv::imgproc::{self, Subdiv2D};
use opencv::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::Triangle;

/// Boundary-exclusive containment test.
///
/// A point exactly on the rectangle edge counts as outside, so triangles
/// touching the canvas boundary are dropped rather than clamped.
pub fn rect_contains(rect: Rect, point: Point2f) -> bool {
    point.x > rect.x as f32
        && point.x < (rect.x + rect.width) as f32
        && point.y > rect.y as f32
        && point.y < (rect.y + rect.height) as f32
}

/// Triangulate `points` within a `width` x `height` canvas.
///
/// Returns the triangles of the Delaunay subdivision whose corners all lie
/// strictly inside the canvas, as index triples into `points`. Duplicate
/// points collapse to a single subdivision site; the first inserted index
/// wins.
pub fn make_delaunay(width: i32, height: i32, points: &[Point2f]) -> Result<Vec<Triangle>> {
    let rect = Rect::new(0, 0, width, height);
    let mut subdiv = Subdiv2D::new(rect)?;

    // The subdivision returns a vertex id for every inserted site; that id is
    // the stable key for recovering input indices later. A duplicate point
    // maps to an already-known vertex, so entry() keeps the first index.
    let mut site_index: HashMap<i32, usize> = HashMap::with_capacity(points.len());
    for (i, &point) in points.iter().enumerate() {
        let vertex = subdiv.insert(point)?;
        site_index.entry(vertex).or_insert(i);
    }

    let triangles = collect_triangles(&mut subdiv, rect, &site_index)?;
    debug!(
        sites = points.len(),
        triangles = triangles.len(),
        "triangulated point set"
    );
    Ok(triangles)
}

/// Read the triangle list back from the subdivision, drop triangles reaching
/// the canvas boundary, and map the surviving corners to input indices.
fn collect_triangles(
    subdiv: &mut Subdiv2D,
    rect: Rect,
    site_index: &HashMap<i32, usize>,
) -> Result<Vec<Triangle>> {
    let mut triangle_list = Vector::<Vec6f>::new();
    subdiv.get_triangle_list(&mut triangle_list)?;

    let mut triangles = Vec::with_capacity(triangle_list.len());
    for t in triangle_list.iter() {
        let corners = [
            Point2f::new(t[0], t[1]),
            Point2f::new(t[2], t[3]),
            Point2f::new(t[4], t[5]),
        ];

        // Triangles built on the subdivision's virtual outer vertices show up
        // here too; the containment test removes them along with anything on
        // the canvas edge.
        if !corners.iter().all(|&corner| rect_contains(rect, corner)) {
            continue;
        }

        match resolve_corners(subdiv, site_index, corners)? {
            Some([a, b, c]) => triangles.push(Triangle::new(a, b, c)),
            None => warn!(
                ?corners,
                "triangle corner does not match any inserted site, skipping"
            ),
        }
    }

    Ok(triangles)
}

/// Map corner coordinates back to input indices through the subdivision's own
/// vertex lookup. `locate` reports a vertex id only on an exact hit, which is
/// the contract here: corners are the inserted sites themselves, never
/// synthesized points.
fn resolve_corners(
    subdiv: &mut Subdiv2D,
    site_index: &HashMap<i32, usize>,
    corners: [Point2f; 3],
) -> Result<Option<[usize; 3]>> {
    let mut indices = [0usize; 3];
    for (slot, &corner) in indices.iter_mut().zip(corners.iter()) {
        let mut edge = 0;
        let mut vertex = 0;
        let location = subdiv.locate(corner, &mut edge, &mut vertex)?;
        if location != imgproc::Subdiv2D_PTLOC_VERTEX {
            return Ok(None);
        }
        match site_index.get(&vertex) {
            Some(&index) => *slot = index,
            None => return Ok(None),
        }
    }
    Ok(Some(indices))
}
