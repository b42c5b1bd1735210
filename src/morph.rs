//! Triangle-wise morphing of two images under a shared triangulation, with
//! seamless-clone compositing and mouth-region restoration.
//!
//! The geometry pipeline is OpenCV end to end: affine solving and warping,
//! convex polygon masks, and Poisson (seamless) cloning. This module wires
//! those primitives together; it owns no warp or blend kernel of its own.

use opencv::core::{
    self, AlgorithmHint, Mat, Point, Point2f, Scalar, Size, ToInputArray, Vec3b, Vector,
};
use opencv::prelude::*;
use opencv::{imgproc, photo};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::types::Triangle;

/// Mouth contour for the landmark layout produced by the host application's
/// face detector, as ordered indices into the point set of image 1.
///
/// [`morph_images`] takes the contour as a parameter, so callers with a
/// different landmark model can pass their own ordered index list.
pub const MOUTH_CONTOUR_LANDMARKS: [usize; 18] = [
    99, 100, 101, 102, 103, 104, 105, 106, 107, 108, 109, 110, 111, 112, 113, 114, 115, 116,
];

/// Warp `src` onto a `size` canvas with the affine map taking `src_tri` to
/// `dst_tri`. Linear interpolation, reflecting border extrapolation.
pub fn apply_affine_transform(
    src: &impl ToInputArray,
    src_tri: &Vector<Point2f>,
    dst_tri: &Vector<Point2f>,
    size: Size,
) -> Result<Mat> {
    let warp_mat = imgproc::get_affine_transform(src_tri, dst_tri)?;
    let mut dst = Mat::default();
    imgproc::warp_affine(
        src,
        &mut dst,
        &warp_mat,
        size,
        imgproc::INTER_LINEAR,
        core::BORDER_REFLECT_101,
        Scalar::default(),
    )?;
    Ok(dst)
}

/// Warp one triangle pair from both source images into `morphed`, blending
/// the two warped patches by `alpha`.
///
/// Each triangle gets its own bounding rectangle and local coordinate frame.
/// Both patches are warped into the destination shape taken from `t1`'s local
/// frame, and only pixels inside that triangle are written back to the
/// canvas.
pub fn warp_triangle(
    img1: &Mat,
    img2: &Mat,
    morphed: &mut Mat,
    t1: &[Point2f; 3],
    t2: &[Point2f; 3],
    alpha: f32,
) -> Result<()> {
    let r1 = imgproc::bounding_rect(&Vector::<Point2f>::from_slice(t1))?;
    let r2 = imgproc::bounding_rect(&Vector::<Point2f>::from_slice(t2))?;

    // Triangle corners in each rectangle's local frame. The integer copy of
    // the destination triangle feeds the polygon mask.
    let mut t1_rect = Vector::<Point2f>::new();
    let mut t2_rect = Vector::<Point2f>::new();
    let mut t1_rect_int = Vector::<Point>::new();
    for i in 0..3 {
        let local1 = Point2f::new(t1[i].x - r1.x as f32, t1[i].y - r1.y as f32);
        let local2 = Point2f::new(t2[i].x - r2.x as f32, t2[i].y - r2.y as f32);
        t1_rect.push(local1);
        t2_rect.push(local2);
        t1_rect_int.push(Point::new(local1.x as i32, local1.y as i32));
    }

    let patch1 = Mat::roi(img1, r1)?;
    let patch2 = Mat::roi(img2, r2)?;

    // Both warps target the destination shape from triangle 1's frame, so the
    // morphed canvas keeps image 1's geometry.
    let warp1 = apply_affine_transform(&patch1, &t1_rect, &t1_rect, r1.size())?;
    let warp2 = apply_affine_transform(&patch2, &t2_rect, &t1_rect, r1.size())?;

    let mut blended = Mat::default();
    core::add_weighted(
        &warp1,
        f64::from(1.0 - alpha),
        &warp2,
        f64::from(alpha),
        0.0,
        &mut blended,
        -1,
    )?;

    let mut mask = Mat::zeros(r1.height, r1.width, core::CV_8UC1)?.to_mat()?;
    imgproc::fill_convex_poly(
        &mut mask,
        &t1_rect_int,
        Scalar::all(255.0),
        imgproc::LINE_AA,
        0,
    )?;

    let mut canvas_roi = Mat::roi_mut(morphed, r1)?;
    blended.copy_to_masked(&mut canvas_roi, &mask)?;
    Ok(())
}

/// Binary mask of every pixel with a nonzero grayscale value.
pub fn mask_non_black(image: &Mat) -> Result<Mat> {
    let mut gray = Mat::default();
    imgproc::cvt_color(
        image,
        &mut gray,
        imgproc::COLOR_BGR2GRAY,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    let mut mask = Mat::default();
    imgproc::threshold(&gray, &mut mask, 0.0, 255.0, imgproc::THRESH_BINARY)?;
    Ok(mask)
}

/// Blend `foreground` over `background` inside `mask`.
///
/// Masked pixels become `(1 - alpha) * background + alpha * foreground`;
/// everything else stays `background`. The mask is single-channel, nonzero
/// selects.
pub fn selective_alpha_blend(
    background: &Mat,
    foreground: &Mat,
    mask: &Mat,
    alpha: f32,
) -> Result<Mat> {
    let mut blended = background.try_clone()?;
    for y in 0..mask.rows() {
        for x in 0..mask.cols() {
            if *mask.at_2d::<u8>(y, x)? == 0 {
                continue;
            }
            let bg = *background.at_2d::<Vec3b>(y, x)?;
            let fg = *foreground.at_2d::<Vec3b>(y, x)?;
            let out = blended.at_2d_mut::<Vec3b>(y, x)?;
            for c in 0..3 {
                out[c] = ((1.0 - alpha) * f32::from(bg[c]) + alpha * f32::from(fg[c])) as u8;
            }
        }
    }
    Ok(blended)
}

/// Morph `img2`'s texture into `img1`'s geometry under a shared triangle
/// topology and composite the result back onto `img1` with seamless cloning.
///
/// `mouth_contour` is an ordered list of indices into `points1` describing a
/// closed mouth polygon; [`MOUTH_CONTOUR_LANDMARKS`] is the default layout.
/// `alpha` weights the normal-clone variant against the gradient-mixing one,
/// and the mouth region is afterwards pulled halfway back toward the
/// untouched `img1`.
pub fn morph_images(
    img1: &Mat,
    img2: &Mat,
    points1: &[Point2f],
    points2: &[Point2f],
    triangles: &[Triangle],
    alpha: f32,
    mouth_contour: &[usize],
) -> Result<Mat> {
    let size = img1.size()?;
    let mut morphed = Mat::zeros_size(size, img1.typ())?.to_mat()?;

    // The per-triangle weight is fixed at 1: the canvas carries image 2's
    // texture in image 1's geometry, and the caller's alpha only enters the
    // clone-variant blend below.
    for triangle in triangles {
        let t1 = triangle.resolve(points1)?;
        let t2 = triangle.resolve(points2)?;
        warp_triangle(img1, img2, &mut morphed, &t1, &t2, 1.0)?;
    }
    debug!(triangles = triangles.len(), "warped triangle topology");

    let mouth_polygon = resolve_polygon(points1, mouth_contour)?;

    // Clone anchor: center of the morphed region's bounding box.
    let non_black = mask_non_black(&morphed)?;
    let bounding_box = imgproc::bounding_rect(&non_black)?;
    let center = Point::new(
        bounding_box.x + bounding_box.width / 2,
        bounding_box.y + bounding_box.height / 2,
    );
    debug!(?bounding_box, ?center, "clone anchor");

    // Face mask: invert the non-black mask first, then force the mouth
    // polygon white. The ordering is part of the contract.
    let mut mask = Mat::default();
    core::bitwise_not(&non_black, &mut mask, &core::no_array())?;
    fill_polygon(&mut mask, &mouth_polygon)?;

    let mut mouth_mask = Mat::zeros_size(size, core::CV_8UC1)?.to_mat()?;
    fill_polygon(&mut mouth_mask, &mouth_polygon)?;

    // Background-only variant of image 1, face area blanked by the mask.
    let mut img1_no_face = Mat::default();
    core::bitwise_and(img1, img1, &mut img1_no_face, &mask)?;
    trace!(
        rows = img1_no_face.rows(),
        cols = img1_no_face.cols(),
        "background variant ready"
    );

    // Re-invert: the clone mask covers the morphed face minus the mouth.
    let mut clone_mask = Mat::default();
    core::bitwise_not(&mask, &mut clone_mask, &core::no_array())?;

    let mut result_normal = Mat::default();
    let mut result_mixed = Mat::default();
    photo::seamless_clone(
        &morphed,
        img1,
        &clone_mask,
        center,
        &mut result_normal,
        photo::NORMAL_CLONE,
    )?;
    photo::seamless_clone(
        &morphed,
        img1,
        &clone_mask,
        center,
        &mut result_mixed,
        photo::MIXED_CLONE,
    )?;

    // Global blend of the two clone variants, then pull the mouth region
    // halfway back toward the untouched image 1.
    let everywhere = Mat::new_size_with_default(size, core::CV_8UC1, Scalar::all(255.0))?;
    let result = selective_alpha_blend(&result_normal, &result_mixed, &everywhere, alpha)?;
    let result = selective_alpha_blend(&result, img1, &mouth_mask, 0.5)?;
    Ok(result)
}

/// Resolve landmark indices into an integer polygon.
fn resolve_polygon(points: &[Point2f], indices: &[usize]) -> Result<Vector<Point>> {
    let mut polygon = Vector::<Point>::new();
    for &index in indices {
        let point = points.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: points.len(),
        })?;
        polygon.push(Point::new(point.x as i32, point.y as i32));
    }
    Ok(polygon)
}

/// Fill a single closed polygon white into a mask.
fn fill_polygon(mask: &mut Mat, polygon: &Vector<Point>) -> Result<()> {
    let polygons = Vector::<Vector<Point>>::from_iter([polygon.clone()]);
    imgproc::fill_poly(
        mask,
        &polygons,
        Scalar::all(255.0),
        imgproc::LINE_8,
        0,
        Point::default(),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Rect;

    fn solid(rows: i32, cols: i32, color: (f64, f64, f64)) -> Mat {
        Mat::new_rows_cols_with_default(
            rows,
            cols,
            core::CV_8UC3,
            Scalar::new(color.0, color.1, color.2, 0.0),
        )
        .unwrap()
    }

    #[test]
    fn selective_blend_respects_mask_and_alpha() {
        let background = solid(4, 4, (100.0, 100.0, 100.0));
        let foreground = solid(4, 4, (200.0, 200.0, 200.0));

        let mut mask = Mat::zeros(4, 4, core::CV_8UC1).unwrap().to_mat().unwrap();
        let mut left = Mat::roi_mut(&mut mask, Rect::new(0, 0, 2, 4)).unwrap();
        left.set_to(&Scalar::all(255.0), &core::no_array()).unwrap();

        let blended = selective_alpha_blend(&background, &foreground, &mask, 0.5).unwrap();
        assert_eq!(*blended.at_2d::<Vec3b>(1, 0).unwrap(), Vec3b::from([150, 150, 150]));
        assert_eq!(*blended.at_2d::<Vec3b>(1, 3).unwrap(), Vec3b::from([100, 100, 100]));
    }

    #[test]
    fn selective_blend_extremes_pick_sides() {
        let background = solid(2, 2, (10.0, 20.0, 30.0));
        let foreground = solid(2, 2, (40.0, 50.0, 60.0));
        let mask = Mat::new_rows_cols_with_default(2, 2, core::CV_8UC1, Scalar::all(255.0)).unwrap();

        let at_zero = selective_alpha_blend(&background, &foreground, &mask, 0.0).unwrap();
        assert_eq!(*at_zero.at_2d::<Vec3b>(0, 0).unwrap(), Vec3b::from([10, 20, 30]));

        let at_one = selective_alpha_blend(&background, &foreground, &mask, 1.0).unwrap();
        assert_eq!(*at_one.at_2d::<Vec3b>(0, 0).unwrap(), Vec3b::from([40, 50, 60]));
    }

    #[test]
    fn identity_affine_preserves_pixels() {
        let mut src = Mat::zeros(8, 8, core::CV_8UC1).unwrap().to_mat().unwrap();
        for y in 0..8 {
            for x in 0..8 {
                *src.at_2d_mut::<u8>(y, x).unwrap() = (x + 8 * y) as u8;
            }
        }

        let tri = Vector::<Point2f>::from_slice(&[
            Point2f::new(0.0, 0.0),
            Point2f::new(7.0, 0.0),
            Point2f::new(0.0, 7.0),
        ]);
        let warped = apply_affine_transform(&src, &tri, &tri, Size::new(8, 8)).unwrap();

        assert_eq!(*warped.at_2d::<u8>(3, 4).unwrap(), *src.at_2d::<u8>(3, 4).unwrap());
        assert_eq!(*warped.at_2d::<u8>(6, 1).unwrap(), *src.at_2d::<u8>(6, 1).unwrap());
    }

    #[test]
    fn non_black_mask_finds_painted_region() {
        let mut image = Mat::zeros(10, 10, core::CV_8UC3).unwrap().to_mat().unwrap();
        let mut region = Mat::roi_mut(&mut image, Rect::new(2, 2, 3, 3)).unwrap();
        region
            .set_to(&Scalar::new(200.0, 200.0, 200.0, 0.0), &core::no_array())
            .unwrap();

        let mask = mask_non_black(&image).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 9);
    }
}
