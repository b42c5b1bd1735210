//! Flat C ABI over the crate's operations.
//!
//! Every entry point converts its raw arguments, runs the corresponding
//! operation, and reports failure as a NUL-terminated message string; a null
//! return means success. Exported names keep the host application's spelling.
//!
//! The returned error pointer refers to a thread-local slot and stays valid
//! until the next bridge call on the same thread. Nothing is allowed to
//! unwind across the boundary: panics are caught and reported like any other
//! failure.

use std::cell::RefCell;
use std::ffi::{c_char, c_float, c_int, CStr, CString};
use std::panic::{self, AssertUnwindSafe};
use std::slice;
use std::sync::OnceLock;

use opencv::core::CV_VERSION;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{points_from_flat, triangles_from_flat, Triangle};
use crate::{delaunay, imageio, morph};

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Store `message` in the thread-local error slot and hand out its pointer.
fn raise(message: String) -> *const c_char {
    // NUL bytes cannot survive the C string conversion; after stripping them
    // the conversion is infallible.
    let message = CString::new(message.replace('\0', " ")).unwrap_or_default();
    LAST_ERROR.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = Some(message);
        slot.as_ref().map_or(std::ptr::null(), |m| m.as_ptr())
    })
}

/// Run `op`, mapping errors and panics alike into the error-string
/// convention.
fn guard<F: FnOnce() -> Result<()>>(name: &'static str, op: F) -> *const c_char {
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(())) => std::ptr::null(),
        Ok(Err(err)) => {
            debug!(call = name, error = %err, "bridge call failed");
            raise(err.to_string())
        }
        Err(_) => raise(format!("{name}: internal panic")),
    }
}

unsafe fn str_arg<'a>(ptr: *const c_char, argument: &'static str) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(Error::NullPointer { argument });
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| Error::InvalidPath { argument })
}

/// Version string of the backing OpenCV build. Never fails.
#[no_mangle]
pub extern "C" fn version() -> *const c_char {
    static VERSION: OnceLock<CString> = OnceLock::new();
    VERSION
        .get_or_init(|| CString::new(CV_VERSION).unwrap_or_default())
        .as_ptr()
}

/// Decode the image at `input_image_path`, convert it to grayscale and write
/// it to `output_image_path`.
///
/// # Safety
///
/// Both arguments must be valid NUL-terminated strings.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn convertToGrayScale(
    input_image_path: *const c_char,
    output_image_path: *const c_char,
) -> *const c_char {
    guard("convertToGrayScale", || unsafe {
        let input = str_arg(input_image_path, "inputImagePath")?;
        let output = str_arg(output_image_path, "outputImagePath")?;
        imageio::convert_to_gray_scale(input, output)
    })
}

/// Triangulate a flat array of xy pairs within a `f_w` x `f_h` canvas.
///
/// `points` holds `points_size` floats. The resulting index triples are
/// flattened into `result` and the number of integers written is stored in
/// `result_size`; a buffer of `3 * points_size` integers is always large
/// enough.
///
/// # Safety
///
/// `points` must be readable for `points_size` floats, `result` writable for
/// the produced triple count, and `result_size` writable.
#[no_mangle]
#[allow(non_snake_case)]
pub unsafe extern "C" fn makeDelaunay(
    f_w: c_int,
    f_h: c_int,
    points: *const c_float,
    points_size: c_int,
    result: *mut c_int,
    result_size: *mut c_int,
) -> *const c_char {
    guard("makeDelaunay", || unsafe {
        run_delaunay(f_w, f_h, points, points_size, result, result_size)
    })
}

unsafe fn run_delaunay(
    f_w: c_int,
    f_h: c_int,
    points: *const c_float,
    points_size: c_int,
    result: *mut c_int,
    result_size: *mut c_int,
) -> Result<()> {
    if points.is_null() {
        return Err(Error::NullPointer { argument: "points" });
    }
    if result.is_null() || result_size.is_null() {
        return Err(Error::NullPointer { argument: "result" });
    }

    let flat = unsafe { slice::from_raw_parts(points, points_size.max(0) as usize) };
    let sites = points_from_flat(flat);
    let triangles = delaunay::make_delaunay(f_w, f_h, &sites)?;

    let written = triangles.len() * 3;
    let out = unsafe { slice::from_raw_parts_mut(result, written) };
    for (slot, index) in out
        .iter_mut()
        .zip(triangles.iter().flat_map(|triangle| triangle.indices))
    {
        *slot = index as c_int;
    }
    unsafe { *result_size = written as c_int };
    Ok(())
}

/// Morph two images under a shared triangulation and write the composite to
/// `output_path`.
///
/// `num_triangles` counts triangles; `triangles` holds `3 * num_triangles`
/// indices. Each point array must contain a coordinate pair for every index
/// referenced by the triangle list or by [`morph::MOUTH_CONTOUR_LANDMARKS`].
/// On failure the unmorphed first image is written to `output_path` as a
/// fallback artifact and the error is still reported.
///
/// # Safety
///
/// All pointers must be valid for the extents described above; path arguments
/// must be NUL-terminated strings.
#[no_mangle]
#[allow(non_snake_case)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn morphImages(
    img1_path: *const c_char,
    img2_path: *const c_char,
    points1: *const c_float,
    points2: *const c_float,
    triangles: *const c_int,
    num_triangles: c_int,
    alpha: c_float,
    output_path: *const c_char,
) -> *const c_char {
    guard("morphImages", || unsafe {
        let img1_path = str_arg(img1_path, "img1Path")?;
        let output = str_arg(output_path, "outputPath")?;

        let outcome = run_morph(
            img1_path,
            img2_path,
            points1,
            points2,
            triangles,
            num_triangles,
            alpha,
            output,
        );
        if outcome.is_err() {
            // Fallback artifact: the output path is populated even on
            // failure, with the first image passed through unchanged.
            if let Ok(original) = imageio::load_image(img1_path) {
                let _ = imageio::save_image(output, &original);
            }
        }
        outcome
    })
}

#[allow(clippy::too_many_arguments)]
unsafe fn run_morph(
    img1_path: &str,
    img2_path: *const c_char,
    points1: *const c_float,
    points2: *const c_float,
    triangles: *const c_int,
    num_triangles: c_int,
    alpha: f32,
    output_path: &str,
) -> Result<()> {
    let img2_path = unsafe { str_arg(img2_path, "img2Path")? };
    if points1.is_null() {
        return Err(Error::NullPointer { argument: "points1" });
    }
    if points2.is_null() {
        return Err(Error::NullPointer { argument: "points2" });
    }
    if triangles.is_null() {
        return Err(Error::NullPointer {
            argument: "triangles",
        });
    }

    let img1 = imageio::load_image(img1_path)?;
    let img2 = imageio::load_image(img2_path)?;

    let triangle_count = num_triangles.max(0) as usize;
    let flat_triangles = unsafe { slice::from_raw_parts(triangles, triangle_count * 3) };
    let triangle_list = triangles_from_flat(flat_triangles)?;

    // The host passes no explicit point count; every index referenced by the
    // topology or the mouth contour must be backed by a coordinate pair.
    let point_count = required_point_count(&triangle_list, &morph::MOUTH_CONTOUR_LANDMARKS);
    let flat1 = unsafe { slice::from_raw_parts(points1, point_count * 2) };
    let flat2 = unsafe { slice::from_raw_parts(points2, point_count * 2) };
    let pts1 = points_from_flat(flat1);
    let pts2 = points_from_flat(flat2);

    let composite = morph::morph_images(
        &img1,
        &img2,
        &pts1,
        &pts2,
        &triangle_list,
        alpha,
        &morph::MOUTH_CONTOUR_LANDMARKS,
    )?;
    imageio::save_image(output_path, &composite)
}

/// Smallest point count that backs every referenced index.
fn required_point_count(triangles: &[Triangle], mouth_contour: &[usize]) -> usize {
    triangles
        .iter()
        .flat_map(|triangle| triangle.indices)
        .chain(mouth_contour.iter().copied())
        .max()
        .map_or(0, |max| max + 1)
}
