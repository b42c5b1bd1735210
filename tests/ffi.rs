//! Integration tests exercising the C surface through raw pointers.

use morph_bridge::ffi;
use opencv::core::{self, Mat, Scalar, Vec3b, Vector};
use opencv::imgcodecs;
use opencv::prelude::*;
use std::ffi::{CStr, CString};
use std::path::Path;

fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}

fn write_solid_image(path: &Path, color: (f64, f64, f64)) {
    let image = Mat::new_rows_cols_with_default(
        64,
        64,
        core::CV_8UC3,
        Scalar::new(color.0, color.1, color.2, 0.0),
    )
    .unwrap();
    imgcodecs::imwrite(path.to_str().unwrap(), &image, &Vector::<i32>::new()).unwrap();
}

#[test]
fn version_reports_backing_library() {
    let ptr = ffi::version();
    assert!(!ptr.is_null());
    let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap();
    assert!(!text.is_empty());
}

#[test]
fn make_delaunay_fills_caller_buffer() {
    let points: [f32; 8] = [10.0, 10.0, 90.0, 10.0, 90.0, 90.0, 10.0, 90.0];
    let mut result = [0i32; 24];
    let mut result_size = 0i32;

    let err = unsafe {
        ffi::makeDelaunay(
            100,
            100,
            points.as_ptr(),
            points.len() as i32,
            result.as_mut_ptr(),
            &mut result_size,
        )
    };
    assert!(err.is_null());
    assert_eq!(result_size, 6);
    assert!(result[..6].iter().all(|&i| (0..4).contains(&i)));
}

#[test]
fn null_points_reports_error_instead_of_crashing() {
    let mut result = [0i32; 3];
    let mut result_size = 0i32;

    let err = unsafe {
        ffi::makeDelaunay(
            100,
            100,
            std::ptr::null(),
            0,
            result.as_mut_ptr(),
            &mut result_size,
        )
    };
    assert!(!err.is_null());
    let message = unsafe { CStr::from_ptr(err) }.to_str().unwrap();
    assert!(message.contains("null pointer"));
}

#[test]
fn grayscale_missing_input_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("gray.png");

    let input_c = CString::new("/no/such/image.png").unwrap();
    let output_c = c_path(&output);

    let err = unsafe { ffi::convertToGrayScale(input_c.as_ptr(), output_c.as_ptr()) };
    assert!(!err.is_null());
    let message = unsafe { CStr::from_ptr(err) }.to_str().unwrap();
    assert!(message.contains("could not open"));
    assert!(!output.exists());
}

#[test]
fn grayscale_round_trip_through_c_surface() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.png");
    let output = dir.path().join("gray.png");
    write_solid_image(&input, (120.0, 120.0, 120.0));

    let input_c = c_path(&input);
    let output_c = c_path(&output);

    let err = unsafe { ffi::convertToGrayScale(input_c.as_ptr(), output_c.as_ptr()) };
    assert!(err.is_null());

    let gray = imgcodecs::imread(output.to_str().unwrap(), imgcodecs::IMREAD_GRAYSCALE).unwrap();
    assert!(!gray.empty());
    assert_eq!(*gray.at_2d::<u8>(32, 32).unwrap(), 120);
}

#[test]
fn morph_unreadable_second_image_writes_fallback() {
    let dir = tempfile::tempdir().unwrap();
    let img1 = dir.path().join("img1.png");
    let output = dir.path().join("out.png");
    write_solid_image(&img1, (30.0, 60.0, 90.0));

    let img1_c = c_path(&img1);
    let img2_c = CString::new("/no/such/image.png").unwrap();
    let output_c = c_path(&output);

    // Arrays sized for the default mouth contour (indices up to 116).
    let points = vec![0.0f32; 234];
    let triangles = [0i32, 0, 0];

    let err = unsafe {
        ffi::morphImages(
            img1_c.as_ptr(),
            img2_c.as_ptr(),
            points.as_ptr(),
            points.as_ptr(),
            triangles.as_ptr(),
            1,
            0.5,
            output_c.as_ptr(),
        )
    };
    assert!(!err.is_null());
    let message = unsafe { CStr::from_ptr(err) }.to_str().unwrap();
    assert!(message.contains("could not open"));

    // The fallback artifact is the first image, unchanged.
    let fallback = imgcodecs::imread(output.to_str().unwrap(), imgcodecs::IMREAD_COLOR).unwrap();
    assert_eq!(fallback.size().unwrap(), core::Size::new(64, 64));
    assert_eq!(
        *fallback.at_2d::<Vec3b>(32, 32).unwrap(),
        Vec3b::from([30, 60, 90])
    );
}
