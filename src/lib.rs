//! # morph-bridge
//!
//! Native OpenCV bridge exposing grayscale conversion, Delaunay
//! triangulation and two-image face morphing over a flat C ABI, for use from
//! a higher-level mobile application runtime.
//!
//! This crate contributes no vision algorithm of its own. Decoding, color
//! conversion, planar subdivision, affine warping, polygon masks and
//! seamless (Poisson) cloning are all OpenCV; what lives here is the
//! adaptation layer:
//!
//! - **Point-to-triangle mapping**: feed 2D sites into a planar subdivision
//!   and read the triangle list back as stable input-array indices.
//! - **Per-triangle warping**: crop, solve an affine map from the 3-point
//!   correspondence, warp, and composite through a convex polygon mask.
//! - **Morph compositing**: drive the warper across a shared topology, then
//!   blend two seamless-clone variants and restore the mouth region.
//! - **FFI façade**: raw pointers and C strings in, error messages out; a
//!   null return signals success.
//!
//! ## Quick start (Rust callers)
//!
//! ```rust
//! use morph_bridge::make_delaunay;
//! use opencv::core::Point2f;
//!
//! let points = vec![
//!     Point2f::new(10.0, 10.0),
//!     Point2f::new(90.0, 10.0),
//!     Point2f::new(90.0, 90.0),
//!     Point2f::new(10.0, 90.0),
//! ];
//!
//! let triangles = make_delaunay(100, 100, &points).unwrap();
//! assert_eq!(triangles.len(), 2);
//! ```
//!
//! Morphing takes decoded images plus two landmark sets sharing one triangle
//! topology:
//!
//! ```rust,no_run
//! use morph_bridge::{load_image, make_delaunay, morph_images, save_image};
//! use morph_bridge::MOUTH_CONTOUR_LANDMARKS;
//! # use opencv::core::Point2f;
//! # fn landmarks_for(_path: &str) -> Vec<Point2f> { Vec::new() }
//!
//! # fn main() -> morph_bridge::Result<()> {
//! let img1 = load_image("a.jpg")?;
//! let img2 = load_image("b.jpg")?;
//! let points1 = landmarks_for("a.jpg");
//! let points2 = landmarks_for("b.jpg");
//!
//! let triangles = make_delaunay(720, 960, &points1)?;
//! let composite = morph_images(
//!     &img1,
//!     &img2,
//!     &points1,
//!     &points2,
//!     &triangles,
//!     0.5,
//!     &MOUTH_CONTOUR_LANDMARKS,
//! )?;
//! save_image("out.jpg", &composite)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## C callers
//!
//! The [`ffi`] module exports the flat surface loaded by the host runtime:
//! `version`, `convertToGrayScale`, `makeDelaunay` and `morphImages`. Each
//! call is synchronous and owns its buffers for the duration of the call;
//! failures come back as a message string whose pointer stays valid until
//! the next call on the same thread.

pub mod delaunay;
mod error;
pub mod ffi;
pub mod imageio;
pub mod morph;
mod types;

pub use delaunay::{make_delaunay, rect_contains};
pub use error::{Error, Result};
pub use imageio::{convert_to_gray_scale, load_image, save_image};
pub use morph::{
    apply_affine_transform, mask_non_black, morph_images, selective_alpha_blend, warp_triangle,
    MOUTH_CONTOUR_LANDMARKS,
};
pub use types::{points_from_flat, triangles_from_flat, Triangle};
