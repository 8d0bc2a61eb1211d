//! Raster image handling
//!
//! Pure, synchronous helpers: decoding origin bytes, the crop+scale
//! transform and JPEG encoding. Callers on the async runtime run these on
//! the blocking pool.

pub mod codec;
pub mod transform;

pub use codec::{decode, encode_jpeg};
pub use transform::{cropped_size, resize};
