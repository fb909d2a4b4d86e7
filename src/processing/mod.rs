//! # Processing Module
//!
//! Turns an uploaded photograph into the payload the hosted model expects.

pub mod intake;

pub use intake::{EncodedImage, IntakeConfig, encode_image_bytes, encode_image_file};
