// SPDX-License-Identifier: MIT
//! # rca-scale: Fixed-Resolution Scaling for Multimodal Model Input
//!
//! Hosted vision models accept arbitrary image sizes, but request payloads grow
//! with pixel count. This crate reduces an uploaded photograph to a single
//! fixed resolution before it is encoded and inlined into a chat request.
//!
//! ## Key Components
//!
//! - [`plan`]: Scaling plan computation (exact target size)
//! - [`cpu`]: CPU scaling built on fast_image_resize
//!
//! ## Usage Example
//!
//! ```rust
//! use rca_scale::{cpu::scale_rgba_cpu, plan::{build_plan, Size}};
//!
//! let input = Size { w: 4, h: 2 };
//! let src = vec![255u8; 4 * 2 * 4];
//! let plan = build_plan(input, Size { w: 2, h: 2 });
//!
//! let mut resizer = fast_image_resize::Resizer::new();
//! let mut out = vec![0u8; plan.out_len()];
//! scale_rgba_cpu(&mut resizer, &src, input, &plan, &mut out).unwrap();
//! assert_eq!(out.len(), 2 * 2 * 4);
//! ```

pub mod cpu;
pub mod plan;
