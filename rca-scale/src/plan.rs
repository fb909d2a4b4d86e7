// SPDX-License-Identifier: MIT
//! # Scaling Plans
//!
//! A [`ScalePlan`] records the input size and the output size. Workplace
//! photographs are sent at one fixed resolution: the image is stretched or
//! squeezed to exactly the target, whatever its original aspect ratio.

/// Represents a 2D size with width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    /// Number of bytes an RGBA8 buffer of this size occupies.
    pub fn rgba_len(&self) -> usize {
        (self.w as usize) * (self.h as usize) * 4
    }
}

/// Complete scaling plan computed from input parameters.
#[derive(Clone, Copy, Debug)]
pub struct ScalePlan {
    /// Original input dimensions
    pub input: Size,
    /// Output dimensions
    pub out: Size,
}

impl ScalePlan {
    /// Byte length of the RGBA output buffer this plan writes.
    pub fn out_len(&self) -> usize {
        self.out.rgba_len()
    }

    /// True when scaling would leave the image untouched.
    pub fn is_identity(&self) -> bool {
        self.input == self.out
    }
}

/// Compute a plan that scales `input` to exactly `target`.
///
/// Zero-sized targets are clamped to 1px so the resizer never sees an empty
/// destination.
pub fn build_plan(input: Size, target: Size) -> ScalePlan {
    let out = Size {
        w: target.w.max(1),
        h: target.h.max(1),
    };
    ScalePlan { input, out }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distort_ignores_aspect_ratio() {
        let plan = build_plan(Size { w: 4000, h: 1000 }, Size { w: 800, h: 600 });
        assert_eq!(plan.out, Size { w: 800, h: 600 });
        assert_eq!(plan.out_len(), 800 * 600 * 4);
    }

    #[test]
    fn distort_upscales_small_input() {
        let plan = build_plan(Size { w: 10, h: 10 }, Size { w: 800, h: 600 });
        assert_eq!(plan.out, Size { w: 800, h: 600 });
        assert!(!plan.is_identity());
    }

    #[test]
    fn matching_size_is_identity() {
        let plan = build_plan(Size { w: 800, h: 600 }, Size { w: 800, h: 600 });
        assert!(plan.is_identity());
    }

    #[test]
    fn zero_target_is_clamped() {
        let plan = build_plan(Size { w: 10, h: 10 }, Size { w: 0, h: 0 });
        assert_eq!(plan.out, Size { w: 1, h: 1 });
    }
}
