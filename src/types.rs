//! Geometry and color primitives shared across the layout engine.
//!
//! All lengths are PDF points (1/72 inch). Layout math is plain `f32`;
//! the column-width algorithm depends on float rounding residue being
//! absorbed explicitly, so values are never quantized behind the caller's
//! back.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn a4() -> Self {
        Self::new(595.28, 841.89)
    }

    pub fn letter() -> Self {
        // 8.5in x 11in at 72pt/in.
        Self::new(612.0, 792.0)
    }

    pub fn from_mm(width_mm: f32, height_mm: f32) -> Self {
        Self::new(width_mm * 72.0 / 25.4, height_mm * 72.0 / 25.4)
    }

    /// The same page with the long edge horizontal.
    pub fn rotated(self) -> Self {
        Self::new(self.height, self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Combined horizontal extent.
    pub fn x(&self) -> f32 {
        self.left + self.right
    }

    /// Combined vertical extent.
    pub fn y(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}
