//! Rectangle and dirty-region types.
//!
//! # Coordinate System
//!
//! All coordinates use the standard image convention:
//! - Origin (0, 0) is at the **top-left** corner
//! - X increases to the right
//! - Y increases downward
//!
//! [`Rect`] fields are signed so callers can describe regions that hang off
//! the edge of a buffer; clipping is done with [`Rect::clamp_to`].
//!
//! ```rust
//! use pxbuf_core::Rect;
//!
//! let rect = Rect::new(-5, 10, 20, 20);
//! let clipped = rect.clamp_to(100, 100).unwrap();
//! assert_eq!(clipped, Rect::new(0, 10, 15, 20));
//! ```

/// A rectangle defined by origin (x, y) and dimensions (width, height).
///
/// A rectangle with non-positive width or height is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// X coordinate of the left edge (inclusive)
    pub x: i32,
    /// Y coordinate of the top edge (inclusive)
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle with the given origin and dimensions.
    #[inline]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle at the origin with the given dimensions.
    #[inline]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// X coordinate of the right edge (exclusive), saturating at `i32::MAX`.
    #[inline]
    pub const fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    /// Y coordinate of the bottom edge (exclusive), saturating at `i32::MAX`.
    #[inline]
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns `true` if the point is inside (left/top inclusive,
    /// right/bottom exclusive).
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Returns `true` if the two rectangles share at least one pixel.
    #[inline]
    pub const fn overlaps(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Returns the intersection, or `None` if the rectangles don't overlap.
    ///
    /// ```rust
    /// use pxbuf_core::Rect;
    ///
    /// let a = Rect::new(0, 0, 10, 10);
    /// let b = Rect::new(5, 5, 10, 10);
    /// assert_eq!(a.intersect(&b), Some(Rect::new(5, 5, 5, 5)));
    /// ```
    #[inline]
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if x < right && y < bottom {
            Some(Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y)))
        } else {
            None
        }
    }

    /// Returns the bounding box of both rectangles.
    #[inline]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right.saturating_sub(x), bottom.saturating_sub(y))
    }

    /// Clips this rectangle to `[0, max_width) x [0, max_height)`.
    #[inline]
    pub fn clamp_to(&self, max_width: u32, max_height: u32) -> Option<Rect> {
        let bounds = Rect::from_size(to_i32(max_width), to_i32(max_height));
        self.intersect(&bounds)
    }
}

#[inline]
pub(crate) fn to_i32(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

/// Bounding box of all pixels touched since the last commit.
///
/// Stored as corners; `x2`/`y2` are exclusive. Always lies within
/// `[0, pixel_width] x [0, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirtyRegion {
    /// Left edge (inclusive)
    pub x1: i32,
    /// Top edge (inclusive)
    pub y1: i32,
    /// Right edge (exclusive)
    pub x2: i32,
    /// Bottom edge (exclusive)
    pub y2: i32,
}

impl DirtyRegion {
    /// Builds a region from a rectangle, clamped to the given bounds.
    pub fn clamped(rect: Rect, max_width: u32, max_height: u32) -> Self {
        let w = to_i32(max_width);
        let h = to_i32(max_height);
        let x2 = rect.x.saturating_add(rect.width);
        let y2 = rect.y.saturating_add(rect.height);
        Self {
            x1: rect.x.clamp(0, w),
            y1: rect.y.clamp(0, h),
            x2: x2.clamp(0, w),
            y2: y2.clamp(0, h),
        }
    }

    /// Grows this region to also cover `other`.
    pub fn grow(&mut self, other: DirtyRegion) {
        self.x1 = self.x1.min(other.x1);
        self.y1 = self.y1.min(other.y1);
        self.x2 = self.x2.max(other.x2);
        self.y2 = self.y2.max(other.y2);
    }

    /// Region as an origin/size rectangle.
    pub const fn to_rect(&self) -> Rect {
        Rect::new(self.x1, self.y1, self.x2 - self.x1, self.y2 - self.y1)
    }

    /// Returns `true` if no pixel is covered.
    pub const fn is_empty(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }
}
