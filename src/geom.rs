// integer geometry shared by the genome and the rasterizer
//
// vertices are whole-pixel coordinates inside the canvas. the renderer
// places them on pixel centers, so (0, 0) addresses the top-left pixel.

/// a polygon vertex in pixel units, always inside `[0, width) x [0, height)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    #[inline]
    pub fn new(x: u32, y: u32) -> Self {
        Point { x, y }
    }

    /// pixel-center coordinates used when building a vector path
    #[inline]
    pub fn center(self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// inclusive pixel rectangle, used to limit per-polygon work to the area it can touch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PixelRect {
    /// grow the rect by `pad` pixels on every side, clamped to a `width x height` canvas
    #[inline]
    pub fn padded(self, pad: u32, width: u32, height: u32) -> PixelRect {
        PixelRect {
            x0: self.x0.saturating_sub(pad),
            y0: self.y0.saturating_sub(pad),
            x1: self.x1.saturating_add(pad).min(width.saturating_sub(1)),
            y1: self.y1.saturating_add(pad).min(height.saturating_sub(1)),
        }
    }

    #[inline]
    pub fn union(self, other: PixelRect) -> PixelRect {
        PixelRect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

/// axis-aligned bounds of a vertex list, `None` for an empty list
pub fn bounding_box(points: &[Point]) -> Option<PixelRect> {
    let first = points.first()?;
    let mut rect = PixelRect { x0: first.x, y0: first.y, x1: first.x, y1: first.y };
    for p in &points[1..] {
        rect.x0 = rect.x0.min(p.x);
        rect.y0 = rect.y0.min(p.y);
        rect.x1 = rect.x1.max(p.x);
        rect.y1 = rect.y1.max(p.y);
    }
    Some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_of_triangle() {
        let pts = vec![Point::new(3, 7), Point::new(1, 2), Point::new(5, 4)];
        let rect = bounding_box(&pts).unwrap();
        assert_eq!(rect, PixelRect { x0: 1, y0: 2, x1: 5, y1: 7 });
    }

    #[test]
    fn test_bounding_box_empty() {
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn test_padded_clamps_to_canvas() {
        let rect = PixelRect { x0: 0, y0: 1, x1: 3, y1: 3 };
        let grown = rect.padded(1, 4, 4);
        assert_eq!(grown, PixelRect { x0: 0, y0: 0, x1: 3, y1: 3 });
    }

    #[test]
    fn test_padded_saturates_near_u32_max() {
        let rect = PixelRect { x0: u32::MAX - 1, y0: 2, x1: u32::MAX, y1: u32::MAX };
        let grown = rect.padded(3, u32::MAX, u32::MAX);
        assert_eq!(grown, PixelRect { x0: u32::MAX - 4, y0: 0, x1: u32::MAX - 1, y1: u32::MAX - 1 });
    }

    #[test]
    fn test_union_covers_both() {
        let a = PixelRect { x0: 2, y0: 0, x1: 4, y1: 1 };
        let b = PixelRect { x0: 0, y0: 3, x1: 1, y1: 5 };
        assert_eq!(a.union(b), PixelRect { x0: 0, y0: 0, x1: 4, y1: 5 });
    }

    #[test]
    fn test_center_offsets_half_pixel() {
        assert_eq!(Point::new(2, 0).center(), (2.5, 0.5));
    }
}
