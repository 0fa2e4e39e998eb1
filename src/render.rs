use tiny_skia as sk;
use std::cell::RefCell;

use crate::dna::{Color, Genome};
use crate::error::ConfigError;
use crate::geom::{bounding_box, PixelRect, Point};
use crate::organism::{Environment, Organism};

/// straight RGBA8 image, row-major, starts out all zeros (transparent black)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        }
    }

    /// wrap existing RGBA8 bytes; the length must match the dimensions
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ConfigError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ConfigError::TargetSizeMismatch { expected, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// a buffer where every pixel is `color`
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let px = color.to_array();
        let data = px.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self { width, height, data }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// overwrite one pixel, no blending
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&color.to_array());
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }
}

/// the one drawing operation the optimizer needs from a rasterization backend.
/// the covered pixels take `color` verbatim, alpha included.
pub trait Canvas {
    fn fill_polygon(&mut self, points: &[Point], color: Color);
}

/// draw every gene in genome order, so later genes land on top
pub fn paint_genome<C: Canvas + ?Sized>(genome: &Genome, canvas: &mut C) {
    profiling::scope!("paint_genome");
    for gene in genome.genes() {
        canvas.fill_polygon(gene.polygon.points(), gene.color);
    }
}

/// turns a genome into its phenotype. implementations must be pure:
/// the same genome and environment always give a bit-identical buffer.
pub trait Renderer: Send + Sync {
    fn render(&self, genome: &Genome, environment: &Environment) -> PixelBuffer;

    fn render_organism(&self, organism: &Organism) -> PixelBuffer {
        self.render(organism.genome(), organism.environment())
    }
}

/// tiny-skia backed canvas. each polygon is rasterized into a coverage mask
/// without anti-aliasing, then every covered pixel is overwritten.
/// the mask is left zeroed after each fill so it can be reused.
pub struct SkiaCanvas {
    buffer: PixelBuffer,
    mask: sk::Mask,
    outline: sk::Stroke,
}

impl SkiaCanvas {
    /// blank canvas; `None` if either dimension is zero
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let mask = sk::Mask::new(width, height)?;
        Some(Self::with_mask(PixelBuffer::new(width, height), mask))
    }

    fn with_mask(buffer: PixelBuffer, mask: sk::Mask) -> Self {
        // a one pixel outline makes edge pixels count as covered
        let outline = sk::Stroke {
            width: 1.0,
            line_join: sk::LineJoin::Round,
            ..sk::Stroke::default()
        };
        Self { buffer, mask, outline }
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }

    fn into_parts(self) -> (PixelBuffer, sk::Mask) {
        (self.buffer, self.mask)
    }

    /// copy covered mask pixels inside `rect` to the buffer and clear them
    fn apply_mask(&mut self, rect: PixelRect, color: Color) {
        let w = self.mask.width() as usize;
        let mask = self.mask.data_mut();
        for y in rect.y0..=rect.y1 {
            let row = y as usize * w;
            for x in rect.x0..=rect.x1 {
                let m = &mut mask[row + x as usize];
                if *m != 0 {
                    *m = 0;
                    self.buffer.set_pixel(x, y, color);
                }
            }
        }
    }
}

impl Canvas for SkiaCanvas {
    fn fill_polygon(&mut self, points: &[Point], color: Color) {
        profiling::scope!("fill_polygon");
        let Some(vertex_rect) = bounding_box(points) else {
            return;
        };
        let (w, h) = (self.buffer.width(), self.buffer.height());

        let mut touched = vertex_rect;
        if let Some(path) = polygon_path(points) {
            self.mask.fill_path(&path, sk::FillRule::EvenOdd, false, sk::Transform::identity());
            touched = touched.union(pixel_bounds(path.bounds(), w, h));

            if let Some(edge) = path.stroke(&self.outline, 1.0) {
                self.mask.fill_path(&edge, sk::FillRule::Winding, false, sk::Transform::identity());
                touched = touched.union(pixel_bounds(edge.bounds(), w, h));
            }
        }
        self.apply_mask(touched.padded(1, w, h), color);

        // vertices are always covered, even when the path is degenerate
        for p in points {
            if p.x < w && p.y < h {
                self.buffer.set_pixel(p.x, p.y, color);
            }
        }
    }
}

fn polygon_path(points: &[Point]) -> Option<sk::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = sk::PathBuilder::new();
    let (x, y) = first.center();
    pb.move_to(x, y);
    for p in rest {
        let (x, y) = p.center();
        pb.line_to(x, y);
    }
    pb.close();
    pb.finish()
}

/// pixel rect enclosing float bounds, clamped to the canvas
fn pixel_bounds(bounds: sk::Rect, width: u32, height: u32) -> PixelRect {
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;
    PixelRect {
        x0: bounds.left().floor().clamp(0.0, max_x) as u32,
        y0: bounds.top().floor().clamp(0.0, max_y) as u32,
        x1: bounds.right().ceil().clamp(0.0, max_x) as u32,
        y1: bounds.bottom().ceil().clamp(0.0, max_y) as u32,
    }
}

// scratch mask reused across renders on the same thread to avoid a
// full-canvas allocation per phenotype. always handed back zeroed.
thread_local! {
    static SCRATCH_MASK: RefCell<Option<sk::Mask>> = const { RefCell::new(None) };
}

/// default renderer: tiny-skia coverage, flat overwrite onto a blank buffer
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuRenderer;

impl Renderer for CpuRenderer {
    fn render(&self, genome: &Genome, environment: &Environment) -> PixelBuffer {
        profiling::scope!("CpuRenderer::render");
        let (w, h) = (environment.width, environment.height);

        SCRATCH_MASK.with(|cell| {
            let cached = cell
                .borrow_mut()
                .take()
                .filter(|m| m.width() == w && m.height() == h);
            let Some(mask) = cached.or_else(|| sk::Mask::new(w, h)) else {
                return PixelBuffer::new(w, h);
            };

            let mut canvas = SkiaCanvas::with_mask(PixelBuffer::new(w, h), mask);
            paint_genome(genome, &mut canvas);
            let (buffer, mask) = canvas.into_parts();
            *cell.borrow_mut() = Some(mask);
            buffer
        })
    }
}
