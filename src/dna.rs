use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::geom::Point;

/// straight (non-premultiplied) RGBA, one byte per channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    /// every channel, alpha included, drawn independently from [0, 255]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Color {
            r: rng.random(),
            g: rng.random(),
            b: rng.random(),
            a: rng.random(),
        }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// a closed polygon. vertex count is fixed when the polygon is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// `num_points` vertices, each coordinate uniform over the canvas.
    /// repeated vertices and self-intersections are allowed.
    pub fn random<R: Rng>(rng: &mut R, num_points: usize, width: u32, height: u32) -> Self {
        let points = (0..num_points)
            .map(|_| Point::new(rng.random_range(0..width), rng.random_range(0..height)))
            .collect();
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// one polygon and the color it is filled with
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gene {
    pub polygon: Polygon,
    pub color: Color,
}

impl Gene {
    pub fn new(polygon: Polygon, color: Color) -> Self {
        Self { polygon, color }
    }

    pub fn random<R: Rng>(
        rng: &mut R,
        width: u32,
        height: u32,
        vertex_counts: &RangeInclusive<usize>,
    ) -> Self {
        let num_points = rng.random_range(vertex_counts.clone());
        let polygon = Polygon::random(rng, num_points, width, height);
        let color = Color::random(rng);
        Self { polygon, color }
    }
}

// genes are shared behind Arc so crossover only copies pointers; no gene is
// ever edited after creation, so sharing between parent and child is safe.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Genome {
    genes: Vec<Arc<Gene>>,
}

impl Genome {
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes: genes.into_iter().map(Arc::new).collect() }
    }

    /// `genome_size` random genes, each with a vertex count drawn from `vertex_counts`.
    /// panics if the canvas is empty or `vertex_counts` is empty; callers validate both.
    pub fn random<R: Rng>(
        rng: &mut R,
        width: u32,
        height: u32,
        genome_size: usize,
        vertex_counts: RangeInclusive<usize>,
    ) -> Self {
        profiling::scope!("Genome::random");
        let genes = (0..genome_size)
            .map(|_| Arc::new(Gene::random(rng, width, height, &vertex_counts)))
            .collect();
        Self { genes }
    }

    /// single-point crossover. genes in `[len / 2, len - 1)` come from `other`,
    /// everything else (including the last gene) comes from `self`.
    /// indices missing from a shorter `other` are kept from `self`.
    pub fn crossover(&self, other: &Genome) -> Genome {
        let len = self.genes.len();
        let mid = len / 2;
        let end = len.saturating_sub(1).min(other.genes.len());

        let mut genes = self.genes.clone();
        if mid < end {
            genes[mid..end].clone_from_slice(&other.genes[mid..end]);
        }
        Genome { genes }
    }

    #[inline]
    pub fn genes(&self) -> impl ExactSizeIterator<Item = &Gene> + '_ {
        self.genes.iter().map(|g| g.as_ref())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}
