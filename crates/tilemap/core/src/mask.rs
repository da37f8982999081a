//! Occlusion masks rasterized from line-of-sight polygons.
//!
//! A mask is a rectangular opacity bitmap plus an offset locating it in
//! map-pixel space. Masks compose by union: any pixel opaque in any input is
//! opaque in the result. Union is commutative and associative, so the global
//! mask is identical regardless of the order regions are processed in.

use crate::grid::PixelVec;

/// Rasterized opacity bitmap with an origin offset.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcclusionMask {
    width: u32,
    height: u32,
    origin: (i32, i32),
    bits: Vec<bool>,
}

impl OcclusionMask {
    /// All-transparent (fully visible) mask at origin `(0, 0)`.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            origin: (0, 0),
            bits: vec![false; width as usize * height as usize],
        }
    }

    /// Rasterizes a closed polygon given in local coordinates.
    ///
    /// The mask is sized to the polygon's bounding box and its origin is the
    /// box's minimum corner, still in the polygon's local coordinate space;
    /// callers translate it into map space afterwards. Fill rule is even-odd,
    /// sampled at pixel centers. Fewer than three vertices rasterize to an
    /// empty mask.
    pub fn from_polygon(vertices: &[PixelVec]) -> Self {
        if vertices.len() < 3 {
            return Self::transparent(0, 0);
        }

        let min_x = vertices.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
        let min_y = vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
        let max_x = vertices
            .iter()
            .map(|v| v.x)
            .fold(f32::NEG_INFINITY, f32::max);
        let max_y = vertices
            .iter()
            .map(|v| v.y)
            .fold(f32::NEG_INFINITY, f32::max);

        let origin = (min_x.floor() as i32, min_y.floor() as i32);
        let width = (max_x.ceil() as i32 - origin.0).max(0) as u32;
        let height = (max_y.ceil() as i32 - origin.1).max(0) as u32;

        let mut mask = Self {
            width,
            height,
            origin,
            bits: vec![false; width as usize * height as usize],
        };

        let mut crossings: Vec<f32> = Vec::new();
        for row in 0..height {
            let sample_y = origin.1 as f32 + row as f32 + 0.5;

            crossings.clear();
            for (i, a) in vertices.iter().enumerate() {
                let b = &vertices[(i + 1) % vertices.len()];
                // Half-open rule so a scanline through a vertex counts once.
                if (a.y <= sample_y) != (b.y <= sample_y) {
                    let t = (sample_y - a.y) / (b.y - a.y);
                    crossings.push(a.x + t * (b.x - a.x));
                }
            }
            crossings.sort_by(f32::total_cmp);

            for span in crossings.chunks_exact(2) {
                // Pixels whose center x falls in [span[0], span[1]).
                let first = (span[0] - origin.0 as f32 - 0.5).ceil().max(0.0) as u32;
                let last = ((span[1] - origin.0 as f32 - 0.5).ceil().max(0.0) as u32).min(width);
                for column in first..last {
                    mask.bits[(row * width + column) as usize] = true;
                }
            }
        }

        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Offset locating this mask, in map-pixel space once placed.
    pub fn origin(&self) -> (i32, i32) {
        self.origin
    }

    /// Re-anchors the mask at the given map-pixel offset.
    pub fn placed_at(mut self, x: i32, y: i32) -> Self {
        self.origin = (x, y);
        self
    }

    /// Opacity at a point expressed in the mask's placed coordinate space.
    /// Points outside the mask rectangle are transparent.
    pub fn is_opaque(&self, x: i32, y: i32) -> bool {
        let lx = x - self.origin.0;
        let ly = y - self.origin.1;
        if lx < 0 || ly < 0 || lx >= self.width as i32 || ly >= self.height as i32 {
            return false;
        }
        self.bits[ly as usize * self.width as usize + lx as usize]
    }

    pub fn opaque_count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// ORs this mask into `canvas`, respecting both origins.
    pub fn union_into(&self, canvas: &mut OcclusionMask) {
        for ly in 0..self.height as i32 {
            for lx in 0..self.width as i32 {
                if !self.bits[ly as usize * self.width as usize + lx as usize] {
                    continue;
                }
                let cx = self.origin.0 + lx - canvas.origin.0;
                let cy = self.origin.1 + ly - canvas.origin.1;
                if cx < 0 || cy < 0 || cx >= canvas.width as i32 || cy >= canvas.height as i32 {
                    continue;
                }
                canvas.bits[cy as usize * canvas.width as usize + cx as usize] = true;
            }
        }
    }

    /// Union-composites `masks` over a transparent canvas of the given
    /// pixel size. An empty input yields a fully visible canvas.
    pub fn composite<'a, I>(size: (u32, u32), masks: I) -> Self
    where
        I: IntoIterator<Item = &'a OcclusionMask>,
    {
        let mut canvas = Self::transparent(size.0, size.1);
        for mask in masks {
            mask.union_into(&mut canvas);
        }
        canvas
    }
}
