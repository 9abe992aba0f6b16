//! Dense response surfaces and non-destructive peak suppression.

use crate::util::{XqError, XqResult};
use std::collections::VecDeque;

/// Peak location in response coordinates (template top-left placement).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// X coordinate (column) of the peak.
    pub x: usize,
    /// Y coordinate (row) of the peak.
    pub y: usize,
    /// Correlation score at the peak.
    pub score: f32,
}

/// Correlation scores for every template placement, row-major.
#[derive(Clone, Debug)]
pub struct ResponseMap {
    scores: Vec<f32>,
    width: usize,
    height: usize,
}

impl ResponseMap {
    /// Wraps a row-major score buffer.
    pub fn new(scores: Vec<f32>, width: usize, height: usize) -> XqResult<Self> {
        if width == 0 || height == 0 || scores.len() != width * height {
            return Err(XqError::InvalidDimensions { width, height });
        }
        Ok(Self {
            scores,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// Returns the score at placement `(x, y)`.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.scores.get(y * self.width + x).copied()
    }

    /// Returns the highest unmasked score; the first one in row-major order
    /// wins ties. Non-finite scores are ignored.
    pub fn max_unmasked(&self, mask: &PeakMask) -> Option<Peak> {
        let mut best: Option<(usize, f32)> = None;
        for (idx, &score) in self.scores.iter().enumerate() {
            if mask.is_set(idx) || !score.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((idx, score));
            }
        }
        best.map(|(idx, score)| Peak {
            x: idx % self.width,
            y: idx / self.width,
            score,
        })
    }

    /// Marks the 4-connected region of scores above `floor` that contains
    /// `peak`. The peak itself is always marked. Returns the marked count.
    pub fn suppress(&self, mask: &mut PeakMask, peak: Peak, floor: f32) -> usize {
        let start = peak.y * self.width + peak.x;
        if start >= self.scores.len() || mask.is_set(start) {
            return 0;
        }
        let mut marked = 0usize;
        let mut queue = VecDeque::new();
        mask.set(start);
        queue.push_back(start);
        while let Some(idx) = queue.pop_front() {
            marked += 1;
            let x = idx % self.width;
            let y = idx / self.width;
            let mut visit = |nx: usize, ny: usize| {
                let n = ny * self.width + nx;
                if !mask.is_set(n) && self.scores[n] > floor {
                    mask.set(n);
                    queue.push_back(n);
                }
            };
            if x > 0 {
                visit(x - 1, y);
            }
            if x + 1 < self.width {
                visit(x + 1, y);
            }
            if y > 0 {
                visit(x, y - 1);
            }
            if y + 1 < self.height {
                visit(x, y + 1);
            }
        }
        marked
    }
}

/// Visited flags over a response surface.
#[derive(Clone, Debug)]
pub struct PeakMask {
    bits: Vec<bool>,
}

impl PeakMask {
    /// Creates an empty mask sized for `response`.
    pub fn for_response(response: &ResponseMap) -> Self {
        Self {
            bits: vec![false; response.scores.len()],
        }
    }

    pub fn is_set(&self, idx: usize) -> bool {
        self.bits.get(idx).copied().unwrap_or(true)
    }

    fn set(&mut self, idx: usize) {
        if let Some(bit) = self.bits.get_mut(idx) {
            *bit = true;
        }
    }
}
