// Renders 4:2:0 frames of a dark line on a bright floor

use anyhow::{ensure, Result};
use pathline_eye::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FLOOR: u8 = 200;
const LINE: u8 = 40;

/// Frame generator for a vehicle following one or more dark lines
pub struct SyntheticTrack {
    width: usize,
    height: usize,
    /// Line width as a fraction of frame width
    line_width: f64,
    /// Peak amplitude of per-sample noise
    noise: u8,
    rng: StdRng,
    buffer: Vec<u8>,
}

impl SyntheticTrack {
    pub fn new(width: usize, height: usize, seed: u64) -> Result<Self> {
        ensure!(
            width > 0 && height > 0 && width % 2 == 0 && height % 2 == 0,
            "frame dimensions must be positive and even, got {}x{}",
            width,
            height
        );
        let len = Frame::required_len(width, height)
            .ok_or_else(|| anyhow::anyhow!("frame {}x{} is too large", width, height))?;

        Ok(Self {
            width,
            height,
            line_width: 0.08,
            noise: 0,
            rng: StdRng::seed_from_u64(seed),
            buffer: vec![FLOOR; len],
        })
    }

    pub fn with_noise(mut self, noise: u8) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_line_width(mut self, line_width: f64) -> Self {
        self.line_width = line_width.clamp(0.0, 1.0);
        self
    }

    /// Render lines centered at `positions` (each in [-1, 1]) into every
    /// plane, with the top `wall` fraction of the luma plane dark
    pub fn render(&mut self, positions: &[f64], wall: f64) -> Frame<'_> {
        let (w, h) = (self.width, self.height);
        let (cw, ch) = (w / 2, h / 2);
        let noise = self.noise;

        for sample in self.buffer.iter_mut() {
            *sample = if noise == 0 {
                FLOOR
            } else {
                FLOOR.saturating_sub(self.rng.gen_range(0..=noise))
            };
        }

        let (luma, chroma) = self.buffer.split_at_mut(w * h);
        paint_lines(luma, w, h, positions, self.line_width);
        let (u, v) = chroma.split_at_mut(cw * ch);
        paint_lines(u, cw, ch, positions, self.line_width);
        paint_lines(&mut v[..cw * ch], cw, ch, positions, self.line_width);

        let wall_rows = ((wall.clamp(0.0, 1.0)) * h as f64).round() as usize;
        for row in luma.chunks_exact_mut(w).take(wall_rows) {
            row.fill(0);
        }

        Frame::new(&self.buffer, w, h)
    }
}

fn paint_lines(plane: &mut [u8], width: usize, height: usize, positions: &[f64], line_width: f64) {
    let half = (line_width * width as f64 / 2.0).max(1.0);
    for &position in positions {
        let center = (position.clamp(-1.0, 1.0) + 1.0) / 2.0 * width as f64;
        let start = (center - half).max(0.0) as usize;
        let end = ((center + half) as usize).min(width);
        for row in plane.chunks_exact_mut(width).take(height) {
            row[start..end].fill(LINE);
        }
    }
}
