//! Raw 4:2:0 planar frames and their plane views

use crate::error::VisionError;
use pathline_core::Channel;

/// Raw frame borrowed from the capture callback for the duration of one tick
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> Frame<'a> {
    /// Wrap a buffer; geometry is checked when the planes are extracted
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bytes needed for a `width x height` 4:2:0 frame, `None` on overflow
    pub fn required_len(width: usize, height: usize) -> Option<usize> {
        let luma = width.checked_mul(height)?;
        let chroma = (width / 2).checked_mul(height / 2)?;
        luma.checked_add(chroma.checked_mul(2)?)
    }
}

/// Row-major view of one channel
#[derive(Debug, Clone, Copy)]
pub struct Plane<'a> {
    samples: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> Plane<'a> {
    fn new(samples: &'a [u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(samples.len(), width * height);
        Self {
            samples,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn samples(&self) -> &'a [u8] {
        self.samples
    }

    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.samples.get(start..start + self.width)
    }

    /// Samples of column `x`, top to bottom
    pub fn column(&self, x: usize) -> Option<impl ExactSizeIterator<Item = u8> + 'a> {
        if x >= self.width {
            return None;
        }
        Some(self.samples[x..].iter().step_by(self.width).copied())
    }
}

/// The three planes of one frame
#[derive(Debug, Clone, Copy)]
pub struct Planes<'a> {
    pub y: Plane<'a>,
    pub u: Plane<'a>,
    pub v: Plane<'a>,
}

impl<'a> Planes<'a> {
    pub fn get(&self, channel: Channel) -> &Plane<'a> {
        match channel {
            Channel::Y => &self.y,
            Channel::U => &self.u,
            Channel::V => &self.v,
        }
    }
}

/// Splits a 4:2:0 planar buffer into Y, U and V views without copying
pub struct ChannelExtractor;

impl ChannelExtractor {
    pub fn split<'a>(frame: &Frame<'a>) -> Result<Planes<'a>, VisionError> {
        let (width, height) = (frame.width, frame.height);
        check_dimensions(width, height)?;

        let required = Frame::required_len(width, height).ok_or_else(|| {
            VisionError::Format(format!("Frame {}x{} overflows buffer size", width, height))
        })?;
        if frame.data.len() < required {
            return Err(VisionError::Format(format!(
                "Buffer of {} bytes is too small for a {}x{} frame ({} bytes)",
                frame.data.len(),
                width,
                height,
                required
            )));
        }

        let luma_len = width * height;
        let (chroma_w, chroma_h) = (width / 2, height / 2);
        let chroma_len = chroma_w * chroma_h;

        let (y, rest) = frame.data.split_at(luma_len);
        let (u, rest) = rest.split_at(chroma_len);
        let v = &rest[..chroma_len];

        Ok(Planes {
            y: Plane::new(y, width, height),
            u: Plane::new(u, chroma_w, chroma_h),
            v: Plane::new(v, chroma_w, chroma_h),
        })
    }

    /// Width and height of `channel` for a frame of the given size
    pub fn channel_dimensions(
        channel: Channel,
        width: usize,
        height: usize,
    ) -> Result<(usize, usize), VisionError> {
        check_dimensions(width, height)?;
        Ok(match channel {
            Channel::Y => (width, height),
            Channel::U | Channel::V => (width / 2, height / 2),
        })
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), VisionError> {
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return Err(VisionError::Format(format!(
            "Frame dimensions must be positive and even, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(width: usize, height: usize) -> Vec<u8> {
        let luma = width * height;
        let chroma = (width / 2) * (height / 2);
        let mut data = vec![1u8; luma];
        data.extend(std::iter::repeat(2u8).take(chroma));
        data.extend(std::iter::repeat(3u8).take(chroma));
        data
    }

    #[test]
    fn test_split_plane_layout() {
        let data = frame_bytes(8, 4);
        let planes = ChannelExtractor::split(&Frame::new(&data, 8, 4)).unwrap();

        assert_eq!((planes.y.width(), planes.y.height()), (8, 4));
        assert_eq!((planes.u.width(), planes.u.height()), (4, 2));
        assert_eq!((planes.v.width(), planes.v.height()), (4, 2));
        assert!(planes.y.samples().iter().all(|&s| s == 1));
        assert!(planes.u.samples().iter().all(|&s| s == 2));
        assert!(planes.v.samples().iter().all(|&s| s == 3));
    }

    #[test]
    fn test_split_accepts_trailing_padding() {
        let mut data = frame_bytes(4, 4);
        data.extend_from_slice(&[9, 9, 9]);
        let planes = ChannelExtractor::split(&Frame::new(&data, 4, 4)).unwrap();
        assert!(planes.v.samples().iter().all(|&s| s == 3));
    }

    #[test]
    fn test_split_rejects_short_buffer() {
        let data = frame_bytes(8, 4);
        let result = ChannelExtractor::split(&Frame::new(&data[..data.len() - 1], 8, 4));
        assert!(matches!(result, Err(VisionError::Format(_))));
    }

    #[test]
    fn test_split_rejects_bad_dimensions() {
        let data = vec![0u8; 1024];
        for (w, h) in [(0, 4), (4, 0), (7, 4), (4, 5)] {
            let result = ChannelExtractor::split(&Frame::new(&data, w, h));
            assert!(matches!(result, Err(VisionError::Format(_))), "{}x{}", w, h);
        }
    }

    #[test]
    fn test_required_len_overflow() {
        assert_eq!(Frame::required_len(4, 4), Some(24));
        assert_eq!(Frame::required_len(usize::MAX, 4), None);
    }

    #[test]
    fn test_plane_row_and_column() {
        let data: Vec<u8> = (0..24).collect();
        let planes = ChannelExtractor::split(&Frame::new(&data, 4, 4)).unwrap();

        assert_eq!(planes.y.row(1), Some(&[4u8, 5, 6, 7][..]));
        assert_eq!(planes.y.row(4), None);

        let column: Vec<u8> = planes.y.column(2).unwrap().collect();
        assert_eq!(column, vec![2, 6, 10, 14]);
        assert_eq!(planes.y.column(2).unwrap().len(), 4);
        assert!(planes.y.column(4).is_none());

        assert_eq!(planes.u.row(0), Some(&[16u8, 17][..]));
        assert_eq!(planes.v.row(1), Some(&[22u8, 23][..]));
    }

    #[test]
    fn test_channel_dimensions() {
        assert_eq!(
            ChannelExtractor::channel_dimensions(Channel::Y, 640, 480).unwrap(),
            (640, 480)
        );
        assert_eq!(
            ChannelExtractor::channel_dimensions(Channel::V, 640, 480).unwrap(),
            (320, 240)
        );
        assert!(ChannelExtractor::channel_dimensions(Channel::U, 641, 480).is_err());
    }
}
