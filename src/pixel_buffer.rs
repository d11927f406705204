// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Host-side 2D pixel storage for readback results.

A [`PixelBuffer`] is a row-major 2D array of pixels.  The origin (0, 0) is the top-left,
X grows to the right and Y grows downward.

Readback builds one in two explicit steps:

1. [`PixelBuffer::from_mapped_rows`] interprets mapped bytes using the row pitch as the
   stride, so the buffer can be wider than the real image.
2. [`PixelBuffer::crop`] trims the pad columns, and only when there are any.

```
use native_texture::{PixelBuffer, Texel};
use native_texture::pixel_formats::Unorm4;

let mut buffer = PixelBuffer::new_with(4, 2, |texel| {
    if texel.y == 0 { Unorm4::opaque(255, 0, 0) } else { Unorm4::opaque(0, 0, 255) }
});
buffer.flip_vertical();
assert_eq!(buffer[Texel { x: 0, y: 0 }], Unorm4::opaque(0, 0, 255));
```
*/

use crate::Error;
use crate::pixel_formats::{PixelElement, Unorm4};
use std::ops::{Index, IndexMut};

/// Integer pixel coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Texel {
    pub x: u32,
    pub y: u32,
}

impl Texel {
    pub const ZERO: Texel = Texel { x: 0, y: 0 };

    const fn vec_offset(&self, width: u32) -> usize {
        width as usize * self.y as usize + self.x as usize
    }
}

/// A row-major 2D array of pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<P> {
    data: Vec<P>,
    width: u32,
    height: u32,
}

/// The normalized result of every readback.
pub type Image = PixelBuffer<Unorm4>;

impl<P: PixelElement> PixelBuffer<P> {
    /// A `width × height` buffer of all-zero pixels.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![P::zeroed(); width as usize * height as usize],
            width,
            height,
        }
    }

    pub fn new_with<F: FnMut(Texel) -> P>(width: u32, height: u32, mut initializer: F) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(initializer(Texel { x, y }));
            }
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Wraps tightly packed pixels.
    ///
    /// # Panics
    /// If `data.len() != width * height`.
    pub fn from_pixels(width: u32, height: u32, data: Vec<P>) -> Self {
        assert_eq!(
            data.len(),
            width as usize * height as usize,
            "pixel count does not match {width}x{height}"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /**
    Interprets mapped device memory as `rows` rows of `stride` pixels each.

    Row `r` starts at byte `r * row_pitch`.  The resulting buffer is `stride` pixels wide,
    which includes any alignment padding the device put at the end of each row.  Bytes in the
    pitch beyond `stride * size_of::<P>()` are ignored.
    */
    pub fn from_mapped_rows(bytes: &[u8], row_pitch: usize, stride: u32, rows: u32) -> Result<Self, Error> {
        let element_size = size_of::<P>();
        if element_size == 0 {
            return Err(Error::ZeroSizedElement);
        }
        let row_bytes = stride as usize * element_size;
        if row_bytes > row_pitch {
            return Err(Error::RowPitchTooSmall {
                row_pitch,
                width: stride,
                element_size,
            });
        }
        let expected = match rows {
            0 => 0,
            rows => (rows as usize - 1) * row_pitch + row_bytes,
        };
        if bytes.len() < expected {
            return Err(Error::MappedRegionTooSmall {
                len: bytes.len(),
                expected,
            });
        }

        let mut data = Vec::with_capacity(stride as usize * rows as usize);
        for row in 0..rows as usize {
            let offset = row * row_pitch;
            let row_slice = &bytes[offset..offset + row_bytes];
            // mapped memory has no alignment guarantee for P
            data.extend(
                row_slice
                    .chunks_exact(element_size)
                    .map(bytemuck::pod_read_unaligned::<P>),
            );
        }
        Ok(Self {
            data,
            width: stride,
            height: rows,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[P] {
        &self.data
    }

    pub fn into_pixels(self) -> Vec<P> {
        self.data
    }

    pub fn row(&self, y: u32) -> &[P] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    /// Mirrors the buffer so the last row becomes the first.
    pub fn flip_vertical(&mut self) {
        let width = self.width as usize;
        if width == 0 {
            return;
        }
        let height = self.height as usize;
        for top in 0..height / 2 {
            let bottom = height - 1 - top;
            let (upper, lower) = self.data.split_at_mut(bottom * width);
            upper[top * width..(top + 1) * width].swap_with_slice(&mut lower[..width]);
        }
    }

    /// The `width × height` region anchored at the origin.
    ///
    /// # Panics
    /// If the region does not fit inside this buffer.
    pub fn crop(&self, width: u32, height: u32) -> Self {
        assert!(
            width <= self.width && height <= self.height,
            "crop {width}x{height} exceeds buffer {}x{}",
            self.width,
            self.height
        );
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            data.extend_from_slice(&self.row(y)[..width as usize]);
        }
        Self {
            data,
            width,
            height,
        }
    }

    pub fn map<Q, F: FnMut(P) -> Q>(self, f: F) -> PixelBuffer<Q> {
        PixelBuffer {
            data: self.data.into_iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }

    /// Normalizes every pixel into [`Unorm4`].
    pub fn into_unorm4(self) -> Image {
        self.map(P::to_unorm4)
    }
}

impl<P> Index<Texel> for PixelBuffer<P> {
    type Output = P;

    fn index(&self, index: Texel) -> &Self::Output {
        assert!(index.x < self.width && index.y < self.height, "texel {index:?} out of bounds");
        &self.data[index.vec_offset(self.width)]
    }
}

impl<P> IndexMut<Texel> for PixelBuffer<P> {
    fn index_mut(&mut self, index: Texel) -> &mut Self::Output {
        assert!(index.x < self.width && index.y < self.height, "texel {index:?} out of bounds");
        &mut self.data[index.vec_offset(self.width)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(width: u32, height: u32) -> PixelBuffer<u8> {
        PixelBuffer::new_with(width, height, |t| (t.y * 10 + t.x) as u8)
    }

    #[test]
    fn flip_reverses_rows() {
        let mut b = numbered(2, 3);
        b.flip_vertical();
        assert_eq!(b.pixels(), &[20, 21, 10, 11, 0, 1]);
    }

    #[test]
    fn flip_single_row_is_noop() {
        let mut b = numbered(3, 1);
        b.flip_vertical();
        assert_eq!(b.pixels(), &[0, 1, 2]);
    }

    #[test]
    fn crop_discards_trailing_columns() {
        let b = numbered(4, 2);
        let c = b.crop(2, 2);
        assert_eq!(c.width(), 2);
        assert_eq!(c.pixels(), &[0, 1, 10, 11]);
    }

    #[test]
    fn mapped_rows_use_pitch_as_stride() {
        // 2 pixels of 4 bytes each, padded to 12 bytes per row
        let mut bytes = Vec::new();
        for row in 0..2u8 {
            bytes.extend_from_slice(&[row, 0, 0, 255, row, 1, 0, 255]);
            bytes.extend_from_slice(&[0xAA; 4]);
        }
        let b = PixelBuffer::<Unorm4>::from_mapped_rows(&bytes, 12, 3, 2).unwrap();
        assert_eq!(b.width(), 3);
        assert_eq!(b[Texel { x: 1, y: 1 }], Unorm4 { r: 1, g: 1, b: 0, a: 255 });
        assert_eq!(b[Texel { x: 2, y: 0 }], Unorm4 { r: 0xAA, g: 0xAA, b: 0xAA, a: 0xAA });
    }

    #[test]
    fn last_row_need_not_carry_padding() {
        let bytes = [1u8, 2, 0, 0, 3, 4];
        let b = PixelBuffer::<u8>::from_mapped_rows(&bytes, 4, 2, 2).unwrap();
        assert_eq!(b.pixels(), &[1, 2, 3, 4]);
    }

    #[test]
    fn short_region_is_rejected() {
        let bytes = [0u8; 7];
        let err = PixelBuffer::<Unorm4>::from_mapped_rows(&bytes, 4, 1, 2).unwrap_err();
        assert!(matches!(err, Error::MappedRegionTooSmall { len: 7, expected: 8 }));
    }

    #[test]
    fn narrow_pitch_is_rejected() {
        let err = PixelBuffer::<Unorm4>::from_mapped_rows(&[0; 64], 4, 2, 1).unwrap_err();
        assert!(matches!(err, Error::RowPitchTooSmall { .. }));
    }

    #[repr(C)]
    #[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct Nothing;

    impl PixelElement for Nothing {
        fn to_unorm4(self) -> Unorm4 {
            Unorm4::ZERO
        }
    }

    #[test]
    fn zero_sized_element_is_rejected() {
        let err = PixelBuffer::<Nothing>::from_mapped_rows(&[0; 16], 4, 1, 2).unwrap_err();
        assert!(matches!(err, Error::ZeroSizedElement));
    }

    #[test]
    fn zero_area() {
        let b = PixelBuffer::<Unorm4>::blank(0, 5);
        assert!(b.is_empty());
        let mut c = b.clone();
        c.flip_vertical();
        assert_eq!(c, b);
    }
}
