// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Texture formats, usage flags, and the host-side pixel types readback can interpret.
//!
//! Two different ideas live here:
//!
//! - [`TextureFormat`] is what the *device* stores.  It is a runtime value, because the device
//!   is the authority on what a live texture actually is.
//! - [`PixelElement`] is how the *host* wants to look at mapped bytes.  It is a type, chosen by
//!   the caller of [`crate::NativeTexture::extract_data`], and it determines the stride
//!   arithmetic during readback.
//!
//! Whatever element type was used to interpret the data, readback hands back [`Unorm4`].
//!
//! # Examples
//!
//! ```
//! use native_texture::pixel_formats::{Float4, PixelElement, Unorm4};
//!
//! let half_red = Float4 { r: 0.5, g: 0.0, b: 0.0, a: 1.0 };
//! assert_eq!(half_red.to_unorm4(), Unorm4 { r: 128, g: 0, b: 0, a: 255 });
//! ```

pub(crate) mod png_support;

use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;
use std::ops::{BitOr, BitOrAssign};

pub use half::f16;

/// Formats a [`crate::NativeTexture`] can be allocated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    R32Float,
    Rgba8Unorm,
    Rgba8UnormSrgb,
    Bgra8Unorm,
    Bgra8UnormSrgb,
    Rgba16Float,
    Rgba32Float,
}

impl TextureFormat {
    /// Size of one texel as laid out by the device, before any row padding.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::R32Float => 4,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8Unorm
            | TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// How the live texture will be used on the GPU.
///
/// Flags combine with `|`.  Readback always adds [`TextureUsage::COPY_SRC`] itself.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureUsage(u8);

impl TextureUsage {
    pub const NONE: TextureUsage = TextureUsage(0);
    /// Sampled or read from shaders.
    pub const SAMPLED: TextureUsage = TextureUsage(1 << 0);
    /// Rendered into as a color attachment.
    pub const RENDER_TARGET: TextureUsage = TextureUsage(1 << 1);
    /// Written from compute or fragment shaders as storage.
    pub const STORAGE: TextureUsage = TextureUsage(1 << 2);
    /// May be the source of a copy.
    pub const COPY_SRC: TextureUsage = TextureUsage(1 << 3);

    pub const fn contains(&self, other: TextureUsage) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: TextureUsage) -> TextureUsage {
        TextureUsage(self.0 | other.0)
    }
}

impl BitOr for TextureUsage {
    type Output = TextureUsage;

    fn bitor(self, rhs: TextureUsage) -> TextureUsage {
        self.union(rhs)
    }
}

impl BitOrAssign for TextureUsage {
    fn bitor_assign(&mut self, rhs: TextureUsage) {
        *self = self.union(rhs);
    }
}

impl Debug for TextureUsage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = [
            (TextureUsage::SAMPLED, "SAMPLED"),
            (TextureUsage::RENDER_TARGET, "RENDER_TARGET"),
            (TextureUsage::STORAGE, "STORAGE"),
            (TextureUsage::COPY_SRC, "COPY_SRC"),
        ];
        let mut set = f.debug_set();
        for (flag, name) in names {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/**
A fixed-size pixel with a known byte layout, used to interpret mapped memory.

The size of the element is what the row pitch is divided by during readback, so pick the
element that matches the texture's [`TextureFormat::bytes_per_pixel`].
*/
pub trait PixelElement: Pod + Debug + Send + Sync + 'static {
    /// Normalizes this pixel into 4-channel, 8-bit-per-channel RGBA.
    fn to_unorm4(self) -> Unorm4;
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// 4-channel, 8-bit normalized RGBA.  The output type of every readback.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Unorm4 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Unorm4 {
    /// Transparent black, which is also what a blank readback is filled with.
    pub const ZERO: Unorm4 = Unorm4 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn opaque(r: u8, g: u8, b: u8) -> Unorm4 {
        Unorm4 { r, g, b, a: 255 }
    }
}

impl PixelElement for Unorm4 {
    #[inline]
    fn to_unorm4(self) -> Unorm4 {
        self
    }
}

/// 4-channel, 8-bit normalized BGRA, the usual swapchain layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct BGRA8UnormPixel {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl PixelElement for BGRA8UnormPixel {
    #[inline]
    fn to_unorm4(self) -> Unorm4 {
        Unorm4 {
            r: self.r,
            g: self.g,
            b: self.b,
            a: self.a,
        }
    }
}

impl From<Unorm4> for BGRA8UnormPixel {
    fn from(c: Unorm4) -> Self {
        Self {
            b: c.b,
            g: c.g,
            r: c.r,
            a: c.a,
        }
    }
}

/// Four-channel 32-bit float color.  Channels are clamped to [0, 1] on normalization.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Float4 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl PixelElement for Float4 {
    fn to_unorm4(self) -> Unorm4 {
        Unorm4 {
            r: unit_to_u8(self.r),
            g: unit_to_u8(self.g),
            b: unit_to_u8(self.b),
            a: unit_to_u8(self.a),
        }
    }
}

/// Four-channel half-precision float color, for `Rgba16Float` render targets.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Half4 {
    pub r: f16,
    pub g: f16,
    pub b: f16,
    pub a: f16,
}

impl PixelElement for Half4 {
    fn to_unorm4(self) -> Unorm4 {
        Float4 {
            r: self.r.to_f32(),
            g: self.g.to_f32(),
            b: self.b.to_f32(),
            a: self.a.to_f32(),
        }
        .to_unorm4()
    }
}

/// Single-channel 8-bit, expanded to opaque gray.
impl PixelElement for u8 {
    #[inline]
    fn to_unorm4(self) -> Unorm4 {
        Unorm4::opaque(self, self, self)
    }
}

/// Single-channel float, expanded to opaque gray.
impl PixelElement for f32 {
    #[inline]
    fn to_unorm4(self) -> Unorm4 {
        let v = unit_to_u8(self);
        Unorm4::opaque(v, v, v)
    }
}
