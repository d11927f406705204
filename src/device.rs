// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The capability boundary between a texture and the device that backs it.

Everything a [`crate::NativeTexture`] needs from the graphics stack goes through
[`RenderDevice`], a single trait with a handful of methods rather than a
hierarchy; a backend (see [`crate::WgpuDevice`]) or a test double only has to fill these in.
*/

use crate::Error;
use crate::pixel_formats::{TextureFormat, TextureUsage};
use std::fmt::Debug;
use std::ops::Deref;
use std::time::Duration;

/// Everything needed to allocate the live texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor<'a> {
    pub label: &'a str,
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub array_layers: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
}

/// What the device reports about an allocated texture or staging copy.
///
/// The device is authoritative; this is what readback trusts, not the holder's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    pub width: u32,
    pub height: u32,
    pub mip_level_count: u32,
    pub array_layers: u32,
    pub format: TextureFormat,
}

impl TextureInfo {
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDescriptor {
    pub address_mode_u: AddressMode,
    pub address_mode_v: AddressMode,
    pub address_mode_w: AddressMode,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub mipmap_filter: FilterMode,
    pub lod_min_clamp: f32,
    pub lod_max_clamp: f32,
    /// 0 disables anisotropic filtering.
    pub max_anisotropy: u16,
}

impl SamplerDescriptor {
    /// Clamped on all three axes, trilinear, LOD range pinned to level 0.
    ///
    /// These textures never have a real mip chain, so both LOD bounds sit on the only level.
    pub const PINNED_LINEAR: SamplerDescriptor = SamplerDescriptor {
        address_mode_u: AddressMode::ClampToEdge,
        address_mode_v: AddressMode::ClampToEdge,
        address_mode_w: AddressMode::ClampToEdge,
        min_filter: FilterMode::Linear,
        mag_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Linear,
        lod_min_clamp: 0.0,
        lod_max_clamp: 0.0,
        max_anisotropy: 0,
    };
}

/// A staging copy mapped into host memory.
///
/// `row_pitch` is the distance in bytes between the starts of consecutive rows, which can be
/// larger than the tightly packed row.
pub struct MappedRegion<'a> {
    bytes: Box<dyn Deref<Target = [u8]> + 'a>,
    row_pitch: usize,
}

impl<'a> MappedRegion<'a> {
    pub fn new(bytes: impl Deref<Target = [u8]> + 'a, row_pitch: usize) -> Self {
        MappedRegion {
            bytes: Box::new(bytes),
            row_pitch,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    pub fn size_in_bytes(&self) -> usize {
        self.bytes.len()
    }
}

impl Debug for MappedRegion<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappedRegion")
            .field("row_pitch", &self.row_pitch)
            .field("size_in_bytes", &self.size_in_bytes())
            .finish()
    }
}

/**
The device capabilities a texture is built from.

Handles are owned by whoever created them; `destroy_*` releases the GPU side of a handle
that is still borrowed, so a handle shared through an `Arc` can be released by its last
responsible owner without needing to be unwrapped.

# Ordering

`record_copy` followed by `submit` is ordered after all previously submitted work on the
same queue.  Implementations do not need to insert extra barriers for readback.
*/
pub trait RenderDevice: Send + Sync + 'static {
    type Texture: Debug + Send + Sync + 'static;
    type Sampler: Debug + Send + Sync + 'static;
    type Staging;
    type CommandList;
    type Fence;

    fn create_texture_2d(&self, descriptor: &TextureDescriptor<'_>) -> Result<Self::Texture, Error>;
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<Self::Sampler, Error>;
    fn texture_info(&self, texture: &Self::Texture) -> TextureInfo;
    /// A diagnostic name for the handle, if the device has one.
    fn texture_name(&self, texture: &Self::Texture) -> Option<String>;
    fn destroy_texture(&self, texture: &Self::Texture);
    fn destroy_sampler(&self, sampler: &Self::Sampler);

    /// Allocates a host-readable copy target shaped like `info`.
    fn create_staging_texture(&self, info: &TextureInfo) -> Result<Self::Staging, Error>;
    fn staging_info(&self, staging: &Self::Staging) -> TextureInfo;
    fn destroy_staging(&self, staging: &Self::Staging);

    fn create_command_list(&self) -> Self::CommandList;
    fn record_copy(&self, list: &mut Self::CommandList, source: &Self::Texture, destination: &Self::Staging);
    fn create_fence(&self) -> Result<Self::Fence, Error>;
    fn submit(&self, list: Self::CommandList, fence: &Self::Fence);
    /// Blocks until `fence` signals or `timeout` elapses.  Returns whether it signaled.
    fn wait_fence(&self, fence: &Self::Fence, timeout: Duration) -> bool;
    fn destroy_fence(&self, fence: &Self::Fence);

    fn map_for_read<'a>(&'a self, staging: &'a Self::Staging) -> Result<MappedRegion<'a>, Error>;
    fn unmap(&self, staging: &Self::Staging);
}
