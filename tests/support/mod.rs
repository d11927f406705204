// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! An in-memory [`RenderDevice`] for tests.
//!
//! Textures are tightly packed byte vectors.  Staging copies are laid out with a configurable
//! row alignment, so the same test can run against a backend that pads rows and one that
//! doesn't.  Fences either signal on submit or never signal at all; a fence that never signals
//! advances a virtual clock by the requested timeout instead of sleeping.
#![allow(dead_code)]

use native_texture::device::{MappedRegion, RenderDevice, SamplerDescriptor, TextureDescriptor, TextureInfo};
use native_texture::pixel_formats::{TextureFormat, TextureUsage};
use native_texture::{DisposalQueue, Error, NativeTexture, ResourceKind, TextureConfig};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceBehavior {
    Signals,
    NeverSignals,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub textures_created: AtomicUsize,
    pub textures_destroyed: AtomicUsize,
    pub samplers_created: AtomicUsize,
    pub samplers_destroyed: AtomicUsize,
    pub stagings_created: AtomicUsize,
    pub stagings_destroyed: AtomicUsize,
    pub fences_created: AtomicUsize,
    pub fences_destroyed: AtomicUsize,
    pub maps: AtomicUsize,
    pub unmaps: AtomicUsize,
}

impl Counters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct FakeTexture {
    info: TextureInfo,
    name: String,
    pixels: Arc<Mutex<Vec<u8>>>,
    destroyed: AtomicBool,
}

#[derive(Debug)]
pub struct FakeSampler {
    pub descriptor: SamplerDescriptor,
    destroyed: AtomicBool,
}

#[derive(Debug)]
pub struct FakeStaging {
    info: TextureInfo,
    row_pitch: usize,
    bytes: Arc<Mutex<Vec<u8>>>,
}

pub struct FakeCommandList {
    copies: Vec<(Arc<Mutex<Vec<u8>>>, TextureInfo, Arc<Mutex<Vec<u8>>>, usize)>,
}

pub struct FakeFence {
    signaled: AtomicBool,
}

#[derive(Debug)]
pub struct FakeDevice {
    row_alignment: usize,
    fence_behavior: FenceBehavior,
    refuse_textures: bool,
    pub counters: Counters,
    virtual_clock: Mutex<Duration>,
    requested_timeouts: Mutex<Vec<Duration>>,
}

impl FakeDevice {
    /// Rows in staging copies are tightly packed.
    pub fn unpadded() -> Self {
        Self::with_alignment(1)
    }

    /// Rows in staging copies are padded to 256 bytes, like wgpu.
    pub fn padded() -> Self {
        Self::with_alignment(256)
    }

    pub fn with_alignment(row_alignment: usize) -> Self {
        FakeDevice {
            row_alignment,
            fence_behavior: FenceBehavior::Signals,
            refuse_textures: false,
            counters: Counters::default(),
            virtual_clock: Mutex::new(Duration::ZERO),
            requested_timeouts: Mutex::new(Vec::new()),
        }
    }

    pub fn stalled(mut self) -> Self {
        self.fence_behavior = FenceBehavior::NeverSignals;
        self
    }

    pub fn refusing_textures(mut self) -> Self {
        self.refuse_textures = true;
        self
    }

    pub fn elapsed(&self) -> Duration {
        *self.virtual_clock.lock().unwrap()
    }

    pub fn requested_timeouts(&self) -> Vec<Duration> {
        self.requested_timeouts.lock().unwrap().clone()
    }

    /// Stands in for a render pass: writes `pixel(x, y)` into every texel.
    pub fn render<const N: usize>(&self, texture: &FakeTexture, pixel: impl Fn(u32, u32) -> [u8; N]) {
        assert_eq!(N as u32, texture.info.format.bytes_per_pixel());
        let mut pixels = texture.pixels.lock().unwrap();
        for y in 0..texture.info.height {
            for x in 0..texture.info.width {
                let offset = (y as usize * texture.info.width as usize + x as usize) * N;
                pixels[offset..offset + N].copy_from_slice(&pixel(x, y));
            }
        }
    }

    pub fn is_destroyed(texture: &FakeTexture) -> bool {
        texture.destroyed.load(Ordering::SeqCst)
    }

    fn row_pitch(&self, info: &TextureInfo) -> usize {
        let row = info.width as usize * info.format.bytes_per_pixel() as usize;
        row.div_ceil(self.row_alignment) * self.row_alignment
    }
}

impl RenderDevice for FakeDevice {
    type Texture = FakeTexture;
    type Sampler = FakeSampler;
    type Staging = FakeStaging;
    type CommandList = FakeCommandList;
    type Fence = FakeFence;

    fn create_texture_2d(&self, descriptor: &TextureDescriptor<'_>) -> Result<FakeTexture, Error> {
        if self.refuse_textures {
            return Err(Error::Allocation {
                resource: ResourceKind::Texture,
                reason: "out of memory".to_string(),
            });
        }
        self.counters.textures_created.fetch_add(1, Ordering::SeqCst);
        let info = TextureInfo {
            width: descriptor.width,
            height: descriptor.height,
            mip_level_count: descriptor.mip_level_count,
            array_layers: descriptor.array_layers,
            format: descriptor.format,
        };
        let len = descriptor.width as usize * descriptor.height as usize * descriptor.format.bytes_per_pixel() as usize;
        Ok(FakeTexture {
            info,
            name: descriptor.label.to_string(),
            pixels: Arc::new(Mutex::new(vec![0; len])),
            destroyed: AtomicBool::new(false),
        })
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<FakeSampler, Error> {
        self.counters.samplers_created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeSampler {
            descriptor: *descriptor,
            destroyed: AtomicBool::new(false),
        })
    }

    fn texture_info(&self, texture: &FakeTexture) -> TextureInfo {
        texture.info
    }

    fn texture_name(&self, texture: &FakeTexture) -> Option<String> {
        Some(texture.name.clone())
    }

    fn destroy_texture(&self, texture: &FakeTexture) {
        assert!(!texture.destroyed.swap(true, Ordering::SeqCst), "texture destroyed twice");
        self.counters.textures_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn destroy_sampler(&self, sampler: &FakeSampler) {
        assert!(!sampler.destroyed.swap(true, Ordering::SeqCst), "sampler destroyed twice");
        self.counters.samplers_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn create_staging_texture(&self, info: &TextureInfo) -> Result<FakeStaging, Error> {
        self.counters.stagings_created.fetch_add(1, Ordering::SeqCst);
        let row_pitch = self.row_pitch(info);
        Ok(FakeStaging {
            info: *info,
            row_pitch,
            // padding is garbage until a copy lands
            bytes: Arc::new(Mutex::new(vec![0xCD; row_pitch * info.height as usize])),
        })
    }

    fn staging_info(&self, staging: &FakeStaging) -> TextureInfo {
        staging.info
    }

    fn destroy_staging(&self, _staging: &FakeStaging) {
        self.counters.stagings_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn create_command_list(&self) -> FakeCommandList {
        FakeCommandList { copies: Vec::new() }
    }

    fn record_copy(&self, list: &mut FakeCommandList, source: &FakeTexture, destination: &FakeStaging) {
        list.copies.push((
            source.pixels.clone(),
            source.info,
            destination.bytes.clone(),
            destination.row_pitch,
        ));
    }

    fn create_fence(&self) -> Result<FakeFence, Error> {
        self.counters.fences_created.fetch_add(1, Ordering::SeqCst);
        Ok(FakeFence {
            signaled: AtomicBool::new(false),
        })
    }

    fn submit(&self, list: FakeCommandList, fence: &FakeFence) {
        if self.fence_behavior == FenceBehavior::NeverSignals {
            return;
        }
        for (source, info, destination, row_pitch) in list.copies {
            let source = source.lock().unwrap();
            let mut destination = destination.lock().unwrap();
            let row = info.width as usize * info.format.bytes_per_pixel() as usize;
            for y in 0..info.height as usize {
                destination[y * row_pitch..y * row_pitch + row].copy_from_slice(&source[y * row..(y + 1) * row]);
            }
        }
        fence.signaled.store(true, Ordering::SeqCst);
    }

    fn wait_fence(&self, fence: &FakeFence, timeout: Duration) -> bool {
        self.requested_timeouts.lock().unwrap().push(timeout);
        if fence.signaled.load(Ordering::SeqCst) {
            true
        } else {
            *self.virtual_clock.lock().unwrap() += timeout;
            false
        }
    }

    fn destroy_fence(&self, _fence: &FakeFence) {
        self.counters.fences_destroyed.fetch_add(1, Ordering::SeqCst);
    }

    fn map_for_read<'a>(&'a self, staging: &'a FakeStaging) -> Result<MappedRegion<'a>, Error> {
        self.counters.maps.fetch_add(1, Ordering::SeqCst);
        let bytes = staging.bytes.lock().unwrap().clone();
        Ok(MappedRegion::new(bytes, staging.row_pitch))
    }

    fn unmap(&self, _staging: &FakeStaging) {
        self.counters.unmaps.fetch_add(1, Ordering::SeqCst);
    }
}

/// A texture config for `width x height` RGBA8, named `name`.
pub fn rgba8(width: u32, height: u32, name: &str) -> TextureConfig<'_> {
    TextureConfig {
        width,
        height,
        format: TextureFormat::Rgba8Unorm,
        usage: TextureUsage::RENDER_TARGET,
        debug_name: name,
    }
}

/// A fresh holder on `device`, disposing into `queue`.
pub fn texture_on(device: &Arc<FakeDevice>, queue: &Arc<DisposalQueue>, config: TextureConfig<'_>) -> NativeTexture<FakeDevice> {
    NativeTexture::new(device.clone(), queue.clone(), config).expect("fake device allocates")
}

/// Paints the live texture behind `texture`.
pub fn paint<const N: usize>(texture: &NativeTexture<FakeDevice>, pixel: impl Fn(u32, u32) -> [u8; N]) {
    let pair = texture.resource_list().pop().expect("texture is available");
    texture.device().render(pair.texture(), pixel);
}
