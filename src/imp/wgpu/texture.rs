// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{MappedRegion, RenderDevice, SamplerDescriptor, TextureDescriptor, TextureInfo};
use crate::imp::wgpu::bound_device::WgpuDevice;
use crate::pixel_formats::TextureFormat;
use crate::readback::FENCE_TIMEOUT;
use crate::{Error, ResourceKind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// A live wgpu texture, remembering the format and label it was created with.
#[derive(Debug)]
pub struct WgpuTexture {
    texture: wgpu::Texture,
    format: TextureFormat,
    label: String,
}

impl WgpuTexture {
    /// For binding into passes outside this crate.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }
}

/**
The staging copy on wgpu.

Textures cannot be mapped on wgpu, so the staging copy is a `MAP_READ` buffer laid out like
the texture, with each row padded to [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
*/
#[derive(Debug)]
pub struct WgpuStaging {
    buffer: wgpu::Buffer,
    info: TextureInfo,
    bytes_per_row: u32,
}

/// Signaled from `on_submitted_work_done` for the submission it was handed to.
#[derive(Debug)]
pub struct WgpuFence {
    signal: Sender<()>,
    signaled: Receiver<()>,
}

fn aligned_bytes_per_row(width: u32, format: TextureFormat) -> u32 {
    let unaligned = width * format.bytes_per_pixel();
    unaligned.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

impl RenderDevice for WgpuDevice {
    type Texture = WgpuTexture;
    type Sampler = wgpu::Sampler;
    type Staging = WgpuStaging;
    type CommandList = wgpu::CommandEncoder;
    type Fence = WgpuFence;

    fn create_texture_2d(&self, descriptor: &TextureDescriptor<'_>) -> Result<WgpuTexture, Error> {
        let texture = self.allocating(ResourceKind::Texture, |device| {
            device.create_texture(&wgpu::TextureDescriptor {
                label: Some(descriptor.label),
                size: wgpu::Extent3d {
                    width: descriptor.width,
                    height: descriptor.height,
                    depth_or_array_layers: descriptor.array_layers,
                },
                mip_level_count: descriptor.mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: descriptor.format.wgpu_format(),
                usage: descriptor.usage.wgpu_usage(),
                view_formats: &[],
            })
        })?;
        Ok(WgpuTexture {
            texture,
            format: descriptor.format,
            label: descriptor.label.to_string(),
        })
    }

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<wgpu::Sampler, Error> {
        self.allocating(ResourceKind::Sampler, |device| {
            device.create_sampler(&descriptor.wgpu_descriptor())
        })
    }

    fn texture_info(&self, texture: &WgpuTexture) -> TextureInfo {
        TextureInfo {
            width: texture.texture.width(),
            height: texture.texture.height(),
            mip_level_count: texture.texture.mip_level_count(),
            array_layers: texture.texture.depth_or_array_layers(),
            format: texture.format,
        }
    }

    fn texture_name(&self, texture: &WgpuTexture) -> Option<String> {
        if texture.label.is_empty() {
            None
        } else {
            Some(texture.label.clone())
        }
    }

    fn destroy_texture(&self, texture: &WgpuTexture) {
        texture.texture.destroy();
    }

    fn destroy_sampler(&self, _sampler: &wgpu::Sampler) {
        //wgpu has no explicit sampler destruction; it goes with the last handle
    }

    fn create_staging_texture(&self, info: &TextureInfo) -> Result<WgpuStaging, Error> {
        let bytes_per_row = aligned_bytes_per_row(info.width, info.format);
        let size = bytes_per_row as u64 * info.height as u64 * info.array_layers as u64;
        let buffer = self.allocating(ResourceKind::StagingCopy, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback_staging"),
                size,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        })?;
        Ok(WgpuStaging {
            buffer,
            info: *info,
            bytes_per_row,
        })
    }

    fn staging_info(&self, staging: &WgpuStaging) -> TextureInfo {
        staging.info
    }

    fn destroy_staging(&self, staging: &WgpuStaging) {
        staging.buffer.destroy();
    }

    fn create_command_list(&self) -> wgpu::CommandEncoder {
        self.device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback"),
            })
    }

    fn record_copy(&self, list: &mut wgpu::CommandEncoder, source: &WgpuTexture, destination: &WgpuStaging) {
        let info = destination.info;
        list.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &source.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &destination.buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(destination.bytes_per_row),
                    rows_per_image: Some(info.height),
                },
            },
            wgpu::Extent3d {
                width: info.width,
                height: info.height,
                depth_or_array_layers: info.array_layers,
            },
        );
    }

    fn create_fence(&self) -> Result<WgpuFence, Error> {
        let (signal, signaled) = mpsc::channel();
        Ok(WgpuFence { signal, signaled })
    }

    fn submit(&self, list: wgpu::CommandEncoder, fence: &WgpuFence) {
        self.queue().submit(std::iter::once(list.finish()));
        let signal = fence.signal.clone();
        self.queue().on_submitted_work_done(move || {
            let _ = signal.send(());
        });
    }

    fn wait_fence(&self, fence: &WgpuFence, timeout: Duration) -> bool {
        self.wait_for_callback(&fence.signaled, timeout).is_some()
    }

    fn destroy_fence(&self, _fence: &WgpuFence) {}

    fn map_for_read<'a>(&'a self, staging: &'a WgpuStaging) -> Result<MappedRegion<'a>, Error> {
        let (sender, receiver) = mpsc::channel();
        staging
            .buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let _ = sender.send(result);
            });
        // the copy has already finished, so this only waits on the map itself
        match self.wait_for_callback(&receiver, FENCE_TIMEOUT) {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(Error::Map(e.to_string())),
            None => return Err(Error::Map("map did not complete".to_string())),
        }
        let view = staging.buffer.slice(..).get_mapped_range();
        Ok(MappedRegion::new(view, staging.bytes_per_row as usize))
    }

    fn unmap(&self, staging: &WgpuStaging) {
        staging.buffer.unmap();
    }
}
