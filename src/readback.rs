// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Blocking GPU-to-host readback.

The live texture may not be host-mappable, so readback copies it into a staging copy, waits
on a fence, maps the staging copy and undoes the device's row padding.  Every GPU object
created here is owned by a guard and released on every exit path, including the timeout.
*/

use crate::device::{MappedRegion, RenderDevice};
use crate::pixel_formats::PixelElement;
use crate::{Error, Image, PixelBuffer};
use std::time::Duration;

/// How long readback waits for the copy to finish before giving up.
pub const FENCE_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq)]
pub struct ReadbackOptions {
    /// Mirror the image so the last row comes first.
    pub flip_vertical: bool,
    /// Single attempt; there is no retry.
    pub fence_timeout: Duration,
}

impl Default for ReadbackOptions {
    fn default() -> Self {
        ReadbackOptions {
            flip_vertical: false,
            fence_timeout: FENCE_TIMEOUT,
        }
    }
}

struct StagingGuard<'d, D: RenderDevice> {
    device: &'d D,
    staging: D::Staging,
}

impl<D: RenderDevice> Drop for StagingGuard<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_staging(&self.staging);
    }
}

struct FenceGuard<'d, D: RenderDevice> {
    device: &'d D,
    fence: D::Fence,
}

impl<D: RenderDevice> Drop for FenceGuard<'_, D> {
    fn drop(&mut self) {
        self.device.destroy_fence(&self.fence);
    }
}

/// Unmaps on drop, after releasing the mapped view.
struct MappingGuard<'d, D: RenderDevice> {
    device: &'d D,
    staging: &'d D::Staging,
    region: Option<MappedRegion<'d>>,
}

impl<'d, D: RenderDevice> MappingGuard<'d, D> {
    fn map(device: &'d D, staging: &'d D::Staging) -> Result<Self, Error> {
        let region = device.map_for_read(staging)?;
        Ok(MappingGuard {
            device,
            staging,
            region: Some(region),
        })
    }

    fn region(&self) -> &MappedRegion<'d> {
        self.region.as_ref().expect("region is only taken in drop")
    }
}

impl<D: RenderDevice> Drop for MappingGuard<'_, D> {
    fn drop(&mut self) {
        drop(self.region.take());
        self.device.unmap(self.staging);
    }
}

/**
Reads `texture` back as an [`Image`].

`declared` is the holder's recorded size, used only for the blank image returned when the
fence does not signal in time.  Everything else comes from the device.
*/
pub(crate) fn extract_data<D: RenderDevice, P: PixelElement>(
    device: &D,
    texture: &D::Texture,
    declared: (u32, u32),
    options: &ReadbackOptions,
) -> Result<Image, Error> {
    if size_of::<P>() == 0 {
        return Err(Error::ZeroSizedElement);
    }
    let info = device.texture_info(texture);
    if info.is_empty() {
        logwise::warn_sync!("Skipping readback for zero-sized texture");
        return Ok(Image::blank(info.width, info.height));
    }

    let staging = StagingGuard {
        device,
        staging: device.create_staging_texture(&info)?,
    };
    let mut commands = device.create_command_list();
    device.record_copy(&mut commands, texture, &staging.staging);
    let fence = FenceGuard {
        device,
        fence: device.create_fence()?,
    };
    device.submit(commands, &fence.fence);

    let wait = logwise::perfwarn_begin!("readback fence wait");
    let signaled = device.wait_fence(&fence.fence, options.fence_timeout);
    drop(wait);
    if !signaled {
        logwise::error_sync!(
            "Readback fence did not signal within {timeout}; returning a blank {w}x{h} image",
            timeout = logwise::privacy::LogIt(&options.fence_timeout),
            w = declared.0,
            h = declared.1
        );
        return Ok(Image::blank(declared.0, declared.1));
    }

    let mapping = MappingGuard::map(device, &staging.staging)?;
    let region = mapping.region();
    let rows = device.staging_info(&staging.staging).height;
    let element_size = size_of::<P>();
    let stride = (region.row_pitch() / element_size) as u32;
    if stride < info.width {
        return Err(Error::RowPitchTooSmall {
            row_pitch: region.row_pitch(),
            width: info.width,
            element_size,
        });
    }
    logwise::trace_sync!(
        "readback mapped {len} bytes, pitch {pitch}, stride {stride}",
        len = region.size_in_bytes(),
        pitch = region.row_pitch(),
        stride = stride
    );

    let mut buffer = PixelBuffer::<P>::from_mapped_rows(region.bytes(), region.row_pitch(), stride, rows)?;
    drop(mapping);

    if options.flip_vertical {
        buffer.flip_vertical();
    }
    if buffer.width() != info.width {
        buffer = buffer.crop(info.width, info.height.min(buffer.height()));
    }
    Ok(buffer.into_unorm4())
}
