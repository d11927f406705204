/*! native_texture manages a GPU-resident 2D texture backed by a native graphics device.

A [`NativeTexture`] owns exactly one texture and one sampler on some [`RenderDevice`].  It can
be read back to host memory with a blocking call, and it is destroyed through an external
[`DisposalScheduler`] rather than at the moment you ask for it, because the GPU may still be
consuming it.

| Concern            | Where                               | Notes                                                         |
|--------------------|-------------------------------------|---------------------------------------------------------------|
| Allocation         | [`NativeTexture::new`]              | Eager.  Single mip, single layer.  Fails only if the device refuses. |
| Sampling           | [`device::SamplerDescriptor`]       | Clamped, linear, LOD pinned to level 0.                       |
| Readback           | [`NativeTexture::extract_data`]     | Blocks up to [`readback::FENCE_TIMEOUT`].  A stall returns a blank image. |
| Destruction        | [`NativeTexture::dispose`]          | Deferred through a [`DisposalScheduler`].                     |
| Upload             | [`upload::TextureUpload`]           | Intentionally inert.  This texture is only ever written by the GPU. |

# Backends

The device is a narrow capability trait, [`RenderDevice`].  With the default `backend_wgpu`
feature, [`WgpuDevice`] implements it on top of [wgpu](https://wgpu.rs), so we inherit DX12,
Vulkan, Metal and friends.  Row pitch on that backend is padded to
256 bytes, which is exactly the situation the readback path has to undo.

# Example

```no_run
# #[cfg(feature = "backend_wgpu")]
# fn main() -> Result<(), native_texture::Error> {
use std::sync::Arc;
use native_texture::{DisposalQueue, NativeTexture, TextureConfig, WgpuDevice};
use native_texture::pixel_formats::Unorm4;

let device = Arc::new(WgpuDevice::new_blocking(&Default::default())?);
let disposals = Arc::new(DisposalQueue::new());
let texture = NativeTexture::new(device.clone(), disposals.clone(), TextureConfig::render_target(256, 256, "capture"))?;

// ... render into the texture ...

let image = texture.extract_data::<Unorm4>(false)?;
assert_eq!(image.width(), 256);

texture.dispose();
device.drain_disposals_when_idle(&disposals);
# Ok(())
# }
# #[cfg(not(feature = "backend_wgpu"))]
# fn main() {}
```
*/

pub mod device;
pub mod disposal;
mod error;
mod imp;
pub mod pixel_buffer;
pub mod pixel_formats;
pub mod readback;
pub mod texture;
pub mod upload;

pub use device::RenderDevice;
pub use disposal::{DisposalQueue, DisposalScheduler, OwnerToken};
pub use error::{Error, ResourceKind};
pub use pixel_buffer::{Image, PixelBuffer, Texel};
pub use readback::ReadbackOptions;
pub use texture::{NativeTexture, ResourcePair, TextureConfig};

#[cfg(feature = "backend_wgpu")]
pub use imp::{WgpuDevice, WgpuDeviceOptions, WgpuFence, WgpuStaging, WgpuTexture};

#[cfg(all(test, feature = "backend_wgpu"))]
mod tests {
    use super::*;

    #[test]
    fn wgpu_handles_are_nameable_from_the_root() {
        use std::any::type_name;
        assert_eq!(type_name::<<WgpuDevice as RenderDevice>::Texture>(), type_name::<WgpuTexture>());
        assert_eq!(type_name::<<WgpuDevice as RenderDevice>::Staging>(), type_name::<WgpuStaging>());
        assert_eq!(type_name::<<WgpuDevice as RenderDevice>::Fence>(), type_name::<WgpuFence>());
    }
}
