// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
mod bound_device;
mod pixel_format;
mod sampler;
mod texture;

pub use bound_device::{WgpuDevice, WgpuDeviceOptions};
pub use texture::{WgpuFence, WgpuStaging, WgpuTexture};
