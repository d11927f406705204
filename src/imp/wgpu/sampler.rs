// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::device::{AddressMode, FilterMode, SamplerDescriptor};

impl AddressMode {
    const fn wgpu(&self) -> wgpu::AddressMode {
        match self {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
        }
    }
}

impl FilterMode {
    const fn wgpu(&self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl SamplerDescriptor {
    pub(super) fn wgpu_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: None,
            address_mode_u: self.address_mode_u.wgpu(),
            address_mode_v: self.address_mode_v.wgpu(),
            address_mode_w: self.address_mode_w.wgpu(),
            mag_filter: self.mag_filter.wgpu(),
            min_filter: self.min_filter.wgpu(),
            mipmap_filter: self.mipmap_filter.wgpu(),
            lod_min_clamp: self.lod_min_clamp,
            lod_max_clamp: self.lod_max_clamp,
            compare: None,
            //wgpu spells "no anisotropy" as 1
            anisotropy_clamp: self.max_anisotropy.max(1),
            border_color: None,
        }
    }
}
