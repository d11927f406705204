// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;

/// The kind of GPU object a device refused to allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    Sampler,
    StagingCopy,
    Fence,
    Device,
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Texture => write!(f, "texture"),
            ResourceKind::Sampler => write!(f, "sampler"),
            ResourceKind::StagingCopy => write!(f, "staging copy"),
            ResourceKind::Fence => write!(f, "fence"),
            ResourceKind::Device => write!(f, "device"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("device refused to allocate {resource}: {reason}")]
    Allocation {
        resource: ResourceKind,
        reason: String,
    },
    #[error("texture has been disposed")]
    Disposed,
    #[error("failed to map staging copy for read: {0}")]
    Map(String),
    #[error("row pitch of {row_pitch} bytes cannot hold {width} pixels of {element_size} bytes")]
    RowPitchTooSmall {
        row_pitch: usize,
        width: u32,
        element_size: usize,
    },
    #[error("mapped region holds {len} bytes but its layout needs {expected}")]
    MappedRegionTooSmall { len: usize, expected: usize },
    #[error("readback element type has zero size")]
    ZeroSizedElement,
    #[cfg(feature = "backend_wgpu")]
    #[error("no suitable adapter: {0}")]
    NoSuchAdapter(#[from] wgpu::RequestAdapterError),
    #[error(transparent)]
    Png(#[from] png::EncodingError),
    #[cfg(feature = "backend_wgpu")]
    #[error(transparent)]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

impl Error {
    pub(crate) fn allocation(resource: ResourceKind, reason: impl Display) -> Self {
        Error::Allocation {
            resource,
            reason: reason.to_string(),
        }
    }
}
