// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! The texture resource holder.

use crate::device::{RenderDevice, SamplerDescriptor, TextureDescriptor};
use crate::disposal::{DisposalScheduler, OwnerToken};
use crate::pixel_formats::{PixelElement, TextureFormat, TextureUsage};
use crate::readback::{self, ReadbackOptions};
use crate::{Error, Image};
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Returned by [`NativeTexture::identifier`] when there is nothing to name.
pub const UNAVAILABLE_IDENTIFIER: &str = "<unavailable>";

/// Construction parameters for a [`NativeTexture`].
#[derive(Debug, Clone, Copy)]
pub struct TextureConfig<'a> {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub debug_name: &'a str,
}

impl<'a> TextureConfig<'a> {
    /// An RGBA8 texture that is rendered into and sampled.
    pub const fn render_target(width: u32, height: u32, debug_name: &'a str) -> Self {
        TextureConfig {
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            usage: TextureUsage::RENDER_TARGET.union(TextureUsage::SAMPLED),
            debug_name,
        }
    }
}

/// A texture handle and its sampler, bound together as one unit of GPU-visible state.
pub struct ResourcePair<D: RenderDevice> {
    texture: D::Texture,
    sampler: D::Sampler,
}

impl<D: RenderDevice> ResourcePair<D> {
    pub fn texture(&self) -> &D::Texture {
        &self.texture
    }

    pub fn sampler(&self) -> &D::Sampler {
        &self.sampler
    }
}

impl<D: RenderDevice> Debug for ResourcePair<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePair")
            .field("texture", &self.texture)
            .field("sampler", &self.sampler)
            .finish()
    }
}

/// State shared with the disposal action, which outlives the call to `dispose`.
struct Shared<D: RenderDevice> {
    // `None` together with `available == false`, always flipped under this lock
    resources: Mutex<Option<Arc<ResourcePair<D>>>>,
    available: AtomicBool,
    disposed: AtomicBool,
}

impl<D: RenderDevice> Shared<D> {
    fn resources(&self) -> MutexGuard<'_, Option<Arc<ResourcePair<D>>>> {
        self.resources.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/**
A GPU-resident 2D texture with one sampler, created eagerly and destroyed lazily.

# Lifecycle

* [`NativeTexture::new`] allocates the texture and sampler immediately.
* [`NativeTexture::dispose`] marks the texture disposed right away, but only *schedules*
  destruction.  Until the scheduler runs the action, [`NativeTexture::resource_list`] still
  returns the pair, so work already queued against it stays valid.
* Once the action has run, [`NativeTexture::is_available`] is `false` forever and the
  resource list is empty.

Dropping a `NativeTexture` disposes it.

# Width and height are bookkeeping

[`NativeTexture::set_width`] and [`NativeTexture::set_height`] change the recorded size
and nothing else.  The GPU allocation keeps the size it was created with, while
[`NativeTexture::byte_size`] and the blank image returned by a timed-out readback follow
the recorded size.  Do not use them to resize.
*/
pub struct NativeTexture<D: RenderDevice> {
    device: Arc<D>,
    scheduler: Arc<dyn DisposalScheduler>,
    shared: Arc<Shared<D>>,
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsage,
    debug_name: String,
}

impl<D: RenderDevice> NativeTexture<D> {
    pub fn new(
        device: Arc<D>,
        scheduler: Arc<dyn DisposalScheduler>,
        config: TextureConfig<'_>,
    ) -> Result<Self, Error> {
        let descriptor = TextureDescriptor {
            label: config.debug_name,
            width: config.width,
            height: config.height,
            mip_level_count: 1,
            array_layers: 1,
            format: config.format,
            usage: config.usage | TextureUsage::COPY_SRC,
        };
        let texture = device.create_texture_2d(&descriptor)?;
        let sampler = match device.create_sampler(&SamplerDescriptor::PINNED_LINEAR) {
            Ok(sampler) => sampler,
            Err(e) => {
                // nothing has seen the texture yet, so it can go right away
                device.destroy_texture(&texture);
                return Err(e);
            }
        };
        logwise::trace_sync!(
            "created texture {name} {w}x{h}",
            name = logwise::privacy::LogIt(&config.debug_name),
            w = config.width,
            h = config.height
        );

        Ok(Self {
            device,
            scheduler,
            shared: Arc::new(Shared {
                resources: Mutex::new(Some(Arc::new(ResourcePair { texture, sampler }))),
                available: AtomicBool::new(true),
                disposed: AtomicBool::new(false),
            }),
            width: config.width,
            height: config.height,
            format: config.format,
            usage: config.usage,
            debug_name: config.debug_name.to_string(),
        })
    }

    /// The current pair, or nothing once disposal has completed.
    ///
    /// Don't hold on to the result across [`NativeTexture::dispose`].
    pub fn resource_list(&self) -> Vec<Arc<ResourcePair<D>>> {
        self.shared.resources().iter().cloned().collect()
    }

    /// A diagnostic name for the underlying texture, or [`UNAVAILABLE_IDENTIFIER`].
    pub fn identifier(&self) -> String {
        self.shared
            .resources()
            .as_ref()
            .and_then(|pair| self.device.texture_name(&pair.texture))
            .unwrap_or_else(|| UNAVAILABLE_IDENTIFIER.to_string())
    }

    /// `width * height * 4`, from the recorded size.
    ///
    /// An accounting estimate that assumes 4 bytes per pixel whatever the format is.
    pub fn byte_size(&self) -> u64 {
        self.width as u64 * self.height as u64 * 4
    }

    pub fn is_available(&self) -> bool {
        self.shared.available.load(Ordering::Acquire)
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Changes the recorded width only.  See the type docs.
    pub fn set_width(&mut self, width: u32) {
        self.width = width;
    }

    /// Changes the recorded height only.  See the type docs.
    pub fn set_height(&mut self, height: u32) {
        self.height = height;
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /**
    Requests destruction.  Idempotent.

    The first call marks the texture disposed and schedules an action that destroys the
    sampler and texture, clears the pair, and marks the texture unavailable.  When that
    happens is up to the scheduler.
    */
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let shared = self.shared.clone();
        let device = self.device.clone();
        let owner = OwnerToken::new(self.debug_name.clone());
        logwise::trace_sync!(
            "scheduling disposal of {owner}",
            owner = logwise::privacy::LogIt(&owner)
        );
        self.scheduler.schedule_disposal(
            Box::new(move || {
                let mut resources = shared.resources();
                if let Some(pair) = resources.take() {
                    device.destroy_sampler(&pair.sampler);
                    device.destroy_texture(&pair.texture);
                }
                shared.available.store(false, Ordering::Release);
            }),
            owner,
        );
    }

    /**
    Reads the texture back to host memory, blocking the calling thread.

    `P` decides how mapped bytes are interpreted; the result is always [`Image`].  If the GPU
    does not finish within [`readback::FENCE_TIMEOUT`], this returns a blank image of the
    recorded size instead of an error.

    # Errors
    [`Error::Disposed`] after [`NativeTexture::dispose`], [`Error::ZeroSizedElement`] if `P`
    has no size, and allocation or mapping failures from the device.
    */
    pub fn extract_data<P: PixelElement>(&self, flip_vertical: bool) -> Result<Image, Error> {
        self.extract_data_with::<P>(&ReadbackOptions {
            flip_vertical,
            ..ReadbackOptions::default()
        })
    }

    /// [`NativeTexture::extract_data`] with every knob exposed.
    pub fn extract_data_with<P: PixelElement>(&self, options: &ReadbackOptions) -> Result<Image, Error> {
        if self.is_disposed() {
            return Err(Error::Disposed);
        }
        let pair = self.shared.resources().clone().ok_or(Error::Disposed)?;
        readback::extract_data::<D, P>(
            &*self.device,
            &pair.texture,
            (self.width, self.height),
            options,
        )
    }
}

impl<D: RenderDevice> Drop for NativeTexture<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<D: RenderDevice> Debug for NativeTexture<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeTexture")
            .field("debug_name", &self.debug_name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("usage", &self.usage)
            .field("available", &self.is_available())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
