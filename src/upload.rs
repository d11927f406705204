// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! The host-to-GPU upload contract.

[`crate::NativeTexture`] is only ever written by the GPU (it is a render target), so its
implementation accepts and discards everything.  Writes are not errors; they simply have no
effect.  Code that needs to stream pixels in wants a different kind of texture.
*/

use crate::NativeTexture;
use crate::device::RenderDevice;
use crate::pixel_formats::PixelElement;

pub trait TextureUpload {
    /// Stages pixels for a later [`TextureUpload::upload`].
    fn set_data<P: PixelElement>(&self, data: &[P]);
    /// Pushes staged pixels to the GPU.  Returns whether anything was uploaded.
    fn upload(&self) -> bool;
    fn flush_uploads(&self);
    fn upload_complete(&self) -> bool;
}

impl<D: RenderDevice> TextureUpload for NativeTexture<D> {
    fn set_data<P: PixelElement>(&self, _data: &[P]) {}

    fn upload(&self) -> bool {
        false
    }

    fn flush_uploads(&self) {}

    fn upload_complete(&self) -> bool {
        false
    }
}
