use crate::Error;
use crate::Image;
use png::{BitDepth, ColorType};
use std::io::Write;

impl Image {
    /// Encodes this image as an 8-bit RGBA PNG.
    pub fn encode_png<W: Write>(&self, w: W) -> Result<(), Error> {
        let mut encoder = png::Encoder::new(w, self.width(), self.height());
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(bytemuck::cast_slice(self.pixels()))?;
        writer.finish()?;
        Ok(())
    }
}
