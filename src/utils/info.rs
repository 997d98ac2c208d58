use crate::decoders::png::chunks::{tag_name, Chunk};
use crate::utils::image::{DecodedImage, Image};
use std::fmt::{Display, Formatter};

/// Human-readable summary of a decoded image: header, chunks and frames.
pub struct PngInfo<'a> {
    decoded: &'a DecodedImage,
}

impl<'a> From<&'a DecodedImage> for PngInfo<'a> {
    fn from(decoded: &'a DecodedImage) -> Self {
        PngInfo { decoded }
    }
}

impl Display for PngInfo<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let header = &self.decoded.header;
        let chunks = &self.decoded.chunks;

        writeln!(f, "Dimensions: {}x{}", header.width, header.height)?;
        writeln!(f, "Color type: {:?}", header.color_type)?;
        writeln!(f, "Bit depth: {}", header.bit_depth)?;
        writeln!(f, "Interlaced: {}", header.interlace)?;

        writeln!(f, "====================")?;

        writeln!(f, "Chunks:")?;
        for tag in chunks.tags() {
            writeln!(f, "  {}: {}", tag_name(&tag), chunks.all(tag).len())?;
        }

        if let Some(palette) = chunks.palette() {
            writeln!(f, "Palette entries: {}", palette.len())?;
        }

        if let Some(gamma) = chunks.gamma() {
            writeln!(f, "Gamma: {}", gamma)?;
        }

        for tag in chunks.tags() {
            for chunk in chunks.all(tag) {
                match chunk {
                    Chunk::Text(text) => writeln!(f, "Text: {} = {}", text.keyword, text.text)?,
                    Chunk::CompressedText(text) => match text.decompress() {
                        Ok(body) => writeln!(f, "Text: {} = {}", text.keyword, body)?,
                        Err(e) => writeln!(f, "Text: {} = <{}>", text.keyword, e)?,
                    },
                    Chunk::InternationalText(text) => match text.text() {
                        Ok(body) => writeln!(f, "Text [{}]: {} = {}", text.language_tag, text.keyword, body)?,
                        Err(e) => writeln!(f, "Text [{}]: {} = <{}>", text.language_tag, text.keyword, e)?,
                    },
                    Chunk::Time(time) => writeln!(
                        f,
                        "Modified: {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                        time.year, time.month, time.day, time.hour, time.minute, time.second
                    )?,
                    Chunk::Unknown { tag, data } => {
                        writeln!(f, "Undecodable {} chunk: {} bytes", tag_name(tag), data.len())?
                    }
                    _ => {}
                }
            }
        }

        if let Image::Animated(animation) = &self.decoded.image {
            writeln!(f, "====================")?;

            let plays = if animation.is_infinite() {
                "infinite".to_string()
            } else {
                animation.num_plays.to_string()
            };

            writeln!(f, "Frames: {} (acTL: {}), plays: {}", animation.frame_count(), animation.num_frames, plays)?;

            for (i, frame) in animation.frames().iter().enumerate() {
                writeln!(
                    f,
                    "  #{}: {}x{} at {},{}, delay {}/{} ({} ms), dispose {:?}, blend {:?}",
                    i,
                    frame.width(),
                    frame.height(),
                    frame.x_offset,
                    frame.y_offset,
                    frame.delay_num,
                    frame.delay_den,
                    frame.delay().as_millis(),
                    frame.dispose_op,
                    frame.blend_op
                )?;
            }
        }

        Ok(())
    }
}
