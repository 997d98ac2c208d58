use crate::utils::bytereader::ByteReader;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::options::DecoderOptions;

/// Length of the IHDR fields this decoder interprets.
pub const HEADER_LENGTH: usize = 13;

/// Longest IHDR payload accepted when strict header length is off.
pub const MAX_LENIENT_HEADER_LENGTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale = 0,
    RGB = 2,
    Indexed = 3,
    GrayscaleAlpha = 4,
    RGBA = 6,
}

impl ColorType {
    pub fn from_u8(value: u8) -> Option<ColorType> {
        match value {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::RGB),
            3 => Some(ColorType::Indexed),
            4 => Some(ColorType::GrayscaleAlpha),
            6 => Some(ColorType::RGBA),
            _ => None,
        }
    }

    /// Samples stored per pixel.
    pub fn channels(self) -> u8 {
        match self {
            ColorType::Grayscale | ColorType::Indexed => 1,
            ColorType::GrayscaleAlpha => 2,
            ColorType::RGB => 3,
            ColorType::RGBA => 4,
        }
    }

    pub fn allowed_bit_depths(self) -> &'static [u8] {
        match self {
            ColorType::Grayscale => &[1, 2, 4, 8, 16],
            ColorType::Indexed => &[1, 2, 4, 8],
            ColorType::RGB | ColorType::GrayscaleAlpha | ColorType::RGBA => &[8, 16],
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ColorType::GrayscaleAlpha | ColorType::RGBA)
    }
}

/// Decoded IHDR. Animation frames get their own copy through
/// [`ImageHeader::with_dimensions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace: bool,
}

impl ImageHeader {
    /// Parses and validates an IHDR payload.
    ///
    /// Only the first 13 bytes are interpreted; the caller checks the payload length.
    pub fn parse(payload: &[u8], options: &DecoderOptions) -> VexelResult<ImageHeader> {
        let mut reader = ByteReader::new(payload);

        let width = reader.read_u32()?;
        let height = reader.read_u32()?;
        let bit_depth = reader.read_u8()?;
        let color_type = reader.read_u8()?;
        let compression_method = reader.read_u8()?;
        let filter_method = reader.read_u8()?;
        let interlace_method = reader.read_u8()?;

        if width == 0 || width > options.get_max_width() {
            return Err(invalid("width", width));
        }

        if height == 0 || height > options.get_max_height() {
            return Err(invalid("height", height));
        }

        let color_type = ColorType::from_u8(color_type).ok_or_else(|| invalid("color type", color_type as u32))?;

        if !color_type.allowed_bit_depths().contains(&bit_depth) {
            return Err(invalid("bit depth", bit_depth as u32));
        }

        if compression_method != 0 {
            return Err(invalid("compression method", compression_method as u32));
        }

        if filter_method != 0 {
            return Err(invalid("filter method", filter_method as u32));
        }

        let interlace = match interlace_method {
            0 => false,
            1 => true,
            _ => return Err(invalid("interlace method", interlace_method as u32)),
        };

        Ok(ImageHeader {
            width,
            height,
            bit_depth,
            color_type,
            compression_method,
            filter_method,
            interlace,
        })
    }

    /// Same sample layout with a different size, as used by animation frames.
    pub fn with_dimensions(&self, width: u32, height: u32) -> ImageHeader {
        ImageHeader { width, height, ..*self }
    }

    pub fn bits_per_pixel(&self) -> usize {
        self.bit_depth as usize * self.color_type.channels() as usize
    }

    /// Filter unit: bytes per complete pixel, at least 1.
    pub fn bytes_per_pixel(&self) -> usize {
        ((self.bits_per_pixel() + 7) / 8).max(1)
    }

    /// Bytes per scanline, not counting the filter byte.
    pub fn row_stride(&self) -> usize {
        (self.width as usize * self.bits_per_pixel() + 7) / 8
    }

    /// Size of the inflated image data: every row plus its filter byte.
    pub fn decompressed_size(&self) -> usize {
        self.height as usize * (1 + self.row_stride())
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn invalid(field: &'static str, value: u32) -> VexelError {
    VexelError::InvalidHeaderField { field, value }
}
