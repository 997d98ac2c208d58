use crate::decoders::png::chunks::ChunkMap;
use crate::decoders::png::header::ImageHeader;
use std::time::Duration;

fn u16_to_u8(values: &[u16]) -> Vec<u8> {
    values.iter().map(|&v| (v >> 8) as u8).collect()
}

/// Canonical RGBA samples, four per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelData {
    Rgba8(Vec<u8>),
    Rgba16(Vec<u16>),
}

impl PixelData {
    pub fn bit_depth(&self) -> u8 {
        match self {
            PixelData::Rgba8(_) => 8,
            PixelData::Rgba16(_) => 16,
        }
    }

    /// Number of samples (not bytes) held.
    pub fn len(&self) -> usize {
        match self {
            PixelData::Rgba8(pixels) => pixels.len(),
            PixelData::Rgba16(pixels) => pixels.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns 8-bit samples, keeping the high byte of 16-bit ones.
    pub fn to_rgba8(&self) -> Vec<u8> {
        match self {
            PixelData::Rgba8(pixels) => pixels.clone(),
            PixelData::Rgba16(pixels) => u16_to_u8(pixels),
        }
    }

    pub fn into_rgba8(self) -> Vec<u8> {
        match self {
            PixelData::Rgba8(pixels) => pixels,
            PixelData::Rgba16(pixels) => u16_to_u8(&pixels),
        }
    }
}

/// Decoded pixels of one image or animation frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: PixelData,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, pixels: PixelData) -> PixelBuffer {
        PixelBuffer { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    pub fn into_pixels(self) -> PixelData {
        self.pixels
    }

    pub fn bit_depth(&self) -> u8 {
        self.pixels.bit_depth()
    }

    /// RGBA sample values at (x, y), widened to u16.
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u16; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let offset = (y as usize * self.width as usize + x as usize) * 4;
        match &self.pixels {
            PixelData::Rgba8(pixels) => pixels
                .get(offset..offset + 4)
                .map(|p| [p[0] as u16, p[1] as u16, p[2] as u16, p[3] as u16]),
            PixelData::Rgba16(pixels) => pixels
                .get(offset..offset + 4)
                .map(|p| [p[0], p[1], p[2], p[3]]),
        }
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.to_rgba8()
    }
}

/// How the frame's region is treated before the next frame is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposeOp {
    #[default]
    None,
    Background,
    Previous,
}

impl DisposeOp {
    pub fn from_u8(value: u8) -> Option<DisposeOp> {
        match value {
            0 => Some(DisposeOp::None),
            1 => Some(DisposeOp::Background),
            2 => Some(DisposeOp::Previous),
            _ => None,
        }
    }
}

/// How the frame is combined with the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendOp {
    #[default]
    Source,
    Over,
}

impl BlendOp {
    pub fn from_u8(value: u8) -> Option<BlendOp> {
        match value {
            0 => Some(BlendOp::Source),
            1 => Some(BlendOp::Over),
            _ => None,
        }
    }
}

/// One animation frame and its placement on the canvas.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: PixelBuffer,
    pub delay: Duration,
    pub delay_num: u16,
    /// Never zero; a stored denominator of 0 reads as 100.
    pub delay_den: u16,
    pub x_offset: u32,
    pub y_offset: u32,
    pub dispose_op: DisposeOp,
    pub blend_op: BlendOp,
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[derive(Debug, Clone)]
pub struct AnimatedImage {
    pub width: u32,
    pub height: u32,
    /// Frame count announced by acTL.
    pub num_frames: u32,
    /// 0 means loop forever.
    pub num_plays: u32,
    pub frames: Vec<Frame>,
}

impl AnimatedImage {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// First decoded frame, used as the still representation.
    pub fn thumbnail(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn is_infinite(&self) -> bool {
        self.num_plays == 0
    }
}

#[derive(Debug, Clone)]
pub enum Image {
    Static(PixelBuffer),
    Animated(AnimatedImage),
}

impl Image {
    pub fn width(&self) -> u32 {
        match self {
            Image::Static(buffer) => buffer.width(),
            Image::Animated(animation) => animation.width,
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            Image::Static(buffer) => buffer.height(),
            Image::Animated(animation) => animation.height,
        }
    }

    pub fn is_animated(&self) -> bool {
        matches!(self, Image::Animated(_))
    }

    /// Pixels of the static image, or of the animation's first frame.
    pub fn first_pixels(&self) -> Option<&PixelBuffer> {
        match self {
            Image::Static(buffer) => Some(buffer),
            Image::Animated(animation) => animation.thumbnail().map(Frame::pixels),
        }
    }
}

/// Everything a decode produces: pixels, ancillary chunks and the header.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: Image,
    pub chunks: ChunkMap,
    pub header: ImageHeader,
}

impl DecodedImage {
    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }
}
