mod decoders;
mod utils;

pub use decoders::png::chunks::{
    self, ActlChunk, BackgroundData, Chromaticities, Chunk, ChunkMap, ChunkTag, CompressedText, FctlChunk,
    IccProfile, ImageTime, InternationalText, PhysicalDimensions, PhysicalUnit, RenderingIntent, SignificantBits,
    TextChunk, TransparencyData,
};
pub use decoders::png::filter::{unfilter_scanlines, FilterType};
pub use decoders::png::header::{ColorType, ImageHeader};
pub use decoders::png::{PngDecoder, PNG_SIGNATURE};
pub use utils::error::{VexelError, VexelResult};
pub use utils::image::{AnimatedImage, BlendOp, DecodedImage, DisposeOp, Frame, Image, PixelBuffer, PixelData};
pub use utils::info::PngInfo;
pub use utils::logger::Logger;
pub use utils::options::DecoderOptions;
pub use utils::pool::{DecodeResources, PooledResources, ResourcePool};
pub use utils::writer;

use std::fs;
use std::path::Path;

/// Decodes a PNG or APNG held in memory with default options.
pub fn decode(data: &[u8]) -> VexelResult<DecodedImage> {
    PngDecoder::new(data).decode()
}

/// Reads a file into memory and decodes it.
pub fn decode_file<P: AsRef<Path>>(path: P) -> VexelResult<DecodedImage> {
    let data = fs::read(path)?;
    decode(&data)
}
