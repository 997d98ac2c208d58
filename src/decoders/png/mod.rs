pub mod apng;
pub mod chunks;
pub mod filter;
pub mod header;
pub(crate) mod inflate;
pub mod unpack;

use crate::decoders::png::apng::AnimationSequencer;
use crate::decoders::png::chunks::{decode_chunk, tag_name, ChunkMap, ChunkTag, ACTL, IDAT, IEND, IHDR};
use crate::decoders::png::filter::unfilter_scanlines;
use crate::decoders::png::header::{ImageHeader, HEADER_LENGTH, MAX_LENIENT_HEADER_LENGTH};
use crate::decoders::png::inflate::InflateStage;
use crate::decoders::png::unpack::unpack;
use crate::utils::bytereader::ByteReader;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::image::{DecodedImage, Image};
use crate::utils::options::DecoderOptions;
use crate::utils::pool::DecodeResources;
use crate::{log_debug, log_warn};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// One framed chunk, borrowing its payload from the input.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawChunk<'a> {
    pub tag: ChunkTag,
    pub data: &'a [u8],
}

/// Reads `length | tag | payload | crc`. The CRC is skipped, never checked.
///
/// # Returns
/// - `None` once the input is exhausted
/// - `VexelError::IoError` with `UnexpectedEof` if a chunk is cut short
pub(crate) fn read_chunk<'a>(reader: &mut ByteReader<'a>) -> VexelResult<Option<RawChunk<'a>>> {
    if !reader.has_remaining() {
        return Ok(None);
    }

    let length = reader.read_u32()? as usize;
    let tag = reader.read_array::<4>()?;
    let data = reader.read_bytes(length)?;
    reader.skip(4)?;

    Ok(Some(RawChunk { tag, data }))
}

/// PNG and APNG decoder over an in-memory byte stream.
///
/// Walks the stream once: signature, IHDR, then every chunk in order.
/// Image data is inflated as it is met; ancillary chunks are decoded into a
/// [`ChunkMap`]. An acTL chunk hands the rest of the stream to the
/// [`AnimationSequencer`].
pub struct PngDecoder<'a> {
    reader: ByteReader<'a>,
    options: DecoderOptions,
}

impl<'a> PngDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        PngDecoder {
            reader: ByteReader::new(data),
            options: DecoderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decodes with freshly allocated resources.
    pub fn decode(self) -> VexelResult<DecodedImage> {
        let mut resources = DecodeResources::with_scratch_size(self.options.get_scratch_size());
        self.decode_with(&mut resources)
    }

    /// Decodes using caller-provided resources, which may be reused across decodes.
    pub fn decode_with(mut self, resources: &mut DecodeResources) -> VexelResult<DecodedImage> {
        resources.ensure_scratch(self.options.get_scratch_size());

        self.read_signature()?;
        let header = self.read_header()?;

        log_debug!(
            "PNG {}x{}, {:?} at {} bits, interlaced: {}",
            header.width,
            header.height,
            header.color_type,
            header.bit_depth,
            header.interlace
        );

        if header.interlace {
            log_warn!("Adam7 interlacing is not supported, decoding scanlines sequentially");
        }

        let mut chunks = ChunkMap::new();
        let mut stage = InflateStage::new(resources, header.decompressed_size())?;

        while let Some(chunk) = read_chunk(&mut self.reader)? {
            match chunk.tag {
                IDAT => stage.feed(resources, chunk.data)?,
                IEND => break,
                tag => match decode_chunk(tag, chunk.data, &header) {
                    Some(decoded) => {
                        chunks.insert(decoded);

                        if tag == ACTL {
                            log_debug!("acTL found, decoding as animation");

                            return AnimationSequencer::new(header, chunks, self.options, resources)
                                .run(&mut self.reader);
                        }
                    }
                    None => log_debug!(
                        "Skipping chunk {} ({} bytes) before offset {}",
                        tag_name(&tag),
                        chunk.data.len(),
                        self.reader.position()
                    ),
                },
            }
        }

        log_debug!("Inflated {} bytes of image data", stage.written());
        let filtered = stage.finish()?;
        let raw = unfilter_scanlines(&filtered, header.height as usize, header.row_stride(), header.bytes_per_pixel())?;
        let pixels = unpack(&raw, &header, &chunks, self.options.get_parallel_threshold())?;

        Ok(DecodedImage {
            image: Image::Static(pixels),
            chunks,
            header,
        })
    }

    fn read_signature(&mut self) -> VexelResult<()> {
        let signature = self.reader.read_array::<8>().map_err(|_| VexelError::BadSignature)?;

        if signature != PNG_SIGNATURE {
            return Err(VexelError::BadSignature);
        }

        Ok(())
    }

    fn read_header(&mut self) -> VexelResult<ImageHeader> {
        let length = self.reader.read_u32().map_err(|_| VexelError::MissingHeader)? as usize;
        let tag = self.reader.read_array::<4>().map_err(|_| VexelError::MissingHeader)?;

        if tag != IHDR {
            return Err(VexelError::MissingHeader);
        }

        let valid_length = if self.options.get_strict_header_length() {
            length == HEADER_LENGTH
        } else {
            (HEADER_LENGTH..=MAX_LENIENT_HEADER_LENGTH).contains(&length)
        };

        if !valid_length {
            return Err(VexelError::InvalidHeaderField {
                field: "header length",
                value: length as u32,
            });
        }

        let payload = self.reader.read_bytes(length)?;
        self.reader.skip(4)?;

        ImageHeader::parse(&payload[..HEADER_LENGTH], &self.options)
    }
}
