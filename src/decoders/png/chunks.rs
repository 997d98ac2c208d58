use crate::decoders::png::header::{ColorType, ImageHeader};
use crate::log_warn;
use crate::utils::bytereader::ByteReader;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::image::{BlendOp, DisposeOp};
use flate2::read::ZlibDecoder;
use std::collections::HashMap;
use std::io::Read;

pub type ChunkTag = [u8; 4];

// Critical chunks
pub const IHDR: ChunkTag = *b"IHDR";
pub const PLTE: ChunkTag = *b"PLTE";
pub const IDAT: ChunkTag = *b"IDAT";
pub const IEND: ChunkTag = *b"IEND";

// Ancillary chunks
pub const TRNS: ChunkTag = *b"tRNS";
pub const GAMA: ChunkTag = *b"gAMA";
pub const CHRM: ChunkTag = *b"cHRM";
pub const SRGB: ChunkTag = *b"sRGB";
pub const ICCP: ChunkTag = *b"iCCP";
pub const SBIT: ChunkTag = *b"sBIT";
pub const BKGD: ChunkTag = *b"bKGD";
pub const PHYS: ChunkTag = *b"pHYs";
pub const HIST: ChunkTag = *b"hIST";
pub const TIME: ChunkTag = *b"tIME";
pub const TEXT: ChunkTag = *b"tEXt";
pub const ZTXT: ChunkTag = *b"zTXt";
pub const ITXT: ChunkTag = *b"iTXt";

// Animation chunks
pub const ACTL: ChunkTag = *b"acTL";
pub const FCTL: ChunkTag = *b"fcTL";
pub const FDAT: ChunkTag = *b"fdAT";

/// Printable form of a chunk tag.
pub fn tag_name(tag: &ChunkTag) -> String {
    String::from_utf8_lossy(tag).into_owned()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransparencyData {
    Grayscale(u16),
    RGB(u16, u16, u16),
    Palette(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundData {
    Grayscale(u16),
    RGB(u16, u16, u16),
    PaletteIndex(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual = 0,
    RelativeColorimetric = 1,
    Saturation = 2,
    AbsoluteColorimetric = 3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chromaticities {
    pub white_point_x: f32,
    pub white_point_y: f32,
    pub red_x: f32,
    pub red_y: f32,
    pub green_x: f32,
    pub green_y: f32,
    pub blue_x: f32,
    pub blue_y: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IccProfile {
    pub name: String,
    pub compression_method: u8,
    pub compressed_profile: Vec<u8>,
}

impl IccProfile {
    /// Inflates the embedded profile.
    pub fn decompress(&self) -> VexelResult<Vec<u8>> {
        inflate(&self.compressed_profile)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignificantBits {
    Grayscale { gray: u8 },
    RGB { red: u8, green: u8, blue: u8 },
    GrayscaleAlpha { gray: u8, alpha: u8 },
    RGBA { red: u8, green: u8, blue: u8, alpha: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhysicalUnit {
    Unknown,
    Meter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDimensions {
    pub pixels_per_unit_x: u32,
    pub pixels_per_unit_y: u32,
    pub unit: PhysicalUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// tEXt: Latin-1 keyword and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

/// zTXt: the text stays compressed until asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedText {
    pub keyword: String,
    pub compression_method: u8,
    pub compressed_text: Vec<u8>,
}

impl CompressedText {
    pub fn decompress(&self) -> VexelResult<String> {
        Ok(latin1(&inflate(&self.compressed_text)?))
    }
}

/// iTXt: UTF-8 text, optionally compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternationalText {
    pub keyword: String,
    pub compressed: bool,
    pub compression_method: u8,
    pub language_tag: String,
    pub translated_keyword: String,
    pub data: Vec<u8>,
}

impl InternationalText {
    /// Text body, inflated first when the compression flag is set.
    pub fn text(&self) -> VexelResult<String> {
        if self.compressed {
            Ok(String::from_utf8_lossy(&inflate(&self.data)?).into_owned())
        } else {
            Ok(String::from_utf8_lossy(&self.data).into_owned())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActlChunk {
    pub num_frames: u32,
    pub num_plays: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FctlChunk {
    pub sequence_number: u32,
    pub width: u32,
    pub height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub delay_num: u16,
    pub delay_den: u16,
    pub dispose_op: DisposeOp,
    pub blend_op: BlendOp,
}

/// Decoded ancillary (and palette) chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Palette(Vec<[u8; 3]>),
    Transparency(TransparencyData),
    Gamma(f32),
    Chromaticities(Chromaticities),
    Srgb(RenderingIntent),
    IccProfile(IccProfile),
    SignificantBits(SignificantBits),
    Background(BackgroundData),
    PhysicalDimensions(PhysicalDimensions),
    Histogram(Vec<u16>),
    Time(ImageTime),
    Text(TextChunk),
    CompressedText(CompressedText),
    InternationalText(InternationalText),
    AnimationControl(ActlChunk),
    FrameControl(FctlChunk),
    /// A registered chunk whose payload could not be decoded.
    Unknown { tag: ChunkTag, data: Vec<u8> },
}

impl Chunk {
    pub fn tag(&self) -> ChunkTag {
        match self {
            Chunk::Palette(_) => PLTE,
            Chunk::Transparency(_) => TRNS,
            Chunk::Gamma(_) => GAMA,
            Chunk::Chromaticities(_) => CHRM,
            Chunk::Srgb(_) => SRGB,
            Chunk::IccProfile(_) => ICCP,
            Chunk::SignificantBits(_) => SBIT,
            Chunk::Background(_) => BKGD,
            Chunk::PhysicalDimensions(_) => PHYS,
            Chunk::Histogram(_) => HIST,
            Chunk::Time(_) => TIME,
            Chunk::Text(_) => TEXT,
            Chunk::CompressedText(_) => ZTXT,
            Chunk::InternationalText(_) => ITXT,
            Chunk::AnimationControl(_) => ACTL,
            Chunk::FrameControl(_) => FCTL,
            Chunk::Unknown { tag, .. } => *tag,
        }
    }
}

/// Whether `tag` has a decoder in the dispatch table.
pub fn is_registered(tag: &ChunkTag) -> bool {
    matches!(
        *tag,
        PLTE | TRNS
            | GAMA
            | CHRM
            | SRGB
            | ICCP
            | SBIT
            | BKGD
            | PHYS
            | HIST
            | TIME
            | TEXT
            | ZTXT
            | ITXT
            | ACTL
            | FCTL
    )
}

/// Decodes a registered chunk payload.
///
/// # Returns
/// - `None` if the tag has no decoder
/// - `Chunk::Unknown` carrying the raw payload if decoding failed
pub fn decode_chunk(tag: ChunkTag, payload: &[u8], header: &ImageHeader) -> Option<Chunk> {
    let mut reader = ByteReader::new(payload);

    let result = match tag {
        PLTE => read_plte(&mut reader),
        TRNS => read_trns(&mut reader, header),
        GAMA => read_gama(&mut reader),
        CHRM => read_chrm(&mut reader),
        SRGB => read_srgb(&mut reader),
        ICCP => read_iccp(&mut reader),
        SBIT => read_sbit(&mut reader, header),
        BKGD => read_bkgd(&mut reader, header),
        PHYS => read_phys(&mut reader),
        HIST => read_hist(&mut reader),
        TIME => read_time(&mut reader),
        TEXT => read_text(&mut reader),
        ZTXT => read_ztxt(&mut reader),
        ITXT => read_itxt(&mut reader),
        ACTL => read_actl(&mut reader),
        FCTL => read_fctl(&mut reader),
        _ => return None,
    };

    match result {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            log_warn!("Malformed {} chunk, keeping raw payload: {}", tag_name(&tag), e);
            Some(Chunk::Unknown {
                tag,
                data: payload.to_vec(),
            })
        }
    }
}

fn malformed(msg: impl Into<String>) -> VexelError {
    VexelError::CorruptStream(msg.into())
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn inflate(data: &[u8]) -> VexelResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;

    Ok(out)
}

fn read_plte(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let length = reader.bytes_left();

    if length == 0 || length % 3 != 0 {
        return Err(malformed(format!("PLTE length {} is not a positive multiple of 3", length)));
    }

    let entries = length / 3;
    if entries > 256 {
        log_warn!("PLTE has {} entries, only 256 are addressable", entries);
    }

    let mut palette = Vec::with_capacity(entries);
    for _ in 0..entries {
        palette.push(reader.read_array::<3>()?);
    }

    Ok(Chunk::Palette(palette))
}

fn read_trns(reader: &mut ByteReader, header: &ImageHeader) -> VexelResult<Chunk> {
    let data = match header.color_type {
        ColorType::Grayscale => TransparencyData::Grayscale(reader.read_u16()?),
        ColorType::RGB => {
            let r = reader.read_u16()?;
            let g = reader.read_u16()?;
            let b = reader.read_u16()?;

            TransparencyData::RGB(r, g, b)
        }
        ColorType::Indexed => {
            let alpha = reader.read_to_end();
            if alpha.is_empty() {
                return Err(malformed("empty tRNS for indexed color"));
            }

            TransparencyData::Palette(alpha.to_vec())
        }
        ColorType::GrayscaleAlpha | ColorType::RGBA => {
            return Err(malformed(format!("tRNS not allowed for color type {:?}", header.color_type)));
        }
    };

    Ok(Chunk::Transparency(data))
}

fn read_gama(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let gamma = reader.read_u32()?;

    Ok(Chunk::Gamma(gamma as f32 / 100000.0))
}

fn read_chrm(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let mut values = [0f32; 8];
    for value in values.iter_mut() {
        *value = reader.read_u32()? as f32 / 100000.0;
    }

    Ok(Chunk::Chromaticities(Chromaticities {
        white_point_x: values[0],
        white_point_y: values[1],
        red_x: values[2],
        red_y: values[3],
        green_x: values[4],
        green_y: values[5],
        blue_x: values[6],
        blue_y: values[7],
    }))
}

fn read_srgb(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let intent = match reader.read_u8()? {
        0 => RenderingIntent::Perceptual,
        1 => RenderingIntent::RelativeColorimetric,
        2 => RenderingIntent::Saturation,
        3 => RenderingIntent::AbsoluteColorimetric,
        n => return Err(malformed(format!("invalid sRGB rendering intent {}", n))),
    };

    Ok(Chunk::Srgb(intent))
}

fn read_iccp(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let name = latin1(reader.read_null_terminated()?);
    let compression_method = reader.read_u8()?;
    let compressed_profile = reader.read_to_end().to_vec();

    Ok(Chunk::IccProfile(IccProfile {
        name,
        compression_method,
        compressed_profile,
    }))
}

fn read_sbit(reader: &mut ByteReader, header: &ImageHeader) -> VexelResult<Chunk> {
    let bits = match header.color_type {
        ColorType::Grayscale => SignificantBits::Grayscale { gray: reader.read_u8()? },
        ColorType::RGB | ColorType::Indexed => SignificantBits::RGB {
            red: reader.read_u8()?,
            green: reader.read_u8()?,
            blue: reader.read_u8()?,
        },
        ColorType::GrayscaleAlpha => SignificantBits::GrayscaleAlpha {
            gray: reader.read_u8()?,
            alpha: reader.read_u8()?,
        },
        ColorType::RGBA => SignificantBits::RGBA {
            red: reader.read_u8()?,
            green: reader.read_u8()?,
            blue: reader.read_u8()?,
            alpha: reader.read_u8()?,
        },
    };

    Ok(Chunk::SignificantBits(bits))
}

fn read_bkgd(reader: &mut ByteReader, header: &ImageHeader) -> VexelResult<Chunk> {
    let background = match header.color_type {
        ColorType::Grayscale | ColorType::GrayscaleAlpha => BackgroundData::Grayscale(reader.read_u16()?),
        ColorType::RGB | ColorType::RGBA => {
            let r = reader.read_u16()?;
            let g = reader.read_u16()?;
            let b = reader.read_u16()?;

            BackgroundData::RGB(r, g, b)
        }
        ColorType::Indexed => BackgroundData::PaletteIndex(reader.read_u8()?),
    };

    Ok(Chunk::Background(background))
}

fn read_phys(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let pixels_per_unit_x = reader.read_u32()?;
    let pixels_per_unit_y = reader.read_u32()?;

    let unit = match reader.read_u8()? {
        1 => PhysicalUnit::Meter,
        _ => PhysicalUnit::Unknown,
    };

    Ok(Chunk::PhysicalDimensions(PhysicalDimensions {
        pixels_per_unit_x,
        pixels_per_unit_y,
        unit,
    }))
}

fn read_hist(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let mut frequencies = Vec::with_capacity(reader.bytes_left() / 2);
    while reader.bytes_left() >= 2 {
        frequencies.push(reader.read_u16()?);
    }

    Ok(Chunk::Histogram(frequencies))
}

fn read_time(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let time = ImageTime {
        year: reader.read_u16()?,
        month: reader.read_u8()?,
        day: reader.read_u8()?,
        hour: reader.read_u8()?,
        minute: reader.read_u8()?,
        second: reader.read_u8()?,
    };

    if !(1..=12).contains(&time.month) || !(1..=31).contains(&time.day) {
        log_warn!("Invalid date in tIME chunk: {}-{}-{}", time.year, time.month, time.day);
    }

    if time.hour > 23 || time.minute > 59 || time.second > 60 {
        log_warn!("Invalid time in tIME chunk: {}:{}:{}", time.hour, time.minute, time.second);
    }

    Ok(Chunk::Time(time))
}

fn read_text(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let keyword = latin1(reader.read_null_terminated()?);
    let text = latin1(reader.read_to_end());

    Ok(Chunk::Text(TextChunk { keyword, text }))
}

fn read_ztxt(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let keyword = latin1(reader.read_null_terminated()?);
    let compression_method = reader.read_u8()?;

    if compression_method != 0 {
        log_warn!("Unknown compression method in zTXt chunk: {}", compression_method);
    }

    Ok(Chunk::CompressedText(CompressedText {
        keyword,
        compression_method,
        compressed_text: reader.read_to_end().to_vec(),
    }))
}

fn read_itxt(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let keyword = latin1(reader.read_null_terminated()?);
    let compressed = reader.read_u8()? != 0;
    let compression_method = reader.read_u8()?;
    let language_tag = String::from_utf8_lossy(reader.read_null_terminated()?).into_owned();
    let translated_keyword = String::from_utf8_lossy(reader.read_null_terminated()?).into_owned();

    Ok(Chunk::InternationalText(InternationalText {
        keyword,
        compressed,
        compression_method,
        language_tag,
        translated_keyword,
        data: reader.read_to_end().to_vec(),
    }))
}

fn read_actl(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let num_frames = reader.read_u32()?;
    let num_plays = reader.read_u32()?;

    if num_frames == 0 {
        return Err(malformed("acTL with zero frames"));
    }

    Ok(Chunk::AnimationControl(ActlChunk { num_frames, num_plays }))
}

fn read_fctl(reader: &mut ByteReader) -> VexelResult<Chunk> {
    let sequence_number = reader.read_u32()?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let x_offset = reader.read_u32()?;
    let y_offset = reader.read_u32()?;
    let delay_num = reader.read_u16()?;
    let delay_den = reader.read_u16()?;
    let dispose = reader.read_u8()?;
    let blend = reader.read_u8()?;

    let dispose_op = DisposeOp::from_u8(dispose).unwrap_or_else(|| {
        log_warn!("Invalid fcTL dispose_op: {}", dispose);
        DisposeOp::None
    });

    let blend_op = BlendOp::from_u8(blend).unwrap_or_else(|| {
        log_warn!("Invalid fcTL blend_op: {}", blend);
        BlendOp::Source
    });

    Ok(Chunk::FrameControl(FctlChunk {
        sequence_number,
        width,
        height,
        x_offset,
        y_offset,
        delay_num,
        delay_den,
        dispose_op,
        blend_op,
    }))
}

/// Decoded chunks grouped by tag, each group in stream order.
#[derive(Debug, Clone, Default)]
pub struct ChunkMap {
    chunks: HashMap<ChunkTag, Vec<Chunk>>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.entry(chunk.tag()).or_default().push(chunk);
    }

    /// First instance registered under `tag`.
    pub fn first(&self, tag: ChunkTag) -> Option<&Chunk> {
        self.chunks.get(&tag).and_then(|list| list.first())
    }

    /// Every instance registered under `tag`, in stream order.
    pub fn all(&self, tag: ChunkTag) -> &[Chunk] {
        self.chunks.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, tag: ChunkTag) -> bool {
        !self.all(tag).is_empty()
    }

    /// Tags present, sorted.
    pub fn tags(&self) -> Vec<ChunkTag> {
        let mut tags: Vec<ChunkTag> = self.chunks.keys().copied().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.chunks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn palette(&self) -> Option<&[[u8; 3]]> {
        self.all(PLTE).iter().find_map(|chunk| match chunk {
            Chunk::Palette(palette) => Some(palette.as_slice()),
            _ => None,
        })
    }

    pub fn transparency(&self) -> Option<&TransparencyData> {
        self.all(TRNS).iter().find_map(|chunk| match chunk {
            Chunk::Transparency(data) => Some(data),
            _ => None,
        })
    }

    pub fn animation_control(&self) -> Option<&ActlChunk> {
        self.all(ACTL).iter().find_map(|chunk| match chunk {
            Chunk::AnimationControl(actl) => Some(actl),
            _ => None,
        })
    }

    pub fn gamma(&self) -> Option<f32> {
        self.all(GAMA).iter().find_map(|chunk| match chunk {
            Chunk::Gamma(gamma) => Some(*gamma),
            _ => None,
        })
    }
}
