use crate::decoders::png::chunks::{decode_chunk, tag_name, Chunk, ChunkMap, FctlChunk, FCTL, FDAT, IDAT, IEND};
use crate::decoders::png::filter::unfilter_scanlines;
use crate::decoders::png::header::ImageHeader;
use crate::decoders::png::inflate::InflateStage;
use crate::decoders::png::read_chunk;
use crate::decoders::png::unpack::unpack;
use crate::utils::bytereader::ByteReader;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::image::{AnimatedImage, DecodedImage, Frame, Image};
use crate::utils::options::DecoderOptions;
use crate::utils::pool::DecodeResources;
use crate::{log_debug, log_warn};
use std::time::Duration;

/// Denominator used when fcTL stores 0.
const DEFAULT_DELAY_DEN: u16 = 100;

/// Frame whose fcTL has been read and whose data is still being inflated.
struct PendingFrame {
    control: FctlChunk,
    header: ImageHeader,
    stage: InflateStage,
}

/// Decodes the frames of an animated PNG, picking up the stream right
/// after the acTL chunk.
///
/// Every fcTL closes the frame before it and opens a new one; fdAT payloads
/// (minus their sequence number) and IDAT chunks that follow an fcTL feed the
/// open frame. IDAT before the first fcTL is the default image and is skipped.
pub struct AnimationSequencer<'r> {
    header: ImageHeader,
    chunks: ChunkMap,
    options: DecoderOptions,
    resources: &'r mut DecodeResources,
}

impl<'r> AnimationSequencer<'r> {
    pub fn new(
        header: ImageHeader,
        chunks: ChunkMap,
        options: DecoderOptions,
        resources: &'r mut DecodeResources,
    ) -> Self {
        AnimationSequencer {
            header,
            chunks,
            options,
            resources,
        }
    }

    pub fn run(mut self, reader: &mut ByteReader) -> VexelResult<DecodedImage> {
        let actl = *self
            .chunks
            .animation_control()
            .ok_or(VexelError::MissingAnimationControl)?;

        let mut frames = Vec::new();
        let mut pending: Option<PendingFrame> = None;

        while let Some(chunk) = read_chunk(reader)? {
            match chunk.tag {
                FCTL => {
                    if let Some(frame) = pending.take() {
                        frames.push(self.finish_frame(frame)?);
                    }

                    let control = match decode_chunk(FCTL, chunk.data, &self.header) {
                        Some(Chunk::FrameControl(control)) => control,
                        _ => return Err(VexelError::CorruptStream("Malformed fcTL chunk".into())),
                    };

                    pending = Some(self.begin_frame(control)?);
                    self.chunks.insert(Chunk::FrameControl(control));
                }
                FDAT => {
                    if chunk.data.len() < 4 {
                        return Err(VexelError::CorruptStream(format!(
                            "fdAT of {} bytes has no sequence number",
                            chunk.data.len()
                        )));
                    }

                    match pending.as_mut() {
                        Some(frame) => frame.stage.feed(self.resources, &chunk.data[4..])?,
                        None => log_warn!("fdAT before any fcTL, skipped"),
                    }
                }
                IDAT => match pending.as_mut() {
                    Some(frame) => frame.stage.feed(self.resources, chunk.data)?,
                    None => log_debug!("Skipping default image data ({} bytes)", chunk.data.len()),
                },
                IEND => break,
                tag => match decode_chunk(tag, chunk.data, &self.header) {
                    Some(decoded) => self.chunks.insert(decoded),
                    None => log_debug!("Skipping chunk {} ({} bytes)", tag_name(&tag), chunk.data.len()),
                },
            }
        }

        if let Some(frame) = pending.take() {
            frames.push(self.finish_frame(frame)?);
        }

        if frames.is_empty() {
            return Err(VexelError::CorruptStream("Animation contains no frames".into()));
        }

        if frames.len() != actl.num_frames as usize {
            log_warn!("acTL announces {} frames, found {}", actl.num_frames, frames.len());
        }

        Ok(DecodedImage {
            image: Image::Animated(AnimatedImage {
                width: self.header.width,
                height: self.header.height,
                num_frames: actl.num_frames,
                num_plays: actl.num_plays,
                frames,
            }),
            chunks: self.chunks,
            header: self.header,
        })
    }

    fn begin_frame(&mut self, control: FctlChunk) -> VexelResult<PendingFrame> {
        if control.width == 0 || control.height == 0 {
            return Err(VexelError::CorruptStream(format!(
                "Frame {} has an empty region {}x{}",
                control.sequence_number, control.width, control.height
            )));
        }

        if control.width > self.options.get_max_width() {
            return Err(VexelError::InvalidHeaderField {
                field: "frame width",
                value: control.width,
            });
        }

        if control.height > self.options.get_max_height() {
            return Err(VexelError::InvalidHeaderField {
                field: "frame height",
                value: control.height,
            });
        }

        let right = control.x_offset as u64 + control.width as u64;
        let bottom = control.y_offset as u64 + control.height as u64;
        if right > self.header.width as u64 || bottom > self.header.height as u64 {
            log_warn!(
                "Frame {} at {},{} size {}x{} reaches past the {}x{} canvas",
                control.sequence_number,
                control.x_offset,
                control.y_offset,
                control.width,
                control.height,
                self.header.width,
                self.header.height
            );
        }

        let header = self.header.with_dimensions(control.width, control.height);
        let stage = InflateStage::new(self.resources, header.decompressed_size())?;

        Ok(PendingFrame { control, header, stage })
    }

    fn finish_frame(&self, frame: PendingFrame) -> VexelResult<Frame> {
        let PendingFrame { control, header, stage } = frame;

        let filtered = stage.finish()?;
        let raw = unfilter_scanlines(&filtered, header.height as usize, header.row_stride(), header.bytes_per_pixel())?;
        let pixels = unpack(&raw, &header, &self.chunks, self.options.get_parallel_threshold())?;

        let delay_den = if control.delay_den == 0 { DEFAULT_DELAY_DEN } else { control.delay_den };
        let delay = Duration::from_nanos(control.delay_num as u64 * 1_000_000_000 / delay_den as u64);

        log_debug!(
            "Frame {}: {}x{} at {},{}, delay {}/{}",
            control.sequence_number,
            control.width,
            control.height,
            control.x_offset,
            control.y_offset,
            control.delay_num,
            delay_den
        );

        Ok(Frame {
            pixels,
            delay,
            delay_num: control.delay_num,
            delay_den,
            x_offset: control.x_offset,
            y_offset: control.y_offset,
            dispose_op: control.dispose_op,
            blend_op: control.blend_op,
        })
    }
}
