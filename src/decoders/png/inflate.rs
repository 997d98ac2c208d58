use crate::log_debug;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::pool::DecodeResources;
use flate2::{FlushDecompress, Status};

/// Streams zlib-compressed image data straight into a buffer sized for the
/// whole image (or frame), one chunk payload at a time.
///
/// The decompressor lives in [`DecodeResources`] and keeps its state between
/// calls to [`InflateStage::feed`], so a DEFLATE stream may be split across
/// any number of IDAT or fdAT chunks.
pub(crate) struct InflateStage {
    output: Vec<u8>,
    written: usize,
    finished: bool,
}

impl InflateStage {
    /// Resets the decompressor and allocates the output buffer.
    /// A buffer that cannot be allocated is `CorruptStream`.
    pub fn new(resources: &mut DecodeResources, size: usize) -> VexelResult<Self> {
        resources.reset();

        let mut output: Vec<u8> = Vec::new();
        output.try_reserve_exact(size).map_err(|e| {
            VexelError::CorruptStream(format!("Cannot allocate {} bytes of image data: {}", size, e))
        })?;
        output.resize(size, 0);

        Ok(InflateStage {
            output,
            written: 0,
            finished: false,
        })
    }

    /// Decompresses one chunk payload.
    ///
    /// Input is staged through the scratch buffer in pieces of its size, so
    /// chunk size never dictates buffer size.
    pub fn feed(&mut self, resources: &mut DecodeResources, data: &[u8]) -> VexelResult<()> {
        let DecodeResources { decompress, scratch } = resources;

        for piece in data.chunks(scratch.len().max(1)) {
            if self.finished {
                log_debug!("Ignoring {} bytes after the end of the zlib stream", data.len());
                return Ok(());
            }

            let staged = &mut scratch[..piece.len()];
            staged.copy_from_slice(piece);

            let mut input: &[u8] = staged;
            loop {
                let before_in = decompress.total_in();
                let before_out = decompress.total_out();

                let status = if self.written < self.output.len() {
                    decompress.decompress(input, &mut self.output[self.written..], FlushDecompress::None)
                } else {
                    // Output is full; anything still produced means the stream is too long
                    let mut probe = [0u8; 1];
                    decompress.decompress(input, &mut probe, FlushDecompress::None)
                }
                .map_err(|e| VexelError::CorruptStream(format!("Inflate failed: {}", e)))?;

                let consumed = (decompress.total_in() - before_in) as usize;
                let produced = (decompress.total_out() - before_out) as usize;

                if self.written == self.output.len() && produced > 0 {
                    return Err(VexelError::CorruptStream(format!(
                        "Image data inflates past the expected {} bytes",
                        self.output.len()
                    )));
                }

                self.written += produced;
                input = &input[consumed..];

                if status == Status::StreamEnd {
                    self.finished = true;
                    break;
                }

                if consumed == 0 && produced == 0 {
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Returns the filled buffer; any size other than the expected one is corrupt.
    pub fn finish(self) -> VexelResult<Vec<u8>> {
        if self.written != self.output.len() {
            return Err(VexelError::CorruptStream(format!(
                "Expected {} bytes of image data, inflated {}",
                self.output.len(),
                self.written
            )));
        }

        Ok(self.output)
    }
}
