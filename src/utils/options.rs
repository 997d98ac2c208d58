/// Default ceiling for both image dimensions.
pub const DEFAULT_MAX_DIMENSION: u32 = 1 << 14;

/// Pixel count from which rows are unpacked in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64 * 1024;

/// Size of the buffer compressed bytes are staged through before inflating.
pub const DEFAULT_SCRATCH_SIZE: usize = 8 * 1024;

/// Options respected by the PNG decoder.
///
/// Built with chained setters starting from [`DecoderOptions::default`]:
///
/// ```
/// use vexel_png::DecoderOptions;
///
/// let options = DecoderOptions::default()
///     .set_strict_header_length(false)
///     .set_max_width(4096);
///
/// assert_eq!(options.get_max_width(), 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderOptions {
    strict_header_length: bool,
    max_width: u32,
    max_height: u32,
    parallel_threshold: usize,
    scratch_size: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptions {
            strict_header_length: true,
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            scratch_size: DEFAULT_SCRATCH_SIZE,
        }
    }
}

impl DecoderOptions {
    /// Whether IHDR must be exactly 13 bytes long.
    ///
    /// When false, header payloads of 13 to 100 bytes are accepted and
    /// only the first 13 bytes are interpreted.
    pub const fn get_strict_header_length(&self) -> bool {
        self.strict_header_length
    }

    pub const fn get_max_width(&self) -> u32 {
        self.max_width
    }

    pub const fn get_max_height(&self) -> u32 {
        self.max_height
    }

    pub const fn get_parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub const fn get_scratch_size(&self) -> usize {
        self.scratch_size
    }

    pub fn set_strict_header_length(mut self, yes: bool) -> Self {
        self.strict_header_length = yes;
        self
    }

    /// Set maximum width above which the decoder refuses the image
    ///
    /// # Arguments
    ///
    /// * `width`: The maximum width allowed
    pub fn set_max_width(mut self, width: u32) -> Self {
        self.max_width = width;
        self
    }

    /// Set maximum height above which the decoder refuses the image
    ///
    /// # Arguments
    ///
    /// * `height`: The maximum height allowed
    pub fn set_max_height(mut self, height: u32) -> Self {
        self.max_height = height;
        self
    }

    /// Set the number of pixels from which rows are unpacked in parallel.
    ///
    /// Has no effect without the `rayon` feature.
    pub fn set_parallel_threshold(mut self, pixels: usize) -> Self {
        self.parallel_threshold = pixels;
        self
    }

    /// Set the staging buffer size for compressed input, clamped to at least one byte.
    pub fn set_scratch_size(mut self, size: usize) -> Self {
        self.scratch_size = size.max(1);
        self
    }
}
