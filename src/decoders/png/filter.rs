use crate::utils::error::{VexelError, VexelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    Paeth = 4,
}

impl FilterType {
    pub fn from_u8(value: u8) -> Option<FilterType> {
        match value {
            0 => Some(FilterType::None),
            1 => Some(FilterType::Sub),
            2 => Some(FilterType::Up),
            3 => Some(FilterType::Average),
            4 => Some(FilterType::Paeth),
            _ => None,
        }
    }
}

fn decode_sub_filter(src: &[u8], dst: &mut [u8], bytes_per_pixel: usize) {
    let lead = bytes_per_pixel.min(src.len());
    dst[..lead].copy_from_slice(&src[..lead]);

    for i in lead..src.len() {
        dst[i] = src[i].wrapping_add(dst[i - bytes_per_pixel]);
    }
}

fn decode_up_filter(src: &[u8], dst: &mut [u8], prior: &[u8]) {
    for ((d, &s), &p) in dst.iter_mut().zip(src).zip(prior) {
        *d = s.wrapping_add(p);
    }
}

fn decode_average_filter(src: &[u8], dst: &mut [u8], prior: &[u8], bytes_per_pixel: usize) {
    let lead = bytes_per_pixel.min(src.len());

    for i in 0..lead {
        dst[i] = src[i].wrapping_add(prior[i] >> 1);
    }

    for i in lead..src.len() {
        let left = dst[i - bytes_per_pixel] as u16;
        let above = prior[i] as u16;
        dst[i] = src[i].wrapping_add(((left + above) >> 1) as u8);
    }
}

fn decode_paeth_filter(src: &[u8], dst: &mut [u8], prior: &[u8], bytes_per_pixel: usize) {
    let lead = bytes_per_pixel.min(src.len());

    // Left and upper-left are zero, so the predictor is always "above"
    for i in 0..lead {
        dst[i] = src[i].wrapping_add(prior[i]);
    }

    for i in lead..src.len() {
        let left = dst[i - bytes_per_pixel];
        let above = prior[i];
        let upper_left = prior[i - bytes_per_pixel];

        dst[i] = src[i].wrapping_add(paeth_predictor(left, above, upper_left));
    }
}

/// Picks whichever of left, above and upper-left is closest to
/// `left + above - upper_left`, ties resolved in that order.
pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let a = a as i16;
    let b = b as i16;
    let c = c as i16;

    let p = a + b - c;
    let pa = (p - a).abs();
    let pb = (p - b).abs();
    let pc = (p - c).abs();

    if pa <= pb && pa <= pc {
        a as u8
    } else if pb <= pc {
        b as u8
    } else {
        c as u8
    }
}

/// Reverses per-scanline filtering.
///
/// `data` holds `height` rows of one filter byte followed by `stride` bytes.
/// Each row is reconstructed in place in the output buffer, reading the row
/// above from the already reconstructed output.
///
/// # Returns
/// - `height * stride` bytes of raw scanline data
/// - `VexelError::InvalidFilterType` on a filter byte above 4
/// - `VexelError::CorruptStream` if `data` is not exactly `height` rows long
pub fn unfilter_scanlines(data: &[u8], height: usize, stride: usize, bytes_per_pixel: usize) -> VexelResult<Vec<u8>> {
    let scanline_bytes = stride + 1;

    if data.len() != height * scanline_bytes {
        return Err(VexelError::CorruptStream(format!(
            "Scanline data is {} bytes, expected {} rows of {}",
            data.len(),
            height,
            scanline_bytes
        )));
    }

    let bytes_per_pixel = bytes_per_pixel.max(1);
    let mut output = vec![0u8; height * stride];
    let empty_row = vec![0u8; stride];

    for (row, scanline) in data.chunks_exact(scanline_bytes).enumerate() {
        let filter = FilterType::from_u8(scanline[0]).ok_or(VexelError::InvalidFilterType {
            row,
            filter: scanline[0],
        })?;
        let src = &scanline[1..];

        let (done, rest) = output.split_at_mut(row * stride);
        let dst = &mut rest[..stride];
        let prior = if row == 0 { &empty_row[..] } else { &done[(row - 1) * stride..] };

        match filter {
            FilterType::None => dst.copy_from_slice(src),
            FilterType::Sub => decode_sub_filter(src, dst, bytes_per_pixel),
            FilterType::Up => decode_up_filter(src, dst, prior),
            FilterType::Average => decode_average_filter(src, dst, prior, bytes_per_pixel),
            FilterType::Paeth => decode_paeth_filter(src, dst, prior, bytes_per_pixel),
        }
    }

    Ok(output)
}
