use crate::decoders::png::chunks::{ChunkMap, TransparencyData};
use crate::decoders::png::header::{ColorType, ImageHeader};
use crate::log_warn;
use crate::utils::error::{VexelError, VexelResult};
use crate::utils::image::{PixelBuffer, PixelData};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

/// Runs `f` over matching output and input rows, in parallel when asked
/// to and the `rayon` feature is on. Returns the sum of `f`'s results.
fn for_each_row<T, F>(output: &mut [T], out_stride: usize, data: &[u8], in_stride: usize, parallel: bool, f: F) -> usize
where
    T: Send,
    F: Fn(&[u8], &mut [T]) -> usize + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        if parallel {
            return output
                .par_chunks_mut(out_stride)
                .zip(data.par_chunks(in_stride))
                .map(|(dst, src)| f(src, dst))
                .sum();
        }
    }

    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    output
        .chunks_mut(out_stride)
        .zip(data.chunks(in_stride))
        .map(|(dst, src)| f(src, dst))
        .sum()
}

/// For every possible byte, the samples packed into it, most significant first.
fn sample_table(bit_depth: u8) -> Vec<[u8; 8]> {
    let per_byte = (8 / bit_depth) as usize;
    let mask = (1u16 << bit_depth) - 1;

    (0..256u16)
        .map(|byte| {
            let mut samples = [0u8; 8];
            for (k, sample) in samples.iter_mut().take(per_byte).enumerate() {
                let shift = 8 - bit_depth as usize * (k + 1);
                *sample = ((byte >> shift) & mask) as u8;
            }
            samples
        })
        .collect()
}

fn packed_samples<'a>(src: &'a [u8], table: &'a [[u8; 8]], per_byte: usize) -> impl Iterator<Item = u8> + 'a {
    src.iter()
        .flat_map(move |&byte| table[byte as usize][..per_byte].iter().copied())
}

/// RGBA for every index; entries past the palette are opaque black.
fn palette_table(palette: &[[u8; 3]], alpha: &[u8]) -> Vec<[u8; 4]> {
    (0..256usize)
        .map(|i| match palette.get(i) {
            Some(rgb) => [rgb[0], rgb[1], rgb[2], alpha.get(i).copied().unwrap_or(255)],
            None => OPAQUE_BLACK,
        })
        .collect()
}

fn be16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// Expands defiltered scanlines into canonical RGBA, applying PLTE and tRNS.
///
/// Depths 1 to 8 produce 8-bit channels, depth 16 produces 16-bit channels.
pub fn unpack(data: &[u8], header: &ImageHeader, chunks: &ChunkMap, parallel_threshold: usize) -> VexelResult<PixelBuffer> {
    let width = header.width as usize;
    let height = header.height as usize;
    let stride = header.row_stride();
    let out_stride = width * 4;

    if data.len() != stride * height {
        return Err(VexelError::CorruptStream(format!(
            "Defiltered data is {} bytes, expected {}",
            data.len(),
            stride * height
        )));
    }

    let parallel = header.pixel_count() >= parallel_threshold;
    let transparency = chunks.transparency();
    let depth = header.bit_depth;

    let pixels = match (header.color_type, depth) {
        (ColorType::Indexed, 1 | 2 | 4 | 8) => {
            let palette = chunks.palette().ok_or(VexelError::MissingPalette)?;
            let alpha: &[u8] = match transparency {
                Some(TransparencyData::Palette(alpha)) => alpha,
                _ => &[],
            };

            let table = palette_table(palette, alpha);
            let valid = palette.len().min(256);
            let mut out = vec![0u8; out_stride * height];

            let overflow = if depth == 8 {
                for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                    unpack_indexed(src.iter().copied(), dst, &table, valid)
                })
            } else {
                let samples = sample_table(depth);
                let per_byte = (8 / depth) as usize;
                for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                    unpack_indexed(packed_samples(src, &samples, per_byte), dst, &table, valid)
                })
            };

            if overflow > 0 {
                log_warn!(
                    "{} pixels reference entries past the {}-entry palette, decoded as black",
                    overflow,
                    palette.len()
                );
            }

            PixelData::Rgba8(out)
        }
        (ColorType::Grayscale, 16) => {
            let key = match transparency {
                Some(TransparencyData::Grayscale(value)) => Some(*value),
                _ => None,
            };

            let mut out = vec![0u16; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (gray, px) in src.chunks_exact(2).zip(dst.chunks_exact_mut(4)) {
                    let value = be16(gray);
                    let alpha = if key == Some(value) { 0 } else { u16::MAX };
                    px.copy_from_slice(&[value, value, value, alpha]);
                }
                0
            });

            PixelData::Rgba16(out)
        }
        (ColorType::Grayscale, 1 | 2 | 4 | 8) => {
            let key = match transparency {
                Some(TransparencyData::Grayscale(value)) => Some(*value),
                _ => None,
            };

            let scale = 255 / ((1u16 << depth) - 1);
            let mut out = vec![0u8; out_stride * height];

            let expand = |raw: u8, px: &mut [u8]| {
                let scaled = raw as u16 * scale;
                let alpha = if key == Some(raw as u16) || key == Some(scaled) { 0 } else { 255 };
                px.copy_from_slice(&[scaled as u8, scaled as u8, scaled as u8, alpha]);
            };

            if depth == 8 {
                for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                    for (&raw, px) in src.iter().zip(dst.chunks_exact_mut(4)) {
                        expand(raw, px);
                    }
                    0
                });
            } else {
                let samples = sample_table(depth);
                let per_byte = (8 / depth) as usize;
                for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                    for (raw, px) in packed_samples(src, &samples, per_byte).zip(dst.chunks_exact_mut(4)) {
                        expand(raw, px);
                    }
                    0
                });
            }

            PixelData::Rgba8(out)
        }
        (ColorType::RGB, 8) => {
            let key = match transparency {
                Some(TransparencyData::RGB(r, g, b)) => Some([*r, *g, *b]),
                _ => None,
            };

            let mut out = vec![0u8; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (rgb, px) in src.chunks_exact(3).zip(dst.chunks_exact_mut(4)) {
                    let opaque = key != Some([rgb[0] as u16, rgb[1] as u16, rgb[2] as u16]);
                    px.copy_from_slice(&[rgb[0], rgb[1], rgb[2], if opaque { 255 } else { 0 }]);
                }
                0
            });

            PixelData::Rgba8(out)
        }
        (ColorType::RGB, 16) => {
            let key = match transparency {
                Some(TransparencyData::RGB(r, g, b)) => Some([*r, *g, *b]),
                _ => None,
            };

            let mut out = vec![0u16; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (rgb, px) in src.chunks_exact(6).zip(dst.chunks_exact_mut(4)) {
                    let color = [be16(&rgb[0..2]), be16(&rgb[2..4]), be16(&rgb[4..6])];
                    let alpha = if key == Some(color) { 0 } else { u16::MAX };
                    px.copy_from_slice(&[color[0], color[1], color[2], alpha]);
                }
                0
            });

            PixelData::Rgba16(out)
        }
        (ColorType::GrayscaleAlpha, 8) => {
            let mut out = vec![0u8; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (ga, px) in src.chunks_exact(2).zip(dst.chunks_exact_mut(4)) {
                    px.copy_from_slice(&[ga[0], ga[0], ga[0], ga[1]]);
                }
                0
            });

            PixelData::Rgba8(out)
        }
        (ColorType::GrayscaleAlpha, 16) => {
            let mut out = vec![0u16; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (ga, px) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
                    let gray = be16(&ga[0..2]);
                    px.copy_from_slice(&[gray, gray, gray, be16(&ga[2..4])]);
                }
                0
            });

            PixelData::Rgba16(out)
        }
        (ColorType::RGBA, 8) => PixelData::Rgba8(data.to_vec()),
        (ColorType::RGBA, 16) => {
            let mut out = vec![0u16; out_stride * height];
            for_each_row(&mut out, out_stride, data, stride, parallel, |src, dst| {
                for (sample, value) in src.chunks_exact(2).zip(dst.iter_mut()) {
                    *value = be16(sample);
                }
                0
            });

            PixelData::Rgba16(out)
        }
        (_, depth) => {
            return Err(VexelError::InvalidHeaderField {
                field: "bit depth",
                value: depth as u32,
            })
        }
    };

    Ok(PixelBuffer::new(header.width, header.height, pixels))
}

/// Looks up each index in the RGBA palette table, returning how many
/// indices fell past the palette.
fn unpack_indexed(indices: impl Iterator<Item = u8>, dst: &mut [u8], table: &[[u8; 4]], valid: usize) -> usize {
    let mut overflow = 0;

    for (index, px) in indices.zip(dst.chunks_exact_mut(4)) {
        if index as usize >= valid {
            overflow += 1;
        }
        px.copy_from_slice(&table[index as usize]);
    }

    overflow
}
