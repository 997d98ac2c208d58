use crate::utils::image::{PixelBuffer, PixelData};
use std::fs::File;
use std::io::{BufWriter, Error, Write};
use std::path::Path;

/// Writes a pixel buffer as a PAM (P7) image with an RGB_ALPHA tuple type.
///
/// 16-bit buffers keep their full precision with MAXVAL 65535, samples big-endian.
pub fn write_pam<W: Write>(out: &mut W, buffer: &PixelBuffer) -> Result<(), Error> {
    out.write_all(b"P7\n")?;
    out.write_all(format!("WIDTH {}\n", buffer.width()).as_bytes())?;
    out.write_all(format!("HEIGHT {}\n", buffer.height()).as_bytes())?;

    match buffer.pixels() {
        PixelData::Rgba8(pixels) => {
            out.write_all(b"DEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n")?;
            out.write_all(pixels)?;
        }
        PixelData::Rgba16(pixels) => {
            out.write_all(b"DEPTH 4\nMAXVAL 65535\nTUPLTYPE RGB_ALPHA\nENDHDR\n")?;
            for value in pixels {
                out.write_all(&value.to_be_bytes())?;
            }
        }
    }

    Ok(())
}

pub fn write_pam_file<P: AsRef<Path>>(path: P, buffer: &PixelBuffer) -> Result<(), Error> {
    let mut file = BufWriter::new(File::create(path)?);
    write_pam(&mut file, buffer)?;
    file.flush()
}
