#[cfg(test)]
mod tests {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;
    use std::time::Duration;
    use vexel_png::chunks::{IDAT, TEXT, ZTXT};
    use vexel_png::{
        decode, decode_file, writer, BlendOp, Chunk, DecoderOptions, DisposeOp, Image, PixelData, PngDecoder,
        PngInfo, ResourcePool, TransparencyData, VexelError, PNG_SIGNATURE,
    };

    const COLOR_GRAY: u8 = 0;
    const COLOR_INDEXED: u8 = 3;
    const COLOR_RGBA: u8 = 6;

    fn chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + 12);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(tag);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0, 0, 0, 0]);
        out
    }

    fn ihdr_payload(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        let mut data = Vec::with_capacity(13);
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
        data
    }

    fn ihdr(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
        chunk(b"IHDR", &ihdr_payload(width, height, bit_depth, color_type))
    }

    fn actl(num_frames: u32, num_plays: u32) -> Vec<u8> {
        let mut data = num_frames.to_be_bytes().to_vec();
        data.extend_from_slice(&num_plays.to_be_bytes());
        chunk(b"acTL", &data)
    }

    fn fctl(sequence: u32, width: u32, height: u32, x: u32, y: u32, delay_num: u16, delay_den: u16) -> Vec<u8> {
        let mut data = Vec::with_capacity(26);
        for value in [sequence, width, height, x, y] {
            data.extend_from_slice(&value.to_be_bytes());
        }
        data.extend_from_slice(&delay_num.to_be_bytes());
        data.extend_from_slice(&delay_den.to_be_bytes());
        data.extend_from_slice(&[1, 1]);
        chunk(b"fcTL", &data)
    }

    fn fdat(sequence: u32, compressed: &[u8]) -> Vec<u8> {
        let mut data = sequence.to_be_bytes().to_vec();
        data.extend_from_slice(compressed);
        chunk(b"fdAT", &data)
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Prefixes every row with filter type 0 and compresses the result.
    fn image_data(rows: &[&[u8]]) -> Vec<u8> {
        let mut raw = Vec::new();
        for row in rows {
            raw.push(0);
            raw.extend_from_slice(row);
        }
        zlib(&raw)
    }

    fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        for chunk in chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    fn iend() -> Vec<u8> {
        chunk(b"IEND", &[])
    }

    fn solid_rgba(color: [u8; 4], width: usize) -> Vec<u8> {
        color.iter().copied().cycle().take(width * 4).collect()
    }

    fn rgba8(image: &Image) -> Vec<u8> {
        match image.first_pixels().unwrap().pixels() {
            PixelData::Rgba8(pixels) => pixels.clone(),
            other => panic!("Expected 8-bit pixels, got {:?}", other),
        }
    }

    #[test]
    pub fn test_static_rgba() -> Result<(), Box<dyn std::error::Error>> {
        let rows: [&[u8]; 2] = [&[255, 0, 0, 255, 0, 255, 0, 128], &[0, 0, 255, 0, 10, 20, 30, 40]];
        let data = png(&[ihdr(2, 2, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows)), iend()]);

        let decoded = decode(&data)?;

        assert!(!decoded.image.is_animated());
        assert_eq!(decoded.image.width(), 2);
        assert_eq!(decoded.image.height(), 2);
        assert_eq!(rgba8(&decoded.image), [rows[0], rows[1]].concat());

        Ok(())
    }

    #[test]
    pub fn test_gray16() -> Result<(), Box<dyn std::error::Error>> {
        let rows: [&[u8]; 2] = [&[0x12, 0x34], &[0xAB, 0xCD]];
        let data = png(&[ihdr(1, 2, 16, COLOR_GRAY), chunk(b"IDAT", &image_data(&rows)), iend()]);

        let decoded = decode(&data)?;
        let buffer = decoded.image.first_pixels().unwrap();

        assert_eq!(buffer.bit_depth(), 16);
        assert_eq!(buffer.get_pixel(0, 0), Some([0x1234, 0x1234, 0x1234, 0xFFFF]));
        assert_eq!(buffer.get_pixel(0, 1), Some([0xABCD, 0xABCD, 0xABCD, 0xFFFF]));
        assert_eq!(buffer.to_rgba8(), vec![0x12, 0x12, 0x12, 0xFF, 0xAB, 0xAB, 0xAB, 0xFF]);

        Ok(())
    }

    #[test]
    pub fn test_indexed_with_transparency() -> Result<(), Box<dyn std::error::Error>> {
        let palette = [10, 11, 12, 20, 21, 22, 30, 31, 32, 40, 41, 42];
        let rows: [&[u8]; 1] = [&[0b00_01_10_11]];
        let data = png(&[
            ihdr(4, 1, 2, COLOR_INDEXED),
            chunk(b"PLTE", &palette),
            chunk(b"tRNS", &[0, 128]),
            chunk(b"IDAT", &image_data(&rows)),
            iend(),
        ]);

        let decoded = decode(&data)?;

        assert_eq!(decoded.chunks.palette().map(|p| p.len()), Some(4));
        assert_eq!(decoded.chunks.transparency(), Some(&TransparencyData::Palette(vec![0, 128])));
        assert_eq!(
            rgba8(&decoded.image),
            vec![10, 11, 12, 0, 20, 21, 22, 128, 30, 31, 32, 255, 40, 41, 42, 255]
        );

        Ok(())
    }

    #[test]
    pub fn test_indexed_without_palette() {
        let rows: [&[u8]; 1] = [&[0]];
        let data = png(&[ihdr(1, 1, 8, COLOR_INDEXED), chunk(b"IDAT", &image_data(&rows)), iend()]);

        assert!(matches!(decode(&data), Err(VexelError::MissingPalette)));
    }

    #[test]
    pub fn test_bad_signature() {
        let mut data = png(&[ihdr(1, 1, 8, COLOR_RGBA), iend()]);
        data[1] = b'J';

        assert!(matches!(decode(&data), Err(VexelError::BadSignature)));
        assert!(matches!(decode(&[]), Err(VexelError::BadSignature)));
    }

    #[test]
    pub fn test_missing_header() {
        let rows: [&[u8]; 1] = [&[0, 0, 0, 0]];
        let data = png(&[chunk(b"IDAT", &image_data(&rows)), iend()]);

        assert!(matches!(decode(&data), Err(VexelError::MissingHeader)));
    }

    #[test]
    pub fn test_invalid_header_fields() {
        let zero_width = png(&[ihdr(0, 1, 8, COLOR_RGBA), iend()]);
        assert!(matches!(
            decode(&zero_width),
            Err(VexelError::InvalidHeaderField { field: "width", value: 0 })
        ));

        let bad_depth = png(&[ihdr(1, 1, 4, COLOR_RGBA), iend()]);
        assert!(matches!(
            decode(&bad_depth),
            Err(VexelError::InvalidHeaderField { field: "bit depth", value: 4 })
        ));

        let bad_color = png(&[ihdr(1, 1, 8, 5), iend()]);
        assert!(matches!(
            decode(&bad_color),
            Err(VexelError::InvalidHeaderField { field: "color type", value: 5 })
        ));
    }

    #[test]
    pub fn test_header_length() -> Result<(), Box<dyn std::error::Error>> {
        let mut payload = ihdr_payload(1, 1, 8, COLOR_RGBA);
        payload.push(0xEE);

        let rows: [&[u8]; 1] = [&[1, 2, 3, 4]];
        let data = png(&[chunk(b"IHDR", &payload), chunk(b"IDAT", &image_data(&rows)), iend()]);

        assert!(matches!(
            decode(&data),
            Err(VexelError::InvalidHeaderField {
                field: "header length",
                value: 14
            })
        ));

        let options = DecoderOptions::default().set_strict_header_length(false);
        let decoded = PngDecoder::new(&data).with_options(options).decode()?;
        assert_eq!(rgba8(&decoded.image), vec![1, 2, 3, 4]);

        let short = png(&[chunk(b"IHDR", &payload[..12]), iend()]);
        assert!(matches!(
            PngDecoder::new(&short).with_options(options).decode(),
            Err(VexelError::InvalidHeaderField {
                field: "header length",
                value: 12
            })
        ));

        Ok(())
    }

    #[test]
    pub fn test_invalid_filter_type() {
        let raw = [0, 1, 2, 3, 4, 7, 5, 6, 7, 8];
        let data = png(&[ihdr(1, 2, 8, COLOR_RGBA), chunk(b"IDAT", &zlib(&raw)), iend()]);

        assert!(matches!(
            decode(&data),
            Err(VexelError::InvalidFilterType { row: 1, filter: 7 })
        ));
    }

    #[test]
    pub fn test_short_image_data() {
        let rows: [&[u8]; 1] = [&[1, 2, 3, 4]];
        let data = png(&[ihdr(1, 2, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows)), iend()]);

        assert!(matches!(decode(&data), Err(VexelError::CorruptStream(_))));
    }

    #[test]
    pub fn test_truncated_chunk() {
        let rows: [&[u8]; 1] = [&[1, 2, 3, 4]];
        let mut data = png(&[ihdr(1, 1, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows))]);
        data.truncate(data.len() - 6);

        match decode(&data) {
            Err(VexelError::IoError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof),
            other => panic!("Expected UnexpectedEof, got {:?}", other),
        }
    }

    #[test]
    pub fn test_missing_iend() -> Result<(), Box<dyn std::error::Error>> {
        let rows: [&[u8]; 1] = [&[9, 8, 7, 6]];
        let data = png(&[ihdr(1, 1, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows))]);

        assert_eq!(rgba8(&decode(&data)?.image), vec![9, 8, 7, 6]);

        Ok(())
    }

    #[test]
    pub fn test_split_image_data() -> Result<(), Box<dyn std::error::Error>> {
        let row: Vec<u8> = (0..64u8).collect();
        let rows: Vec<&[u8]> = vec![row.as_slice(); 8];
        let compressed = image_data(&rows);

        let mut chunks = vec![ihdr(16, 8, 8, COLOR_RGBA)];
        for piece in compressed.chunks(3) {
            chunks.push(chunk(b"IDAT", piece));
        }
        chunks.push(iend());
        let data = png(&chunks);

        let options = DecoderOptions::default().set_scratch_size(2).set_parallel_threshold(0);
        let decoded = PngDecoder::new(&data).with_options(options).decode()?;

        assert_eq!(decoded.chunks.all(IDAT).len(), 0);
        assert_eq!(rgba8(&decoded.image), row.repeat(8));

        Ok(())
    }

    #[test]
    pub fn test_ancillary_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let mut ztxt = b"Comment\0\0".to_vec();
        ztxt.extend_from_slice(&zlib(b"compressed words"));

        let rows: [&[u8]; 1] = [&[0, 0, 0, 255]];
        let data = png(&[
            ihdr(1, 1, 8, COLOR_RGBA),
            chunk(b"tEXt", b"Title\0Hello"),
            chunk(b"prVt", &[1, 2, 3]),
            chunk(b"gAMA", &45455u32.to_be_bytes()),
            chunk(b"IDAT", &image_data(&rows)),
            chunk(b"zTXt", &ztxt),
            iend(),
        ]);

        let decoded = decode(&data)?;
        let chunks = &decoded.chunks;

        assert!(!chunks.contains(*b"prVt"));
        assert!((chunks.gamma().unwrap() - 0.45455).abs() < 1e-6);

        match chunks.first(TEXT) {
            Some(Chunk::Text(text)) => {
                assert_eq!(text.keyword, "Title");
                assert_eq!(text.text, "Hello");
            }
            other => panic!("Expected tEXt, got {:?}", other),
        }

        match chunks.first(ZTXT) {
            Some(Chunk::CompressedText(text)) => {
                assert_eq!(text.keyword, "Comment");
                assert_eq!(text.decompress()?, "compressed words");
            }
            other => panic!("Expected zTXt, got {:?}", other),
        }

        let info = PngInfo::from(&decoded).to_string();
        assert!(info.contains("Dimensions: 1x1"));
        assert!(info.contains("Text: Title = Hello"));

        Ok(())
    }

    #[test]
    pub fn test_animation_frames() -> Result<(), Box<dyn std::error::Error>> {
        let red = solid_rgba([255, 0, 0, 255], 2);
        let green = solid_rgba([0, 255, 0, 255], 1);
        let blue = solid_rgba([0, 0, 255, 255], 2);

        let data = png(&[
            ihdr(2, 2, 8, COLOR_RGBA),
            actl(2, 0),
            chunk(b"IDAT", &image_data(&[red.as_slice(), red.as_slice()])),
            fctl(0, 1, 1, 1, 1, 3, 0),
            fdat(1, &image_data(&[green.as_slice()])),
            fctl(2, 2, 2, 0, 0, 0, 0),
            fdat(3, &image_data(&[blue.as_slice(), blue.as_slice()])),
            iend(),
        ]);

        let decoded = decode(&data)?;

        let animation = match &decoded.image {
            Image::Animated(animation) => animation,
            other => panic!("Expected animation, got {:?}", other),
        };

        assert_eq!(animation.frame_count(), 2);
        assert!(animation.is_infinite());

        let first = &animation.frames()[0];
        assert_eq!((first.width(), first.height()), (1, 1));
        assert_eq!((first.x_offset, first.y_offset), (1, 1));
        assert_eq!(first.delay_den, 100);
        assert_eq!(first.delay(), Duration::from_millis(30));
        assert_eq!(first.dispose_op, DisposeOp::Background);
        assert_eq!(first.blend_op, BlendOp::Over);
        assert_eq!(first.pixels().pixels(), &PixelData::Rgba8(green));

        let second = &animation.frames()[1];
        assert_eq!(second.delay_num, 0);
        assert_eq!(second.delay_den, 100);
        assert_eq!(second.delay(), Duration::ZERO);
        assert_eq!(second.pixels().pixels(), &PixelData::Rgba8([blue.clone(), blue].concat()));

        // The default image is not part of the animation.
        assert_eq!(decoded.image.first_pixels().unwrap().width(), 1);

        Ok(())
    }

    #[test]
    pub fn test_default_image_as_first_frame() -> Result<(), Box<dyn std::error::Error>> {
        let red = solid_rgba([255, 0, 0, 255], 2);
        let data = png(&[
            ihdr(2, 1, 8, COLOR_RGBA),
            actl(1, 3),
            fctl(0, 2, 1, 0, 0, 1, 10),
            chunk(b"IDAT", &image_data(&[red.as_slice()])),
            iend(),
        ]);

        let decoded = decode(&data)?;

        match &decoded.image {
            Image::Animated(animation) => {
                assert_eq!(animation.frame_count(), 1);
                assert_eq!(animation.num_plays, 3);
                assert_eq!(animation.frames()[0].delay(), Duration::from_millis(100));
                assert_eq!(animation.frames()[0].pixels().pixels(), &PixelData::Rgba8(red));
            }
            other => panic!("Expected animation, got {:?}", other),
        }

        Ok(())
    }

    #[test]
    pub fn test_animation_without_frames() {
        let data = png(&[ihdr(1, 1, 8, COLOR_RGBA), actl(0, 0), iend()]);
        assert!(matches!(decode(&data), Err(VexelError::MissingAnimationControl)));

        let data = png(&[ihdr(1, 1, 8, COLOR_RGBA), actl(1, 0), iend()]);
        assert!(matches!(decode(&data), Err(VexelError::CorruptStream(_))));
    }

    #[test]
    pub fn test_empty_frame_region() {
        let data = png(&[ihdr(2, 2, 8, COLOR_RGBA), actl(1, 0), fctl(0, 0, 2, 0, 0, 1, 1), iend()]);

        assert!(matches!(decode(&data), Err(VexelError::CorruptStream(_))));
    }

    #[test]
    pub fn test_oversized_header() {
        let data = png(&[ihdr(1 << 24, 1 << 24, 16, COLOR_RGBA), iend()]);

        assert!(matches!(
            decode(&data),
            Err(VexelError::InvalidHeaderField {
                field: "width",
                value: 16777216
            })
        ));

        let options = DecoderOptions::default().set_max_width(u32::MAX).set_max_height(u32::MAX);
        assert!(matches!(
            PngDecoder::new(&data).with_options(options).decode(),
            Err(VexelError::CorruptStream(_))
        ));
    }

    #[test]
    pub fn test_oversized_frame() {
        let data = png(&[
            ihdr(1, 1, 16, COLOR_RGBA),
            actl(1, 0),
            fctl(0, 1 << 24, 1 << 24, 0, 0, 1, 1),
            iend(),
        ]);

        assert!(matches!(
            decode(&data),
            Err(VexelError::InvalidHeaderField {
                field: "frame width",
                value: 16777216
            })
        ));

        let options = DecoderOptions::default().set_max_width(u32::MAX).set_max_height(u32::MAX);
        assert!(matches!(
            PngDecoder::new(&data).with_options(options).decode(),
            Err(VexelError::CorruptStream(_))
        ));
    }

    #[test]
    pub fn test_signature_without_header() {
        assert!(matches!(decode(&PNG_SIGNATURE), Err(VexelError::MissingHeader)));
    }

    #[test]
    pub fn test_palette_after_animation_control() -> Result<(), Box<dyn std::error::Error>> {
        let data = png(&[
            ihdr(2, 1, 8, COLOR_INDEXED),
            actl(1, 0),
            chunk(b"PLTE", &[1, 2, 3, 4, 5, 6]),
            fctl(0, 2, 1, 0, 0, 1, 1),
            fdat(1, &image_data(&[&[1u8, 0][..]])),
            iend(),
        ]);

        let decoded = decode(&data)?;

        assert_eq!(rgba8(&decoded.image), vec![4, 5, 6, 255, 1, 2, 3, 255]);

        Ok(())
    }

    #[test]
    pub fn test_resource_pool_reuse() -> Result<(), Box<dyn std::error::Error>> {
        let rows: [&[u8]; 1] = [&[5, 6, 7, 8]];
        let data = png(&[ihdr(1, 1, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows)), iend()]);

        let pool = ResourcePool::new();
        assert_eq!(pool.idle(), 0);

        let first = pool.decode(&data)?;
        assert_eq!(pool.idle(), 1);

        let second = pool.decode(&data)?;
        assert_eq!(pool.idle(), 1);
        assert_eq!(rgba8(&first.image), rgba8(&second.image));

        // A failed decode still returns its resources.
        assert!(pool.decode(&data[..20]).is_err());
        assert_eq!(pool.idle(), 1);
        assert_eq!(rgba8(&pool.decode(&data)?.image), vec![5, 6, 7, 8]);

        Ok(())
    }

    #[test]
    pub fn test_resource_pool_threads() {
        let row: Vec<u8> = (0..=255u8).collect();
        let rows: Vec<&[u8]> = vec![row.as_slice(); 32];
        let data = png(&[ihdr(64, 32, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows)), iend()]);
        let expected = row.repeat(32);

        let pool = ResourcePool::new();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..8 {
                        let decoded = pool.decode(&data).unwrap();
                        assert_eq!(rgba8(&decoded.image), expected);
                    }
                });
            }
        });

        assert!((1..=4).contains(&pool.idle()));
    }

    #[test]
    pub fn test_decode_file_and_pam() -> Result<(), Box<dyn std::error::Error>> {
        let rows: [&[u8]; 1] = [&[1, 2, 3, 4, 5, 6, 7, 8]];
        let data = png(&[ihdr(2, 1, 8, COLOR_RGBA), chunk(b"IDAT", &image_data(&rows)), iend()]);

        let path = std::env::temp_dir().join(format!("vexel-png-test-{}.png", std::process::id()));
        std::fs::write(&path, &data)?;
        let decoded = decode_file(&path);
        std::fs::remove_file(&path)?;
        let decoded = decoded?;

        let mut pam = Vec::new();
        writer::write_pam(&mut pam, decoded.image.first_pixels().unwrap())?;

        let header = b"P7\nWIDTH 2\nHEIGHT 1\nDEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n";
        assert_eq!(&pam[..header.len()], header);
        assert_eq!(&pam[header.len()..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        assert!(decode_file("/nonexistent/vexel-png/image.png").is_err());

        Ok(())
    }
}
