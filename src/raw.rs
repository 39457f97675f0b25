//! GIF89a envelope serialization: header, color tables, extensions, and
//! per-frame image descriptors, driving the LZW encoder (component C) and
//! the bit-packer/sub-block framer beneath it.
//!
//! Grounded in `cgif_raw.c`'s `cgif_raw_newgif`/`cgif_raw_addframe`/
//! `cgif_raw_close`, reading byte-for-byte off the GIF89a layout, and in
//! `gered-ggdt`'s `gif.rs` for the idiomatic little-endian struct-write style.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{EncodeError, Result};
use crate::lzw;
use crate::palette::{self, ColorTable};
use crate::sink::WriteSink;
use crate::subblock;

const GIF_HEADER: &[u8; 6] = b"GIF89a";
const NETSCAPE_IDENTIFIER: &[u8; 11] = b"NETSCAPE2.0";
const TRAILER: u8 = 0x3B;
const IMAGE_SEPARATOR: u8 = 0x2C;
const EXTENSION_INTRODUCER: u8 = 0x21;
const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
const APPLICATION_LABEL: u8 = 0xFF;

/// Disposal method recorded in a frame's Graphic Control Extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    #[default]
    Unspecified = 0,
    DoNotDispose = 1,
    RestoreToBackground = 2,
    RestoreToPrevious = 3,
}

/// Canvas-level configuration fixed for the lifetime of a [`RawWriter`].
pub struct RawWriterConfig {
    pub width: u16,
    pub height: u16,
    pub global_palette: Option<ColorTable>,
    pub is_animated: bool,
    pub no_loop: bool,
    pub loop_count: u16,
}

/// One frame's worth of already-decided placement, palette, and timing,
/// handed down by the frame queue optimizer (component F).
pub struct FrameDescriptor<'a> {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlace: bool,
    pub local_palette: Option<&'a ColorTable>,
    pub pixels: &'a [u8],
    pub disposal: Disposal,
    pub transparent_index: Option<u8>,
    pub delay: u16,
}

/// Owns the write sink and streams GIF bytes into it one section at a time.
pub struct RawWriter<W: WriteSink> {
    sink: W,
    config: RawWriterConfig,
    wrote_header: bool,
}

impl<W: WriteSink> RawWriter<W> {
    /// Opens `sink` and immediately writes the header, global color table
    /// (if any), and Netscape looping extension (if animated).
    pub fn new(mut sink: W, config: RawWriterConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(EncodeError::Invalid("canvas dimensions must be non-zero".into()));
        }

        let mut header = Vec::with_capacity(13);
        header.extend_from_slice(GIF_HEADER);
        header.write_u16::<LittleEndian>(config.width).unwrap();
        header.write_u16::<LittleEndian>(config.height).unwrap();

        let packed = match &config.global_palette {
            Some(table) => 0b1000_0000 | table.size_field(),
            None => 0,
        };
        header.push(packed);
        header.push(0); // background color index
        header.push(0); // pixel aspect ratio

        sink.write_bytes(&header).map_err(EncodeError::Write)?;

        if let Some(table) = &config.global_palette {
            sink.write_bytes(&table.padded_bytes()).map_err(EncodeError::Write)?;
        }

        if config.is_animated && !config.no_loop {
            let mut ext = Vec::with_capacity(19);
            ext.push(EXTENSION_INTRODUCER);
            ext.push(APPLICATION_LABEL);
            ext.push(11);
            ext.extend_from_slice(NETSCAPE_IDENTIFIER);
            ext.push(3);
            ext.push(1);
            ext.write_u16::<LittleEndian>(config.loop_count).unwrap();
            ext.push(0);
            sink.write_bytes(&ext).map_err(EncodeError::Write)?;
        }

        log::debug!(
            "raw writer opened {}x{} canvas, animated={}",
            config.width,
            config.height,
            config.is_animated
        );

        Ok(Self { sink, config, wrote_header: true })
    }

    /// Writes one frame's Graphic Control Extension (if needed), Image
    /// Descriptor, optional local color table, and LZW-compressed pixels.
    pub fn write_frame(&mut self, frame: FrameDescriptor<'_>) -> Result<()> {
        debug_assert!(self.wrote_header);

        let needs_gce = self.config.is_animated || frame.transparent_index.is_some();
        if needs_gce {
            let mut gce = Vec::with_capacity(8);
            gce.push(EXTENSION_INTRODUCER);
            gce.push(GRAPHIC_CONTROL_LABEL);
            gce.push(4);
            let disposal_bits = (frame.disposal as u8) << 2;
            let transparent_flag = frame.transparent_index.is_some() as u8;
            gce.push(disposal_bits | transparent_flag);
            gce.write_u16::<LittleEndian>(frame.delay).unwrap();
            gce.push(frame.transparent_index.unwrap_or(0));
            gce.push(0);
            self.sink.write_bytes(&gce).map_err(EncodeError::Write)?;
        }

        let mut descriptor = Vec::with_capacity(10);
        descriptor.push(IMAGE_SEPARATOR);
        descriptor.write_u16::<LittleEndian>(frame.left).unwrap();
        descriptor.write_u16::<LittleEndian>(frame.top).unwrap();
        descriptor.write_u16::<LittleEndian>(frame.width).unwrap();
        descriptor.write_u16::<LittleEndian>(frame.height).unwrap();

        let mut packed = 0u8;
        if frame.local_palette.is_some() {
            packed |= 0b1000_0000;
        }
        if frame.interlace {
            packed |= 0b0100_0000;
        }
        if let Some(table) = frame.local_palette {
            packed |= table.size_field();
        }
        descriptor.push(packed);
        self.sink.write_bytes(&descriptor).map_err(EncodeError::Write)?;

        if let Some(table) = frame.local_palette {
            self.sink.write_bytes(&table.padded_bytes()).map_err(EncodeError::Write)?;
        }

        let active_palette = frame
            .local_palette
            .or(self.config.global_palette.as_ref())
            .ok_or_else(|| EncodeError::Invalid("frame has no local or global color table".into()))?;

        let eff_colors =
            palette::effective_color_count(active_palette.len(), frame.transparent_index.map(|i| i as u16));
        let init_dict_len = palette::padded_table_size(eff_colors).max(4) as u16;
        let init_code_len = (init_dict_len.trailing_zeros() as u8 + 1).max(3);

        let pixels = if frame.interlace {
            interlace_reorder(frame.pixels, frame.width, frame.height)
        } else {
            frame.pixels.to_vec()
        };

        let lzw_codes = lzw::encode(&pixels, init_dict_len, init_code_len)?;

        self.sink.write_bytes(&[init_code_len - 1]).map_err(EncodeError::Write)?;
        self.sink
            .write_bytes(&subblock::frame_sub_blocks(&lzw_codes))
            .map_err(EncodeError::Write)?;

        Ok(())
    }

    /// Writes the trailer byte and releases the sink.
    pub fn close(mut self) -> Result<()> {
        self.sink.write_bytes(&[TRAILER]).map_err(EncodeError::Write)?;
        self.sink.close_sink().map_err(EncodeError::Close)?;
        Ok(())
    }
}

/// Reorders rows into GIF's four interlace passes: 0,8,16..; 4,12,20..;
/// 2,6,10..; 1,3,5...
fn interlace_reorder(pixels: &[u8], width: u16, height: u16) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    let mut out = Vec::with_capacity(pixels.len());
    let passes: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];
    for (start, step) in passes {
        let mut y = start;
        while y < h {
            out.extend_from_slice(&pixels[y * w..(y + 1) * w]);
            y += step;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interlace_reorder_single_row_is_identity() {
        let pixels = [1, 2, 3];
        let out = interlace_reorder(&pixels, 3, 1);
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn interlace_reorder_follows_pass_order() {
        // 8 rows, one pixel each, row value == row index.
        let pixels: Vec<u8> = (0..8).collect();
        let out = interlace_reorder(&pixels, 1, 8);
        // pass 1: rows 0 -- step 8 only hits row 0 within height 8
        // pass 2: row 4
        // pass 3: rows 2, 6
        // pass 4: rows 1, 3, 5, 7
        assert_eq!(out, vec![0, 4, 2, 6, 1, 3, 5, 7]);
    }

    #[test]
    fn write_frame_rejects_missing_palette() {
        let cfg = RawWriterConfig {
            width: 1,
            height: 1,
            global_palette: None,
            is_animated: false,
            no_loop: true,
            loop_count: 0,
        };
        let mut writer = RawWriter::new(Vec::new(), cfg).unwrap();
        let frame = FrameDescriptor {
            left: 0,
            top: 0,
            width: 1,
            height: 1,
            interlace: false,
            local_palette: None,
            pixels: &[0],
            disposal: Disposal::Unspecified,
            transparent_index: None,
            delay: 0,
        };
        assert!(writer.write_frame(frame).is_err());
    }

    #[test]
    fn header_round_trips_basic_fields() {
        let table = ColorTable::new(vec![[0, 0, 0], [255, 255, 255]]).unwrap();
        let cfg = RawWriterConfig {
            width: 10,
            height: 20,
            global_palette: Some(table),
            is_animated: true,
            no_loop: false,
            loop_count: 0,
        };
        let mut buf = Vec::new();
        {
            let writer = RawWriter::new(&mut buf, cfg).unwrap();
            writer.close().unwrap();
        }
        assert_eq!(&buf[0..6], b"GIF89a");
        assert_eq!(u16::from_le_bytes([buf[6], buf[7]]), 10);
        assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 20);
        assert_eq!(*buf.last().unwrap(), TRAILER);
    }
}
