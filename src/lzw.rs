//! GIF-variant LZW compression.
//!
//! Grounded in the two-level dictionary layout of `cgif_raw.c`'s
//! `resetDict`/`add_child`/`lzw_crawl_tree`, reimplemented without a fixed
//! `MAX_DICT_LEN/2 + 1` map-row cap (see `DESIGN.md`), and in the bit-width
//! bump schedule of `create_byte_list`.

use crate::bitpack::BitPacker;
use crate::error::{EncodeError, Result};

/// Dictionary entries never exceed this count; reaching it forces a reset.
pub const MAX_DICT_LEN: u16 = 4096;

/// A single dictionary node's extra (non-inline) children, allocated only
/// once a non-root parent gains a second child.
type MapRow = Box<[u16]>;

struct Dictionary {
    init_dict_len: u16,
    dict_pos: u16,
    /// `[parent][color] -> child code`, valid only for `parent < init_dict_len`.
    /// `0` means absent (safe: real child codes start at `init_dict_len + 2`).
    root_table: Vec<u16>,
    /// One inline `(color, child)` slot per non-root parent, indexed directly
    /// by parent code.
    inline_child: Vec<Option<(u8, u16)>>,
    /// Index into `map_rows` once a parent's second child forces promotion.
    map_slot: Vec<Option<usize>>,
    map_rows: Vec<MapRow>,
}

impl Dictionary {
    fn new(init_dict_len: u16) -> Self {
        let root_size = init_dict_len as usize * init_dict_len as usize;
        Self {
            init_dict_len,
            dict_pos: init_dict_len + 2,
            root_table: vec![0; root_size],
            inline_child: vec![None; MAX_DICT_LEN as usize],
            map_slot: vec![None; MAX_DICT_LEN as usize],
            map_rows: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.dict_pos = self.init_dict_len + 2;
        self.root_table.fill(0);
        self.inline_child.fill(None);
        self.map_slot.fill(None);
        self.map_rows.clear();
    }

    fn lookup(&self, parent: u16, color: u8) -> Option<u16> {
        if parent < self.init_dict_len {
            let idx = parent as usize * self.init_dict_len as usize + color as usize;
            match self.root_table[idx] {
                0 => None,
                code => Some(code),
            }
        } else {
            let parent = parent as usize;
            if let Some(row_idx) = self.map_slot[parent] {
                match self.map_rows[row_idx][color as usize] {
                    0 => None,
                    code => Some(code),
                }
            } else {
                match self.inline_child[parent] {
                    Some((c, child)) if c == color => Some(child),
                    _ => None,
                }
            }
        }
    }

    fn insert(&mut self, parent: u16, color: u8, new_code: u16) {
        if parent < self.init_dict_len {
            let idx = parent as usize * self.init_dict_len as usize + color as usize;
            self.root_table[idx] = new_code;
            return;
        }
        let parent = parent as usize;
        if let Some(row_idx) = self.map_slot[parent] {
            self.map_rows[row_idx][color as usize] = new_code;
            return;
        }
        match self.inline_child[parent] {
            None => {
                self.inline_child[parent] = Some((color, new_code));
            }
            Some((existing_color, existing_child)) => {
                let mut row = vec![0u16; self.init_dict_len as usize].into_boxed_slice();
                row[existing_color as usize] = existing_child;
                row[color as usize] = new_code;
                let row_idx = self.map_rows.len();
                self.map_rows.push(row);
                self.map_slot[parent] = Some(row_idx);
            }
        }
    }
}

/// Tracks the current code bit-width and when it must grow.
///
/// Mirrors `create_byte_list`'s counter: the Clear code itself counts toward
/// the post-Clear sequence, and the counter resets to 1 (not 0) in the same
/// step that emits a Clear.
struct WidthSchedule {
    init_code_len: u8,
    width: u8,
    codes_since_clear: u32,
    /// Number of codes-since-clear at which the width must grow next.
    /// Follows `create_byte_list`'s `n`/`dictPos` bump check: the first
    /// threshold is `init_dict_len`, and each following one is
    /// `2 * previous + init_dict_len` (i.e. `(2^k - 1) * init_dict_len`).
    next_threshold: u32,
}

impl WidthSchedule {
    fn new(init_code_len: u8) -> Self {
        Self { init_code_len, width: init_code_len, codes_since_clear: 0, next_threshold: 0 }
    }

    fn current_width(&self) -> u8 {
        self.width
    }

    /// Advances the schedule after a code of kind `is_clear` has just been
    /// emitted at `init_dict_len`.
    fn advance(&mut self, is_clear: bool, init_dict_len: u16) {
        if is_clear {
            self.width = self.init_code_len;
            self.codes_since_clear = 1;
            self.next_threshold = init_dict_len as u32;
            return;
        }
        self.codes_since_clear += 1;
        if self.width >= 12 {
            return;
        }
        if self.codes_since_clear == self.next_threshold {
            self.width += 1;
            self.next_threshold = self.next_threshold * 2 + init_dict_len as u32;
        }
    }
}

/// Compresses `pixels` (each an index `< init_dict_len`) into a GIF LZW code
/// stream, beginning with Clear and ending with End.
///
/// `init_dict_len` must already be the next power of two covering the
/// frame's effective color count (see [`crate::palette::effective_color_count`]).
pub fn encode(pixels: &[u8], init_dict_len: u16, init_code_len: u8) -> Result<Vec<u8>> {
    if let Some(&bad) = pixels.iter().find(|&&p| p as u16 >= init_dict_len) {
        return Err(EncodeError::Index(bad as u16));
    }

    let clear_code = init_dict_len;
    let end_code = init_dict_len + 1;

    let mut dict = Dictionary::new(init_dict_len);
    let mut width = WidthSchedule::new(init_code_len);
    let mut packer = BitPacker::new();

    let emit = |packer: &mut BitPacker, width: &mut WidthSchedule, code: u16, is_clear: bool| {
        packer.push_code(code, width.current_width());
        width.advance(is_clear, init_dict_len);
    };

    emit(&mut packer, &mut width, clear_code, true);

    if pixels.is_empty() {
        emit(&mut packer, &mut width, end_code, false);
        return Ok(packer.into_bytes());
    }

    let mut parent = pixels[0] as u16;
    for &px in &pixels[1..] {
        let color = px;
        if let Some(child) = dict.lookup(parent, color) {
            parent = child;
            continue;
        }

        emit(&mut packer, &mut width, parent, false);

        if dict.dict_pos >= MAX_DICT_LEN {
            log::trace!("lzw dictionary full at {} entries, resetting", MAX_DICT_LEN);
            dict.reset();
            emit(&mut packer, &mut width, clear_code, true);
        } else {
            dict.insert(parent, color, dict.dict_pos);
            dict.dict_pos += 1;
        }
        parent = color as u16;
    }

    emit(&mut packer, &mut width, parent, false);
    emit(&mut packer, &mut width, end_code, false);

    Ok(packer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_pixel_beyond_dictionary() {
        let err = encode(&[0, 1, 4], 4, 3).unwrap_err();
        match err {
            EncodeError::Index(4) => {}
            other => panic!("expected Index(4), got {other:?}"),
        }
    }

    #[test]
    fn empty_frame_emits_clear_then_end_only() {
        let bytes = encode(&[], 4, 3).unwrap();
        // 2 codes of width 3 = 6 bits = 1 byte
        assert_eq!(bytes.len(), 1);
        let clear = 4u8;
        let end = 5u8;
        let packed = bytes[0];
        assert_eq!(packed & 0b111, clear);
        assert_eq!((packed >> 3) & 0b111, end);
    }

    #[test]
    fn single_pixel_emits_clear_pixel_end() {
        let bytes = encode(&[2], 4, 3).unwrap();
        assert!(!bytes.is_empty());
    }

    #[test]
    fn repeated_pixel_reuses_dictionary_entries() {
        // A long run should compress to fewer codes than raw pixel count.
        let pixels = vec![0u8; 64];
        let bytes = encode(&pixels, 4, 3).unwrap();
        // Upper bound: if every pixel were a literal at max width (12 bits),
        // that would be 64 * 12 / 8 = 96 bytes; a real run-length dictionary
        // should do much better.
        assert!(bytes.len() < 96);
    }

    #[test]
    fn width_schedule_bumps_at_cgif_thresholds() {
        let mut w = WidthSchedule::new(3);
        assert_eq!(w.current_width(), 3);
        w.advance(true, 4); // clear
        assert_eq!(w.current_width(), 3);
        assert_eq!(w.codes_since_clear, 1);
        for _ in 0..2 {
            w.advance(false, 4);
        }
        // codes_since_clear now 3; next code (the 4th since clear) needs width 4
        assert_eq!(w.codes_since_clear, 3);
        assert_eq!(w.current_width(), 3);
        w.advance(false, 4);
        // codes_since_clear now 4 == init_dict_len -> width bumped to 4
        assert_eq!(w.codes_since_clear, 4);
        assert_eq!(w.current_width(), 4);

        // second threshold is 3*init_dict_len = 12
        for _ in 0..7 {
            w.advance(false, 4);
        }
        assert_eq!(w.codes_since_clear, 11);
        assert_eq!(w.current_width(), 4);
        w.advance(false, 4);
        assert_eq!(w.codes_since_clear, 12);
        assert_eq!(w.current_width(), 5);
    }

    #[test]
    fn dictionary_resets_when_full() {
        // Force a dictionary small enough (init_dict_len=4) that a highly
        // varied pixel sequence overflows MAX_DICT_LEN and triggers a reset
        // without panicking or producing a malformed (empty) stream.
        let pixels: Vec<u8> = (0..8000).map(|i| (i % 4) as u8).collect();
        let bytes = encode(&pixels, 4, 3).unwrap();
        assert!(!bytes.is_empty());
    }
}
