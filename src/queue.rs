//! Three-slot frame queue: dedupes identical consecutive frames, computes
//! diff windows and transparency rewrites against the previous frame, and
//! forwards finished frames to the raw writer.
//!
//! Grounded in `cgif.c`'s `cgif_addframe`/`flushFrame`/`doWidthHeightOptim`.
//! Slot 0 caches the last frame actually flushed (needed only to diff the
//! *next* submission); slots 1-2 hold up to two not-yet-flushed frames.

use crate::diff::{self, Diff, DiffRect, FrameView};
use crate::error::Result;
use crate::flags::{CanvasAttributeFlags, CanvasGeneratorFlags, FrameAttributeFlags, FrameGeneratorFlags};
use crate::palette::{self, ColorTable};
use crate::raw::{Disposal, FrameDescriptor, RawWriter};
use crate::sink::WriteSink;

/// Caller input for one frame submission.
pub struct FrameConfig {
    pub pixels: Vec<u8>,
    pub local_palette: Option<ColorTable>,
    pub attr_flags: FrameAttributeFlags,
    pub gen_flags: FrameGeneratorFlags,
    pub delay: u16,
    /// Meaningful only when `attr_flags` sets `HAS_SET_TRANSPARENT` or `HAS_ALPHA`.
    pub transparent_index: u8,
}

/// A frame sitting in the queue, not yet flushed.
struct PendingFrame {
    pixels: Vec<u8>,
    local_palette: Option<ColorTable>,
    attr_flags: FrameAttributeFlags,
    gen_flags: FrameGeneratorFlags,
    delay: u32,
    transparent_index: u8,
    disposal: Disposal,
}

/// A cached copy of the last frame actually flushed, kept only so the next
/// submission can be diffed against it.
struct FlushedFrame {
    pixels: Vec<u8>,
    local_palette: Option<ColorTable>,
    transparent_index: Option<u8>,
}

pub struct FrameQueue {
    canvas_width: u16,
    canvas_height: u16,
    canvas_attr: CanvasAttributeFlags,
    canvas_gen: CanvasGeneratorFlags,
    global_palette: Option<ColorTable>,
    prev_flushed: Option<FlushedFrame>,
    pending: Vec<PendingFrame>,
    wrote_any_frame: bool,
}

impl FrameQueue {
    pub fn new(
        canvas_width: u16,
        canvas_height: u16,
        canvas_attr: CanvasAttributeFlags,
        canvas_gen: CanvasGeneratorFlags,
        global_palette: Option<ColorTable>,
    ) -> Self {
        Self {
            canvas_width,
            canvas_height,
            canvas_attr,
            canvas_gen,
            global_palette,
            prev_flushed: None,
            pending: Vec::with_capacity(2),
            wrote_any_frame: false,
        }
    }

    pub fn wrote_any_frame(&self) -> bool {
        self.wrote_any_frame
    }

    fn validate(&self, config: &FrameConfig) -> Result<()> {
        use crate::error::EncodeError;
        let expected_len = self.canvas_width as usize * self.canvas_height as usize;
        if config.pixels.len() != expected_len {
            return Err(EncodeError::Invalid(format!(
                "frame has {} pixels, expected {expected_len} for {}x{} canvas",
                config.pixels.len(),
                self.canvas_width,
                self.canvas_height
            )));
        }
        let uses_local = config.attr_flags.contains(FrameAttributeFlags::USE_LOCAL_TABLE);
        if uses_local && config.local_palette.is_none() {
            return Err(EncodeError::Invalid("USE_LOCAL_TABLE set but no local palette given".into()));
        }
        if !uses_local && self.global_palette.is_none() {
            return Err(EncodeError::Invalid("no local palette and canvas has no global table".into()));
        }
        let has_alpha = config.attr_flags.contains(FrameAttributeFlags::HAS_ALPHA);
        let has_set_transparent = config.attr_flags.contains(FrameAttributeFlags::HAS_SET_TRANSPARENT);
        if has_alpha && has_set_transparent {
            return Err(EncodeError::Invalid("HAS_ALPHA and HAS_SET_TRANSPARENT are mutually exclusive".into()));
        }
        if has_alpha && self.canvas_attr.contains(CanvasAttributeFlags::HAS_TRANSPARENCY) {
            return Err(EncodeError::Invalid(
                "frame HAS_ALPHA conflicts with canvas HAS_TRANSPARENCY".into(),
            ));
        }
        Ok(())
    }

    /// Submits one frame, merging it into the previous one if identical, or
    /// queueing it and flushing the oldest pending frame if the queue is full.
    pub fn submit<W: WriteSink>(&mut self, config: FrameConfig, writer: &mut RawWriter<W>) -> Result<()> {
        self.validate(&config)?;

        if !self.canvas_gen.contains(CanvasGeneratorFlags::KEEP_IDENTICAL_FRAMES) {
            if let Some(last) = self.pending.last_mut() {
                if frames_equal(&config, last, self.global_palette.as_ref()) {
                    if let Some(merged) = last.delay.checked_add(config.delay as u32) {
                        if merged <= u16::MAX as u32 {
                            last.delay = merged;
                            log::debug!("merged identical frame, delay now {merged}");
                            return Ok(());
                        }
                    }
                }
            }
        }

        let mut frame = PendingFrame {
            pixels: config.pixels,
            local_palette: config.local_palette,
            attr_flags: config.attr_flags,
            gen_flags: config.gen_flags,
            delay: config.delay as u32,
            transparent_index: config.transparent_index,
            disposal: Disposal::DoNotDispose,
        };

        let forces_background = self.canvas_attr.contains(CanvasAttributeFlags::HAS_TRANSPARENCY)
            || frame.attr_flags.contains(FrameAttributeFlags::HAS_ALPHA);
        if forces_background {
            frame.disposal = Disposal::RestoreToBackground;
            if let Some(predecessor) = self.pending.last_mut() {
                predecessor.gen_flags.remove(
                    FrameGeneratorFlags::USE_TRANSPARENCY | FrameGeneratorFlags::USE_DIFF_WINDOW,
                );
                predecessor.disposal = Disposal::RestoreToBackground;
            }
        }

        if self.pending.len() >= 2 {
            let oldest = self.pending.remove(0);
            self.flush(oldest, writer)?;
        }
        self.pending.push(frame);

        Ok(())
    }

    /// Flushes all remaining pending frames, in order. Called by `close()`.
    pub fn drain<W: WriteSink>(&mut self, writer: &mut RawWriter<W>) -> Result<()> {
        while !self.pending.is_empty() {
            let next = self.pending.remove(0);
            self.flush(next, writer)?;
        }
        Ok(())
    }

    fn flush<W: WriteSink>(&mut self, cur: PendingFrame, writer: &mut RawWriter<W>) -> Result<()> {
        let active_palette = cur
            .local_palette
            .as_ref()
            .or(self.global_palette.as_ref())
            .expect("validated at submit time");

        let mut gen_flags = cur.gen_flags;
        let is_first_frame = self.prev_flushed.is_none();
        let has_alpha = cur.attr_flags.contains(FrameAttributeFlags::HAS_ALPHA);
        if is_first_frame || has_alpha {
            gen_flags.remove(FrameGeneratorFlags::USE_TRANSPARENCY | FrameGeneratorFlags::USE_DIFF_WINDOW);
        }
        if cur.attr_flags.contains(FrameAttributeFlags::HAS_SET_TRANSPARENT) {
            gen_flags.remove(FrameGeneratorFlags::USE_TRANSPARENCY);
        }
        if active_palette.len() >= 256 {
            gen_flags.remove(FrameGeneratorFlags::USE_TRANSPARENCY);
        }

        let cur_set_transparent = if cur.attr_flags.contains(FrameAttributeFlags::HAS_ALPHA)
            || cur.attr_flags.contains(FrameAttributeFlags::HAS_SET_TRANSPARENT)
        {
            Some(cur.transparent_index)
        } else {
            None
        };

        let mut rect = DiffRect { left: 0, top: 0, width: self.canvas_width, height: self.canvas_height };
        let mut buffer = cur.pixels.clone();
        let mut identical = false;

        if gen_flags.contains(FrameGeneratorFlags::USE_DIFF_WINDOW) {
            let prev = self.prev_flushed.as_ref().expect("USE_DIFF_WINDOW implies a previous frame");
            let cur_view = FrameView {
                pixels: &cur.pixels,
                width: self.canvas_width,
                height: self.canvas_height,
                palette: active_palette,
                transparent_index: cur_set_transparent,
            };
            let prev_palette = prev.local_palette.as_ref().or(self.global_palette.as_ref()).expect("prev frame palette");
            let prev_view = FrameView {
                pixels: &prev.pixels,
                width: self.canvas_width,
                height: self.canvas_height,
                palette: prev_palette,
                transparent_index: prev.transparent_index,
            };
            let global = self.global_palette.as_ref().unwrap_or(active_palette);
            match diff::diff_area(&cur_view, &prev_view, global) {
                Diff::Different(found) => {
                    rect = found;
                    buffer = diff::crop_pixels(&cur.pixels, self.canvas_width, rect);
                }
                Diff::Identical => {
                    identical = true;
                    rect = DiffRect { left: 0, top: 0, width: 1, height: 1 };
                    buffer = vec![cur.pixels[0]];
                }
            }
        }

        let mut transparent_index_out = None;
        if gen_flags.contains(FrameGeneratorFlags::USE_TRANSPARENCY) && !identical {
            if let Some(prev) = &self.prev_flushed {
                let t_idx = palette::pick_transparent_index(active_palette.len());
                let prev_palette = prev.local_palette.as_ref().or(self.global_palette.as_ref()).expect("prev frame palette");
                for y in 0..rect.height {
                    for x in 0..rect.width {
                        let full_x = rect.left + x;
                        let full_y = rect.top + y;
                        let cur_px = cur.pixels[full_y as usize * self.canvas_width as usize + full_x as usize];
                        let prev_px = prev.pixels[full_y as usize * self.canvas_width as usize + full_x as usize];
                        let unchanged = prev.transparent_index != Some(prev_px)
                            && active_palette.get(cur_px as usize) == prev_palette.get(prev_px as usize);
                        if unchanged {
                            buffer[y as usize * rect.width as usize + x as usize] = t_idx as u8;
                        }
                    }
                }
                transparent_index_out = Some(t_idx as u8);
            }
        } else if let Some(idx) = cur_set_transparent {
            transparent_index_out = Some(idx);
        }

        let descriptor = FrameDescriptor {
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
            interlace: cur.attr_flags.contains(FrameAttributeFlags::INTERLACED),
            local_palette: cur.local_palette.as_ref(),
            pixels: &buffer,
            disposal: cur.disposal,
            transparent_index: transparent_index_out,
            delay: cur.delay.min(u16::MAX as u32) as u16,
        };

        log::debug!(
            "flushing frame at ({}, {}) size {}x{}, disposal={:?}",
            descriptor.left,
            descriptor.top,
            descriptor.width,
            descriptor.height,
            descriptor.disposal
        );

        writer.write_frame(descriptor)?;
        self.wrote_any_frame = true;

        self.prev_flushed = Some(FlushedFrame {
            pixels: cur.pixels,
            local_palette: cur.local_palette,
            transparent_index: cur_set_transparent,
        });

        Ok(())
    }
}

/// Whole-frame equality used for the identical-frame merge: compares pixels
/// and palette choice of a not-yet-queued submission against an already
/// pending frame.
fn frames_equal(config: &FrameConfig, pending: &PendingFrame, global: Option<&ColorTable>) -> bool {
    if config.pixels.len() != pending.pixels.len() {
        return false;
    }
    let config_palette = config.local_palette.as_ref().or(global);
    let pending_palette = pending.local_palette.as_ref().or(global);
    let (Some(a), Some(b)) = (config_palette, pending_palette) else {
        return false;
    };
    if a.len() != b.len() || a.padded_bytes() != b.padded_bytes() {
        return false;
    }
    config.pixels == pending.pixels
}
