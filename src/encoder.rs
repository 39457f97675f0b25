//! Public encoder handle: wires configuration, the frame queue optimizer
//! (component F), and the raw GIF writer (component D) behind a small,
//! sticky-failure `Result`-returning API.
//!
//! Replaces the C ancestor's errno-on-handle pattern (see `DESIGN.md`'s
//! "Re-architecture hints" entry): once an operation fails, the handle
//! remembers the [`ErrorKind`] and every subsequent call returns
//! [`EncodeError::Poisoned`] until `close()` is called.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{EncodeError, ErrorKind, Result};
use crate::flags::{CanvasAttributeFlags, CanvasGeneratorFlags, FrameAttributeFlags, FrameGeneratorFlags};
use crate::palette::ColorTable;
use crate::queue::{FrameConfig, FrameQueue};
use crate::raw::{RawWriter, RawWriterConfig};
use crate::sink::{self, WriteSink};

/// Canvas-wide settings fixed for the encoder's lifetime.
pub struct EncoderConfig {
    width: u16,
    height: u16,
    global_palette: Option<ColorTable>,
    attr_flags: CanvasAttributeFlags,
    gen_flags: CanvasGeneratorFlags,
    loop_count: u16,
}

impl EncoderConfig {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            global_palette: None,
            attr_flags: CanvasAttributeFlags::empty(),
            gen_flags: CanvasGeneratorFlags::empty(),
            loop_count: 0,
        }
    }

    pub fn with_global_palette(mut self, palette: ColorTable) -> Self {
        self.global_palette = Some(palette);
        self
    }

    pub fn with_attr_flags(mut self, flags: CanvasAttributeFlags) -> Self {
        self.attr_flags = flags;
        self
    }

    pub fn with_gen_flags(mut self, flags: CanvasGeneratorFlags) -> Self {
        self.gen_flags = flags;
        self
    }

    pub fn with_loop_count(mut self, loop_count: u16) -> Self {
        self.loop_count = loop_count;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(EncodeError::Invalid("canvas dimensions must be non-zero".into()));
        }
        if self.attr_flags.contains(CanvasAttributeFlags::NO_GLOBAL_TABLE) && self.global_palette.is_some() {
            return Err(EncodeError::Invalid("NO_GLOBAL_TABLE set but a global palette was provided".into()));
        }
        if !self.attr_flags.contains(CanvasAttributeFlags::NO_GLOBAL_TABLE) && self.global_palette.is_none() {
            return Err(EncodeError::Invalid("a global palette is required unless NO_GLOBAL_TABLE is set".into()));
        }
        Ok(())
    }
}

/// A per-frame submission. Thin builder over [`crate::queue::FrameConfig`].
pub struct FrameInput {
    pub pixels: Vec<u8>,
    pub local_palette: Option<ColorTable>,
    pub attr_flags: FrameAttributeFlags,
    pub gen_flags: FrameGeneratorFlags,
    pub delay: u16,
    pub transparent_index: u8,
}

impl FrameInput {
    pub fn new(pixels: Vec<u8>) -> Self {
        Self {
            pixels,
            local_palette: None,
            attr_flags: FrameAttributeFlags::empty(),
            gen_flags: FrameGeneratorFlags::empty(),
            delay: 0,
            transparent_index: 0,
        }
    }
}

impl From<FrameInput> for FrameConfig {
    fn from(input: FrameInput) -> Self {
        FrameConfig {
            pixels: input.pixels,
            local_palette: input.local_palette,
            attr_flags: input.attr_flags,
            gen_flags: input.gen_flags,
            delay: input.delay,
            transparent_index: input.transparent_index,
        }
    }
}

/// Streaming GIF89a encoder. Not `Clone`; used through `&mut self` until
/// [`Encoder::close`] consumes it.
pub struct Encoder<W: WriteSink> {
    raw: RawWriter<W>,
    queue: FrameQueue,
    poisoned: Option<ErrorKind>,
}

impl<W: WriteSink> Encoder<W> {
    /// Validates `config`, writes the GIF header/global table/looping
    /// extension immediately, and returns a ready-to-use handle.
    pub fn new(config: EncoderConfig, sink: W) -> Result<Self> {
        config.validate()?;

        let is_animated = config.attr_flags.contains(CanvasAttributeFlags::IS_ANIMATED);
        let no_loop = config.attr_flags.contains(CanvasAttributeFlags::NO_LOOP);

        let queue = FrameQueue::new(
            config.width,
            config.height,
            config.attr_flags,
            config.gen_flags,
            config.global_palette.clone(),
        );

        let raw = RawWriter::new(
            sink,
            RawWriterConfig {
                width: config.width,
                height: config.height,
                global_palette: config.global_palette,
                is_animated,
                no_loop,
                loop_count: config.loop_count,
            },
        )?;

        log::debug!("encoder created");
        Ok(Self { raw, queue, poisoned: None })
    }

    /// Queues one frame, possibly flushing a previously queued one.
    pub fn add_frame(&mut self, frame: FrameInput) -> Result<()> {
        if let Some(kind) = self.poisoned {
            return Err(EncodeError::Poisoned(kind));
        }
        match self.queue.submit(frame.into(), &mut self.raw) {
            Ok(()) => Ok(()),
            Err(err) => {
                log::warn!("encoder poisoned by {err}");
                self.poisoned = Some(err.kind());
                Err(err)
            }
        }
    }

    /// Flushes any remaining queued frames, writes the trailer, and closes
    /// the sink. Runs even if the handle was already poisoned, and returns
    /// the first error encountered (preferring the original poison reason).
    pub fn close(mut self) -> Result<()> {
        let drain_result = self.queue.drain(&mut self.raw);

        let no_frames_written = !self.queue.wrote_any_frame();

        let first_error = match (self.poisoned, drain_result) {
            (Some(kind), _) => Some(EncodeError::Poisoned(kind)),
            (None, Err(e)) => Some(e),
            (None, Ok(())) => None,
        };

        let close_result = self.raw.close();

        if let Some(err) = first_error {
            return Err(err);
        }
        close_result?;

        if no_frames_written {
            return Err(EncodeError::Invalid("close() called without ever adding a frame".into()));
        }

        Ok(())
    }
}

impl Encoder<BufWriter<File>> {
    /// Convenience constructor that opens `path` for writing.
    pub fn create(path: impl AsRef<Path>, config: EncoderConfig) -> Result<Self> {
        let file = sink::file_sink(path).map_err(EncodeError::Write)?;
        Self::new(config, file)
    }
}
