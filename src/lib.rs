//! Streaming GIF89a encoder.
//!
//! Frames are pushed in one at a time through [`Encoder::add_frame`]; the
//! frame queue optimizer dedupes identical frames, crops to the minimal
//! dirty rectangle, and rewrites unchanged pixels to a transparent index
//! before the result is LZW-compressed and serialized by the raw writer.
//!
//! ```no_run
//! use gifstream::{Encoder, EncoderConfig, FrameInput, ColorTable};
//!
//! let palette = ColorTable::new(vec![[0, 0, 0], [255, 255, 255]]).unwrap();
//! let config = EncoderConfig::new(2, 2).with_global_palette(palette);
//! let mut encoder = Encoder::create("out.gif", config).unwrap();
//! encoder.add_frame(FrameInput::new(vec![0, 1, 1, 0])).unwrap();
//! encoder.close().unwrap();
//! ```

mod bitpack;
mod diff;
mod encoder;
mod error;
mod flags;
mod lzw;
mod palette;
mod queue;
mod raw;
mod sink;
mod subblock;

pub use encoder::{Encoder, EncoderConfig, FrameInput};
pub use error::{EncodeError, ErrorKind, Result};
pub use flags::{CanvasAttributeFlags, CanvasGeneratorFlags, FrameAttributeFlags, FrameGeneratorFlags};
pub use palette::ColorTable;
pub use raw::Disposal;
pub use sink::WriteSink;
