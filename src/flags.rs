//! Packed option sets for canvas- and frame-level configuration.
//!
//! Grounded in `gered-ggdt`'s use of `bitflags!` for GIF descriptor packed
//! fields, generalized here to the caller-facing configuration flags rather
//! than wire-level bit layouts (those live in `raw.rs`).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CanvasAttributeFlags: u8 {
        const NO_GLOBAL_TABLE  = 0b0001;
        const IS_ANIMATED      = 0b0010;
        const NO_LOOP          = 0b0100;
        const HAS_TRANSPARENCY = 0b1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CanvasGeneratorFlags: u8 {
        const KEEP_IDENTICAL_FRAMES = 0b0001;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameAttributeFlags: u8 {
        const USE_LOCAL_TABLE     = 0b0001;
        const HAS_SET_TRANSPARENT = 0b0010;
        const HAS_ALPHA           = 0b0100;
        const INTERLACED          = 0b1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameGeneratorFlags: u8 {
        const USE_DIFF_WINDOW  = 0b0001;
        const USE_TRANSPARENCY = 0b0010;
    }
}
