//! Core library for a triggered-instruction CGRA toolchain.
//!
//! A target device is a tiled mesh of small processing elements. Each element
//! owns a private register file, an optional scratchpad, bounded packet
//! channels toward its cardinal neighbors, and an instruction store whose
//! entries fire when a declarative trigger over architectural state becomes
//! true rather than by program-counter sequencing.
//!
//! This crate provides the three tightly coupled pieces such a toolchain is
//! built around:
//!
//! * [`parameters`]: the architectural parameter model that every other
//!   component derives its widths, counts and feature flags from.
//! * [`assembly`]: the triggered-instruction intermediate representation,
//!   the datapath operation semantics, and the bit-exact machine-code
//!   encoder.
//! * [`simulator`]: a cycle-accurate functional simulator built from
//!   processing elements, bounded channel buffers, memories and routers,
//!   scheduled with a two-phase commit discipline.
//!
//! Parsing assembly text into the IR lives in the `tasm` crate; binary image
//! containers live in the `timage` crate.

pub mod assembly;
pub mod direction;
pub mod parameters;
pub mod simulator;

#[cfg(test)]
pub(crate) mod test_utils;

/// Machine word used for datapath computation and packet payloads.
pub type Word = u32;

/// Packet tag. Only the low `tag_width` bits survive encoding.
pub type Tag = u32;
