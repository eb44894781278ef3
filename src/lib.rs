//! # IPPcode23 Runtime
//!
//! A virtual machine for IPPcode23, a three-address-code XML intermediate
//! language: an XML source loader, a tagged-value/frame model, and a
//! fetch-decode-execute dispatcher.
//!
//! The crate is organized leaves-first, matching the cooperating pieces
//! described for the VM:
//! - [`value`] — the tagged runtime value.
//! - [`frame`] — the three named frames (GF/LF/TF) and the local-frame
//!   stack.
//! - [`program`] — the XML source loader and instruction representation.
//! - [`io`] — the line-oriented I/O adapter `READ`/`WRITE`/`DPRINT` read
//!   and write through.
//! - [`vm`] — the dispatcher: label pre-pass, operand/call stacks, and
//!   per-opcode semantics.
//! - [`error`] — the fault taxonomy and CLI usage errors.

pub mod error;
pub mod frame;
pub mod io;
pub mod program;
pub mod value;
pub mod vm;
