//! # Frame Store for the IPPcode23 VM
//!
//! This module implements the three named variable frames (GF/LF/TF), the
//! frame stack that backs LF, and the define/load/store operations with
//! the invariants from spec §3-4.2.
//!
//! ## Model
//! - **Global (GF)** — exists for the whole program lifetime.
//! - **Temporary (TF)** — may be unallocated, allocated-and-empty, or
//!   allocated-with-bindings.
//! - **Local (LF)** — the top of `frame_stack`; unallocated whenever the
//!   stack is empty.
//!
//! ## Error behavior
//! - A name lookup that misses in an allocated frame →
//!   [`Fault::UndefinedVariable`].
//! - Re-defining a name already present in a frame → [`Fault::SemanticError`].
//! - Using LF/TF while unallocated → [`Fault::UnallocatedFrame`].
//! - Reading a variable that holds `Value::Unset` → [`Fault::MissingValue`]
//!   (checked by callers via [`FrameStore::load`], except `TYPE`'s
//!   documented carve-out).

use std::collections::HashMap;

use crate::error::Fault;
use crate::value::Value;

/// Which of the three named frames an argument refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTag {
    Global,
    Local,
    Temporary,
}

impl FrameTag {
    /// Parse the two-letter frame prefix used in `frame@name` variable
    /// references.
    pub fn parse(s: &str) -> Option<FrameTag> {
        match s {
            "GF" => Some(FrameTag::Global),
            "LF" => Some(FrameTag::Local),
            "TF" => Some(FrameTag::Temporary),
            _ => None,
        }
    }
}

/// A single frame: a name-to-value mapping, unique names within the frame.
#[derive(Debug, Default)]
pub struct Frame {
    bindings: HashMap<String, Value>,
}

impl Frame {
    fn new() -> Self {
        Frame {
            bindings: HashMap::new(),
        }
    }
}

/// Owns GF, TF (optional), and the LF stack, and enforces the allocation
/// and definition invariants for all frame operations.
#[derive(Default)]
pub struct FrameStore {
    global: Frame,
    temporary: Option<Frame>,
    locals: Vec<Frame>,
}

impl FrameStore {
    pub fn new() -> Self {
        FrameStore {
            global: Frame::new(),
            temporary: None,
            locals: Vec::new(),
        }
    }

    /// `CREATEFRAME`: unconditionally replace TF with a new empty frame.
    pub fn create_temporary(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// `PUSHFRAME`: require TF allocated; move it onto the frame stack as
    /// the new LF. TF becomes unallocated.
    pub fn push_frame(&mut self) -> Result<(), Fault> {
        let frame = self.temporary.take().ok_or_else(|| {
            Fault::UnallocatedFrame("PUSHFRAME: temporary frame is not allocated".to_string())
        })?;
        self.locals.push(frame);
        Ok(())
    }

    /// `POPFRAME`: require the frame stack non-empty; pop its top into TF.
    pub fn pop_frame(&mut self) -> Result<(), Fault> {
        let frame = self.locals.pop().ok_or_else(|| {
            Fault::UnallocatedFrame("POPFRAME: local frame stack is empty".to_string())
        })?;
        self.temporary = Some(frame);
        Ok(())
    }

    fn frame(&self, tag: FrameTag) -> Result<&Frame, Fault> {
        match tag {
            FrameTag::Global => Ok(&self.global),
            FrameTag::Temporary => self
                .temporary
                .as_ref()
                .ok_or_else(|| Fault::UnallocatedFrame("TF is not allocated".to_string())),
            FrameTag::Local => self
                .locals
                .last()
                .ok_or_else(|| Fault::UnallocatedFrame("LF is not allocated".to_string())),
        }
    }

    fn frame_mut(&mut self, tag: FrameTag) -> Result<&mut Frame, Fault> {
        match tag {
            FrameTag::Global => Ok(&mut self.global),
            FrameTag::Temporary => self
                .temporary
                .as_mut()
                .ok_or_else(|| Fault::UnallocatedFrame("TF is not allocated".to_string())),
            FrameTag::Local => self
                .locals
                .last_mut()
                .ok_or_else(|| Fault::UnallocatedFrame("LF is not allocated".to_string())),
        }
    }

    /// `DEFVAR`: require the frame allocated and the name absent; create
    /// a binding holding `Value::Unset`.
    pub fn define(&mut self, tag: FrameTag, name: &str) -> Result<(), Fault> {
        let frame = self.frame_mut(tag)?;
        if frame.bindings.contains_key(name) {
            return Err(Fault::SemanticError(format!(
                "variable {} is already defined",
                name
            )));
        }
        frame.bindings.insert(name.to_string(), Value::Unset);
        Ok(())
    }

    /// Read a variable's raw value (including `Unset`), without the
    /// missing-value check. Used by `TYPE`'s documented carve-out.
    pub fn peek(&self, tag: FrameTag, name: &str) -> Result<&Value, Fault> {
        let frame = self.frame(tag)?;
        frame
            .bindings
            .get(name)
            .ok_or_else(|| Fault::UndefinedVariable(format!("variable {} is not defined", name)))
    }

    /// `load`: require the frame allocated and the name present; reading
    /// `Unset` is a missing-value fault.
    pub fn load(&self, tag: FrameTag, name: &str) -> Result<Value, Fault> {
        match self.peek(tag, name)? {
            Value::Unset => Err(Fault::MissingValue(format!(
                "variable {} has no value",
                name
            ))),
            v => Ok(v.clone()),
        }
    }

    /// `store`: require the frame allocated and the name present.
    pub fn store(&mut self, tag: FrameTag, name: &str, value: Value) -> Result<(), Fault> {
        let frame = self.frame_mut(tag)?;
        if !frame.bindings.contains_key(name) {
            return Err(Fault::UndefinedVariable(format!(
                "variable {} is not defined",
                name
            )));
        }
        frame.bindings.insert(name.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_load_unset_is_missing_value() {
        let mut fs = FrameStore::new();
        fs.define(FrameTag::Global, "x").unwrap();
        assert_eq!(
            fs.load(FrameTag::Global, "x"),
            Err(Fault::MissingValue("variable x has no value".to_string()))
        );
    }

    #[test]
    fn redefine_is_semantic_error() {
        let mut fs = FrameStore::new();
        fs.define(FrameTag::Global, "x").unwrap();
        assert!(matches!(
            fs.define(FrameTag::Global, "x"),
            Err(Fault::SemanticError(_))
        ));
    }

    #[test]
    fn store_undefined_is_undefined_variable() {
        let mut fs = FrameStore::new();
        assert!(matches!(
            fs.store(FrameTag::Global, "x", Value::Int(1)),
            Err(Fault::UndefinedVariable(_))
        ));
    }

    #[test]
    fn tf_round_trip_restores_bindings() {
        let mut fs = FrameStore::new();
        fs.create_temporary();
        fs.define(FrameTag::Temporary, "x").unwrap();
        fs.store(FrameTag::Temporary, "x", Value::Int(1)).unwrap();

        fs.push_frame().unwrap();
        fs.define(FrameTag::Local, "y").unwrap();
        fs.store(FrameTag::Local, "y", Value::Int(2)).unwrap();

        fs.pop_frame().unwrap();
        assert_eq!(fs.load(FrameTag::Temporary, "y"), Ok(Value::Int(2)));
    }

    #[test]
    fn unallocated_tf_is_fault() {
        let fs = FrameStore::new();
        assert!(matches!(
            fs.peek(FrameTag::Temporary, "x"),
            Err(Fault::UnallocatedFrame(_))
        ));
    }

    #[test]
    fn unallocated_lf_is_fault() {
        let fs = FrameStore::new();
        assert!(matches!(
            fs.peek(FrameTag::Local, "x"),
            Err(Fault::UnallocatedFrame(_))
        ));
    }

    #[test]
    fn push_without_create_is_fault() {
        let mut fs = FrameStore::new();
        assert!(matches!(
            fs.push_frame(),
            Err(Fault::UnallocatedFrame(_))
        ));
    }

    #[test]
    fn pop_empty_stack_is_fault() {
        let mut fs = FrameStore::new();
        assert!(matches!(fs.pop_frame(), Err(Fault::UnallocatedFrame(_))));
    }
}
