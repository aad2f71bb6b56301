use hashbrown::{HashMap, HashSet};

use crate::{backend::error::LoweringError, frontend::lexer::Span, middle::ty::Type};

/// A variable visible at some point of a function body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub ty: Type,
    pub address: u32,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    /// Every binding visible in this block, inherited ones included
    bindings: HashMap<String, Binding>,
    /// Names declared by this block itself
    declared_here: HashSet<String>,
}

/// Lexical scopes of one function. Entering a block copies the enclosing
/// frame, so resolving a name is a single lookup in the top frame and leaving
/// the block restores the enclosing view untouched.
///
/// Local slots are handed out monotonically and are never reused, even once
/// the block that declared them is gone.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    next_address: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
            next_address: 0,
        }
    }

    fn top(&self) -> &Frame {
        // The function frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    fn top_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    pub fn declare(&mut self, name: &str, ty: Type, span: Span) -> Result<u32, LoweringError> {
        if self.top().declared_here.contains(name) {
            return Err(LoweringError::Redeclaration {
                name: name.to_owned(),
                span,
            });
        }

        let address = self.next_address;
        self.next_address += ty.size();

        let frame = self.top_mut();
        frame.declared_here.insert(name.to_owned());
        frame.bindings.insert(name.to_owned(), Binding { ty, address });

        Ok(address)
    }

    pub fn resolve(&self, name: &str) -> Option<Binding> {
        self.top().bindings.get(name).copied()
    }

    pub fn enter_block(&mut self) {
        let frame = Frame {
            bindings: self.top().bindings.clone(),
            declared_here: HashSet::new(),
        };

        self.frames.push(frame);
    }

    pub fn exit_block(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// The emitted `.limit locals`
    pub fn limit_locals(&self) -> u32 {
        self.next_address
    }
}
