use crate::error::RenderError;
use glam::Mat4;

/// Save/restore stack of 4x4 transforms.
///
/// Never empty: the bottom entry is the base transform and cannot be popped.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformStack {
    stack: Vec<Mat4>,
}

impl Default for TransformStack {
    fn default() -> Self {
        Self {
            stack: vec![Mat4::IDENTITY],
        }
    }
}

impl TransformStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every pushed scope and set the base to identity.
    pub fn reset(&mut self) {
        self.stack.truncate(1);
        self.stack[0] = Mat4::IDENTITY;
    }

    /// Replace the current transform with identity.
    pub fn load_identity(&mut self) {
        *self.top_mut() = Mat4::IDENTITY;
    }

    /// Open a scope starting from a copy of the current transform.
    pub fn push(&mut self) {
        let top = self.top();
        self.stack.push(top);
    }

    pub fn pop(&mut self) -> Result<Mat4, RenderError> {
        if self.stack.len() == 1 {
            return Err(RenderError::StackUnderflow);
        }
        self.stack.pop().ok_or(RenderError::StackUnderflow)
    }

    /// Post-multiply the current transform, so `m` applies to vertices first.
    pub fn multiply(&mut self, m: Mat4) {
        let top = self.top_mut();
        *top *= m;
    }

    pub fn top(&self) -> Mat4 {
        self.stack[self.stack.len() - 1]
    }

    /// Number of open scopes above the base.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    fn top_mut(&mut self) -> &mut Mat4 {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }
}
