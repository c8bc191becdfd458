use std::ops::Range;
use std::sync::Arc;

use crate::paint::{GradientHandle, ImageTextureHandle, StrokeHandle};
use crate::text::FontHandle;

use super::config::BufferLimits;
use super::error::{CanvasError, Pool};
use super::opcode::Opcode;

/// Shared-resource or text operand.
#[derive(Debug, Clone)]
pub enum Operand {
    Stroke(StrokeHandle),
    /// `None` clears an active gradient.
    Gradient(Option<GradientHandle>),
    Font(FontHandle),
    /// `None` clears an active image texture.
    Image(Option<ImageTextureHandle>),
    Text(Arc<str>),
}

/// One recorded operation: an opcode plus ranges into the operand pools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub opcode: Opcode,
    pub floats: Range<u32>,
    pub ints: Range<u32>,
    pub handles: Range<u32>,
}

/// A command with its operands resolved.
#[derive(Debug, Copy, Clone)]
pub struct CommandView<'a> {
    pub opcode: Opcode,
    pub floats: &'a [f32],
    pub ints: &'a [i32],
    pub handles: &'a [Operand],
}

/// Append-only log of one frame.
///
/// Pools grow as needed but never past `limits`; an append that would cross
/// any limit is rejected whole.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    floats: Vec<f32>,
    ints: Vec<i32>,
    handles: Vec<Operand>,
    limits: BufferLimits,
}

impl CommandBuffer {
    pub fn new(limits: BufferLimits) -> Self {
        Self { limits, ..Self::default() }
    }

    /// Empties every pool; keeps allocations for reuse.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.floats.clear();
        self.ints.clear();
        self.handles.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn limits(&self) -> BufferLimits {
        self.limits
    }

    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// `(floats, ints, handles)` currently used.
    #[inline]
    pub fn pool_usage(&self) -> (usize, usize, usize) {
        (self.floats.len(), self.ints.len(), self.handles.len())
    }

    pub fn push(
        &mut self,
        opcode: Opcode,
        floats: &[f32],
        ints: &[i32],
        handles: &[Operand],
    ) -> Result<(), CanvasError> {
        let arity = opcode.arity();
        if ints.len() != arity.ints
            || handles.len() != arity.handles
            || arity.float_count(ints) != Some(floats.len())
        {
            return Err(CanvasError::InvalidArgument("operand count does not match opcode"));
        }

        let l = self.limits;
        let checks = [
            (Pool::Commands, self.commands.len() + 1, l.max_commands),
            (Pool::Floats, self.floats.len() + floats.len(), l.max_floats),
            (Pool::Ints, self.ints.len() + ints.len(), l.max_ints),
            (Pool::Handles, self.handles.len() + handles.len(), l.max_handles),
        ];
        if let Some((pool, _, limit)) = checks.into_iter().find(|(_, need, limit)| need > limit) {
            return Err(CanvasError::CapacityExceeded { pool, limit });
        }

        let range = |start: usize, len: usize| start as u32..(start + len) as u32;
        self.commands.push(Command {
            opcode,
            floats: range(self.floats.len(), floats.len()),
            ints: range(self.ints.len(), ints.len()),
            handles: range(self.handles.len(), handles.len()),
        });
        self.floats.extend_from_slice(floats);
        self.ints.extend_from_slice(ints);
        self.handles.extend_from_slice(handles);
        Ok(())
    }

    pub fn view(&self, cmd: &Command) -> CommandView<'_> {
        let r = |r: &Range<u32>| r.start as usize..r.end as usize;
        CommandView {
            opcode: cmd.opcode,
            floats: &self.floats[r(&cmd.floats)],
            ints: &self.ints[r(&cmd.ints)],
            handles: &self.handles[r(&cmd.handles)],
        }
    }

    /// Commands in append order.
    pub fn iter(&self) -> impl Iterator<Item = CommandView<'_>> {
        self.commands.iter().map(|c| self.view(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> BufferLimits {
        BufferLimits { max_commands: 3, max_floats: 8, max_ints: 2, max_handles: 1 }
    }

    #[test]
    fn ranges_are_contiguous_and_increasing() {
        let mut b = CommandBuffer::new(BufferLimits::default());
        b.push(Opcode::Clear, &[], &[], &[]).unwrap();
        b.push(Opcode::Translate, &[1.0, 2.0], &[], &[]).unwrap();
        b.push(Opcode::FillPolygon, &[0.0; 12], &[3], &[]).unwrap();

        let c = b.commands();
        assert_eq!(c[1].floats, 0..2);
        assert_eq!(c[2].floats, 2..14);
        assert_eq!(c[2].ints, 0..1);
        for w in c.windows(2) {
            assert_eq!(w[0].floats.end, w[1].floats.start);
            assert_eq!(w[0].ints.end, w[1].ints.start);
        }
        assert_eq!(b.view(&c[1]).floats, &[1.0, 2.0]);
    }

    #[test]
    fn arity_mismatch_is_rejected() {
        let mut b = CommandBuffer::new(BufferLimits::default());
        assert!(matches!(
            b.push(Opcode::DrawLine, &[0.0; 3], &[], &[]),
            Err(CanvasError::InvalidArgument(_))
        ));
        assert!(matches!(
            b.push(Opcode::FillPolygon, &[0.0; 8], &[3], &[]),
            Err(CanvasError::InvalidArgument(_))
        ));
        assert!(b.is_empty());
    }

    #[test]
    fn overflow_is_atomic() {
        let mut b = CommandBuffer::new(tiny());
        b.push(Opcode::DrawLine, &[0.0, 0.0, 1.0, 1.0], &[], &[]).unwrap();

        // Fits the command pool but not the float pool.
        let err = b.push(Opcode::SetTransform, &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0], &[], &[]).unwrap_err();
        assert_eq!(err, CanvasError::CapacityExceeded { pool: Pool::Floats, limit: 8 });
        assert_eq!(b.len(), 1);
        assert_eq!(b.pool_usage(), (4, 0, 0));

        // Earlier commands are intact and recording continues.
        b.push(Opcode::Translate, &[3.0, 4.0], &[], &[]).unwrap();
        b.push(Opcode::Clear, &[], &[], &[]).unwrap();
        let err = b.push(Opcode::Clear, &[], &[], &[]).unwrap_err();
        assert_eq!(err, CanvasError::CapacityExceeded { pool: Pool::Commands, limit: 3 });
        let ops: Vec<Opcode> = b.iter().map(|v| v.opcode).collect();
        assert_eq!(ops, vec![Opcode::DrawLine, Opcode::Translate, Opcode::Clear]);
        assert_eq!(b.view(&b.commands()[0]).floats, &[0.0, 0.0, 1.0, 1.0]);
    }
}
