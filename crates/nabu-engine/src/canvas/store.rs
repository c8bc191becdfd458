//! Shared backing store of a canvas and its frame handoff protocol.
//!
//! Three locks, always taken one at a time:
//! - `drawing`: short-held flag; `reset()` test-and-sets it so a second
//!   producer is turned away immediately instead of queueing.
//! - `slot` + `completed`: the single-frame handoff. `reset()` waits here
//!   until the executor has finished the previous frame.
//! - `producer`: the buffer being recorded, the current state, and the
//!   thread that owns the session.

use std::mem;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

use super::buffer::{CommandBuffer, Operand};
use super::config::CanvasConfig;
use super::error::CanvasError;
use super::observer::FrameObserver;
use super::opcode::Opcode;
use super::state::GraphicsState;

/// A closed recording, ready for replay.
#[derive(Debug)]
pub struct RecordedFrame {
    pub index: u64,
    pub buffer: CommandBuffer,
    /// State snapshot taken at `reset()`; replay starts from it.
    pub initial_state: GraphicsState,
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Idle,
    Pending(RecordedFrame),
    Executing,
}

#[derive(Debug, Default)]
struct FrameSlot {
    state: SlotState,
    /// Buffer returned by the executor, reused by the next session.
    spare: Option<CommandBuffer>,
}

#[derive(Debug)]
pub(crate) struct Producer {
    pub buffer: CommandBuffer,
    pub current: GraphicsState,
    owner: Option<ThreadId>,
    initial: Option<GraphicsState>,
    next_index: u64,
}

impl Producer {
    fn check_owner(&self) -> Result<(), CanvasError> {
        match self.owner {
            None => Err(CanvasError::NotRecording),
            Some(id) if id == thread::current().id() => Ok(()),
            Some(_) => Err(CanvasError::ForeignThread),
        }
    }
}

pub struct CommandStore {
    config: CanvasConfig,
    drawing: Mutex<bool>,
    slot: Mutex<FrameSlot>,
    completed: Condvar,
    producer: Mutex<Producer>,
    observers: Mutex<Vec<Arc<dyn FrameObserver>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CommandStore {
    pub fn new(config: CanvasConfig) -> Self {
        let producer = Producer {
            buffer: CommandBuffer::new(config.limits),
            current: GraphicsState::new(&config),
            owner: None,
            initial: None,
            next_index: 0,
        };
        Self {
            config,
            drawing: Mutex::new(false),
            slot: Mutex::new(FrameSlot::default()),
            completed: Condvar::new(),
            producer: Mutex::new(producer),
            observers: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn is_recording(&self) -> bool {
        *lock(&self.drawing)
    }

    /// Opens a session for the calling thread.
    ///
    /// Returns `false` at once if a session is already open. Otherwise, when
    /// `block` is set, waits for the previous frame to finish executing;
    /// without it, returns `false` if that frame is still in flight.
    pub(crate) fn begin(&self, block: bool) -> bool {
        {
            let mut drawing = lock(&self.drawing);
            if *drawing {
                return false;
            }
            *drawing = true;
        }

        let spare = {
            let mut slot = lock(&self.slot);
            while !matches!(slot.state, SlotState::Idle) {
                if !block {
                    drop(slot);
                    *lock(&self.drawing) = false;
                    return false;
                }
                slot = self.completed.wait(slot).unwrap_or_else(PoisonError::into_inner);
            }
            slot.spare.take()
        };

        let mut p = lock(&self.producer);
        p.owner = Some(thread::current().id());
        if let Some(buffer) = spare {
            p.buffer = buffer;
        }
        p.buffer.clear();
        p.current.reapply_defaults(&self.config);
        p.initial = Some(p.current.clone());
        if let Err(e) = p.buffer.push(Opcode::Clear, &[], &[], &[]) {
            log::warn!("initial clear not recorded: {e}");
        }
        log::trace!("session opened for frame {}", p.next_index);
        true
    }

    /// Closes the calling thread's session and publishes the frame.
    pub(crate) fn finish(&self) -> Result<u64, CanvasError> {
        let frame = {
            let mut p = lock(&self.producer);
            p.check_owner()?;
            p.owner = None;
            let index = p.next_index;
            p.next_index += 1;
            let buffer = mem::replace(&mut p.buffer, CommandBuffer::new(self.config.limits));
            let initial_state = match p.initial.take() {
                Some(s) => s,
                None => p.current.clone(),
            };
            RecordedFrame { index, buffer, initial_state }
        };
        let index = frame.index;
        log::trace!("frame {index} recorded ({} commands)", frame.buffer.len());

        lock(&self.slot).state = SlotState::Pending(frame);
        *lock(&self.drawing) = false;
        Ok(index)
    }

    /// Runs `f` against the open session of the calling thread.
    pub(crate) fn record<R>(
        &self,
        f: impl FnOnce(&mut Producer) -> Result<R, CanvasError>,
    ) -> Result<R, CanvasError> {
        let mut p = lock(&self.producer);
        p.check_owner()?;
        f(&mut p)
    }

    /// Applies a state change; while the calling thread records, the
    /// matching opcode is appended first and the change only lands if that
    /// succeeds.
    pub(crate) fn set_state(
        &self,
        opcode: Opcode,
        floats: &[f32],
        handles: &[Operand],
        apply: impl FnOnce(&mut GraphicsState),
    ) -> Result<(), CanvasError> {
        let mut p = lock(&self.producer);
        match p.check_owner() {
            Err(CanvasError::NotRecording) => {}
            Err(e) => return Err(e),
            Ok(()) => p.buffer.push(opcode, floats, &[], handles)?,
        }
        apply(&mut p.current);
        Ok(())
    }

    pub(crate) fn current<R>(&self, f: impl FnOnce(&GraphicsState) -> R) -> R {
        f(&lock(&self.producer).current)
    }

    /// Takes the pending frame for execution, if any.
    pub fn take_frame(&self) -> Option<RecordedFrame> {
        let mut slot = lock(&self.slot);
        match mem::take(&mut slot.state) {
            SlotState::Pending(frame) => {
                slot.state = SlotState::Executing;
                Some(frame)
            }
            other => {
                slot.state = other;
                None
            }
        }
    }

    /// Marks the executing frame complete and wakes a waiting `reset()`.
    pub fn complete_frame(&self, buffer: CommandBuffer) {
        let mut slot = lock(&self.slot);
        slot.state = SlotState::Idle;
        slot.spare = Some(buffer);
        self.completed.notify_all();
    }

    pub fn has_pending_frame(&self) -> bool {
        matches!(lock(&self.slot).state, SlotState::Pending(_))
    }

    pub(crate) fn add_observer(&self, observer: Arc<dyn FrameObserver>) {
        lock(&self.observers).push(observer);
    }

    /// Snapshot so observers run without the list locked.
    pub(crate) fn observers(&self) -> Vec<Arc<dyn FrameObserver>> {
        lock(&self.observers).clone()
    }
}

impl std::fmt::Debug for CommandStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandStore")
            .field("config", &self.config)
            .field("recording", &self.is_recording())
            .finish_non_exhaustive()
    }
}
