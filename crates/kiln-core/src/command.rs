//! The firing engine's command inbox.
//!
//! A bounded lock-free queue with multiple producers (control interfaces)
//! and one consumer (the engine tick). Enqueueing never blocks; a full
//! queue is surfaced to the caller immediately.

use heapless::mpmc::MpMcQueue;
use thiserror::Error;

use crate::profile::FiringProfile;

/// Inbox capacity. Commands are coalesced by the engine within one tick, so
/// a small bound suffices; overflow is a caller-visible error.
pub const INBOX_CAPACITY: usize = 4;

/// Commands accepted by the firing engine.
#[derive(Debug, Clone)]
pub enum Command {
    Start {
        profile: FiringProfile,
        delay_minutes: u32,
    },
    Stop,
    Pause,
    Resume,
    SkipSegment,
    AutotuneStart {
        setpoint_c: f32,
        hysteresis_c: f32,
    },
    AutotuneStop,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("command inbox is full")]
    QueueFull,
    #[error("auto-tune setpoint {0} °C exceeds the safe temperature limit")]
    SetpointTooHigh(f32),
}

/// Bounded MPSC command queue feeding the engine.
pub struct CommandInbox {
    queue: MpMcQueue<Command, INBOX_CAPACITY>,
}

impl Default for CommandInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInbox {
    pub fn new() -> Self {
        Self {
            queue: MpMcQueue::new(),
        }
    }

    /// Enqueues a command without blocking.
    pub fn send(&self, command: Command) -> Result<(), CommandError> {
        self.queue
            .enqueue(command)
            .map_err(|_| CommandError::QueueFull)
    }

    /// Takes the next pending command, if any. Called only by the engine.
    pub fn try_recv(&self) -> Option<Command> {
        self.queue.dequeue()
    }
}

impl core::fmt::Debug for CommandInbox {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandInbox").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_is_visible_to_caller() {
        let inbox = CommandInbox::new();
        for _ in 0..INBOX_CAPACITY {
            inbox.send(Command::Stop).unwrap();
        }
        assert_eq!(inbox.send(Command::Pause), Err(CommandError::QueueFull));

        // Draining one slot makes room again.
        assert!(matches!(inbox.try_recv(), Some(Command::Stop)));
        inbox.send(Command::Pause).unwrap();
    }

    #[test]
    fn test_fifo_order() {
        let inbox = CommandInbox::new();
        inbox.send(Command::Pause).unwrap();
        inbox.send(Command::Resume).unwrap();
        assert!(matches!(inbox.try_recv(), Some(Command::Pause)));
        assert!(matches!(inbox.try_recv(), Some(Command::Resume)));
        assert!(inbox.try_recv().is_none());
    }
}
