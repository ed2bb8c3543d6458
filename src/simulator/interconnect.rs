//! Packets and staged channel buffers.
//!
//! A buffer is a bounded FIFO with a two-phase access protocol: `enqueue` and
//! `dequeue` only stage their effects, while `peek` and the emptiness and
//! fullness queries read the committed queue. A later `commit` applies the
//! staged dequeue first and the staged enqueue second, making the new state
//! visible to the next cycle.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::simulator::SimulatorError;
use crate::{Tag, Word};

/// A tagged word traveling through the interconnect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Packet {
    pub tag: Tag,
    pub value: Word,
}

impl Packet {
    pub fn new(tag: Tag, value: Word) -> Packet {
        Packet { tag, value }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<tag: 0x{:01x}, value: 0x{:08x}>", self.tag, self.value)
    }
}

pub struct Buffer {
    name: String,
    deque: VecDeque<Packet>,
    depth: usize,
    staged_enqueue: Option<Packet>,
    staged_dequeue: bool,
    pending: bool,
}

impl Buffer {
    pub fn new(name: impl Into<String>, depth: usize) -> Buffer {
        Buffer {
            name: name.into(),
            deque: VecDeque::with_capacity(depth),
            depth,
            staged_enqueue: None,
            staged_dequeue: false,
            pending: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage a packet to be enqueued. Fails if the committed queue is full.
    pub fn enqueue(&mut self, packet: Packet) -> Result<(), SimulatorError> {
        if self.is_full() {
            return Err(SimulatorError::EnqueueOnFullBuffer(self.name.clone()));
        }
        self.staged_enqueue = Some(packet);
        self.pending = true;
        Ok(())
    }

    /// Stage a dequeue and return the head packet. Fails if the committed
    /// queue is empty.
    pub fn dequeue(&mut self) -> Result<Packet, SimulatorError> {
        if self.is_empty() {
            return Err(SimulatorError::DequeueOnEmptyBuffer(self.name.clone()));
        }
        self.staged_dequeue = true;
        self.pending = true;
        self.peek()
    }

    /// Read the head packet without consuming it.
    pub fn peek(&self) -> Result<Packet, SimulatorError> {
        match self.deque.front() {
            Some(packet) => Ok(*packet),
            None => Err(SimulatorError::PeekOnEmptyBuffer(self.name.clone())),
        }
    }

    /// Finish outstanding transactions after all processing elements and
    /// memories have run their cycle. The dequeue is applied before the
    /// enqueue.
    pub fn commit(&mut self) {
        if self.pending {
            if self.staged_dequeue {
                // Discard: the packet was already handed out by dequeue().
                self.deque.pop_front();
                self.staged_dequeue = false;
            }
            if let Some(packet) = self.staged_enqueue.take() {
                self.deque.push_back(packet);
            }
            self.pending = false;
        }
    }

    /// Drop staged transactions and empty the queue.
    pub fn reset(&mut self) {
        self.staged_enqueue = None;
        self.staged_dequeue = false;
        self.pending = false;
        self.deque.clear();
    }

    pub fn count(&self) -> usize {
        self.deque.len()
    }

    pub fn remaining(&self) -> usize {
        self.depth - self.count()
    }

    pub fn is_full(&self) -> bool {
        self.deque.len() == self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.deque.is_empty()
    }
}

/// Shared handle to a buffer. Buffers sit between exactly two components (one
/// enqueuer, one dequeuer) and are additionally visited by the system's
/// commit phase.
pub type BufferHandle = Rc<RefCell<Buffer>>;

macro_rules! channel_buffer_wrapper {
    ($(#[$attribute:meta])* $name:ident) => {
        $(#[$attribute])*
        #[derive(Clone)]
        pub struct $name {
            inner: BufferHandle,
        }

        impl $name {
            pub fn new(name: impl Into<String>, depth: usize) -> $name {
                $name {
                    inner: Rc::new(RefCell::new(Buffer::new(name, depth))),
                }
            }

            pub fn name(&self) -> String {
                self.inner.borrow().name().to_owned()
            }

            pub fn enqueue(&self, packet: Packet) -> Result<(), SimulatorError> {
                self.inner.borrow_mut().enqueue(packet)
            }

            pub fn dequeue(&self) -> Result<Packet, SimulatorError> {
                self.inner.borrow_mut().dequeue()
            }

            pub fn peek(&self) -> Result<Packet, SimulatorError> {
                self.inner.borrow().peek()
            }

            pub fn commit(&self) {
                self.inner.borrow_mut().commit()
            }

            pub fn reset(&self) {
                self.inner.borrow_mut().reset()
            }

            pub fn count(&self) -> usize {
                self.inner.borrow().count()
            }

            pub fn is_full(&self) -> bool {
                self.inner.borrow().is_full()
            }

            pub fn is_empty(&self) -> bool {
                self.inner.borrow().is_empty()
            }

            /// The raw handle, for registration with the system commit phase.
            pub fn handle(&self) -> BufferHandle {
                Rc::clone(&self.inner)
            }
        }
    };
}

channel_buffer_wrapper! {
    /// A buffer that emits packets toward a consumer: a core's output channel
    /// or a memory read port's data-out side.
    SenderChannelBuffer
}

channel_buffer_wrapper! {
    /// A buffer that receives packets: a core's input channel or a memory
    /// port's address-in and data-in sides.
    ReceiverChannelBuffer
}

channel_buffer_wrapper! {
    /// A buffer internal to a routing fabric.
    RoutingBuffer
}
