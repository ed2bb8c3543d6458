//! Cycle-accurate functional simulator.
//!
//! A [`system::System`] steps processing elements, memories and channel
//! buffers in lock step. Within one cycle every processing element and memory
//! stages its buffer mutations; the buffers commit in a final phase, so all
//! state reads observe prior-cycle values regardless of iteration order.

pub mod array;
pub mod block;
pub mod core;
pub mod instances;
pub mod interconnect;
pub mod memory;
pub mod processing_element;
pub mod quartet;
pub mod router;
pub mod system;

use std::error::Error as StdError;
use std::fmt;

use crate::simulator::router::RouterType;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SimulatorError {
    EnqueueOnFullBuffer(String),
    DequeueOnEmptyBuffer(String),
    PeekOnEmptyBuffer(String),
    MissingScratchpad(String),
    AddressOutOfRange { name: String, address: u32 },
    RegisterDataLengthMismatch,
    UnsupportedRouterType(String),
    IncompatibleRouterConnection(RouterType),
    MissingProcessingElement(usize),
}

impl fmt::Display for SimulatorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimulatorError::EnqueueOnFullBuffer(name) => {
                write!(f, "Attempted to enqueue a packet on a full buffer: {}.", name)
            }
            SimulatorError::DequeueOnEmptyBuffer(name) => write!(
                f,
                "Attempted to dequeue a packet from an empty buffer: {}.",
                name
            ),
            SimulatorError::PeekOnEmptyBuffer(name) => write!(
                f,
                "Attempted to peek the next value on an empty buffer: {}.",
                name
            ),
            SimulatorError::MissingScratchpad(name) => write!(
                f,
                "Attempting a scratchpad access in core {} which has no scratchpad.",
                name
            ),
            SimulatorError::AddressOutOfRange { name, address } => {
                write!(f, "Address {} is out of range in {}.", address, name)
            }
            SimulatorError::RegisterDataLengthMismatch => f.write_str(
                "Register initialization data length and register file size do not match.",
            ),
            SimulatorError::UnsupportedRouterType(name) => {
                write!(f, "Unsupported router type: {}.", name)
            }
            SimulatorError::IncompatibleRouterConnection(router_type) => write!(
                f,
                "Cannot connect a software router to a {:?} router.",
                router_type
            ),
            SimulatorError::MissingProcessingElement(index) => {
                write!(f, "Missing processing element {}.", index)
            }
        }
    }
}

impl StdError for SimulatorError {}
