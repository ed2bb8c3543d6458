//! Processing elements: a core paired with a router.

use std::cell::RefCell;
use std::rc::Rc;

use crate::direction::Direction;
use crate::parameters::{CoreParameters, InterconnectParameters};
use crate::simulator::core::Core;
use crate::simulator::interconnect::{ReceiverChannelBuffer, SenderChannelBuffer};
use crate::simulator::router::{build_router, Router};
use crate::simulator::SimulatorError;

pub struct ProcessingElement {
    name: String,
    core: Core,
    router: Box<dyn Router>,
}

/// Processing elements are shared between tiles, connection routines and the
/// system event loop.
pub type ProcessingElementHandle = Rc<RefCell<ProcessingElement>>;

impl ProcessingElement {
    pub fn new(
        name: impl Into<String>,
        cp: &CoreParameters,
        ip: &InterconnectParameters,
    ) -> Result<ProcessingElement, SimulatorError> {
        let name = name.into();
        let core = Core::new(name.clone(), cp);
        let router = build_router(ip, &core)?;
        Ok(ProcessingElement { name, core, router })
    }

    pub fn into_handle(self) -> ProcessingElementHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut Core {
        &mut self.core
    }

    pub fn router(&self) -> &dyn Router {
        self.router.as_ref()
    }

    pub fn router_mut(&mut self) -> &mut dyn Router {
        self.router.as_mut()
    }

    pub fn connect_to_sender_channel_buffer(
        &mut self,
        direction: Direction,
        sender_channel_buffer: &SenderChannelBuffer,
    ) -> Result<(), SimulatorError> {
        self.router
            .connect_to_sender_channel_buffer(direction, sender_channel_buffer)
    }

    pub fn connect_to_receiver_channel_buffer(
        &mut self,
        direction: Direction,
        receiver_channel_buffer: &ReceiverChannelBuffer,
    ) -> Result<(), SimulatorError> {
        self.router
            .connect_to_receiver_channel_buffer(direction, receiver_channel_buffer)
    }

    /// Perform a single cycle: the core first, then the router.
    pub fn iterate(&mut self, keep_execution_trace: bool) -> Result<(), SimulatorError> {
        self.core.iterate(keep_execution_trace)?;
        self.router.iterate()
    }

    pub fn reset(&mut self) {
        self.core.reset();
        self.router.reset();
    }
}

/// Connect two processing elements along the axis given by the direction
/// from `a` to `b`.
pub fn connect_processing_elements(
    a: &ProcessingElementHandle,
    b: &ProcessingElementHandle,
    direction_a_to_b: Direction,
) -> Result<(), SimulatorError> {
    a.borrow_mut()
        .router_mut()
        .connect_to_processing_element(direction_a_to_b, &b.borrow())?;
    b.borrow_mut()
        .router_mut()
        .connect_to_processing_element(direction_a_to_b.reverse(), &a.borrow())?;
    Ok(())
}
