//! Interconnect routers.
//!
//! Only the software router is functional: it wires each cardinal input and
//! output channel straight to the neighbor's opposite channel. The switch and
//! virtual-circuit routers are placeholders for future releases behind the
//! same [`Router`] interface.

use tracing::trace;

use crate::direction::Direction;
use crate::parameters::InterconnectParameters;
use crate::simulator::core::Core;
use crate::simulator::interconnect::{ReceiverChannelBuffer, SenderChannelBuffer};
use crate::simulator::processing_element::ProcessingElement;
use crate::simulator::SimulatorError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouterType {
    Software = 0,
    Switch = 1,
    VirtualCircuit = 2,
}

impl RouterType {
    pub fn from_name(name: &str) -> Result<RouterType, SimulatorError> {
        match name {
            "software" => Ok(RouterType::Software),
            "switch" => Ok(RouterType::Switch),
            "virtual_circuit" => Ok(RouterType::VirtualCircuit),
            _ => Err(SimulatorError::UnsupportedRouterType(name.to_owned())),
        }
    }
}

pub trait Router {
    fn router_type(&self) -> RouterType;

    /// Link this router to a neighboring processing element along a cardinal
    /// axis.
    fn connect_to_processing_element(
        &mut self,
        direction: Direction,
        neighbor: &ProcessingElement,
    ) -> Result<(), SimulatorError>;

    /// Connect a peripheral buffer that emits packets toward this router.
    fn connect_to_sender_channel_buffer(
        &mut self,
        direction: Direction,
        sender_channel_buffer: &SenderChannelBuffer,
    ) -> Result<(), SimulatorError>;

    /// Connect a peripheral buffer that receives packets from this router.
    fn connect_to_receiver_channel_buffer(
        &mut self,
        direction: Direction,
        receiver_channel_buffer: &ReceiverChannelBuffer,
    ) -> Result<(), SimulatorError>;

    /// Perform a single cycle of routing, staging all buffer traffic.
    fn iterate(&mut self) -> Result<(), SimulatorError>;

    fn reset(&mut self);
}

/// A router that leaves all routing up to the hardware: every input and
/// output channel has a cardinal direction and routes to or from the nearest
/// neighbor in that direction.
pub struct SoftwareRouter {
    name: String,
    input_channel_buffers: Vec<ReceiverChannelBuffer>,
    output_channel_buffers: Vec<SenderChannelBuffer>,
    source_buffers: Vec<Option<SenderChannelBuffer>>,
    destination_buffers: Vec<Option<ReceiverChannelBuffer>>,
}

impl SoftwareRouter {
    pub fn new(ip: &InterconnectParameters, core: &Core) -> SoftwareRouter {
        SoftwareRouter {
            name: core.name().to_owned(),
            input_channel_buffers: core.input_channel_buffers().to_vec(),
            output_channel_buffers: core.output_channel_buffers().to_vec(),
            source_buffers: vec![None; ip.num_router_sources as usize],
            destination_buffers: vec![None; ip.num_router_destinations as usize],
        }
    }
}

impl Router for SoftwareRouter {
    fn router_type(&self) -> RouterType {
        RouterType::Software
    }

    fn connect_to_processing_element(
        &mut self,
        direction: Direction,
        neighbor: &ProcessingElement,
    ) -> Result<(), SimulatorError> {
        let neighbor_router_type = neighbor.router().router_type();
        if neighbor_router_type != RouterType::Software {
            return Err(SimulatorError::IncompatibleRouterConnection(
                neighbor_router_type,
            ));
        }

        // The neighbor's opposite-facing channels become this router's
        // immediate source and destination in the given direction.
        let reverse = neighbor.core().input_channel_buffers()
            [direction.reverse() as usize]
            .clone();
        self.destination_buffers[direction as usize] = Some(reverse);
        let reverse = neighbor.core().output_channel_buffers()
            [direction.reverse() as usize]
            .clone();
        self.source_buffers[direction as usize] = Some(reverse);
        Ok(())
    }

    fn connect_to_sender_channel_buffer(
        &mut self,
        direction: Direction,
        sender_channel_buffer: &SenderChannelBuffer,
    ) -> Result<(), SimulatorError> {
        self.source_buffers[direction as usize] = Some(sender_channel_buffer.clone());
        Ok(())
    }

    fn connect_to_receiver_channel_buffer(
        &mut self,
        direction: Direction,
        receiver_channel_buffer: &ReceiverChannelBuffer,
    ) -> Result<(), SimulatorError> {
        self.destination_buffers[direction as usize] = Some(receiver_channel_buffer.clone());
        Ok(())
    }

    fn iterate(&mut self) -> Result<(), SimulatorError> {
        // Pull one packet from each non-empty source into the matching local
        // input channel buffer.
        for (i, source_buffer) in self.source_buffers.iter().enumerate() {
            if let Some(source_buffer) = source_buffer {
                let input_channel_buffer = &self.input_channel_buffers[i];
                if !input_channel_buffer.is_full() && !source_buffer.is_empty() {
                    let packet = source_buffer.dequeue()?;
                    input_channel_buffer.enqueue(packet)?;
                    trace!(router = %self.name, source = i, %packet, "routed inbound");
                }
            }
        }

        // Push from each non-empty local output channel buffer into the
        // matching destination.
        for (i, destination_buffer) in self.destination_buffers.iter().enumerate() {
            if let Some(destination_buffer) = destination_buffer {
                let output_channel_buffer = &self.output_channel_buffers[i];
                if !output_channel_buffer.is_empty() && !destination_buffer.is_full() {
                    let packet = output_channel_buffer.dequeue()?;
                    destination_buffer.enqueue(packet)?;
                    trace!(router = %self.name, destination = i, %packet, "routed outbound");
                }
            }
        }

        Ok(())
    }

    fn reset(&mut self) {
        // Wires only; no internal state.
    }
}

macro_rules! placeholder_router {
    ($(#[$attribute:meta])* $name:ident, $router_type:expr) => {
        $(#[$attribute])*
        pub struct $name;

        impl Router for $name {
            fn router_type(&self) -> RouterType {
                $router_type
            }

            fn connect_to_processing_element(
                &mut self,
                _direction: Direction,
                _neighbor: &ProcessingElement,
            ) -> Result<(), SimulatorError> {
                Ok(())
            }

            fn connect_to_sender_channel_buffer(
                &mut self,
                _direction: Direction,
                _sender_channel_buffer: &SenderChannelBuffer,
            ) -> Result<(), SimulatorError> {
                Ok(())
            }

            fn connect_to_receiver_channel_buffer(
                &mut self,
                _direction: Direction,
                _receiver_channel_buffer: &ReceiverChannelBuffer,
            ) -> Result<(), SimulatorError> {
                Ok(())
            }

            fn iterate(&mut self) -> Result<(), SimulatorError> {
                Ok(())
            }

            fn reset(&mut self) {}
        }
    };
}

placeholder_router! {
    /// Reserved for a future release.
    SwitchRouter,
    RouterType::Switch
}

placeholder_router! {
    /// Reserved for a future release.
    VirtualCircuitRouter,
    RouterType::VirtualCircuit
}

/// Instantiate the router selected by the interconnect parameters.
pub fn build_router(
    ip: &InterconnectParameters,
    core: &Core,
) -> Result<Box<dyn Router>, SimulatorError> {
    match RouterType::from_name(&ip.router_type)? {
        RouterType::Software => Ok(Box::new(SoftwareRouter::new(ip, core))),
        RouterType::Switch => Ok(Box::new(SwitchRouter)),
        RouterType::VirtualCircuit => Ok(Box::new(VirtualCircuitRouter)),
    }
}
