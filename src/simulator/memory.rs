//! Memories with read and write ports.
//!
//! A read port pops an address packet, stages the read for one cycle, and
//! emits a data packet carrying the address packet's tag. A write port pops
//! one address packet and one data packet together and writes immediately.
//! Memory contents persist across reset.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::simulator::interconnect::{Packet, ReceiverChannelBuffer, SenderChannelBuffer};
use crate::simulator::SimulatorError;
use crate::Word;

pub struct ReadPort {
    name: String,
    addr_in_channel_buffer: ReceiverChannelBuffer,
    data_out_channel_buffer: SenderChannelBuffer,
    pending_read_packet: Option<Packet>,
}

impl ReadPort {
    pub fn new(name: impl Into<String>, buffer_depth: usize) -> ReadPort {
        let name = name.into();
        ReadPort {
            addr_in_channel_buffer: ReceiverChannelBuffer::new(
                format!("{} Address-In Channel Buffer", name),
                buffer_depth,
            ),
            data_out_channel_buffer: SenderChannelBuffer::new(
                format!("{} Data-Out Channel Buffer", name),
                buffer_depth,
            ),
            pending_read_packet: None,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr_in_channel_buffer(&self) -> &ReceiverChannelBuffer {
        &self.addr_in_channel_buffer
    }

    pub fn data_out_channel_buffer(&self) -> &SenderChannelBuffer {
        &self.data_out_channel_buffer
    }
}

pub struct WritePort {
    name: String,
    addr_in_channel_buffer: ReceiverChannelBuffer,
    data_in_channel_buffer: ReceiverChannelBuffer,
}

impl WritePort {
    pub fn new(name: impl Into<String>, buffer_depth: usize) -> WritePort {
        let name = name.into();
        WritePort {
            addr_in_channel_buffer: ReceiverChannelBuffer::new(
                format!("{} Address-In Channel Buffer", name),
                buffer_depth,
            ),
            data_in_channel_buffer: ReceiverChannelBuffer::new(
                format!("{} Data-In Channel Buffer", name),
                buffer_depth,
            ),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr_in_channel_buffer(&self) -> &ReceiverChannelBuffer {
        &self.addr_in_channel_buffer
    }

    pub fn data_in_channel_buffer(&self) -> &ReceiverChannelBuffer {
        &self.data_in_channel_buffer
    }
}

pub struct Memory {
    name: String,
    contents: Vec<Word>,
    read_ports: Vec<ReadPort>,
    write_ports: Vec<WritePort>,
}

pub type MemoryHandle = Rc<RefCell<Memory>>;

impl Memory {
    pub fn new(name: impl Into<String>, size: usize) -> Memory {
        Memory {
            name: name.into(),
            contents: vec![0; size],
            read_ports: Vec::new(),
            write_ports: Vec::new(),
        }
    }

    pub fn into_handle(self) -> MemoryHandle {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &[Word] {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut [Word] {
        &mut self.contents
    }

    pub fn add_read_port(&mut self, read_port: ReadPort) {
        self.read_ports.push(read_port);
    }

    pub fn add_write_port(&mut self, write_port: WritePort) {
        self.write_ports.push(write_port);
    }

    pub fn read_ports(&self) -> &[ReadPort] {
        &self.read_ports
    }

    pub fn write_ports(&self) -> &[WritePort] {
        &self.write_ports
    }

    /// Perform a single cycle of execution over all ports.
    pub fn iterate(&mut self) -> Result<(), SimulatorError> {
        // Emit any pending reads whose data-out buffer has space.
        for read_port in &mut self.read_ports {
            if let Some(packet) = read_port.pending_read_packet {
                if !read_port.data_out_channel_buffer.is_full() {
                    trace!(port = %read_port.name, %packet, "read");
                    read_port.data_out_channel_buffer.enqueue(packet)?;
                    read_port.pending_read_packet = None;
                }
            }
        }

        // Serve one new address per idle read port.
        for read_port in &mut self.read_ports {
            if !read_port.addr_in_channel_buffer.is_empty()
                && read_port.pending_read_packet.is_none()
            {
                let read_addr_packet = read_port.addr_in_channel_buffer.dequeue()?;
                let read_addr = read_addr_packet.value as usize;
                let word = self.contents.get(read_addr).copied().ok_or_else(|| {
                    SimulatorError::AddressOutOfRange {
                        name: read_port.name.clone(),
                        address: read_addr_packet.value,
                    }
                })?;
                read_port.pending_read_packet = Some(Packet::new(read_addr_packet.tag, word));
            }
        }

        // Perform all write requests with both an address and a data packet.
        for write_port in &mut self.write_ports {
            if !write_port.addr_in_channel_buffer.is_empty()
                && !write_port.data_in_channel_buffer.is_empty()
            {
                let write_addr_packet = write_port.addr_in_channel_buffer.dequeue()?;
                let write_data_packet = write_port.data_in_channel_buffer.dequeue()?;
                let write_addr = write_addr_packet.value as usize;
                trace!(port = %write_port.name, address = write_addr_packet.value, packet = %write_data_packet, "write");
                match self.contents.get_mut(write_addr) {
                    Some(slot) => *slot = write_data_packet.value,
                    None => {
                        return Err(SimulatorError::AddressOutOfRange {
                            name: write_port.name.clone(),
                            address: write_addr_packet.value,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Reset port state and buffers. The contents are persistent.
    pub fn reset(&mut self) {
        for read_port in &mut self.read_ports {
            read_port.pending_read_packet = None;
            read_port.addr_in_channel_buffer.reset();
            read_port.data_out_channel_buffer.reset();
        }
        for write_port in &mut self.write_ports {
            write_port.addr_in_channel_buffer.reset();
            write_port.data_in_channel_buffer.reset();
        }
    }
}
