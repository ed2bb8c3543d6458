//! Top-level system wrapper and the two-phase event loop.

use std::collections::HashMap;
use std::io;
use std::io::prelude::*;

use tracing::trace;

use crate::simulator::array::Array;
use crate::simulator::block::Block;
use crate::simulator::interconnect::BufferHandle;
use crate::simulator::memory::MemoryHandle;
use crate::simulator::processing_element::ProcessingElementHandle;
use crate::simulator::quartet::Quartet;
use crate::simulator::SimulatorError;

/// The numeric runs in a component name, used to keep event-loop ordering and
/// debug output stable regardless of registration order.
fn natural_number_sort_key(name: &str) -> Vec<u64> {
    let mut key = Vec::new();
    let mut current: Option<u64> = None;
    for c in name.chars() {
        if let Some(digit) = c.to_digit(10) {
            current = Some(current.unwrap_or(0) * 10 + u64::from(digit));
        } else if let Some(number) = current.take() {
            key.push(number);
        }
    }
    if let Some(number) = current {
        key.push(number);
    }
    key
}

/// A collection of processing elements, memories and every buffer in the
/// system, plus the cycle counter.
///
/// Each cycle proceeds in three phases in a fixed order: every processing
/// element steps (staging its channel traffic), every memory steps over its
/// ports, and finally every buffer commits pending dequeues and then pending
/// enqueues. Because firing decisions observe buffers only through committed
/// state, each cycle sees a consistent prior-cycle snapshot no matter how the
/// components are ordered.
#[derive(Default)]
pub struct System {
    cycle: u64,
    processing_elements: Vec<ProcessingElementHandle>,
    memories: Vec<MemoryHandle>,
    buffers: Vec<BufferHandle>,
}

impl System {
    pub fn new() -> System {
        System::default()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn processing_elements(&self) -> &[ProcessingElementHandle] {
        &self.processing_elements
    }

    pub fn memories(&self) -> &[MemoryHandle] {
        &self.memories
    }

    // --- Registration ---

    pub fn register_processing_element(&mut self, processing_element: &ProcessingElementHandle) {
        {
            let pe = processing_element.borrow();
            for buffer in pe.core().input_channel_buffers() {
                self.buffers.push(buffer.handle());
            }
            for buffer in pe.core().output_channel_buffers() {
                self.buffers.push(buffer.handle());
            }
        }
        self.processing_elements
            .push(ProcessingElementHandle::clone(processing_element));
    }

    /// Register a memory. Must happen after all of its ports are attached,
    /// so their buffers join the commit phase.
    pub fn register_memory(&mut self, memory: &MemoryHandle) {
        {
            let memory = memory.borrow();
            for read_port in memory.read_ports() {
                self.buffers.push(read_port.addr_in_channel_buffer().handle());
                self.buffers.push(read_port.data_out_channel_buffer().handle());
            }
            for write_port in memory.write_ports() {
                self.buffers.push(write_port.addr_in_channel_buffer().handle());
                self.buffers.push(write_port.data_in_channel_buffer().handle());
            }
        }
        self.memories.push(MemoryHandle::clone(memory));
    }

    pub fn register_quartet(&mut self, quartet: &Quartet) {
        for processing_element in quartet.processing_elements() {
            self.register_processing_element(processing_element);
        }
    }

    pub fn register_block(&mut self, block: &Block) {
        for quartet in block.quartets() {
            self.register_quartet(quartet);
        }
    }

    pub fn register_array(&mut self, array: &Array) {
        for processing_element in array.processing_elements() {
            self.register_processing_element(processing_element);
        }
    }

    /// Alphabetize components for stable debug output and make sure the
    /// processing elements form a contiguous `processing_element_{i}` range.
    pub fn finalize(&mut self) -> Result<(), SimulatorError> {
        self.processing_elements
            .sort_by_key(|pe| natural_number_sort_key(pe.borrow().name()));
        for (i, processing_element) in self.processing_elements.iter().enumerate() {
            if processing_element.borrow().name() != format!("processing_element_{}", i) {
                return Err(SimulatorError::MissingProcessingElement(i));
            }
        }
        self.memories
            .sort_by_key(|memory| natural_number_sort_key(memory.borrow().name()));
        self.buffers
            .sort_by_key(|buffer| natural_number_sort_key(buffer.borrow().name()));
        Ok(())
    }

    // --- Time stepping ---

    /// Move ahead one clock cycle. Returns whether the system has halted:
    /// every processing element has its halt flag set and every buffer is
    /// empty.
    pub fn iterate(&mut self, keep_execution_trace: bool) -> Result<bool, SimulatorError> {
        let mut halt = true;

        trace!(cycle = self.cycle, "iterate");

        for processing_element in &self.processing_elements {
            processing_element
                .borrow_mut()
                .iterate(keep_execution_trace)?;
        }
        for processing_element in &self.processing_elements {
            halt &= processing_element.borrow().core().halt_register();
        }

        for memory in &self.memories {
            memory.borrow_mut().iterate()?;
        }

        for buffer in &self.buffers {
            let mut buffer = buffer.borrow_mut();
            buffer.commit();
            halt &= buffer.is_empty();
        }

        if !halt {
            self.cycle += 1;
        }

        Ok(halt)
    }

    /// Execute until the system halts or the user exits. In interactive mode
    /// the loop waits on standard input before each cycle; an end-of-file is
    /// reported as an interrupt. Returns `(halted, interrupted)`.
    pub fn run(
        &mut self,
        interactive: bool,
        keep_execution_trace: bool,
    ) -> Result<(bool, bool), SimulatorError> {
        let stdin = io::stdin();
        loop {
            if interactive && self.cycle > 0 {
                println!("Press [Enter] to continue. Type \"exit\" or use [Ctrl-D] to exit.");
                let _ = io::stdout().flush();
                let mut user_input = String::new();
                match stdin.lock().read_line(&mut user_input) {
                    Ok(0) | Err(_) => {
                        self.interrupted_message();
                        return Ok((false, true));
                    }
                    Ok(_) => {
                        let user_input = user_input.trim();
                        if user_input == "exit" {
                            return Ok((false, false));
                        } else if !user_input.is_empty() {
                            eprintln!("Unrecognized command: {}.", user_input);
                        }
                    }
                }
            }

            if self.iterate(keep_execution_trace)? {
                self.halt_message();
                return Ok((true, false));
            }
        }
    }

    // --- Display ---

    fn memory_summary(&self) -> String {
        let mut lines = Vec::new();
        for memory in &self.memories {
            let memory = memory.borrow();
            lines.push(format!("name: {}", memory.name()));
            lines.push("contents:".to_owned());
            for word in memory.contents().iter().take(10) {
                lines.push(format!("0x{:08x}", word));
            }
            if memory.contents().len() > 10 {
                lines.push("...".to_owned());
            }
        }
        lines.join("\n")
    }

    pub fn halt_message(&self) {
        println!("\n--- System halted after {} cycles. ---\n", self.cycle);
        println!("Final Memory Layout\n");
        println!("{}", self.memory_summary());
    }

    pub fn interrupted_message(&self) {
        println!("\n--- System interrupted after {} cycles. ---\n", self.cycle);
        println!("Final Memory Layout\n");
        println!("{}", self.memory_summary());
    }

    // --- Reset ---

    pub fn reset_processing_elements(&mut self) {
        for processing_element in &self.processing_elements {
            processing_element.borrow_mut().reset();
        }
    }

    pub fn reset_memories(&mut self) {
        for memory in &self.memories {
            memory.borrow_mut().reset();
        }
    }

    pub fn reset_buffers(&mut self) {
        for buffer in &self.buffers {
            buffer.borrow_mut().reset();
        }
    }

    /// Reset every processing element, memory and buffer. Instruction stores
    /// and memory contents persist; the cycle counter does not restart so
    /// that consecutive runs remain distinguishable in traces.
    pub fn reset(&mut self) {
        self.reset_processing_elements();
        self.reset_memories();
        self.reset_buffers();
    }

    /// Execution traces by processing element name.
    pub fn processing_element_traces(&self) -> HashMap<String, Vec<i32>> {
        self.processing_elements
            .iter()
            .map(|pe| {
                let pe = pe.borrow();
                (pe.name().to_owned(), pe.core().execution_trace().to_vec())
            })
            .collect()
    }
}
