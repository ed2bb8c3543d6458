//! Processing element cores.

use tracing::trace;

use crate::assembly::instruction::{
    op_implementation, DestinationType, Instruction, Op, SourceType, Trigger,
};
use crate::assembly::program::ProcessingElementProgram;
use crate::parameters::CoreParameters;
use crate::simulator::interconnect::{Packet, ReceiverChannelBuffer, SenderChannelBuffer};
use crate::simulator::SimulatorError;
use crate::Word;

/// Architectural state of one processing element: predicates, registers, an
/// optional scratchpad, the channel buffers, the halt flag and two
/// performance counters. Instructions are scanned in priority order each
/// cycle; the first whose trigger holds fires.
pub struct Core {
    name: String,
    instructions: Vec<Instruction>,
    predicates: Vec<bool>,
    registers: Vec<Word>,
    scratchpad: Option<Vec<Word>>,
    input_channel_buffers: Vec<ReceiverChannelBuffer>,
    output_channel_buffers: Vec<SenderChannelBuffer>,
    halt_register: bool,
    instructions_retired: u64,
    untriggered_cycles: u64,
    execution_trace: Vec<i32>,
}

impl Core {
    pub fn new(name: impl Into<String>, cp: &CoreParameters) -> Core {
        let name = name.into();
        let scratchpad = if cp.num_scratchpad_words != 0 {
            Some(vec![0; cp.num_scratchpad_words as usize])
        } else {
            None
        };
        let input_channel_buffers = (0..cp.num_input_channels)
            .map(|i| {
                ReceiverChannelBuffer::new(
                    format!("{}: Input Channel Buffer {}", name, i),
                    cp.channel_buffer_depth as usize,
                )
            })
            .collect();
        let output_channel_buffers = (0..cp.num_output_channels)
            .map(|i| {
                SenderChannelBuffer::new(
                    format!("{}: Output Channel Buffer {}", name, i),
                    cp.channel_buffer_depth as usize,
                )
            })
            .collect();

        Core {
            name,
            instructions: Vec::new(),
            predicates: vec![false; cp.num_predicates as usize],
            registers: vec![0; cp.num_registers as usize],
            scratchpad,
            input_channel_buffers,
            output_channel_buffers,
            halt_register: false,
            instructions_retired: 0,
            untriggered_cycles: 0,
            execution_trace: Vec::new(),
        }
    }

    // --- Programming routines ---

    pub fn initialize_registers(&mut self, register_values: &[i64]) -> Result<(), SimulatorError> {
        if register_values.len() != self.registers.len() {
            return Err(SimulatorError::RegisterDataLengthMismatch);
        }
        for (register, &register_value) in self.registers.iter_mut().zip(register_values) {
            *register = register_value as Word;
        }
        Ok(())
    }

    /// Load initial register values and overwrite the instruction store.
    pub fn program(&mut self, program: &ProcessingElementProgram) -> Result<(), SimulatorError> {
        self.initialize_registers(&program.register_values)?;
        self.instructions = program.instructions.clone();
        Ok(())
    }

    // --- Accessors ---

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicates(&self) -> &[bool] {
        &self.predicates
    }

    pub fn registers(&self) -> &[Word] {
        &self.registers
    }

    pub fn register(&self, index: usize) -> Word {
        self.registers[index]
    }

    pub fn scratchpad(&self) -> Option<&[Word]> {
        self.scratchpad.as_deref()
    }

    pub fn input_channel_buffers(&self) -> &[ReceiverChannelBuffer] {
        &self.input_channel_buffers
    }

    pub fn output_channel_buffers(&self) -> &[SenderChannelBuffer] {
        &self.output_channel_buffers
    }

    pub fn halt_register(&self) -> bool {
        self.halt_register
    }

    pub fn instructions_retired(&self) -> u64 {
        self.instructions_retired
    }

    pub fn untriggered_cycles(&self) -> u64 {
        self.untriggered_cycles
    }

    pub fn execution_trace(&self) -> &[i32] {
        &self.execution_trace
    }

    // --- Trigger checking ---

    /// Check the core's architectural state against a trigger. Defaults to
    /// true; any unmet condition vetoes the fire.
    pub fn check_trigger(&self, trigger: &Trigger) -> Result<bool, SimulatorError> {
        for &i in &trigger.true_predicates {
            if !self.predicates[i as usize] {
                return Ok(false);
            }
        }
        for &i in &trigger.false_predicates {
            if self.predicates[i as usize] {
                return Ok(false);
            }
        }
        for &i in &trigger.input_channels {
            if self.input_channel_buffers[i as usize].is_empty() {
                return Ok(false);
            }
        }
        for ((&i, &tag), &boolean) in trigger
            .input_channels
            .iter()
            .zip(&trigger.input_channel_tags)
            .zip(&trigger.input_channel_tag_booleans)
        {
            let head = self.input_channel_buffers[i as usize].peek()?;
            if boolean {
                if head.tag != tag {
                    return Ok(false);
                }
            } else if head.tag == tag {
                return Ok(false);
            }
        }
        for &index in &trigger.output_channel_indices {
            if self.output_channel_buffers[index as usize].is_full() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // --- Time stepping ---

    /// Perform a single cycle of execution, staging any channel traffic.
    pub fn iterate(&mut self, keep_execution_trace: bool) -> Result<(), SimulatorError> {
        let mut fired: Option<Instruction> = None;

        if !self.halt_register {
            for instruction in &self.instructions {
                if self.check_trigger(&instruction.trigger)? {
                    fired = Some(instruction.clone());
                    break;
                }
            }

            if let Some(ref instruction) = fired {
                self.instructions_retired += 1;
                trace!(
                    core = %self.name,
                    instruction = instruction.number,
                    op = %instruction.op,
                    "triggered"
                );

                if instruction.op == Op::HALT {
                    self.halt_register = true;
                }

                // Operand fetch never consumes channel state; only the
                // explicit dequeue list pops.
                let a = self.fetch_operand(instruction, 0)?;
                let b = self.fetch_operand(instruction, 1)?;
                let c = self.fetch_operand(instruction, 2)?;

                let result = match instruction.op {
                    Op::LSW => self.scratchpad_read(a)?,
                    Op::SSW => {
                        self.scratchpad_write(b, a)?;
                        0
                    }
                    op => op_implementation(op)(a, b, c),
                };

                let destination_index = instruction.destination_index.unwrap_or(0) as usize;
                match instruction.destination_type {
                    DestinationType::Channel => {
                        let result_packet =
                            Packet::new(instruction.output_channel_tag.unwrap_or(0), result);
                        for &i in &instruction.output_channel_indices {
                            self.output_channel_buffers[i as usize].enqueue(result_packet)?;
                        }
                    }
                    DestinationType::Register => {
                        self.registers[destination_index] = result;
                    }
                    DestinationType::Predicate => {
                        self.predicates[destination_index] = result != 0;
                    }
                    DestinationType::Null => {}
                }

                for &i in &instruction.input_channels_to_dequeue {
                    self.input_channel_buffers[i as usize].dequeue()?;
                }

                for (&index, &value) in instruction
                    .predicate_update_indices
                    .iter()
                    .zip(&instruction.predicate_update_values)
                {
                    self.predicates[index as usize] = value;
                }
            } else {
                self.untriggered_cycles += 1;
            }
        }

        if keep_execution_trace {
            self.execution_trace.push(match fired {
                Some(instruction) => instruction.number,
                None => -1,
            });
        }

        Ok(())
    }

    fn fetch_operand(
        &self,
        instruction: &Instruction,
        slot: usize,
    ) -> Result<Word, SimulatorError> {
        let index = instruction.source_indices[slot] as usize;
        match instruction.source_types[slot] {
            SourceType::Null => Ok(0),
            SourceType::Immediate => Ok(instruction.immediate.unwrap_or(0) as Word),
            SourceType::Channel => Ok(self.input_channel_buffers[index].peek()?.value),
            SourceType::Register => Ok(self.registers[index]),
        }
    }

    fn scratchpad_read(&self, address: Word) -> Result<Word, SimulatorError> {
        let name = self.name.clone();
        let scratchpad = self
            .scratchpad
            .as_ref()
            .ok_or(SimulatorError::MissingScratchpad(name))?;
        scratchpad
            .get(address as usize)
            .copied()
            .ok_or(SimulatorError::AddressOutOfRange {
                name: self.name.clone(),
                address,
            })
    }

    fn scratchpad_write(&mut self, address: Word, value: Word) -> Result<(), SimulatorError> {
        let name = self.name.clone();
        let scratchpad = self
            .scratchpad
            .as_mut()
            .ok_or(SimulatorError::MissingScratchpad(name.clone()))?;
        match scratchpad.get_mut(address as usize) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SimulatorError::AddressOutOfRange { name, address }),
        }
    }

    // --- Reset ---

    /// Clear all architectural state except the instruction store.
    pub fn reset(&mut self) {
        for predicate in self.predicates.iter_mut() {
            *predicate = false;
        }
        for register in self.registers.iter_mut() {
            *register = 0;
        }
        if let Some(scratchpad) = self.scratchpad.as_mut() {
            for word in scratchpad.iter_mut() {
                *word = 0;
            }
        }
        self.halt_register = false;
        self.instructions_retired = 0;
        self.untriggered_cycles = 0;
        self.execution_trace.clear();
        for input_channel_buffer in &self.input_channel_buffers {
            input_channel_buffer.reset();
        }
        for output_channel_buffer in &self.output_channel_buffers {
            output_channel_buffer.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::instruction::SourceType;
    use crate::test_utils::reference_core_parameters;

    fn core() -> Core {
        Core::new("processing_element_0", &reference_core_parameters())
    }

    fn commit_core_buffers(core: &Core) {
        for buffer in core.input_channel_buffers() {
            buffer.commit();
        }
        for buffer in core.output_channel_buffers() {
            buffer.commit();
        }
    }

    fn always() -> Trigger {
        Trigger::new()
    }

    #[test]
    fn add_immediate_retires_once() {
        // With r0 = 3, computes r1 = r0 + 7, then flips predicate 0 so the
        // instruction cannot fire again.
        let mut core = core();
        let mut instruction = Instruction::new();
        instruction.op = Op::ADD;
        instruction.trigger.false_predicates = vec![0];
        instruction.source_types = [SourceType::Register, SourceType::Immediate, SourceType::Null];
        instruction.immediate = Some(7);
        instruction.destination_type = DestinationType::Register;
        instruction.destination_index = Some(1);
        instruction.predicate_update_indices = vec![0];
        instruction.predicate_update_values = vec![true];
        instruction.number = 0;

        core.program(&ProcessingElementProgram::new(
            "pe",
            vec![3, 0, 0, 0, 0, 0, 0, 0],
            vec![instruction],
        ))
        .unwrap();

        core.iterate(true).unwrap();
        core.iterate(true).unwrap();

        assert_eq!(core.register(1), 10);
        assert_eq!(core.instructions_retired(), 1);
        assert_eq!(core.untriggered_cycles(), 1);
        assert_eq!(core.execution_trace(), &[0, -1]);
    }

    #[test]
    fn halt_stops_retirement() {
        let mut core = core();
        let mut instruction = Instruction::new();
        instruction.op = Op::HALT;
        instruction.trigger = always();
        instruction.number = 0;
        core.program(&ProcessingElementProgram::new("pe", vec![0; 8], vec![instruction]))
            .unwrap();

        core.iterate(true).unwrap();
        assert!(core.halt_register());
        assert_eq!(core.instructions_retired(), 1);

        core.iterate(true).unwrap();
        core.iterate(true).unwrap();
        assert_eq!(core.instructions_retired(), 1);
        assert_eq!(core.execution_trace(), &[0, -1, -1]);
    }

    #[test]
    fn lower_index_wins_ties() {
        let mut core = core();
        let mut first = Instruction::new();
        first.op = Op::MOV;
        first.source_types[0] = SourceType::Immediate;
        first.immediate = Some(1);
        first.destination_type = DestinationType::Register;
        first.destination_index = Some(0);
        first.number = 0;
        let mut second = first.clone();
        second.immediate = Some(2);
        second.number = 1;

        core.program(&ProcessingElementProgram::new(
            "pe",
            vec![0; 8],
            vec![first, second],
        ))
        .unwrap();

        core.iterate(true).unwrap();
        assert_eq!(core.register(0), 1);
        assert_eq!(core.execution_trace(), &[0]);
    }

    #[test]
    fn operand_fetch_peeks_without_consuming() {
        let mut core = core();
        let mut instruction = Instruction::new();
        instruction.op = Op::ADD;
        instruction.trigger.add_input_channel_condition(2, 0, true);
        instruction.source_types = [SourceType::Channel, SourceType::Channel, SourceType::Null];
        instruction.source_indices = [2, 2, 0];
        instruction.destination_type = DestinationType::Register;
        instruction.destination_index = Some(0);
        instruction.number = 0;
        core.program(&ProcessingElementProgram::new("pe", vec![0; 8], vec![instruction]))
            .unwrap();

        core.input_channel_buffers()[2]
            .enqueue(Packet::new(0, 21))
            .unwrap();
        commit_core_buffers(&core);

        core.iterate(false).unwrap();
        commit_core_buffers(&core);

        // Both sources read the same head packet, and nothing was dequeued.
        assert_eq!(core.register(0), 42);
        assert_eq!(core.input_channel_buffers()[2].count(), 1);
    }

    #[test]
    fn dequeue_list_pops_after_the_fire() {
        let mut core = core();
        let mut instruction = Instruction::new();
        instruction.op = Op::MOV;
        instruction.trigger.add_input_channel_condition(1, 5, true);
        instruction.source_types[0] = SourceType::Channel;
        instruction.source_indices[0] = 1;
        instruction.destination_type = DestinationType::Register;
        instruction.destination_index = Some(3);
        instruction.input_channels_to_dequeue = vec![1];
        instruction.number = 0;
        core.program(&ProcessingElementProgram::new("pe", vec![0; 8], vec![instruction]))
            .unwrap();

        core.input_channel_buffers()[1]
            .enqueue(Packet::new(5, 99))
            .unwrap();
        commit_core_buffers(&core);

        core.iterate(false).unwrap();
        commit_core_buffers(&core);

        assert_eq!(core.register(3), 99);
        assert!(core.input_channel_buffers()[1].is_empty());
    }

    #[test]
    fn tag_polarity_gates_the_trigger() {
        let core = core();
        let mut equal = Trigger::new();
        equal.add_input_channel_condition(0, 7, true);
        let mut unequal = Trigger::new();
        unequal.add_input_channel_condition(0, 7, false);

        core.input_channel_buffers()[0]
            .enqueue(Packet::new(7, 0))
            .unwrap();
        commit_core_buffers(&core);

        assert!(core.check_trigger(&equal).unwrap());
        assert!(!core.check_trigger(&unequal).unwrap());
    }

    #[test]
    fn full_output_channel_vetoes_the_trigger() {
        let core = core();
        let mut trigger = Trigger::new();
        trigger.output_channel_indices = vec![0];
        assert!(core.check_trigger(&trigger).unwrap());

        for _ in 0..4 {
            core.output_channel_buffers()[0]
                .enqueue(Packet::new(0, 0))
                .unwrap();
            commit_core_buffers(&core);
        }
        assert!(!core.check_trigger(&trigger).unwrap());
    }

    #[test]
    fn predicate_oscillation_round_trips() {
        // when %p == XXXXXXX0: nop; set %p = XXXXXXX1;
        // when %p == XXXXXXX1: add %r1, $1, $1; set %p = XXXXXXX0;
        let mut core = core();
        let mut ping = Instruction::new();
        ping.op = Op::NOP;
        ping.trigger.false_predicates = vec![0];
        ping.destination_type = DestinationType::Register;
        ping.destination_index = Some(0);
        ping.predicate_update_indices = vec![0];
        ping.predicate_update_values = vec![true];
        ping.number = 0;

        let mut pong = Instruction::new();
        pong.op = Op::ADD;
        pong.trigger.true_predicates = vec![0];
        pong.source_types = [
            SourceType::Immediate,
            SourceType::Immediate,
            SourceType::Null,
        ];
        pong.immediate = Some(1);
        pong.destination_type = DestinationType::Register;
        pong.destination_index = Some(1);
        pong.predicate_update_indices = vec![0];
        pong.predicate_update_values = vec![false];
        pong.number = 1;

        core.program(&ProcessingElementProgram::new(
            "pe",
            vec![0; 8],
            vec![ping, pong],
        ))
        .unwrap();

        core.iterate(true).unwrap();
        core.iterate(true).unwrap();

        assert_eq!(core.register(1), 2);
        assert_eq!(core.execution_trace(), &[0, 1]);
        assert!(!core.predicates()[0]);
    }

    #[test]
    fn scratchpad_store_then_load() {
        // ssw %r1, $5; then lsw %r2, $5;
        let mut core = core();
        let mut store = Instruction::new();
        store.op = Op::SSW;
        store.trigger.false_predicates = vec![0];
        store.source_types = [SourceType::Register, SourceType::Immediate, SourceType::Null];
        store.source_indices = [1, 0, 0];
        store.immediate = Some(5);
        store.predicate_update_indices = vec![0];
        store.predicate_update_values = vec![true];
        store.number = 0;

        let mut load = Instruction::new();
        load.op = Op::LSW;
        load.trigger.true_predicates = vec![0];
        load.source_types[0] = SourceType::Immediate;
        load.immediate = Some(5);
        load.destination_type = DestinationType::Register;
        load.destination_index = Some(2);
        load.number = 1;

        core.program(&ProcessingElementProgram::new(
            "pe",
            vec![0, 1234, 0, 0, 0, 0, 0, 0],
            vec![store, load],
        ))
        .unwrap();

        core.iterate(false).unwrap();
        assert_eq!(core.scratchpad().unwrap()[5], 1234);
        core.iterate(false).unwrap();
        assert_eq!(core.register(2), 1234);
    }

    #[test]
    fn scratchpad_access_without_scratchpad_fails() {
        let mut cp = reference_core_parameters();
        cp.num_scratchpad_words = 0;
        let mut core = Core::new("pe", &cp);

        let mut load = Instruction::new();
        load.op = Op::LSW;
        load.source_types[0] = SourceType::Immediate;
        load.immediate = Some(0);
        load.destination_type = DestinationType::Register;
        load.destination_index = Some(0);
        load.number = 0;
        core.program(&ProcessingElementProgram::new("pe", vec![0; 8], vec![load]))
            .unwrap();

        match core.iterate(false) {
            Err(SimulatorError::MissingScratchpad(_)) => {}
            other => panic!("expected a missing-scratchpad error, got {:?}", other),
        }
    }

    #[test]
    fn reset_is_idempotent_and_preserves_instructions() {
        let mut core = core();
        let mut instruction = Instruction::new();
        instruction.op = Op::HALT;
        instruction.number = 0;
        core.program(&ProcessingElementProgram::new(
            "pe",
            vec![7, 0, 0, 0, 0, 0, 0, 0],
            vec![instruction],
        ))
        .unwrap();
        core.iterate(true).unwrap();
        assert!(core.halt_register());

        core.reset();
        core.reset();

        assert!(!core.halt_register());
        assert_eq!(core.register(0), 0);
        assert!(core.predicates().iter().all(|&p| !p));
        assert_eq!(core.instructions_retired(), 0);
        assert_eq!(core.untriggered_cycles(), 0);
        assert!(core.execution_trace().is_empty());
        // The program survives: the core halts again on the next cycle.
        core.iterate(false).unwrap();
        assert!(core.halt_register());
    }
}
