//! Generators for commonly used simulation systems.

use crate::direction::Direction;
use crate::parameters::{CoreParameters, InterconnectParameters, SystemParameters};
use crate::simulator::array::Array;
use crate::simulator::block::Block;
use crate::simulator::memory::{Memory, ReadPort, WritePort};
use crate::simulator::processing_element::ProcessingElement;
use crate::simulator::quartet::Quartet;
use crate::simulator::system::System;
use crate::simulator::SimulatorError;

/// Build an array test system: a rows-by-columns array with read ports along
/// the north edge and write ports (address and data pairs) along the south
/// edge, all backed by one data memory.
pub fn build_ats_system(
    num_rows: usize,
    num_columns: usize,
    cp: &CoreParameters,
    ip: &InterconnectParameters,
    sp: &SystemParameters,
) -> Result<System, SimulatorError> {
    let mut system = System::new();
    let array = Array::new("array_0", num_rows, num_columns, cp, ip)?;
    system.register_array(&array);
    let mut memory = Memory::new("memory", sp.num_test_data_memory_words as usize);

    for j in 0..num_columns {
        let read_port = ReadPort::new(
            format!("read_port_{}", j),
            sp.test_data_memory_buffer_depth as usize,
        );
        let processing_element = &array.processing_elements()[j];
        processing_element.borrow_mut().connect_to_receiver_channel_buffer(
            Direction::North,
            read_port.addr_in_channel_buffer(),
        )?;
        processing_element.borrow_mut().connect_to_sender_channel_buffer(
            Direction::North,
            read_port.data_out_channel_buffer(),
        )?;
        memory.add_read_port(read_port);
    }

    for j in 0..num_columns / 2 {
        let write_port = WritePort::new(
            format!("write_port_{}", j),
            sp.test_data_memory_buffer_depth as usize,
        );
        let base_processing_element_index = (num_rows - 1) * num_columns;
        let address_processing_element =
            &array.processing_elements()[base_processing_element_index + 2 * j];
        let data_processing_element =
            &array.processing_elements()[base_processing_element_index + 2 * j + 1];
        address_processing_element
            .borrow_mut()
            .connect_to_receiver_channel_buffer(
                Direction::South,
                write_port.addr_in_channel_buffer(),
            )?;
        data_processing_element
            .borrow_mut()
            .connect_to_receiver_channel_buffer(
                Direction::South,
                write_port.data_in_channel_buffer(),
            )?;
        memory.add_write_port(write_port);
    }

    // Ports must all be linked before registration.
    let memory = memory.into_handle();
    system.register_memory(&memory);

    system.finalize()?;
    Ok(system)
}

/// Build the processing element test system: a single processing element with
/// two read ports (north and east) and one write port whose address side is
/// south and data side is west.
pub fn build_pets_system(
    cp: &CoreParameters,
    ip: &InterconnectParameters,
    sp: &SystemParameters,
) -> Result<System, SimulatorError> {
    let mut system = System::new();
    let processing_element =
        ProcessingElement::new("processing_element_0", cp, ip)?.into_handle();
    system.register_processing_element(&processing_element);
    let mut memory = Memory::new("memory", sp.num_test_data_memory_words as usize);

    let read_port_0 = ReadPort::new("read_port_0", sp.test_data_memory_buffer_depth as usize);
    processing_element.borrow_mut().connect_to_receiver_channel_buffer(
        Direction::North,
        read_port_0.addr_in_channel_buffer(),
    )?;
    processing_element.borrow_mut().connect_to_sender_channel_buffer(
        Direction::North,
        read_port_0.data_out_channel_buffer(),
    )?;
    memory.add_read_port(read_port_0);

    let read_port_1 = ReadPort::new("read_port_1", sp.test_data_memory_buffer_depth as usize);
    processing_element.borrow_mut().connect_to_receiver_channel_buffer(
        Direction::East,
        read_port_1.addr_in_channel_buffer(),
    )?;
    processing_element.borrow_mut().connect_to_sender_channel_buffer(
        Direction::East,
        read_port_1.data_out_channel_buffer(),
    )?;
    memory.add_read_port(read_port_1);

    let write_port = WritePort::new("write_port", sp.test_data_memory_buffer_depth as usize);
    processing_element.borrow_mut().connect_to_receiver_channel_buffer(
        Direction::South,
        write_port.addr_in_channel_buffer(),
    )?;
    processing_element.borrow_mut().connect_to_receiver_channel_buffer(
        Direction::West,
        write_port.data_in_channel_buffer(),
    )?;
    memory.add_write_port(write_port);

    let memory = memory.into_handle();
    system.register_memory(&memory);

    system.finalize()?;
    Ok(system)
}

/// Build the quartet test system: one quartet, read ports above the top two
/// processing elements, and one write port below the bottom row.
pub fn build_qts_system(
    cp: &CoreParameters,
    ip: &InterconnectParameters,
    sp: &SystemParameters,
) -> Result<System, SimulatorError> {
    let mut system = System::new();
    let quartet = Quartet::new("quartet_0", 0, 0, 2, cp, ip)?;
    system.register_quartet(&quartet);
    let mut memory = Memory::new("memory", sp.num_test_data_memory_words as usize);

    for j in 0..2 {
        let read_port = ReadPort::new(
            format!("read_port_{}", j),
            sp.test_data_memory_buffer_depth as usize,
        );
        let processing_element = &quartet.processing_elements()[j];
        processing_element.borrow_mut().connect_to_receiver_channel_buffer(
            Direction::North,
            read_port.addr_in_channel_buffer(),
        )?;
        processing_element.borrow_mut().connect_to_sender_channel_buffer(
            Direction::North,
            read_port.data_out_channel_buffer(),
        )?;
        memory.add_read_port(read_port);
    }

    let write_port = WritePort::new("write_port", sp.test_data_memory_buffer_depth as usize);
    quartet.processing_elements()[2]
        .borrow_mut()
        .connect_to_receiver_channel_buffer(Direction::South, write_port.addr_in_channel_buffer())?;
    quartet.processing_elements()[3]
        .borrow_mut()
        .connect_to_receiver_channel_buffer(Direction::South, write_port.data_in_channel_buffer())?;
    memory.add_write_port(write_port);

    let memory = memory.into_handle();
    system.register_memory(&memory);

    system.finalize()?;
    Ok(system)
}

/// Build the block test system: one block, read ports above the four
/// northernmost processing elements, and one write port on the south edge.
pub fn build_bts_system(
    cp: &CoreParameters,
    ip: &InterconnectParameters,
    sp: &SystemParameters,
) -> Result<System, SimulatorError> {
    let mut system = System::new();
    let block = Block::new("block_0", 0, 0, 4, cp, ip)?;
    system.register_block(&block);
    let mut memory = Memory::new("memory", sp.num_test_data_memory_words as usize);

    for (i, &(quartet_index, processing_element_index)) in
        [(0, 0), (0, 1), (1, 0), (1, 1)].iter().enumerate()
    {
        let read_port = ReadPort::new(
            format!("read_port_{}", i),
            sp.test_data_memory_buffer_depth as usize,
        );
        let processing_element =
            &block.quartets()[quartet_index].processing_elements()[processing_element_index];
        processing_element.borrow_mut().connect_to_receiver_channel_buffer(
            Direction::North,
            read_port.addr_in_channel_buffer(),
        )?;
        processing_element.borrow_mut().connect_to_sender_channel_buffer(
            Direction::North,
            read_port.data_out_channel_buffer(),
        )?;
        memory.add_read_port(read_port);
    }

    let write_port = WritePort::new("write_port", sp.test_data_memory_buffer_depth as usize);
    block.quartets()[2].processing_elements()[2]
        .borrow_mut()
        .connect_to_receiver_channel_buffer(Direction::South, write_port.addr_in_channel_buffer())?;
    block.quartets()[2].processing_elements()[3]
        .borrow_mut()
        .connect_to_receiver_channel_buffer(Direction::South, write_port.data_in_channel_buffer())?;
    memory.add_write_port(write_port);

    let memory = memory.into_handle();
    system.register_memory(&memory);

    system.finalize()?;
    Ok(system)
}
