//! Quartets: 2x2 groups of processing elements.
//!
//! In hardware a quartet shares one clock and reset tree, one configuration
//! block and one MMIO access port, so the simulator mirrors the grouping.

use crate::direction::Direction;
use crate::parameters::{CoreParameters, InterconnectParameters};
use crate::simulator::processing_element::{
    connect_processing_elements, ProcessingElement, ProcessingElementHandle,
};
use crate::simulator::SimulatorError;

pub struct Quartet {
    name: String,
    processing_elements: Vec<ProcessingElementHandle>,
}

impl Quartet {
    /// Build a quartet whose processing elements are named by their absolute
    /// position in an array with `num_columns` columns.
    pub fn new(
        name: impl Into<String>,
        row_base_index: usize,
        column_base_index: usize,
        num_columns: usize,
        cp: &CoreParameters,
        ip: &InterconnectParameters,
    ) -> Result<Quartet, SimulatorError> {
        let mut processing_elements = Vec::with_capacity(4);
        for i in row_base_index..row_base_index + 2 {
            for j in column_base_index..column_base_index + 2 {
                let processing_element_index = i * num_columns + j;
                let processing_element = ProcessingElement::new(
                    format!("processing_element_{}", processing_element_index),
                    cp,
                    ip,
                )?;
                processing_elements.push(processing_element.into_handle());
            }
        }

        for i in 0..2 {
            for j in 0..2 {
                if j < 1 {
                    connect_processing_elements(
                        &processing_elements[i * 2 + j],
                        &processing_elements[i * 2 + j + 1],
                        Direction::East,
                    )?;
                }
                if i < 1 {
                    connect_processing_elements(
                        &processing_elements[i * 2 + j],
                        &processing_elements[(i + 1) * 2 + j],
                        Direction::South,
                    )?;
                }
            }
        }

        Ok(Quartet {
            name: name.into(),
            processing_elements,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn processing_elements(&self) -> &[ProcessingElementHandle] {
        &self.processing_elements
    }
}

/// Connect two quartets along the axis given by the direction from `a` to
/// `b`, wiring the two boundary processing element pairs.
pub fn connect_quartets(
    a: &Quartet,
    b: &Quartet,
    direction_a_to_b: Direction,
) -> Result<(), SimulatorError> {
    match direction_a_to_b {
        Direction::North => {
            for j in 0..2 {
                connect_processing_elements(
                    &a.processing_elements[j],
                    &b.processing_elements[2 + j],
                    Direction::North,
                )?;
            }
        }
        Direction::East => {
            for i in 0..2 {
                connect_processing_elements(
                    &a.processing_elements[i * 2 + 1],
                    &b.processing_elements[i * 2],
                    Direction::East,
                )?;
            }
        }
        Direction::South => {
            for j in 0..2 {
                connect_processing_elements(
                    &a.processing_elements[2 + j],
                    &b.processing_elements[j],
                    Direction::South,
                )?;
            }
        }
        Direction::West => {
            for i in 0..2 {
                connect_processing_elements(
                    &a.processing_elements[i * 2],
                    &b.processing_elements[i * 2 + 1],
                    Direction::West,
                )?;
            }
        }
    }
    Ok(())
}
