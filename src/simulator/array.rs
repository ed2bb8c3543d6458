//! Arbitrary rows-by-columns arrays of processing elements.

use crate::direction::Direction;
use crate::parameters::{CoreParameters, InterconnectParameters};
use crate::simulator::processing_element::{
    connect_processing_elements, ProcessingElement, ProcessingElementHandle,
};
use crate::simulator::SimulatorError;

pub struct Array {
    name: String,
    processing_elements: Vec<ProcessingElementHandle>,
}

impl Array {
    pub fn new(
        name: impl Into<String>,
        num_rows: usize,
        num_columns: usize,
        cp: &CoreParameters,
        ip: &InterconnectParameters,
    ) -> Result<Array, SimulatorError> {
        let mut processing_elements = Vec::with_capacity(num_rows * num_columns);
        for i in 0..num_rows * num_columns {
            let processing_element =
                ProcessingElement::new(format!("processing_element_{}", i), cp, ip)?;
            processing_elements.push(processing_element.into_handle());
        }

        for i in 0..num_rows {
            for j in 0..num_columns {
                if j < num_columns - 1 {
                    connect_processing_elements(
                        &processing_elements[i * num_columns + j],
                        &processing_elements[i * num_columns + j + 1],
                        Direction::East,
                    )?;
                }
                if i < num_rows - 1 {
                    connect_processing_elements(
                        &processing_elements[i * num_columns + j],
                        &processing_elements[(i + 1) * num_columns + j],
                        Direction::South,
                    )?;
                }
            }
        }

        Ok(Array {
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
