//! Blocks: 2x2 groups of quartets, sixteen processing elements.

use crate::direction::Direction;
use crate::parameters::{CoreParameters, InterconnectParameters};
use crate::simulator::quartet::{connect_quartets, Quartet};
use crate::simulator::SimulatorError;

pub struct Block {
    name: String,
    quartets: Vec<Quartet>,
}

impl Block {
    pub fn new(
        name: impl Into<String>,
        row_base_index: usize,
        column_base_index: usize,
        num_columns: usize,
        cp: &CoreParameters,
        ip: &InterconnectParameters,
    ) -> Result<Block, SimulatorError> {
        let quartet_row_base_index = row_base_index / 2;
        let quartet_column_base_index = column_base_index / 2;
        let quartet_num_columns = num_columns / 2;

        let mut quartets = Vec::with_capacity(4);
        for i in quartet_row_base_index..quartet_row_base_index + 2 {
            for j in quartet_column_base_index..quartet_column_base_index + 2 {
                let quartet_index = i * quartet_num_columns + j;
                quartets.push(Quartet::new(
                    format!("quartet_{}", quartet_index),
                    i * 2,
                    j * 2,
                    num_columns,
                    cp,
                    ip,
                )?);
            }
        }

        for i in 0..2 {
            for j in 0..2 {
                if j < 1 {
                    connect_quartets(&quartets[i * 2 + j], &quartets[i * 2 + j + 1], Direction::East)?;
                }
                if i < 1 {
                    connect_quartets(&quartets[i * 2 + j], &quartets[(i + 1) * 2 + j], Direction::South)?;
                }
            }
        }

        Ok(Block {
            name: name.into(),
            quartets,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quartets(&self) -> &[Quartet] {
        &self.quartets
    }
}

/// Connect two blocks along the axis given by the direction from `a` to `b`,
/// wiring the two boundary quartet pairs.
pub fn connect_blocks(a: &Block, b: &Block, direction_a_to_b: Direction) -> Result<(), SimulatorError> {
    match direction_a_to_b {
        Direction::North => {
            for j in 0..2 {
                connect_quartets(&a.quartets[j], &b.quartets[2 + j], Direction::North)?;
            }
        }
        Direction::East => {
            for i in 0..2 {
                connect_quartets(&a.quartets[i * 2 + 1], &b.quartets[i * 2], Direction::East)?;
            }
        }
        Direction::South => {
            for j in 0..2 {
                connect_quartets(&a.quartets[2 + j], &b.quartets[j], Direction::South)?;
            }
        }
        Direction::West => {
            for i in 0..2 {
                connect_quartets(&a.quartets[i * 2], &b.quartets[i * 2 + 1], Direction::West)?;
            }
        }
    }
    Ok(())
}
