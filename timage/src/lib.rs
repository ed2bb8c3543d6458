//! Binary program-image container for triggered-instruction processing
//! elements.
//!
//! An image is two little-endian streams of 32-bit words: the initial register
//! file followed by the sliced machine-code instructions. The on-disk form is
//! prefixed with the register word count so the two streams can be separated
//! again when reading.

use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::prelude::*;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use util::Endian;

#[derive(Clone, Debug, PartialEq)]
pub struct ProgramImage {
    register_values: Vec<u32>,
    instruction_words: Vec<u32>,
}

impl ProgramImage {
    pub fn from(register_values: Vec<u32>, instruction_words: Vec<u32>) -> ProgramImage {
        ProgramImage {
            register_values,
            instruction_words,
        }
    }

    pub fn copy_from(register_values: &[u32], instruction_words: &[u32]) -> ProgramImage {
        ProgramImage {
            register_values: Vec::from(register_values),
            instruction_words: Vec::from(instruction_words),
        }
    }

    pub fn register_values(&self) -> &[u32] {
        &self.register_values[..]
    }

    pub fn instruction_words(&self) -> &[u32] {
        &self.instruction_words[..]
    }
}

pub fn read<R: Read>(reader: &mut R) -> std::io::Result<ProgramImage> {
    let register_count = reader.read_u32::<Endian>()?;
    let mut register_values = vec![0u32; register_count as usize];
    reader.read_u32_into::<Endian>(&mut register_values)?;

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    if rest.len() % 4 != 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Instruction stream length is not a multiple of four bytes.",
        ));
    }
    let mut instruction_words = Vec::with_capacity(rest.len() / 4);
    for chunk in rest.chunks(4) {
        instruction_words.push(Endian::read_u32(chunk));
    }

    Ok(ProgramImage::from(register_values, instruction_words))
}

pub fn write<W: Write>(writer: &mut W, image: &ProgramImage) -> std::io::Result<()> {
    writer.write_u32::<Endian>(image.register_values.len() as u32)?;
    for word in &image.register_values {
        writer.write_u32::<Endian>(*word)?;
    }
    for word in &image.instruction_words {
        writer.write_u32::<Endian>(*word)?;
    }
    Ok(())
}

pub trait ReadImageExt: Read + Sized {
    fn read_image(&mut self) -> std::io::Result<ProgramImage> {
        read(self)
    }
}

impl<R: Read + Sized> ReadImageExt for R {}

pub trait WriteImageExt: Write + Sized {
    fn write_image(&mut self, image: &ProgramImage) -> std::io::Result<()> {
        write(self, image)
    }
}

impl<W: Write + Sized> WriteImageExt for W {}

pub fn read_file<P: AsRef<Path>>(path: P) -> std::io::Result<ProgramImage> {
    BufReader::new(File::open(path)?).read_image()
}

pub fn write_file<P: AsRef<Path>>(path: P, image: &ProgramImage) -> std::io::Result<()> {
    BufWriter::new(File::create(path)?).write_image(image)
}
