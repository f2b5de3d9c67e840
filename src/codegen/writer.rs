use rspirv::spirv;

use super::errors::EmitError;

/// SPIR-V 1.0
const VERSION: u32 = 0x0001_0000;
const BOUND_OFFSET: usize = 3;
const MAX_WORD_COUNT: usize = 0xFFFF;

/// Writes a SPIR-V word stream.
///
/// The header is written up front, the id bound is patched once every id is known.
#[derive(Debug, Clone)]
pub(crate) struct ByteStreamWriter {
    words: Vec<u32>,
}

impl Default for ByteStreamWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteStreamWriter {
    pub fn new() -> Self {
        Self {
            words: vec![spirv::MAGIC_NUMBER, VERSION, 0, 0, 0],
        }
    }

    /// Writes an instruction: the word count and opcode, followed by the operands.
    pub fn write_instruction(&mut self, opcode: spirv::Op, operands: &[u32]) -> Result<(), EmitError> {
        let word_count = operands.len() + 1;
        if word_count > MAX_WORD_COUNT {
            return Err(EmitError::InstructionTooLong {
                opcode,
                words: word_count,
            });
        }

        self.words.push(((word_count as u32) << 16) | opcode as u32);
        self.words.extend_from_slice(operands);
        Ok(())
    }

    pub fn set_id_bound(&mut self, bound: u32) {
        self.words[BOUND_OFFSET] = bound;
    }

    pub fn finish(self) -> Vec<u32> {
        self.words
    }
}

/// Packs a string literal: nul terminated, padded to a whole word, little endian.
pub(crate) fn pack_string(value: &str) -> Vec<u32> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }

    bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_layout() {
        let mut writer = ByteStreamWriter::new();
        writer.set_id_bound(42);
        let words = writer.finish();

        assert_eq!(words, vec![0x0723_0203, 0x0001_0000, 0, 42, 0]);
    }

    #[test]
    fn instruction_word_count() {
        let mut writer = ByteStreamWriter::new();
        writer
            .write_instruction(spirv::Op::TypeInt, &[1, 32, 0])
            .unwrap();
        let words = writer.finish();

        assert_eq!(&words[5..], &[(4 << 16) | 21, 1, 32, 0]);
    }

    #[test]
    fn oversized_instruction() {
        let mut writer = ByteStreamWriter::new();
        let operands = vec![0; MAX_WORD_COUNT];
        let result = writer.write_instruction(spirv::Op::TypeStruct, &operands);

        assert_eq!(
            result,
            Err(EmitError::InstructionTooLong {
                opcode: spirv::Op::TypeStruct,
                words: MAX_WORD_COUNT + 1,
            })
        );
    }

    #[test]
    fn strings_are_padded() {
        assert_eq!(pack_string("main"), vec![0x6e69_616d, 0]);
        assert_eq!(pack_string("abc"), vec![0x0063_6261]);
        assert_eq!(pack_string(""), vec![0]);
    }
}
