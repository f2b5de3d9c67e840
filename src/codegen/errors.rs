use rspirv::spirv;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EmitError {
    #[error("{node} has no {operand}")]
    MissingOperand { node: String, operand: &'static str },
    #[error("instruction {opcode:?} needs {words} words, more than an instruction can hold")]
    InstructionTooLong { opcode: spirv::Op, words: usize },
}
