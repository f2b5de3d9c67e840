pub mod codegen;
pub mod collect;
pub mod driver;
pub mod ir;
pub mod pass;
pub mod pipeline;
