pub mod assembler;
pub mod index;
pub mod pipeline;
pub mod seed;
pub mod table;
pub mod truecase;
pub mod walker;
