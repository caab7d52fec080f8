pub mod generators;
pub mod mask;
pub mod quantize;
pub mod refine;
