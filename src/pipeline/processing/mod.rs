// Pipeline processing: record parsing, validation/filtering and magnitude normalization

pub mod filter;
pub mod normalize;
pub mod parser;
