pub mod attributes;
pub mod components;
pub mod couplings;
pub mod errors;
pub mod execution;
pub mod types;
pub mod values;
pub mod workspace;

#[cfg(test)]
mod tests;
