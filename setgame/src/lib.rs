pub use board::*;
pub use cards::*;
pub use config::*;
pub use errors::*;
pub use rules::*;

#[cfg(test)]
mod arbitrary;
mod board;
mod cards;
mod config;
mod errors;
mod rules;
