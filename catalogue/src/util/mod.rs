pub mod user_input;

pub use user_input::{UserInput, Validated};
