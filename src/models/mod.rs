//! Records exchanged with the backend collections

mod account;
mod adoption;
mod animal;
mod audit;

pub use account::*;
pub use adoption::*;
pub use animal::*;
pub use audit::*;
