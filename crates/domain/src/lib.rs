#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

mod error;
mod exercise;
mod exercise_group;
mod name;
mod performance;
mod service;
mod set;
mod weight_row;

pub use error::*;
pub use exercise::*;
pub use exercise_group::*;
pub use name::*;
pub use performance::*;
pub use service::*;
pub use set::*;
pub use weight_row::*;
