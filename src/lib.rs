pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;
pub mod web;

pub use config::Curriculum;
pub use error::{Result, TimetableError};
pub use parser::TeacherBindings;
