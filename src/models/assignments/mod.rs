pub mod entities;
pub mod requests;
pub mod responses;
pub mod window;

pub use window::{SubmissionWindow, WindowVerdict};
