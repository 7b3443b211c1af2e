pub mod poll;
pub mod response;
