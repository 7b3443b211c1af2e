pub mod option;
pub mod poll;
pub mod response;
