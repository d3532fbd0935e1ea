pub mod event;
pub mod outcome;
pub mod request;
pub mod slot;
