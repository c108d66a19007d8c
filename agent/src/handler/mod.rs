pub mod catalog;
pub mod dispatch;
pub mod tools;
