//! Route handlers, one module per resource.

pub mod account;
pub mod admin;
pub mod months;
pub mod participants;
pub mod tontines;
