//! Repository implementations on `BursaryService`.
//!
//! Each submodule adds `impl BursaryService` methods for one table.

pub mod audit;
pub mod notification;
