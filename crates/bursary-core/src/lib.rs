//! # bursary-core
//!
//! Core types, validation rules, and response resolution for Bursary.
//!
//! This crate provides the pieces of the entity-mutation pipeline that do not
//! touch storage:
//! - Entity, audit record, and notification structs
//! - Entity kinds, actions, notification classes, and request modes
//! - The per-kind field table and payload validation
//! - The compound date/time validator
//! - The outcome report returned by the orchestrator
//! - The response resolver and its flash-message table

pub mod clock;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod outcome;
pub mod response;
pub mod schema;
pub mod validation;
