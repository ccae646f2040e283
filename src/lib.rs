//! Career Intake - Conversational Career Profile Builder
//!
//! This crate implements a guided, multi-turn intake conversation that
//! collects structured career data (contact info, goals, value proposition,
//! achievements) and can seed it from an uploaded resume.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
