//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry, history, quota and persistence into commands.
//! - Keep UI callers decoupled from storage details.

pub mod task_service;
