//! Unthrow core - program model, host interfaces and edit vocabulary.
//!
//! This crate provides the foundational types for the unthrow analysis
//! system:
//!
//! - [`Program`] / [`ProgramBuilder`]: arena-style whole-program model
//!   with a nominal type hierarchy and checked-exception queries
//! - [`Stmt`]: the exception-relevant statement skeleton of a method body
//! - [`ProgramHost`]: capability trait for the environment (override
//!   search, reference search, atomic edits, classification predicates)
//! - [`Edit`]: declarative, atomically applied structural changes
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   unthrow-cli    │  (User interface)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  unthrow-engine  │  (Flow, graph, classify, propagate, removal)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  unthrow-core    │  (This crate - model, host trait, edits)
//! └──────────────────┘
//! ```

pub mod ast;
pub mod edit;
pub mod error;
pub mod host;
pub mod program;
pub mod types;

// Re-export core types for convenience
pub use ast::{CatchClause, Resource, Stmt};
pub use edit::{apply_all, apply_edit, Edit};
pub use error::{Error, Result};
pub use host::{CallSite, MemoryHost, OverrideSearch, ProgramHost};
pub use program::{MethodSpec, Program, ProgramBuilder, WellKnown};
pub use types::{
    MethodDecl, MethodId, Modifiers, NodeId, ThrowsEntry, ThrowsOrigin, TypeDecl, TypeId, TypeKind,
};
