//! Host capability trait and the in-memory reference host.
//!
//! The analysis engine treats its environment as a set of abstract
//! capabilities: a bounded override search, a whole-program reference
//! search, environment classification predicates, and an atomic edit
//! sink. [`MemoryHost`] implements them against a program snapshot held
//! behind a single-writer lock, and is what the CLI and the test suites
//! run against.

use crate::edit::{self, Edit};
use crate::error::Result;
use crate::program::Program;
use crate::types::{MethodId, NodeId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Result of a bounded override search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideSearch {
    /// The complete set of overriding methods, transitively.
    Known(Vec<MethodId>),
    /// Enumeration would exceed the cost budget; callers must assume an
    /// unknown override could exist and fail closed.
    Unknown,
}

/// A call expression referencing a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    /// Method whose body contains the call.
    pub caller: MethodId,
    /// The call node.
    pub node: NodeId,
}

/// Capabilities the analysis engine requires from its environment.
///
/// Implementations must be `Send + Sync`; the engine may dispatch
/// independent queries concurrently.
pub trait ProgramHost: Send + Sync {
    /// Enumerates all methods overriding `method`, directly or
    /// transitively. Returns [`OverrideSearch::Unknown`] when the
    /// result set would exceed `cost_budget` methods.
    fn find_overrides(&self, method: MethodId, cost_budget: usize) -> OverrideSearch;

    /// Whole-program search for call expressions targeting `method`.
    fn find_references(&self, method: MethodId) -> Vec<CallSite>;

    /// Applies a batch of edits atomically: either every edit commits
    /// or none does.
    fn apply_edits(&self, edits: Vec<Edit>) -> Result<()>;

    /// Framework-invoked callback signature.
    fn is_entry_point(&self, method: MethodId) -> bool;

    /// Serialization contract method (readObject and friends).
    fn is_serialization_related(&self, method: MethodId) -> bool;
}

/// Reference host over an in-memory program snapshot.
pub struct MemoryHost {
    program: RwLock<Program>,
}

impl MemoryHost {
    pub fn new(program: Program) -> Self {
        Self {
            program: RwLock::new(program),
        }
    }

    /// An immutable snapshot of the current program state.
    pub fn snapshot(&self) -> Program {
        self.program.read().clone()
    }
}

impl ProgramHost for MemoryHost {
    fn find_overrides(&self, method: MethodId, cost_budget: usize) -> OverrideSearch {
        let program = self.program.read();
        let mut found = Vec::new();
        for candidate in program.method_ids() {
            if program.overrides_method(candidate, method) {
                if found.len() >= cost_budget {
                    return OverrideSearch::Unknown;
                }
                found.push(candidate);
            }
        }
        OverrideSearch::Known(found)
    }

    fn find_references(&self, method: MethodId) -> Vec<CallSite> {
        let program = self.program.read();
        let mut sites = Vec::new();
        for caller in program.method_ids() {
            if let Some(body) = &program.method(caller).body {
                let mut calls = Vec::new();
                crate::ast::collect_calls(body, &mut calls);
                sites.extend(
                    calls
                        .into_iter()
                        .filter(|(_, callee)| *callee == method)
                        .map(|(node, _)| CallSite { caller, node }),
                );
            }
        }
        sites
    }

    fn apply_edits(&self, edits: Vec<Edit>) -> Result<()> {
        let mut program = self.program.write();
        let staged = edit::apply_all(&program, &edits)?;
        *program = staged;
        Ok(())
    }

    fn is_entry_point(&self, method: MethodId) -> bool {
        self.program.read().method(method).is_entry_point
    }

    fn is_serialization_related(&self, method: MethodId) -> bool {
        self.program.read().method(method).is_serialization_related
    }
}
