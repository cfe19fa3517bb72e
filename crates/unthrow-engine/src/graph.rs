//! Override graph builder and per-method flow-fact annotator.
//!
//! Facts are computed once per method at discovery and never mutated
//! afterwards; the override adjacency is append-only. Both maps sit
//! behind locks so the build can run method-parallel and later phases
//! can insert edges as the external search discovers them.
//!
//! Discovering an override edge does not merge the override's facts
//! into the base; revalidation against overrides is the global phase's
//! job.

use crate::cancel::CancelToken;
use crate::flow;
use crate::{Error, Result};
use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use unthrow_core::{MethodId, Program, TypeId};

/// Per-method flow facts plus the override adjacency known so far.
#[derive(Debug, Default)]
pub struct ExceptionGraph {
    facts: RwLock<HashMap<MethodId, Arc<HashSet<TypeId>>>>,
    overrides: RwLock<HashMap<MethodId, Vec<MethodId>>>,
}

impl ExceptionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds facts for every method in the program (method-parallel)
    /// and registers the direct-subtype override edges derivable from
    /// the snapshot. Deep override chains are left to the global phase.
    pub fn build(program: &Program, cancel: &CancelToken) -> Result<Self> {
        let graph = Self::new();
        let ids: Vec<MethodId> = program.method_ids().collect();

        let computed: Vec<(MethodId, HashSet<TypeId>)> = ids
            .par_iter()
            .map(|&id| {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                Ok((id, flow::escaping(program, id)))
            })
            .collect::<Result<_>>()?;
        {
            let mut facts = graph.facts.write();
            for (id, fact) in computed {
                facts.entry(id).or_insert_with(|| Arc::new(fact));
            }
        }

        for &base in &ids {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for &candidate in &ids {
                if program.overrides_method(candidate, base)
                    && is_direct(program, candidate, base)
                {
                    graph.on_override_discovered(base, candidate);
                }
            }
        }
        Ok(graph)
    }

    /// Registers a method, computing its flow fact. Idempotent: a fact
    /// already present is never recomputed or replaced.
    pub fn on_method_discovered(&self, program: &Program, method: MethodId) {
        let mut facts = self.facts.write();
        facts
            .entry(method)
            .or_insert_with(|| Arc::new(flow::escaping(program, method)));
    }

    /// Registers an override edge. Idempotent append.
    pub fn on_override_discovered(&self, base: MethodId, overriding: MethodId) {
        let mut overrides = self.overrides.write();
        let edges = overrides.entry(base).or_default();
        if !edges.contains(&overriding) {
            edges.push(overriding);
        }
    }

    /// The method's flow fact; empty for methods never discovered.
    pub fn fact(&self, method: MethodId) -> Arc<HashSet<TypeId>> {
        self.facts.read().get(&method).cloned().unwrap_or_default()
    }

    /// True once the method's fact slot has been written.
    pub fn is_registered(&self, method: MethodId) -> bool {
        self.facts.read().contains_key(&method)
    }

    /// Overriding methods known so far for `base`.
    pub fn known_overrides(&self, base: MethodId) -> Vec<MethodId> {
        self.overrides
            .read()
            .get(&base)
            .cloned()
            .unwrap_or_default()
    }
}

fn is_direct(program: &Program, candidate: MethodId, base: MethodId) -> bool {
    let base_owner = program.method(base).owner;
    program
        .type_decl(program.method(candidate).owner)
        .supertypes
        .contains(&base_owner)
}
