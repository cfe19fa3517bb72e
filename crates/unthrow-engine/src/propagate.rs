//! Global propagation: revalidates local candidates against the full
//! override set.
//!
//! Overrides may be discovered after classification, so the engine
//! issues one bounded external query per method that still has a
//! candidate. Retraction is monotonic and idempotent; because every
//! flow fact was computed bottom-up before any edge is consulted, one
//! sweep suffices and no retraction can create another.

use crate::cancel::CancelToken;
use crate::classify::{is_abstract_like, Candidate};
use crate::graph::ExceptionGraph;
use crate::{AnalyzerOptions, Error, Result};
use tracing::debug;
use unthrow_core::{MethodId, OverrideSearch, Program, ProgramHost, TypeId};

/// Returns the candidates that survive revalidation, in emission order.
pub(crate) fn revalidate(
    program: &Program,
    graph: &ExceptionGraph,
    host: &dyn ProgramHost,
    options: &AnalyzerOptions,
    cancel: &CancelToken,
    candidates: Vec<Candidate>,
) -> Result<Vec<Candidate>> {
    // Group per method, preserving first-seen order.
    let mut order: Vec<MethodId> = Vec::new();
    for c in &candidates {
        if !order.contains(&c.method) {
            order.push(c.method);
        }
    }

    let mut confirmed = Vec::new();
    for method in order {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mine = candidates.iter().filter(|c| c.method == method);

        match host.find_overrides(method, options.override_search_budget) {
            OverrideSearch::Unknown => {
                // Fail closed: an unknown override might throw any of
                // the candidate types.
                debug!(
                    method = %program.method_display(method),
                    budget = options.override_search_budget,
                    "override fan-out exceeds budget; suppressing candidates"
                );
            }
            OverrideSearch::Known(found) => {
                for &overriding in &found {
                    graph.on_method_discovered(program, overriding);
                    graph.on_override_discovered(method, overriding);
                }
                for candidate in mine {
                    if let Some(&blocker) = found
                        .iter()
                        .find(|&&o| override_needs(program, graph, o, candidate.ty))
                    {
                        debug!(
                            method = %program.method_display(method),
                            ty = %program.type_name(candidate.ty),
                            kept_by = %program.method_display(blocker),
                            "candidate retracted by override"
                        );
                    } else {
                        confirmed.push(*candidate);
                    }
                }
            }
        }
    }
    Ok(confirmed)
}

/// True when the override keeps the base declaration load-bearing.
fn override_needs(
    program: &Program,
    graph: &ExceptionGraph,
    overriding: MethodId,
    ty: TypeId,
) -> bool {
    let decl = program.method(overriding);

    // A non-private override redeclaring the type (or a subtype) pins
    // the contract for polymorphic substitutability.
    if !decl.modifiers.is_private
        && decl
            .throws_types()
            .any(|declared| program.is_assignable(declared, ty))
    {
        return true;
    }

    // The override actually propagates the type (or a subtype).
    if graph
        .fact(overriding)
        .iter()
        .any(|&thrown| program.is_assignable(thrown, ty))
    {
        return true;
    }

    // Concrete but bodyless (native, or a body the host could not
    // produce): assume it may still throw.
    decl.body.is_none() && !is_abstract_like(program, decl)
}
