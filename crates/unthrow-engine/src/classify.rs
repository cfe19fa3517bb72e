//! Local redundancy classification.
//!
//! Compares a method's declared throws-list against its own flow fact
//! and a gauntlet of exclusion rules. Candidates emitted here are still
//! provisional: overrides not yet in the graph may retract them during
//! the global phase.

use crate::graph::ExceptionGraph;
use crate::{AnalysisError, AnalyzerOptions, ProblemCategory};
use std::collections::HashSet;
use tracing::error;
use unthrow_core::{MethodDecl, MethodId, Program, ProgramHost, TypeId, TypeKind};

/// A provisional redundancy finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub method: MethodId,
    pub ty: TypeId,
    pub category: ProblemCategory,
}

/// True for methods whose missing body is part of their contract.
pub(crate) fn is_abstract_like(program: &Program, decl: &MethodDecl) -> bool {
    decl.modifiers.is_abstract || program.type_decl(decl.owner).kind == TypeKind::Interface
}

/// Classifies one method, appending any internal-error records.
pub(crate) fn classify(
    program: &Program,
    graph: &ExceptionGraph,
    host: &dyn ProgramHost,
    options: &AnalyzerOptions,
    method: MethodId,
    errors: &mut Vec<AnalysisError>,
) -> Vec<Candidate> {
    let decl = program.method(method);

    if decl.modifiers.is_synthetic
        || decl.modifiers.is_native
        || host.is_serialization_related(method)
    {
        return Vec::new();
    }
    if options.ignore_entry_points && host.is_entry_point(method) {
        return Vec::new();
    }

    let abstract_like = is_abstract_like(program, decl);
    if decl.body.is_none() && !abstract_like {
        // Concrete method lost its body since discovery; exclude it
        // from results rather than guessing.
        error!(
            method = %program.method_display(method),
            "concrete method has no body; excluding from analysis"
        );
        errors.push(AnalysisError {
            method: program.method_display(method),
            message: "concrete method has no body".to_string(),
        });
        return Vec::new();
    }

    let fact = graph.fact(method);
    let wk = program.well_known();
    let overridable = program.can_be_overridden(method);
    let known_overrides = graph.known_overrides(method);

    let category = if abstract_like {
        ProblemCategory::AbstractMethod
    } else if !known_overrides.is_empty() {
        ProblemCategory::OverriddenMethod
    } else {
        ProblemCategory::PlainMethod
    };

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for ty in decl.throws_types() {
        if !seen.insert(ty) {
            continue;
        }
        if !program.is_checked_exception(ty) {
            continue;
        }
        // Remote stubs require RemoteException even when provably
        // unused.
        if ty == wk.remote_exception && program.implements_remote(decl.owner) {
            continue;
        }
        // Related (in either direction) to something the body throws.
        if fact
            .iter()
            .any(|&thrown| program.is_assignable(thrown, ty) || program.is_assignable(ty, thrown))
        {
            continue;
        }
        // Cheap local suppression against overrides already in the
        // graph; the full search happens in the global phase.
        if overridable
            && known_overrides.iter().any(|&o| {
                graph
                    .fact(o)
                    .iter()
                    .any(|&thrown| program.is_assignable(thrown, ty))
                    || program
                        .method(o)
                        .throws_types()
                        .any(|d| program.is_assignable(d, ty))
            })
        {
            continue;
        }
        candidates.push(Candidate {
            method,
            ty,
            category,
        });
    }
    candidates
}
