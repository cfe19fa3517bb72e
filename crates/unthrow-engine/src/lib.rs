//! Unthrow Engine - whole-program redundant-throws analysis.
//!
//! This crate turns a [`Program`](unthrow_core::Program) snapshot into a
//! list of [`RedundancyProblem`]s and plans the edit batches that fix
//! them. It runs in three phases:
//!
//! 1. **Graph build** ([`graph`]): a method-parallel sweep computes the
//!    flow fact of every method (the checked exception types escaping
//!    its body) and registers the direct override edges visible in the
//!    snapshot.
//! 2. **Local classification** ([`classify`], internal): each declared
//!    checked exception is compared against the method's own fact and a
//!    set of exclusion rules, producing provisional candidates.
//! 3. **Global propagation** ([`propagate`], internal): one bounded
//!    host query per candidate method resolves the full override set;
//!    overrides that still need the declaration retract the candidate.
//!    An unbounded search result fails closed.
//!
//! Fixes are planned by the [`removal`] engine as single atomic edit
//! batches covering throws entries, overrides, dead catch sections,
//! emptied try-statements, and documentation tags.

pub mod cancel;
mod classify;
pub mod flow;
pub mod graph;
mod propagate;
pub mod removal;

use serde::Serialize;
use std::time::Instant;
use tracing::info;
use unthrow_core::{Edit, MethodId, Program, ProgramHost, TypeId};

pub use cancel::CancelToken;
pub use removal::RemovalEngine;

/// Errors surfaced by an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("analysis cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] unthrow_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Cap on host override enumeration before the engine gives up on a
/// method and keeps its declarations untouched.
pub const DEFAULT_OVERRIDE_SEARCH_BUDGET: usize = 256;

/// Tuning knobs for an analysis run.
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Skip methods the host marks as entry points (overridden library
    /// callbacks, `main`, test methods).
    pub ignore_entry_points: bool,
    /// Maximum override count the host may enumerate per method.
    pub override_search_budget: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            ignore_entry_points: false,
            override_search_budget: DEFAULT_OVERRIDE_SEARCH_BUDGET,
        }
    }
}

/// How the flagged declaration site relates to the override graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCategory {
    /// Abstract or interface method: the declaration constrains only
    /// implementors, none of which throws the type.
    AbstractMethod,
    /// Concrete method with known overrides, none of which throws or
    /// redeclares the type.
    OverriddenMethod,
    /// Concrete method with no known overrides.
    PlainMethod,
}

impl ProblemCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::AbstractMethod => "abstract method",
            Self::OverriddenMethod => "overridden method",
            Self::PlainMethod => "method",
        }
    }
}

/// One confirmed redundant throws declaration.
#[derive(Debug, Clone, Serialize)]
pub struct RedundancyProblem {
    pub method: MethodId,
    pub method_display: String,
    pub ty: TypeId,
    pub type_name: String,
    pub category: ProblemCategory,
}

/// Counters for one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub methods_analyzed: usize,
    pub candidates_emitted: usize,
    pub candidates_retracted: usize,
    pub problems_reported: usize,
    pub duration_ms: u64,
}

/// A non-fatal inconsistency encountered mid-run. The affected method
/// is excluded from results; the run continues.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisError {
    pub method: String,
    pub message: String,
}

/// The complete outcome of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub problems: Vec<RedundancyProblem>,
    pub statistics: Statistics,
    pub errors: Vec<AnalysisError>,
}

/// Analysis facade: owns the options and cancellation token, borrows
/// the host for override search, reference search, and edits.
pub struct Analyzer<'a> {
    host: &'a dyn ProgramHost,
    options: AnalyzerOptions,
    cancel: CancelToken,
}

impl<'a> Analyzer<'a> {
    pub fn new(host: &'a dyn ProgramHost, options: AnalyzerOptions) -> Self {
        Self {
            host,
            options,
            cancel: CancelToken::new(),
        }
    }

    /// A token that cancels this analyzer's runs from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs the full pipeline over a program snapshot.
    pub fn analyze(&self, program: &Program) -> Result<Analysis> {
        let start = Instant::now();
        let graph = graph::ExceptionGraph::build(program, &self.cancel)?;

        let mut errors = Vec::new();
        let mut candidates = Vec::new();
        let mut methods_analyzed = 0usize;
        for method in program.method_ids() {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            methods_analyzed += 1;
            candidates.extend(classify::classify(
                program,
                &graph,
                self.host,
                &self.options,
                method,
                &mut errors,
            ));
        }

        let candidates_emitted = candidates.len();
        let confirmed = propagate::revalidate(
            program,
            &graph,
            self.host,
            &self.options,
            &self.cancel,
            candidates,
        )?;

        let problems: Vec<RedundancyProblem> = confirmed
            .iter()
            .map(|c| RedundancyProblem {
                method: c.method,
                method_display: program.method_display(c.method),
                ty: c.ty,
                type_name: program.type_name(c.ty).to_string(),
                category: c.category,
            })
            .collect();

        let statistics = Statistics {
            methods_analyzed,
            candidates_emitted,
            candidates_retracted: candidates_emitted - problems.len(),
            problems_reported: problems.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            methods = statistics.methods_analyzed,
            problems = statistics.problems_reported,
            retracted = statistics.candidates_retracted,
            duration_ms = statistics.duration_ms,
            "analysis complete"
        );

        Ok(Analysis {
            problems,
            statistics,
            errors,
        })
    }

    /// Plans the edit batch that would fix one reported problem,
    /// without applying it.
    pub fn plan_fix(&self, program: &Program, problem: &RedundancyProblem) -> Result<Vec<Edit>> {
        RemovalEngine::new(program, self.host).plan(problem.method, problem.ty)
    }

    /// Plans and atomically applies the fix through the host.
    pub fn apply_fix(&self, program: &Program, problem: &RedundancyProblem) -> Result<Vec<Edit>> {
        RemovalEngine::new(program, self.host).apply(problem.method, problem.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unthrow_core::{MemoryHost, MethodSpec, ProgramBuilder};

    #[test]
    fn test_analyze_reports_and_fix_clears() {
        let mut b = ProgramBuilder::new();
        let wk = b.well_known();
        let owner = b.class("com.example.A", &[]);
        let m = b.method(MethodSpec {
            throws: vec![wk.io_exception],
            body: Some(vec![]),
            ..MethodSpec::new(owner, "m")
        });
        let p = b.finish();
        let host = MemoryHost::new(p.clone());

        let analyzer = Analyzer::new(&host, AnalyzerOptions::default());
        let analysis = analyzer.analyze(&p).unwrap();
        assert_eq!(analysis.problems.len(), 1);
        assert_eq!(analysis.statistics.problems_reported, 1);
        assert!(analysis.errors.is_empty());

        analyzer.apply_fix(&p, &analysis.problems[0]).unwrap();
        let after = host.snapshot();
        assert_eq!(after.method(m).throws_list_len(), 0);

        // A second run over the fixed snapshot finds nothing.
        let analysis = analyzer.analyze(&after).unwrap();
        assert!(analysis.problems.is_empty());
    }

    #[test]
    fn test_cancelled_analyze_returns_error() {
        let mut b = ProgramBuilder::new();
        let owner = b.class("com.example.A", &[]);
        b.method(MethodSpec {
            body: Some(vec![]),
            ..MethodSpec::new(owner, "m")
        });
        let p = b.finish();
        let host = MemoryHost::new(p.clone());

        let analyzer = Analyzer::new(&host, AnalyzerOptions::default());
        analyzer.cancel_token().cancel();
        assert!(matches!(analyzer.analyze(&p), Err(Error::Cancelled)));
    }
}
