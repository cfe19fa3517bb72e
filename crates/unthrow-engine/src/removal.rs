//! Cascading safe removal of a confirmed-redundant throws declaration.
//!
//! One removal is planned as a single batch of edits covering: the
//! throws-list entries on the method and every override, catch sections
//! at every call site that lose their last inducer, try-statements left
//! with nothing to handle, and matching `@throws` documentation tags.
//! The batch is applied atomically by the host; a stale target rejects
//! the whole transaction.

use std::collections::{HashMap, HashSet};
use unthrow_core::{
    ast, Edit, Error as CoreError, MethodId, NodeId, OverrideSearch, Program, ProgramHost, Stmt,
    TypeId,
};

use crate::{Error, Result};

/// Plans and applies removal transactions.
pub struct RemovalEngine<'a> {
    program: &'a Program,
    host: &'a dyn ProgramHost,
}

/// A potential producer of an exception type inside a protected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Inducer {
    ty: TypeId,
    /// Call or resource-close target; None for explicit throws.
    target: Option<MethodId>,
}

/// One enclosing try-statement at a call site: its catch sections and
/// the inducer sites of its protected region.
#[derive(Debug)]
struct TryModel {
    catches: Vec<(NodeId, Vec<TypeId>)>,
    inducers: Vec<Inducer>,
    has_resources: bool,
    has_finally: bool,
}

impl<'a> RemovalEngine<'a> {
    pub fn new(program: &'a Program, host: &'a dyn ProgramHost) -> Self {
        Self { program, host }
    }

    /// Plans the full edit batch for removing `ty` from `method`.
    pub fn plan(&self, method: MethodId, ty: TypeId) -> Result<Vec<Edit>> {
        let program = self.program;

        // Step 1: cascade across the override graph. Every declaration
        // the removed type would satisfy is cleared on every override.
        let affected = self.affected_methods(method);
        let mut removal_order: Vec<(MethodId, Vec<TypeId>)> = Vec::new();
        let mut removed: HashMap<MethodId, HashSet<TypeId>> = HashMap::new();
        for &m in &affected {
            let mut types: Vec<TypeId> = Vec::new();
            for declared in program.method(m).throws_types() {
                if program.is_assignable(ty, declared) && !types.contains(&declared) {
                    types.push(declared);
                }
            }
            if !types.is_empty() {
                removed.insert(m, types.iter().copied().collect());
                removal_order.push((m, types));
            }
        }
        if !removed.contains_key(&method) {
            return Err(Error::Core(CoreError::MissingThrowsEntry { method, ty }));
        }

        let mut edits = Vec::new();
        for (m, types) in &removal_order {
            for &t in types {
                edits.push(Edit::RemoveThrowsEntry { method: *m, ty: t });
            }
        }

        // Step 2: locate the innermost try-statement protecting every
        // reference to an affected method.
        let mut try_sites: Vec<(MethodId, NodeId)> = Vec::new();
        for (m, _) in &removal_order {
            for site in self.host.find_references(*m) {
                let caller = program.method(site.caller);
                let Some(body) = &caller.body else { continue };
                if let Some(try_node) = ast::innermost_protecting_try(body, site.node) {
                    if !try_sites.contains(&(site.caller, try_node)) {
                        try_sites.push((site.caller, try_node));
                    }
                }
            }
        }

        // Steps 3-5: recompute essentiality per catch section, rewrite
        // or delete sections, unwrap emptied try-statements.
        for (caller, try_node) in try_sites {
            let model = self.build_try_model(caller, try_node)?;
            let mut all_emptied = !model.catches.is_empty();
            for (catch_node, declared) in &model.catches {
                let keep: Vec<TypeId> = declared
                    .iter()
                    .copied()
                    .filter(|&c| self.is_essential(c, &model, &removed))
                    .collect();
                if keep.len() == declared.len() {
                    all_emptied = false;
                } else if keep.is_empty() {
                    edits.push(Edit::RemoveCatchClause {
                        method: caller,
                        try_node,
                        catch: *catch_node,
                    });
                } else {
                    all_emptied = false;
                    edits.push(Edit::NarrowCatchClause {
                        method: caller,
                        try_node,
                        catch: *catch_node,
                        keep,
                    });
                }
            }
            if all_emptied && !model.has_finally && !model.has_resources {
                edits.push(Edit::UnwrapTry {
                    method: caller,
                    try_node,
                });
            }
        }

        // Step 6: prune documentation tags.
        for (m, _) in &removal_order {
            edits.extend(self.doc_tag_edits(*m, &removed[m]));
        }

        Ok(edits)
    }

    /// Plans and applies the removal as one atomic transaction.
    pub fn apply(&self, method: MethodId, ty: TypeId) -> Result<Vec<Edit>> {
        let edits = self.plan(method, ty)?;
        self.host.apply_edits(edits.clone())?;
        Ok(edits)
    }

    /// The method itself plus everything overriding it, in first-seen
    /// order with duplicates dropped (the host may report a method more
    /// than once). Falls back to a same-signature subtype scan when the
    /// host cannot enumerate.
    fn affected_methods(&self, method: MethodId) -> Vec<MethodId> {
        let mut seen = HashSet::from([method]);
        let mut affected = vec![method];
        let mut push = |m: MethodId| {
            if seen.insert(m) {
                affected.push(m);
            }
        };
        match self.host.find_overrides(method, usize::MAX) {
            OverrideSearch::Known(found) => found.into_iter().for_each(&mut push),
            OverrideSearch::Unknown => {
                self.program
                    .method_ids()
                    .filter(|&candidate| self.program.overrides_method(candidate, method))
                    .for_each(&mut push);
            }
        }
        affected
    }

    fn build_try_model(&self, method: MethodId, try_node: NodeId) -> Result<TryModel> {
        let body = self
            .program
            .method(method)
            .body
            .as_ref()
            .ok_or(Error::Core(CoreError::StatementNotFound {
                method,
                node: try_node,
            }))?;
        let Some(Stmt::Try {
            resources,
            body: protected,
            catches,
            finally,
            ..
        }) = ast::find_stmt(body, try_node)
        else {
            return Err(Error::Core(CoreError::StatementNotFound {
                method,
                node: try_node,
            }));
        };

        let mut inducers = Vec::new();
        for resource in resources {
            for t in self.program.declared_checked_throws(resource.close_method) {
                inducers.push(Inducer {
                    ty: t,
                    target: Some(resource.close_method),
                });
            }
        }
        self.collect_inducers(protected, &mut inducers);

        Ok(TryModel {
            catches: catches.iter().map(|c| (c.id, c.types.clone())).collect(),
            inducers,
            has_resources: !resources.is_empty(),
            has_finally: finally.is_some(),
        })
    }

    /// Collects inducer sites of a protected region. Types fully caught
    /// by a nested try stay inside it; exceptions raised in nested
    /// catch sections and finally blocks propagate out and count.
    fn collect_inducers(&self, stmts: &[Stmt], out: &mut Vec<Inducer>) {
        let program = self.program;
        for stmt in stmts {
            match stmt {
                Stmt::Block { stmts, .. } => self.collect_inducers(stmts, out),

                Stmt::Call { callee, .. } => {
                    for t in program.declared_checked_throws(*callee) {
                        out.push(Inducer {
                            ty: t,
                            target: Some(*callee),
                        });
                    }
                }

                Stmt::Throw { ty, .. } => {
                    if program.is_checked_exception(*ty) {
                        out.push(Inducer {
                            ty: *ty,
                            target: None,
                        });
                    }
                }

                Stmt::Try {
                    resources,
                    body,
                    catches,
                    finally,
                    ..
                } => {
                    let mut inner = Vec::new();
                    for resource in resources {
                        for t in program.declared_checked_throws(resource.close_method) {
                            inner.push(Inducer {
                                ty: t,
                                target: Some(resource.close_method),
                            });
                        }
                    }
                    self.collect_inducers(body, &mut inner);
                    inner.retain(|ind| {
                        !catches
                            .iter()
                            .flat_map(|c| c.types.iter())
                            .any(|&caught| program.is_assignable(ind.ty, caught))
                    });
                    out.extend(inner);

                    for clause in catches {
                        self.collect_inducers(&clause.body, out);
                    }
                    if let Some(finally) = finally {
                        self.collect_inducers(finally, out);
                    }
                }
            }
        }
    }

    /// A catch type survives when it is a general supertype, an
    /// unchecked type, or still has an inducer that is not one of the
    /// calls being stripped.
    fn is_essential(
        &self,
        caught: TypeId,
        model: &TryModel,
        removed: &HashMap<MethodId, HashSet<TypeId>>,
    ) -> bool {
        let program = self.program;
        if program.is_general_exception_supertype(caught) {
            return true;
        }
        if !program.is_checked_exception(caught) {
            return true;
        }
        model.inducers.iter().any(|ind| {
            let matches = program.is_assignable(ind.ty, caught)
                || program.is_assignable(caught, ind.ty);
            if !matches {
                return false;
            }
            match ind.target {
                Some(target) => !removed
                    .get(&target)
                    .is_some_and(|types| types.contains(&ind.ty)),
                // Explicit throws are never stripped by this fix.
                None => true,
            }
        })
    }

    /// Documentation-tag pruning for one affected method.
    fn doc_tag_edits(&self, method: MethodId, removed: &HashSet<TypeId>) -> Vec<Edit> {
        let decl = self.program.method(method);
        if decl.doc_tag_types().next().is_none() {
            return Vec::new();
        }

        // A method whose whole single-entry throws list is going away
        // cannot have any reachable @throws path left.
        if decl.throws_list_len() == 1 && removed.len() == 1 {
            return vec![Edit::RemoveAllDocTags { method }];
        }

        let remaining: Vec<TypeId> = decl
            .throws_types()
            .filter(|t| !removed.contains(t))
            .collect();
        let mut pruned = HashSet::new();
        let mut edits = Vec::new();
        for tag in decl.doc_tag_types() {
            if pruned.contains(&tag) {
                continue;
            }
            let matches_removed = removed.iter().any(|&r| {
                self.program.is_assignable(r, tag) || self.program.is_assignable(tag, r)
            });
            let still_covered = remaining
                .iter()
                .any(|&kept| self.program.is_assignable(tag, kept));
            if matches_removed && !still_covered {
                pruned.insert(tag);
                edits.push(Edit::RemoveDocTag { method, ty: tag });
            }
        }
        edits
    }
}
