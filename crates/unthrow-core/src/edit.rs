//! Declarative edit vocabulary and its application.
//!
//! A fix is a batch of edits applied as one transaction: every edit is
//! applied to a staging clone of the program and the result replaces
//! the original only when the whole batch succeeds. A stale target (the
//! program changed since the plan was made) rejects the transaction
//! without committing anything.

use crate::ast::{self, Stmt};
use crate::error::{Error, Result};
use crate::program::Program;
use crate::types::{MethodId, NodeId, ThrowsOrigin, TypeId};
use serde::{Deserialize, Serialize};

/// One structural change to the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edit {
    /// Deletes every throws-list entry of exactly `ty` from a method.
    RemoveThrowsEntry { method: MethodId, ty: TypeId },

    /// Deletes a whole catch section from a try-statement.
    RemoveCatchClause {
        method: MethodId,
        try_node: NodeId,
        catch: NodeId,
    },

    /// Rewrites a multi-type catch to a narrower disjunction.
    NarrowCatchClause {
        method: MethodId,
        try_node: NodeId,
        catch: NodeId,
        /// Types that survive, in their original order.
        keep: Vec<TypeId>,
    },

    /// Replaces a try-statement that has no handlers, resources or
    /// finally block with its own body inlined in place.
    UnwrapTry { method: MethodId, try_node: NodeId },

    /// Deletes every `@throws` documentation tag of exactly `ty`.
    RemoveDocTag { method: MethodId, ty: TypeId },

    /// Deletes all `@throws` documentation tags on a method.
    RemoveAllDocTags { method: MethodId },
}

/// Applies a batch of edits atomically, returning the edited program.
///
/// The input program is never modified; on the first failing edit the
/// whole transaction is rejected.
pub fn apply_all(program: &Program, edits: &[Edit]) -> Result<Program> {
    let mut staged = program.clone();
    for edit in edits {
        apply_edit(&mut staged, edit).map_err(|e| Error::TransactionRejected {
            source: Box::new(e),
        })?;
    }
    Ok(staged)
}

/// Applies a single edit in place.
pub fn apply_edit(program: &mut Program, edit: &Edit) -> Result<()> {
    match edit {
        Edit::RemoveThrowsEntry { method, ty } => {
            let decl = program.method_mut(*method);
            let before = decl.declared.len();
            decl.declared
                .retain(|e| !(e.origin == ThrowsOrigin::ThrowsList && e.ty == *ty));
            if decl.declared.len() == before {
                return Err(Error::MissingThrowsEntry {
                    method: *method,
                    ty: *ty,
                });
            }
            Ok(())
        }

        Edit::RemoveCatchClause {
            method,
            try_node,
            catch,
        } => {
            let catches = try_catches_mut(program, *method, *try_node)?;
            let before = catches.len();
            catches.retain(|c| c.id != *catch);
            if catches.len() == before {
                return Err(Error::CatchNotFound {
                    try_node: *try_node,
                    catch: *catch,
                });
            }
            Ok(())
        }

        Edit::NarrowCatchClause {
            method,
            try_node,
            catch,
            keep,
        } => {
            let catches = try_catches_mut(program, *method, *try_node)?;
            let clause = catches
                .iter_mut()
                .find(|c| c.id == *catch)
                .ok_or(Error::CatchNotFound {
                    try_node: *try_node,
                    catch: *catch,
                })?;
            let narrowed: Vec<TypeId> = clause
                .types
                .iter()
                .copied()
                .filter(|t| keep.contains(t))
                .collect();
            if narrowed.is_empty()
                || narrowed.len() != keep.len()
                || narrowed.len() >= clause.types.len()
            {
                return Err(Error::InvalidNarrowing { catch: *catch });
            }
            clause.types = narrowed;
            Ok(())
        }

        Edit::UnwrapTry { method, try_node } => {
            let body = method_body_mut(program, *method, *try_node)?;
            match unwrap_try_in(body, *try_node) {
                Some(result) => result,
                None => Err(Error::StatementNotFound {
                    method: *method,
                    node: *try_node,
                }),
            }
        }

        Edit::RemoveDocTag { method, ty } => {
            let decl = program.method_mut(*method);
            let before = decl.declared.len();
            decl.declared
                .retain(|e| !(e.origin == ThrowsOrigin::DocTag && e.ty == *ty));
            if decl.declared.len() == before {
                return Err(Error::MissingDocTag {
                    method: *method,
                    ty: *ty,
                });
            }
            Ok(())
        }

        Edit::RemoveAllDocTags { method } => {
            let decl = program.method_mut(*method);
            decl.declared.retain(|e| e.origin != ThrowsOrigin::DocTag);
            Ok(())
        }
    }
}

fn method_body_mut(
    program: &mut Program,
    method: MethodId,
    node: NodeId,
) -> Result<&mut Vec<Stmt>> {
    program
        .method_mut(method)
        .body
        .as_mut()
        .ok_or(Error::StatementNotFound { method, node })
}

fn try_catches_mut(
    program: &mut Program,
    method: MethodId,
    try_node: NodeId,
) -> Result<&mut Vec<crate::ast::CatchClause>> {
    let body = method_body_mut(program, method, try_node)?;
    match ast::find_stmt_mut(body, try_node) {
        Some(Stmt::Try { catches, .. }) => Ok(catches),
        _ => Err(Error::StatementNotFound {
            method,
            node: try_node,
        }),
    }
}

/// Finds the try-statement in one of the nested statement lists and
/// splices its body in place. Returns None when the node is absent.
fn unwrap_try_in(stmts: &mut Vec<Stmt>, node: NodeId) -> Option<Result<()>> {
    if let Some(pos) = stmts
        .iter()
        .position(|s| matches!(s, Stmt::Try { id, .. } if *id == node))
    {
        let Stmt::Try {
            resources,
            body,
            catches,
            finally,
            ..
        } = stmts.remove(pos)
        else {
            unreachable!("position matched a try-statement");
        };
        if !resources.is_empty() || !catches.is_empty() || finally.is_some() {
            return Some(Err(Error::TryNotUnwrappable { node }));
        }
        stmts.splice(pos..pos, body);
        return Some(Ok(()));
    }
    for stmt in stmts.iter_mut() {
        let found = match stmt {
            Stmt::Block { stmts, .. } => unwrap_try_in(stmts, node),
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => unwrap_try_in(body, node)
                .or_else(|| {
                    catches
                        .iter_mut()
                        .find_map(|c| unwrap_try_in(&mut c.body, node))
                })
                .or_else(|| finally.as_mut().and_then(|f| unwrap_try_in(f, node))),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}
