//! Exception-relevant statement skeleton.
//!
//! Bodies are reduced to the statements that matter for checked
//! exception flow: calls, explicit throws, try-statements (with
//! resources, multi-type catches and finally blocks) and plain blocks
//! for nesting. Control constructs that do not affect which exceptions
//! escape are represented by their contained statements alone.

use crate::types::{MethodId, NodeId, TypeId};
use serde::{Deserialize, Serialize};

/// A statement in a method body or field initializer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// A nesting block.
    Block {
        id: NodeId,
        #[serde(default)]
        stmts: Vec<Stmt>,
    },

    /// A call expression with a statically resolved target.
    Call { id: NodeId, callee: MethodId },

    /// An explicit throw of a nominal exception type.
    Throw { id: NodeId, ty: TypeId },

    /// A try-statement.
    Try {
        id: NodeId,
        /// Resources whose implicit close calls run on block exit.
        #[serde(default)]
        resources: Vec<Resource>,
        /// The protected region.
        #[serde(default)]
        body: Vec<Stmt>,
        /// Catch sections in source order.
        #[serde(default)]
        catches: Vec<CatchClause>,
        /// Finally block, if present.
        #[serde(default)]
        finally: Option<Vec<Stmt>>,
    },
}

/// A try-with-resources resource; its close call is an implicit inducer
/// site inside the protected region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: NodeId,
    /// The close method invoked implicitly on block exit.
    pub close_method: MethodId,
}

/// A catch section; multi-type catches declare several types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub id: NodeId,
    /// Declared exception types, in source order.
    pub types: Vec<TypeId>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Stmt {
    /// Node identity of this statement.
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Block { id, .. }
            | Stmt::Call { id, .. }
            | Stmt::Throw { id, .. }
            | Stmt::Try { id, .. } => *id,
        }
    }
}

/// Finds a statement by node id, searching all nested regions.
pub fn find_stmt<'a>(stmts: &'a [Stmt], node: NodeId) -> Option<&'a Stmt> {
    for stmt in stmts {
        if stmt.id() == node {
            return Some(stmt);
        }
        let found = match stmt {
            Stmt::Block { stmts, .. } => find_stmt(stmts, node),
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => find_stmt(body, node)
                .or_else(|| catches.iter().find_map(|c| find_stmt(&c.body, node)))
                .or_else(|| finally.as_deref().and_then(|f| find_stmt(f, node))),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Mutable lookup by node id, searching all nested regions.
pub fn find_stmt_mut<'a>(stmts: &'a mut [Stmt], node: NodeId) -> Option<&'a mut Stmt> {
    for stmt in stmts {
        if stmt.id() == node {
            return Some(stmt);
        }
        let found = match stmt {
            Stmt::Block { stmts, .. } => find_stmt_mut(stmts, node),
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                if let Some(s) = find_stmt_mut(body, node) {
                    return Some(s);
                }
                if let Some(s) = catches
                    .iter_mut()
                    .find_map(|c| find_stmt_mut(&mut c.body, node))
                {
                    return Some(s);
                }
                finally.as_deref_mut().and_then(|f| find_stmt_mut(f, node))
            }
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Finds the innermost try-statement whose *protected region* contains
/// the target node.
///
/// Statements inside catch sections or finally blocks are not protected
/// by that try; an exception raised there propagates past it.
pub fn innermost_protecting_try(stmts: &[Stmt], target: NodeId) -> Option<NodeId> {
    fn walk(stmts: &[Stmt], target: NodeId, enclosing: Option<NodeId>) -> Option<Option<NodeId>> {
        for stmt in stmts {
            if stmt.id() == target {
                return Some(enclosing);
            }
            match stmt {
                Stmt::Block { stmts, .. } => {
                    if let Some(found) = walk(stmts, target, enclosing) {
                        return Some(found);
                    }
                }
                Stmt::Try {
                    id,
                    body,
                    catches,
                    finally,
                    ..
                } => {
                    if let Some(found) = walk(body, target, Some(*id)) {
                        return Some(found);
                    }
                    for c in catches {
                        if let Some(found) = walk(&c.body, target, enclosing) {
                            return Some(found);
                        }
                    }
                    if let Some(f) = finally {
                        if let Some(found) = walk(f, target, enclosing) {
                            return Some(found);
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }
    walk(stmts, target, None).flatten()
}

/// Collects every call node (id, callee) in the given statements,
/// including calls inside catch sections and finally blocks.
pub fn collect_calls(stmts: &[Stmt], out: &mut Vec<(NodeId, MethodId)>) {
    for stmt in stmts {
        match stmt {
            Stmt::Call { id, callee } => out.push((*id, *callee)),
            Stmt::Block { stmts, .. } => collect_calls(stmts, out),
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                collect_calls(body, out);
                for c in catches {
                    collect_calls(&c.body, out);
                }
                if let Some(f) = finally {
                    collect_calls(f, out);
                }
            }
            Stmt::Throw { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Stmt> {
        // try { call#3; } catch (T) { call#5; } finally { call#6; }
        vec![Stmt::Try {
            id: NodeId(1),
            resources: vec![],
            body: vec![Stmt::Call {
                id: NodeId(3),
                callee: MethodId(0),
            }],
            catches: vec![CatchClause {
                id: NodeId(4),
                types: vec![TypeId(9)],
                body: vec![Stmt::Call {
                    id: NodeId(5),
                    callee: MethodId(1),
                }],
            }],
            finally: Some(vec![Stmt::Call {
                id: NodeId(6),
                callee: MethodId(2),
            }]),
        }]
    }

    #[test]
    fn test_find_stmt_in_nested_regions() {
        let stmts = sample();
        assert!(find_stmt(&stmts, NodeId(3)).is_some());
        assert!(find_stmt(&stmts, NodeId(5)).is_some());
        assert!(find_stmt(&stmts, NodeId(6)).is_some());
        assert!(find_stmt(&stmts, NodeId(42)).is_none());
    }

    #[test]
    fn test_protecting_try_covers_body_only() {
        let stmts = sample();
        // Call in the protected region is covered.
        assert_eq!(innermost_protecting_try(&stmts, NodeId(3)), Some(NodeId(1)));
        // Calls in catch and finally are not.
        assert_eq!(innermost_protecting_try(&stmts, NodeId(5)), None);
        assert_eq!(innermost_protecting_try(&stmts, NodeId(6)), None);
    }

    #[test]
    fn test_innermost_wins_for_nested_tries() {
        let stmts = vec![Stmt::Try {
            id: NodeId(1),
            resources: vec![],
            body: vec![Stmt::Try {
                id: NodeId(2),
                resources: vec![],
                body: vec![Stmt::Call {
                    id: NodeId(3),
                    callee: MethodId(0),
                }],
                catches: vec![],
                finally: None,
            }],
            catches: vec![],
            finally: None,
        }];

        assert_eq!(innermost_protecting_try(&stmts, NodeId(3)), Some(NodeId(2)));
    }

    #[test]
    fn test_collect_calls_covers_all_regions() {
        let stmts = sample();
        let mut calls = Vec::new();
        collect_calls(&stmts, &mut calls);
        assert_eq!(calls.len(), 3);
    }
}
