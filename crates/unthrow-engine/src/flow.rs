//! Exception-flow extraction.
//!
//! Computes the set of checked exception types that can escape a method
//! body: explicit throws, the declared checked throws of every call
//! target, and implicit resource-close calls, minus whatever an
//! enclosing catch section handles. Exceptions raised inside catch
//! sections and finally blocks escape the try and are collected too.

use std::collections::HashSet;
use unthrow_core::{MethodId, Program, Stmt, TypeId};

/// Checked exception types escaping `method`'s own body.
///
/// For a constructor, exceptions escaping the owning type's non-static
/// field initializers are unioned in: an initializer's exception must
/// be handled in the constructor even though it is not textually inside
/// it. Returns the empty set for bodyless methods; callers decide what
/// "no body" means for their soundness.
pub fn escaping(program: &Program, method: MethodId) -> HashSet<TypeId> {
    let decl = program.method(method);
    let mut out = HashSet::new();
    let Some(body) = &decl.body else {
        return out;
    };
    collect(program, body, &mut out);
    if decl.modifiers.is_constructor {
        collect(
            program,
            &program.type_decl(decl.owner).field_initializers,
            &mut out,
        );
    }
    out
}

fn collect(program: &Program, stmts: &[Stmt], out: &mut HashSet<TypeId>) {
    for stmt in stmts {
        match stmt {
            Stmt::Block { stmts, .. } => collect(program, stmts, out),

            Stmt::Call { callee, .. } => {
                out.extend(program.declared_checked_throws(*callee));
            }

            Stmt::Throw { ty, .. } => {
                if program.is_checked_exception(*ty) {
                    out.insert(*ty);
                }
            }

            Stmt::Try {
                resources,
                body,
                catches,
                finally,
                ..
            } => {
                let mut protected = HashSet::new();
                for resource in resources {
                    protected.extend(program.declared_checked_throws(resource.close_method));
                }
                collect(program, body, &mut protected);
                protected.retain(|&thrown| {
                    !catches
                        .iter()
                        .flat_map(|c| c.types.iter())
                        .any(|&caught| program.is_assignable(thrown, caught))
                });
                out.extend(protected);

                for clause in catches {
                    collect(program, &clause.body, out);
                }
                if let Some(finally) = finally {
                    collect(program, finally, out);
                }
            }
        }
    }
}
