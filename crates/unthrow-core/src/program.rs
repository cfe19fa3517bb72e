//! Whole-program arena and nominal type hierarchy.
//!
//! Types and methods are stored in flat arenas indexed by their ids;
//! relationships (supertypes, call targets) are plain ids rather than
//! references, so the structure has no cycles and clones cheaply enough
//! to serve as the edit-transaction staging copy.

use crate::ast::{CatchClause, Resource, Stmt};
use crate::error::{Error, Result};
use crate::types::{
    MethodDecl, MethodId, Modifiers, NodeId, ThrowsEntry, ThrowsOrigin, TypeDecl, TypeId, TypeKind,
};
use serde::{Deserialize, Serialize};

/// Ids of the seeded well-known types every program carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnown {
    pub throwable: TypeId,
    pub exception: TypeId,
    pub error: TypeId,
    pub runtime_exception: TypeId,
    pub io_exception: TypeId,
    /// The remote-service marker interface (java.rmi.Remote).
    pub remote: TypeId,
    /// java.rmi.RemoteException; kept on remote types even if unused.
    pub remote_exception: TypeId,
}

/// An immutable snapshot of one program under analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    types: Vec<TypeDecl>,
    methods: Vec<MethodDecl>,
    well_known: WellKnown,
}

impl Program {
    /// The seeded well-known type ids.
    pub fn well_known(&self) -> WellKnown {
        self.well_known
    }

    /// Looks up a type declaration.
    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.0 as usize]
    }

    /// Looks up a method declaration.
    pub fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.0 as usize]
    }

    pub(crate) fn method_mut(&mut self, id: MethodId) -> &mut MethodDecl {
        &mut self.methods[id.0 as usize]
    }

    /// All method ids in declaration order.
    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> + '_ {
        (0..self.methods.len() as u32).map(MethodId)
    }

    /// All type ids in declaration order.
    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + '_ {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// Nominal-subtyping predicate: true when `sub` is `sup` or a
    /// transitive subtype of it.
    pub fn is_assignable(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        let mut stack = vec![sub];
        let mut seen = vec![false; self.types.len()];
        while let Some(ty) = stack.pop() {
            let idx = ty.0 as usize;
            if seen[idx] {
                continue;
            }
            seen[idx] = true;
            for &parent in &self.types[idx].supertypes {
                if parent == sup {
                    return true;
                }
                stack.push(parent);
            }
        }
        false
    }

    /// True for checked exception types: throwables that are neither
    /// runtime exceptions nor errors.
    pub fn is_checked_exception(&self, ty: TypeId) -> bool {
        let wk = self.well_known;
        self.is_assignable(ty, wk.throwable)
            && !self.is_assignable(ty, wk.runtime_exception)
            && !self.is_assignable(ty, wk.error)
    }

    /// True for the general supertypes that catch everything, checked
    /// and unchecked alike.
    pub fn is_general_exception_supertype(&self, ty: TypeId) -> bool {
        ty == self.well_known.throwable || ty == self.well_known.exception
    }

    /// True when the owning type transitively implements the
    /// remote-service marker interface.
    pub fn implements_remote(&self, ty: TypeId) -> bool {
        self.is_assignable(ty, self.well_known.remote)
    }

    /// Checked throws-list types declared on a method.
    pub fn declared_checked_throws(&self, method: MethodId) -> impl Iterator<Item = TypeId> + '_ {
        self.method(method)
            .throws_types()
            .filter(|&t| self.is_checked_exception(t))
    }

    /// True when dynamic dispatch can select another implementation for
    /// this method.
    pub fn can_be_overridden(&self, id: MethodId) -> bool {
        let m = self.method(id);
        let owner = self.type_decl(m.owner);
        !m.modifiers.is_private
            && !m.modifiers.is_static
            && !m.modifiers.is_final
            && !m.modifiers.is_constructor
            && !owner.is_final
            && !owner.is_anonymous
    }

    /// True when `candidate` overrides `base`: same signature, declared
    /// on a strict subtype, and `base` is overridable at all.
    pub fn overrides_method(&self, candidate: MethodId, base: MethodId) -> bool {
        if candidate == base || !self.can_be_overridden(base) {
            return false;
        }
        let c = self.method(candidate);
        let b = self.method(base);
        c.signature == b.signature
            && !c.modifiers.is_static
            && c.owner != b.owner
            && self.is_assignable(c.owner, b.owner)
    }

    /// Human-readable "Owner.name" form for messages.
    pub fn method_display(&self, id: MethodId) -> String {
        let m = self.method(id);
        format!("{}.{}", self.type_decl(m.owner).name, m.name)
    }

    /// Fully qualified name of a type.
    pub fn type_name(&self, id: TypeId) -> &str {
        &self.type_decl(id).name
    }

    /// Deserializes a program snapshot from JSON, rejecting snapshots
    /// with dangling type, method or callee references.
    pub fn from_json(json: &str) -> Result<Self> {
        let program: Self = serde_json::from_str(json)?;
        program.validate()?;
        Ok(program)
    }

    /// Checks that every id the snapshot carries resolves within its
    /// arenas, so later lookups can index directly.
    pub fn validate(&self) -> Result<()> {
        let wk = self.well_known;
        for ty in [
            wk.throwable,
            wk.exception,
            wk.error,
            wk.runtime_exception,
            wk.io_exception,
            wk.remote,
            wk.remote_exception,
        ] {
            self.check_type(ty, "well-known table")?;
        }
        for decl in &self.types {
            for &sup in &decl.supertypes {
                self.check_type(sup, &decl.name)?;
            }
            self.check_stmts(&decl.field_initializers, &decl.name)?;
        }
        for m in &self.methods {
            self.check_type(m.owner, &m.name)?;
            for entry in &m.declared {
                self.check_type(entry.ty, &m.name)?;
            }
            if let Some(body) = &m.body {
                self.check_stmts(body, &m.name)?;
            }
        }
        Ok(())
    }

    fn check_type(&self, ty: TypeId, context: &str) -> Result<()> {
        if (ty.0 as usize) < self.types.len() {
            Ok(())
        } else {
            Err(Error::InvalidSnapshot {
                detail: format!("{} references missing type {}", context, ty.0),
            })
        }
    }

    fn check_method(&self, method: MethodId, context: &str) -> Result<()> {
        if (method.0 as usize) < self.methods.len() {
            Ok(())
        } else {
            Err(Error::InvalidSnapshot {
                detail: format!("{} references missing method {}", context, method.0),
            })
        }
    }

    fn check_stmts(&self, stmts: &[Stmt], context: &str) -> Result<()> {
        for stmt in stmts {
            match stmt {
                Stmt::Block { stmts, .. } => self.check_stmts(stmts, context)?,
                Stmt::Call { callee, .. } => self.check_method(*callee, context)?,
                Stmt::Throw { ty, .. } => self.check_type(*ty, context)?,
                Stmt::Try {
                    resources,
                    body,
                    catches,
                    finally,
                    ..
                } => {
                    for resource in resources {
                        self.check_method(resource.close_method, context)?;
                    }
                    self.check_stmts(body, context)?;
                    for clause in catches {
                        for &ty in &clause.types {
                            self.check_type(ty, context)?;
                        }
                        self.check_stmts(&clause.body, context)?;
                    }
                    if let Some(finally) = finally {
                        self.check_stmts(finally, context)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Serializes the program snapshot to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything needed to declare one method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    pub owner: TypeId,
    pub name: String,
    /// Defaults to `name()` when not set.
    pub signature: Option<String>,
    pub modifiers: Modifiers,
    /// Throws-list entry types, in declaration order.
    pub throws: Vec<TypeId>,
    /// `@throws` documentation tag types.
    pub doc_throws: Vec<TypeId>,
    pub body: Option<Vec<Stmt>>,
    pub is_entry_point: bool,
    pub is_serialization_related: bool,
}

impl MethodSpec {
    pub fn new(owner: TypeId, name: &str) -> Self {
        Self {
            owner,
            name: name.to_string(),
            signature: None,
            modifiers: Modifiers::default(),
            throws: Vec::new(),
            doc_throws: Vec::new(),
            body: None,
            is_entry_point: false,
            is_serialization_related: false,
        }
    }
}

/// Builds a [`Program`], seeding the well-known exception hierarchy and
/// allocating statement node ids.
pub struct ProgramBuilder {
    types: Vec<TypeDecl>,
    methods: Vec<MethodDecl>,
    well_known: WellKnown,
    next_node: u32,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            types: Vec::new(),
            methods: Vec::new(),
            // Placeholder; overwritten right below once the roots exist.
            well_known: WellKnown {
                throwable: TypeId(0),
                exception: TypeId(0),
                error: TypeId(0),
                runtime_exception: TypeId(0),
                io_exception: TypeId(0),
                remote: TypeId(0),
                remote_exception: TypeId(0),
            },
            next_node: 0,
        };

        let throwable = builder.class("java.lang.Throwable", &[]);
        let exception = builder.class("java.lang.Exception", &[throwable]);
        let error = builder.class("java.lang.Error", &[throwable]);
        let runtime_exception = builder.class("java.lang.RuntimeException", &[exception]);
        let io_exception = builder.class("java.io.IOException", &[exception]);
        let remote = builder.interface("java.rmi.Remote", &[]);
        let remote_exception = builder.class("java.rmi.RemoteException", &[io_exception]);

        builder.well_known = WellKnown {
            throwable,
            exception,
            error,
            runtime_exception,
            io_exception,
            remote,
            remote_exception,
        };
        builder
    }

    /// The seeded well-known type ids.
    pub fn well_known(&self) -> WellKnown {
        self.well_known
    }

    /// Declares a class with the given direct supertypes.
    pub fn class(&mut self, name: &str, supertypes: &[TypeId]) -> TypeId {
        self.declare_type(name, TypeKind::Class, supertypes)
    }

    /// Declares an interface with the given direct supertypes.
    pub fn interface(&mut self, name: &str, supertypes: &[TypeId]) -> TypeId {
        self.declare_type(name, TypeKind::Interface, supertypes)
    }

    fn declare_type(&mut self, name: &str, kind: TypeKind, supertypes: &[TypeId]) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(TypeDecl {
            id,
            name: name.to_string(),
            kind,
            supertypes: supertypes.to_vec(),
            is_final: false,
            is_anonymous: false,
            field_initializers: Vec::new(),
        });
        id
    }

    pub fn mark_final(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].is_final = true;
    }

    pub fn mark_anonymous(&mut self, ty: TypeId) {
        self.types[ty.0 as usize].is_anonymous = true;
    }

    /// Adds a non-static field initializer statement to a type.
    pub fn field_initializer(&mut self, ty: TypeId, stmt: Stmt) {
        self.types[ty.0 as usize].field_initializers.push(stmt);
    }

    /// Declares a method.
    pub fn method(&mut self, spec: MethodSpec) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let signature = spec.signature.unwrap_or_else(|| format!("{}()", spec.name));
        let mut declared: Vec<ThrowsEntry> = spec
            .throws
            .iter()
            .map(|&ty| ThrowsEntry {
                ty,
                origin: ThrowsOrigin::ThrowsList,
            })
            .collect();
        declared.extend(spec.doc_throws.iter().map(|&ty| ThrowsEntry {
            ty,
            origin: ThrowsOrigin::DocTag,
        }));
        self.methods.push(MethodDecl {
            id,
            owner: spec.owner,
            name: spec.name,
            signature,
            modifiers: spec.modifiers,
            declared,
            body: spec.body,
            is_entry_point: spec.is_entry_point,
            is_serialization_related: spec.is_serialization_related,
        });
        id
    }

    /// Sets a method body after declaration (for forward references).
    pub fn set_body(&mut self, method: MethodId, body: Vec<Stmt>) {
        self.methods[method.0 as usize].body = Some(body);
    }

    fn next_node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    /// A nesting block statement.
    pub fn block(&mut self, stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block {
            id: self.next_node(),
            stmts,
        }
    }

    /// A call with a statically resolved target.
    pub fn call(&mut self, callee: MethodId) -> Stmt {
        Stmt::Call {
            id: self.next_node(),
            callee,
        }
    }

    /// An explicit throw statement.
    pub fn throw_stmt(&mut self, ty: TypeId) -> Stmt {
        Stmt::Throw {
            id: self.next_node(),
            ty,
        }
    }

    /// A try-statement.
    pub fn try_stmt(
        &mut self,
        resources: Vec<Resource>,
        body: Vec<Stmt>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Stmt>>,
    ) -> Stmt {
        Stmt::Try {
            id: self.next_node(),
            resources,
            body,
            catches,
            finally,
        }
    }

    /// A catch section declaring one or more types.
    pub fn catch_clause(&mut self, types: Vec<TypeId>, body: Vec<Stmt>) -> CatchClause {
        CatchClause {
            id: self.next_node(),
            types,
            body,
        }
    }

    /// A try-with-resources resource.
    pub fn resource(&mut self, close_method: MethodId) -> Resource {
        Resource {
            id: self.next_node(),
            close_method,
        }
    }

    /// Resolves a declared type by its fully qualified name.
    pub fn type_by_name(&self, name: &str) -> Result<TypeId> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.id)
            .ok_or_else(|| Error::UnknownTypeName {
                name: name.to_string(),
            })
    }

    pub fn finish(self) -> Program {
        Program {
            types: self.types,
            methods: self.methods,
            well_known: self.well_known,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        Self::new()
    }
}
