//! Core data types for the unthrow program model.
//!
//! A program is an arena of type and method declarations indexed by
//! stable ids. Statements carry their own node ids so edits and inducer
//! sites can be addressed without holding references into the tree.

use crate::ast::Stmt;
use serde::{Deserialize, Serialize};

/// Stable identity of a type declaration within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u32);

/// Stable identity of a method declaration within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

/// Stable identity of a statement node within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Kind of a type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A class declaration.
    Class,
    /// An interface declaration.
    Interface,
}

/// A type declaration: a class or interface with its direct supertypes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    /// Identity of this declaration.
    pub id: TypeId,

    /// Fully qualified name (e.g., "java.io.IOException").
    pub name: String,

    /// Class or interface.
    pub kind: TypeKind,

    /// Direct supertypes (extends + implements).
    pub supertypes: Vec<TypeId>,

    /// Whether the type is declared final.
    #[serde(default)]
    pub is_final: bool,

    /// Whether the type is anonymous.
    #[serde(default)]
    pub is_anonymous: bool,

    /// Non-static field initializers and instance initializer blocks.
    ///
    /// Exceptions escaping these must be handled by every constructor of
    /// the type even though they are not textually inside it.
    #[serde(default)]
    pub field_initializers: Vec<Stmt>,
}

/// Method modifiers relevant to exception analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_native: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_constructor: bool,
    /// Generated glue code (bridge methods and the like).
    #[serde(default)]
    pub is_synthetic: bool,
}

/// Where a declared exception entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrowsOrigin {
    /// An entry in the method signature's throws list.
    ThrowsList,
    /// A `@throws`-style documentation tag.
    DocTag,
}

/// A declared exception type attached to a method.
///
/// Documentation tags are not required to mirror the throws list
/// one-to-one; entries of the same or related types may coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThrowsEntry {
    /// The declared exception type.
    pub ty: TypeId,

    /// Throws-list entry or documentation tag.
    pub origin: ThrowsOrigin,
}

/// A method declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    /// Identity of this declaration.
    pub id: MethodId,

    /// Owning type.
    pub owner: TypeId,

    /// Simple name (e.g., "close").
    pub name: String,

    /// Name plus parameter types; two methods override each other only
    /// when their signatures are equal.
    pub signature: String,

    /// Modifiers relevant to the analysis.
    #[serde(default)]
    pub modifiers: Modifiers,

    /// Declared exceptions: ordered throws-list entries and doc tags.
    #[serde(default)]
    pub declared: Vec<ThrowsEntry>,

    /// Body statements, absent for abstract/native methods.
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,

    /// Framework-invoked callback signature; may be skipped by option.
    #[serde(default)]
    pub is_entry_point: bool,

    /// Serialization contract method (readObject and friends).
    #[serde(default)]
    pub is_serialization_related: bool,
}

impl MethodDecl {
    /// Iterates the types of the throws-list entries (doc tags excluded).
    pub fn throws_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.declared
            .iter()
            .filter(|e| e.origin == ThrowsOrigin::ThrowsList)
            .map(|e| e.ty)
    }

    /// Iterates the types of the `@throws` documentation tags.
    pub fn doc_tag_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.declared
            .iter()
            .filter(|e| e.origin == ThrowsOrigin::DocTag)
            .map(|e| e.ty)
    }

    /// Number of throws-list entries (doc tags excluded).
    pub fn throws_list_len(&self) -> usize {
        self.throws_types().count()
    }

    /// True when the method has no body by contract rather than by error.
    pub fn is_bodyless_by_contract(&self) -> bool {
        self.modifiers.is_abstract || self.modifiers.is_native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throws_entry_serialization() {
        let entry = ThrowsEntry {
            ty: TypeId(4),
            origin: ThrowsOrigin::ThrowsList,
        };

        let json = serde_json::to_string(&entry).unwrap();
        let deserialized: ThrowsEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, deserialized);
    }

    #[test]
    fn test_method_decl_defaults() {
        let json = r#"{
            "id": 0,
            "owner": 1,
            "name": "run",
            "signature": "run()"
        }"#;

        let method: MethodDecl = serde_json::from_str(json).unwrap();
        assert!(method.declared.is_empty());
        assert!(method.body.is_none());
        assert!(!method.modifiers.is_abstract);
        assert!(!method.is_entry_point);
    }

    #[test]
    fn test_throws_types_excludes_doc_tags() {
        let method = MethodDecl {
            id: MethodId(0),
            owner: TypeId(0),
            name: "m".to_string(),
            signature: "m()".to_string(),
            modifiers: Modifiers::default(),
            declared: vec![
                ThrowsEntry {
                    ty: TypeId(1),
                    origin: ThrowsOrigin::ThrowsList,
                },
                ThrowsEntry {
                    ty: TypeId(2),
                    origin: ThrowsOrigin::DocTag,
                },
            ],
            body: None,
            is_entry_point: false,
            is_serialization_related: false,
        };

        assert_eq!(method.throws_types().collect::<Vec<_>>(), vec![TypeId(1)]);
        assert_eq!(method.doc_tag_types().collect::<Vec<_>>(), vec![TypeId(2)]);
        assert_eq!(method.throws_list_len(), 1);
    }
}
