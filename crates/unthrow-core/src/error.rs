//! Error types for the unthrow program model.

use crate::types::{MethodId, NodeId, TypeId};
use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or editing a program model.
#[derive(Debug, Error)]
pub enum Error {
    /// A type name referenced during building was never declared.
    #[error("Unknown type name: {name}")]
    UnknownTypeName {
        /// The unresolved name.
        name: String,
    },

    /// An edit targeted a throws-list entry that no longer exists.
    #[error("Method {method:?} has no throws-list entry of type {ty:?}")]
    MissingThrowsEntry {
        /// Method the edit targeted.
        method: MethodId,
        /// Exception type the edit expected to find.
        ty: TypeId,
    },

    /// An edit referenced a statement node that is not in the method body.
    #[error("Statement {node:?} not found in method {method:?}")]
    StatementNotFound {
        /// Method whose body was searched.
        method: MethodId,
        /// The missing node.
        node: NodeId,
    },

    /// An edit referenced a catch section that is not on the try-statement.
    #[error("Catch section {catch:?} not found on try-statement {try_node:?}")]
    CatchNotFound {
        /// The try-statement searched.
        try_node: NodeId,
        /// The missing catch section.
        catch: NodeId,
    },

    /// A catch narrowing would leave an empty or widened type set.
    #[error("Invalid narrowing for catch section {catch:?}")]
    InvalidNarrowing {
        /// The catch section being rewritten.
        catch: NodeId,
    },

    /// A try-statement cannot be unwrapped because handlers remain.
    #[error("Try-statement {node:?} still has catch sections, resources or a finally block")]
    TryNotUnwrappable {
        /// The try-statement the unwrap targeted.
        node: NodeId,
    },

    /// A documentation-tag edit found nothing to remove.
    #[error("Method {method:?} has no @throws tag for type {ty:?}")]
    MissingDocTag {
        /// Method the edit targeted.
        method: MethodId,
        /// Exception type of the expected tag.
        ty: TypeId,
    },

    /// An atomic edit transaction was rejected; no edits were committed.
    #[error("Edit transaction rejected: {source}")]
    TransactionRejected {
        /// The edit failure that aborted the transaction.
        #[source]
        source: Box<Error>,
    },

    /// A snapshot referenced a type, method or statement id outside its
    /// own arenas.
    #[error("Invalid snapshot: {detail}")]
    InvalidSnapshot {
        /// What referenced the missing id, and which id.
        detail: String,
    },

    /// JSON (de)serialization of a program snapshot failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}
