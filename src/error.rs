//! Error types for the object model and the object factory.
//!
//! Every fallible operation in the crate returns [`Result`]. Shape errors are
//! raised before anything is built, ownership errors are always caller bugs,
//! and reference misses are reported with the reference that failed.

use crate::factory::FactoryId;
use crate::object::ObjectRef;

/// Result type alias for object model operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building, mutating or enumerating objects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value was constructed with the wrong shape
    /// (non-name dictionary key, rectangle without four numbers, ...)
    #[error("Malformed value: {0}")]
    MalformedValue(String),

    /// An object was mutated or removed through a factory that does not own it
    #[error("Object {object} is owned by factory {owner}, not by factory {factory}")]
    ForeignObject {
        /// Native reference of the object inside its owning factory
        object: ObjectRef,
        /// Factory that owns the object
        owner: FactoryId,
        /// Factory the operation was attempted on
        factory: FactoryId,
    },

    /// A shift was requested for an unreachable factory, a reference was
    /// resolved without a context, or the owning factory is closed
    #[error("Invalid object context: {0}")]
    InvalidContext(String),

    /// Reference table lookup miss
    #[error("Object not found: {0}")]
    UnresolvedReference(ObjectRef),

    /// Inconsistent enumeration or a violated clone/shift invariant
    #[error("Corrupted object graph: {0}")]
    CorruptedGraph(String),

    /// Read past the end of a data source
    #[error("End of data reached unexpectedly")]
    UnexpectedEof,

    /// Invalid argument passed to a constructor
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Nesting depth limit exceeded while walking a value
    #[error("Recursion depth limit exceeded (max: {0})")]
    RecursionLimitExceeded(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_value_error() {
        let err = Error::MalformedValue("dictionary key must be a name".to_string());
        let msg = format!("{}", err);
        assert!(msg.contains("Malformed value"));
        assert!(msg.contains("dictionary key"));
    }

    #[test]
    fn test_unresolved_reference_error() {
        let err = Error::UnresolvedReference(ObjectRef::new(10, 0));
        let msg = format!("{}", err);
        assert!(msg.contains("10 0 R"));
    }

    #[test]
    fn test_foreign_object_error() {
        let err = Error::ForeignObject {
            object: ObjectRef::new(3, 0),
            owner: FactoryId::from_raw(1),
            factory: FactoryId::from_raw(2),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("3 0 R"));
        assert!(msg.contains("#1"));
        assert!(msg.contains("#2"));
    }

    #[test]
    fn test_recursion_limit_error() {
        let err = Error::RecursionLimitExceeded(256);
        assert!(format!("{}", err).contains("256"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
