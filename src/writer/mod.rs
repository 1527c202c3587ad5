//! Object serialization for incremental updates.
//!
//! ## Architecture
//!
//! ```text
//! ObjectFactory::list_modified_objects
//!     ↓
//! [ObjectSerializer] (scoped to the root factory)
//!     ↓
//! `N G obj ... endobj` payloads keyed by flat object number
//! ```
//!
//! Outside a factory scope references print their native numbers. Inside a
//! scope every reference is moved into the root factory's flat numbering
//! space by the owning factory's enumeration shift.

mod object_serializer;

pub use object_serializer::ObjectSerializer;
