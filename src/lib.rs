//! # PDF Incremental
//!
//! Object model and object factory for incrementally updated PDF files.
//!
//! ## Core Features
//!
//! - **Typed objects**: null, booleans, numbers, strings, names, arrays,
//!   insertion-ordered dictionaries, streams, references and indirect objects
//! - **Object factories**: object number allocation and tracking of created,
//!   modified and removed objects
//! - **Cross-factory numbering**: factories attached to a document are saved
//!   in one contiguous object numbering space
//! - **Cycle-safe cloning**: object subgraphs are copied between documents
//!   with shared objects copied once
//! - **Trailer chains**: parsed trailers link each revision to the previous
//!   one and locate the free-object list
//!
//! ## Quick Start
//!
//! ```
//! use pdf_incremental::{Dictionary, Object, ObjectFactory};
//!
//! # fn main() -> pdf_incremental::Result<()> {
//! let doc = ObjectFactory::new(1);
//! let fonts = ObjectFactory::new(1);
//! doc.attach(&fonts)?;
//!
//! let font = fonts.new_object(Dictionary::new())?;
//! let mut resources = Dictionary::new();
//! resources.set("F1", font);
//! doc.new_object(resources)?;
//!
//! // Object 1 of `doc` keeps its number; object 1 of `fonts` moves to 2.
//! let records = doc.list_modified_objects(None)?;
//! assert_eq!(records.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
//! assert_eq!(
//!     records[&1].payload_str().as_deref(),
//!     Some("1 0 obj \n<</F1 2 0 R >>\nendobj\n")
//! );
//! doc.clean_enumeration_shift_cache();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod dictionary;
pub mod object;

// Configuration
pub mod config;

// Factories and cloning
pub mod clone;
pub mod factory;

// Parsed documents
pub mod context;
pub mod data_source;
pub mod trailer;
pub mod xref;

// Serialization
pub mod writer;

pub use clone::{make_clone, CloneEngine, CloneMode, ProcessedMap, SourceKey};
pub use config::{CloneOptions, SerializerOptions};
pub use context::{DataParser, ReferenceContext};
pub use data_source::DataSource;
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use factory::{FactoryId, IndirectObject, ObjectFactory, UpdateRecord};
pub use object::{Object, ObjectRef, Rect, Stream};
pub use trailer::Trailer;
pub use writer::ObjectSerializer;
pub use xref::{ReferenceTable, XRefEntry, XRefEntryType};
