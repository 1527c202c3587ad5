//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use pdf_incremental::{
    DataParser, DataSource, Dictionary, Error, Object, ObjectRef, ReferenceContext, ReferenceTable,
    Result, XRefEntry,
};

/// Install a test logger once per binary.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Parser over a fixed set of objects keyed by byte offset.
pub struct MemoryParser {
    source: DataSource,
    objects: HashMap<u64, Object>,
}

impl MemoryParser {
    pub fn new(objects: HashMap<u64, Object>) -> Self {
        Self {
            source: DataSource::new(&b"%PDF-1.4\n% memory document\n"[..])
                .expect("source is not empty"),
            objects,
        }
    }
}

impl DataParser for MemoryParser {
    fn source(&self) -> &DataSource {
        &self.source
    }

    fn parse_object(&self, entry: &XRefEntry, reference: ObjectRef) -> Result<Object> {
        self.objects
            .get(&entry.offset)
            .cloned()
            .ok_or(Error::UnresolvedReference(reference))
    }
}

/// Offset at which object `num` is stored in a memory document.
pub fn offset_of(num: u32) -> u64 {
    u64::from(num) * 100
}

/// Reference table plus parser for objects numbered by their position.
///
/// The free-list head is present and empty.
pub fn memory_context(objects: Vec<(u32, Object)>) -> ReferenceContext {
    let mut table = ReferenceTable::new();
    table.add_entry(0, XRefEntry::free(0, 65535));
    let mut stored = HashMap::new();
    for (num, value) in objects {
        table.add_entry(num, XRefEntry::uncompressed(offset_of(num), 0));
        stored.insert(offset_of(num), value);
    }
    ReferenceContext::new(MemoryParser::new(stored), table)
}

/// Dictionary with a `/Type` entry.
pub fn typed_dict(type_name: &str) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::name(type_name));
    dict
}

/// Small parsed document:
///
/// ```text
/// 1: Catalog -> 2
/// 2: Pages   Kids [3]
/// 3: Page    Parent 2, Resources 4
/// 4: resources with font 5
/// 5: Font
/// ```
pub fn sample_document() -> ReferenceContext {
    let mut catalog = typed_dict("Catalog");
    catalog.set("Pages", ObjectRef::new(2, 0));

    let mut pages = typed_dict("Pages");
    pages.set("Kids", Object::Array(vec![Object::Reference(ObjectRef::new(3, 0))]));
    pages.set("Count", 1);

    let mut page = typed_dict("Page");
    page.set("Parent", ObjectRef::new(2, 0));
    page.set("Resources", ObjectRef::new(4, 0));

    let mut fonts = Dictionary::new();
    fonts.set("F1", ObjectRef::new(5, 0));
    let mut resources = Dictionary::new();
    resources.set("Font", fonts);

    let mut font = typed_dict("Font");
    font.set("BaseFont", Object::name("Helvetica"));

    memory_context(vec![
        (1, Object::Dictionary(catalog)),
        (2, Object::Dictionary(pages)),
        (3, Object::Dictionary(page)),
        (4, Object::Dictionary(resources)),
        (5, Object::Dictionary(font)),
    ])
}
