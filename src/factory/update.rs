//! Update records produced when a factory tree is enumerated for saving.

/// One entry of an incremental update, keyed by its flat object number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRecord {
    /// Object number in the root factory's flat numbering space
    pub object_number: u32,
    /// Generation to write (already bumped for removed objects)
    pub generation: u16,
    /// Whether the entry describes a freed object
    pub removed: bool,
    /// Serialized `N G obj ... endobj` block, absent for removed objects
    pub payload: Option<Vec<u8>>,
}

impl UpdateRecord {
    /// Record for a live object.
    pub fn live(object_number: u32, generation: u16, payload: Vec<u8>) -> Self {
        Self {
            object_number,
            generation,
            removed: false,
            payload: Some(payload),
        }
    }

    /// Record for a removed object.
    pub fn removed(object_number: u32, generation: u16) -> Self {
        Self {
            object_number,
            generation,
            removed: true,
            payload: None,
        }
    }

    /// Payload as text (for debugging and tests).
    pub fn payload_str(&self) -> Option<String> {
        self.payload
            .as_deref()
            .map(|p| String::from_utf8_lossy(p).into_owned())
    }
}
