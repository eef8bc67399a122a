use super::idmap::{IdIndex, IdMap};

/// Id uniquely identifying a prefix. The empty prefix is always id 0.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct PrefixId(u16);

impl PrefixId {
    /// The empty (default) prefix.
    pub const EMPTY: PrefixId = PrefixId(0);
}

impl IdIndex<PrefixId> for PrefixId {
    fn to_id(index: usize) -> PrefixId {
        PrefixId(index as u16)
    }

    fn from_id(id: PrefixId) -> usize {
        id.0 as usize
    }
}

pub(crate) type PrefixLookup = IdMap<PrefixId, String>;
