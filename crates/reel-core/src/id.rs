//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a recording slot.
///
/// Each slot maps to exactly one recording file. Slots are small integers
/// chosen by the user (typically bound to a hotkey).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(pub u32);

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SlotId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Counts how many times module code has been (re)loaded.
///
/// Generation 0 is the first successful load; each hot reload that
/// succeeds advances it by one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleGeneration(pub u64);

impl ModuleGeneration {
    /// The generation that follows this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ModuleGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_display_is_bare_number() {
        assert_eq!(SlotId(3).to_string(), "3");
        assert_eq!(SlotId::from(7), SlotId(7));
    }

    #[test]
    fn generation_advances() {
        let g = ModuleGeneration::default();
        assert_eq!(g.next(), ModuleGeneration(1));
        assert_eq!(g.next().next().to_string(), "2");
    }
}
