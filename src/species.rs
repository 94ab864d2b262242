use crate::constants::SPECIES_COUNT;
use glam::Vec4;

/// A fixed categorical tag on a particle. The declaration order is the
/// canonical order used by the rule matrix and its JSON field names.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Species {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Species {
    pub const ALL: [Species; SPECIES_COUNT] =
        [Species::Red, Species::Green, Species::Blue, Species::Yellow];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Species> {
        Self::ALL.get(index).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Red => "red",
            Species::Green => "green",
            Species::Blue => "blue",
            Species::Yellow => "yellow",
        }
    }

    pub fn from_name(name: &str) -> Option<Species> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Display color (RGBA). Matches the CSS named color of the same name,
    /// so green is #008000 rather than pure green.
    #[inline]
    pub fn color(self) -> Vec4 {
        match self {
            Species::Red => Vec4::new(1.0, 0.0, 0.0, 1.0),
            Species::Green => Vec4::new(0.0, 128.0 / 255.0, 0.0, 1.0),
            Species::Blue => Vec4::new(0.0, 0.0, 1.0, 1.0),
            Species::Yellow => Vec4::new(1.0, 1.0, 0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_declaration_order() {
        for (i, species) in Species::ALL.iter().enumerate() {
            assert_eq!(species.index(), i);
            assert_eq!(Species::from_index(i), Some(*species));
        }
        assert_eq!(Species::from_index(SPECIES_COUNT), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for species in Species::ALL {
            assert_eq!(Species::from_name(species.name()), Some(species));
        }
        assert_eq!(Species::from_name("purple"), None);
        assert_eq!(Species::from_name("Red"), None);
    }

    #[test]
    fn test_colors_are_opaque_and_distinct() {
        for a in Species::ALL {
            assert_eq!(a.color().w, 1.0);
            for b in Species::ALL {
                if a != b {
                    assert_ne!(a.color(), b.color());
                }
            }
        }
    }
}
