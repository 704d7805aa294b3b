//! Elements and per-combatant resistance tables

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Attack element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Element {
    None,
    Fire,
    Water,
    Earth,
    Air,
    Light,
    Dark,
    #[default]
    Physical,
}

impl Element {
    pub fn all() -> &'static [Element] {
        &[
            Element::None,
            Element::Fire,
            Element::Water,
            Element::Earth,
            Element::Air,
            Element::Light,
            Element::Dark,
            Element::Physical,
        ]
    }
}

/// Element -> damage multiplier. Unlisted elements are neutral (1.0).
///
/// Values above 1.0 are weaknesses, below 1.0 resistances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResistanceTable {
    multipliers: AHashMap<Element, f32>,
}

impl ResistanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ResistanceTable::set`]
    pub fn with(mut self, element: Element, multiplier: f32) -> Self {
        self.set(element, multiplier);
        self
    }

    /// Negative multipliers are clamped to 0.0 (full immunity)
    pub fn set(&mut self, element: Element, multiplier: f32) {
        self.multipliers.insert(element, multiplier.max(0.0));
    }

    pub fn multiplier(&self, element: Element) -> f32 {
        self.multipliers.get(&element).copied().unwrap_or(1.0)
    }

    pub fn is_weak_to(&self, element: Element) -> bool {
        self.multiplier(element) > 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlisted_element_is_neutral() {
        let table = ResistanceTable::new().with(Element::Fire, 2.0);
        assert_eq!(table.multiplier(Element::Water), 1.0);
        assert_eq!(table.multiplier(Element::Fire), 2.0);
    }

    #[test]
    fn test_weakness_detection() {
        let table = ResistanceTable::new()
            .with(Element::Light, 1.5)
            .with(Element::Dark, 0.5);
        assert!(table.is_weak_to(Element::Light));
        assert!(!table.is_weak_to(Element::Dark));
        assert!(!table.is_weak_to(Element::Physical));
    }

    #[test]
    fn test_negative_multiplier_clamped() {
        let table = ResistanceTable::new().with(Element::Earth, -3.0);
        assert_eq!(table.multiplier(Element::Earth), 0.0);
    }
}
