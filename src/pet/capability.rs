// Capability flags derived from the animations a character ships with

use super::action::{SIT, SLEEP, SPECIAL};

/// Which optional animations a loaded character supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CapabilitySet {
    /// Character can Sit and Sleep
    pub has_rest_state: bool,
    /// Character has a Special animation
    pub has_special: bool,
}

impl CapabilitySet {
    /// Full repertoire
    pub const FULL: Self = Self {
        has_rest_state: true,
        has_special: true,
    };

    /// Resolve capabilities by querying whether each animation exists
    pub fn resolve(has_animation: impl Fn(&str) -> bool) -> Self {
        Self {
            has_rest_state: has_animation(SIT) && has_animation(SLEEP),
            has_special: has_animation(SPECIAL),
        }
    }

    /// Resolve capabilities from a list of animation names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::resolve(|wanted| names.iter().any(|name| name.as_ref() == wanted))
    }

    /// Characters that can't rest are classified as vehicles
    pub fn is_vehicle(&self) -> bool {
        !self.has_rest_state
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_character() {
        let caps = CapabilitySet::from_names(&["Relax", "Move", "Sit", "Sleep", "Special", "Interact"]);
        assert_eq!(caps, CapabilitySet::FULL);
        assert!(!caps.is_vehicle());
    }

    #[test]
    fn test_missing_sit_is_vehicle() {
        let caps = CapabilitySet::from_names(&["Relax", "Move", "Sleep", "Special"]);
        assert!(!caps.has_rest_state);
        assert!(caps.is_vehicle());
        assert!(caps.has_special);
    }

    #[test]
    fn test_missing_sleep_is_vehicle() {
        let caps = CapabilitySet::from_names(&["Relax", "Move", "Sit"]);
        assert!(caps.is_vehicle());
        assert!(!caps.has_special);
    }

    #[test]
    fn test_empty_set_never_fails() {
        let caps = CapabilitySet::from_names::<&str>(&[]);
        assert!(!caps.has_rest_state);
        assert!(!caps.has_special);
    }
}
