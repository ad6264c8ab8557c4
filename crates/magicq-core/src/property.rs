//! Two-slot versioned values
//!
//! Every cue field keeps the value the operator edits (*defined*) next to the
//! value captured when the cue starts (*live*). Network output only ever reads
//! the live slot, so edits made while a cue runs cannot change what it sends.

/// Which slot of a [`Versioned`] value is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyVersion {
    Defined,
    Live,
}

/// Validator applied on write. Receives the slot being written.
pub type Validator<T> = fn(PropertyVersion, T) -> T;

/// A value with a defined and a live slot
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    defined: T,
    live: T,
    validator: Option<Validator<T>>,
}

impl<T: Clone> Versioned<T> {
    /// Create with both slots set to `value`
    pub fn new(value: T) -> Self {
        Self {
            defined: value.clone(),
            live: value,
            validator: None,
        }
    }

    /// Attach a validator run on every write
    pub fn with_validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn get(&self, version: PropertyVersion) -> &T {
        match version {
            PropertyVersion::Defined => &self.defined,
            PropertyVersion::Live => &self.live,
        }
    }

    pub fn defined(&self) -> &T {
        &self.defined
    }

    pub fn live(&self) -> &T {
        &self.live
    }

    /// Write a slot through the validator.
    ///
    /// Returns true if the stored value changed.
    pub fn set(&mut self, version: PropertyVersion, value: T) -> bool
    where
        T: PartialEq,
    {
        let value = match self.validator {
            Some(validate) => validate(version, value),
            None => value,
        };

        let slot = match version {
            PropertyVersion::Defined => &mut self.defined,
            PropertyVersion::Live => &mut self.live,
        };

        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    /// Copy defined to live
    pub fn snapshot(&mut self) {
        self.live = self.defined.clone();
    }
}

// Equality ignores the validator.
impl<T: PartialEq> PartialEq for Versioned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.defined == other.defined && self.live == other.live
    }
}

impl<T: Eq> Eq for Versioned<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn clamp_defined(version: PropertyVersion, value: i16) -> i16 {
        match version {
            PropertyVersion::Defined => value.clamp(0, 10),
            PropertyVersion::Live => value,
        }
    }

    #[test]
    fn test_validator_only_clamps_defined() {
        let mut value = Versioned::new(0i16).with_validator(clamp_defined);

        assert!(value.set(PropertyVersion::Defined, 42));
        assert_eq!(*value.defined(), 10);

        assert!(value.set(PropertyVersion::Live, 42));
        assert_eq!(*value.live(), 42);
    }

    #[test]
    fn test_snapshot_copies_defined() {
        let mut value = Versioned::new(String::new());
        value.set(PropertyVersion::Defined, "1.5".to_string());
        assert_eq!(value.live(), "");

        value.snapshot();
        assert_eq!(value.live(), "1.5");
        assert_eq!(value.get(PropertyVersion::Live), "1.5");
    }

    #[test]
    fn test_set_reports_change() {
        let mut value = Versioned::new(false);
        assert!(!value.set(PropertyVersion::Defined, false));
        assert!(value.set(PropertyVersion::Defined, true));
    }
}
