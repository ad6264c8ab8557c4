//! Cue command model
//!
//! The nine operator-editable fields of a MagicQ cue, their validators, the
//! validity rule and the flat persisted record.

use crate::osc::Operation;
use crate::property::{PropertyVersion, Versioned};
use crate::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Highest playback (fader) number on the console
pub const MAX_PLAYBACK: i16 = 10;

/// Highest fader level
pub const MAX_LEVEL: i16 = 100;

/// Class key the host wraps persisted cue data in
pub const CLASS_NAME: &str = "StackMagicQCue";

/// Clamp a playback number into [0, 10]. Live writes are not clamped.
pub fn validate_playback(version: PropertyVersion, value: i16) -> i16 {
    match version {
        PropertyVersion::Defined => value.clamp(0, MAX_PLAYBACK),
        PropertyVersion::Live => value,
    }
}

/// Clamp a level into [0, 100]. Live writes are not clamped.
pub fn validate_level(version: PropertyVersion, value: i16) -> i16 {
    match version {
        PropertyVersion::Defined => value.clamp(0, MAX_LEVEL),
        PropertyVersion::Live => value,
    }
}

/// A cue field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Playback,
    Level,
    JumpCueId,
    ActionActivate,
    ActionLevel,
    ActionGo,
    ActionStop,
    ActionJump,
    ActionRelease,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Playback,
        Field::ActionActivate,
        Field::ActionLevel,
        Field::Level,
        Field::ActionGo,
        Field::ActionStop,
        Field::ActionJump,
        Field::JumpCueId,
        Field::ActionRelease,
    ];

    /// Key used in the persisted record
    pub fn key(&self) -> &'static str {
        match self {
            Field::Playback => "playback",
            Field::Level => "level",
            Field::JumpCueId => "jump_cue_id",
            Field::ActionActivate => "action_activate",
            Field::ActionLevel => "action_level",
            Field::ActionGo => "action_go",
            Field::ActionStop => "action_stop",
            Field::ActionJump => "action_jump",
            Field::ActionRelease => "action_release",
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Field::Playback | Field::Level => "an integer",
            Field::JumpCueId => "a string",
            _ => "a boolean",
        }
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A value carried to or from a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i16),
    Bool(bool),
    Text(String),
}

impl FieldValue {
    /// Parse operator input for a field
    pub fn parse(field: Field, text: &str) -> Result<Self> {
        let invalid = || Error::InvalidValue {
            field: field.key(),
            value: text.to_string(),
        };

        match field {
            Field::Playback | Field::Level => text
                .trim()
                .parse::<i64>()
                .map(|v| FieldValue::Int(saturate_i16(v)))
                .map_err(|_| invalid()),
            Field::JumpCueId => Ok(FieldValue::Text(text.to_string())),
            _ => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(FieldValue::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(FieldValue::Bool(false)),
                _ => Err(invalid()),
            },
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Text(v) => f.write_str(v),
        }
    }
}

fn saturate_i16(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// An action switch on the cue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Activate,
    Level,
    Go,
    Jump,
    Stop,
    Release,
}

impl Action {
    /// Order in which enabled actions are sent at the fire instant
    pub const FIRE_ORDER: [Action; 6] = [
        Action::Activate,
        Action::Level,
        Action::Go,
        Action::Jump,
        Action::Stop,
        Action::Release,
    ];

    /// The console operation sent for this action.
    ///
    /// Stop sends the activate address (`/rpc/{n}A`), not `/rpc/{n}S`.
    pub fn operation(&self) -> Operation {
        match self {
            Action::Activate => Operation::Activate,
            Action::Level => Operation::SetLevel,
            Action::Go => Operation::Go,
            Action::Jump => Operation::JumpToCueId,
            Action::Stop => Operation::Activate,
            Action::Release => Operation::Release,
        }
    }

    pub fn field(&self) -> Field {
        match self {
            Action::Activate => Field::ActionActivate,
            Action::Level => Field::ActionLevel,
            Action::Go => Field::ActionGo,
            Action::Jump => Field::ActionJump,
            Action::Stop => Field::ActionStop,
            Action::Release => Field::ActionRelease,
        }
    }
}

/// Plain values of every field, taken from one slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueSettings {
    pub playback: i16,
    pub level: i16,
    pub jump_cue_id: String,
    pub action_activate: bool,
    pub action_level: bool,
    pub action_go: bool,
    pub action_stop: bool,
    pub action_jump: bool,
    pub action_release: bool,
}

impl CueSettings {
    pub fn is_enabled(&self, action: Action) -> bool {
        match action {
            Action::Activate => self.action_activate,
            Action::Level => self.action_level,
            Action::Go => self.action_go,
            Action::Jump => self.action_jump,
            Action::Stop => self.action_stop,
            Action::Release => self.action_release,
        }
    }

    /// Enabled actions in fire order
    pub fn enabled_actions(&self) -> impl Iterator<Item = Action> + '_ {
        Action::FIRE_ORDER
            .into_iter()
            .filter(move |a| self.is_enabled(*a))
    }

    /// Check the validity rule, reporting the first failure
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.playback == 0 {
            return Err(ConfigError::NoPlayback);
        }

        if self.enabled_actions().next().is_none() {
            return Err(ConfigError::NoActions);
        }

        if self.action_jump && self.jump_cue_id.is_empty() {
            return Err(ConfigError::NoJumpCue);
        }

        Ok(())
    }
}

/// Versioned cue configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueConfig {
    playback: Versioned<i16>,
    level: Versioned<i16>,
    jump_cue_id: Versioned<String>,
    action_activate: Versioned<bool>,
    action_level: Versioned<bool>,
    action_go: Versioned<bool>,
    action_stop: Versioned<bool>,
    action_jump: Versioned<bool>,
    action_release: Versioned<bool>,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CueConfig {
    pub fn new() -> Self {
        Self {
            playback: Versioned::new(0).with_validator(validate_playback),
            level: Versioned::new(0).with_validator(validate_level),
            jump_cue_id: Versioned::new(String::new()),
            action_activate: Versioned::new(false),
            action_level: Versioned::new(false),
            action_go: Versioned::new(false),
            action_stop: Versioned::new(false),
            action_jump: Versioned::new(false),
            action_release: Versioned::new(false),
        }
    }

    fn flag(&self, field: Field) -> Option<&Versioned<bool>> {
        match field {
            Field::ActionActivate => Some(&self.action_activate),
            Field::ActionLevel => Some(&self.action_level),
            Field::ActionGo => Some(&self.action_go),
            Field::ActionStop => Some(&self.action_stop),
            Field::ActionJump => Some(&self.action_jump),
            Field::ActionRelease => Some(&self.action_release),
            _ => None,
        }
    }

    fn flag_mut(&mut self, field: Field) -> Option<&mut Versioned<bool>> {
        match field {
            Field::ActionActivate => Some(&mut self.action_activate),
            Field::ActionLevel => Some(&mut self.action_level),
            Field::ActionGo => Some(&mut self.action_go),
            Field::ActionStop => Some(&mut self.action_stop),
            Field::ActionJump => Some(&mut self.action_jump),
            Field::ActionRelease => Some(&mut self.action_release),
            _ => None,
        }
    }

    /// Read one slot of a field
    pub fn get(&self, field: Field, version: PropertyVersion) -> FieldValue {
        match field {
            Field::Playback => FieldValue::Int(*self.playback.get(version)),
            Field::Level => FieldValue::Int(*self.level.get(version)),
            Field::JumpCueId => FieldValue::Text(self.jump_cue_id.get(version).clone()),
            _ => FieldValue::Bool(
                self.flag(field)
                    .map(|f| *f.get(version))
                    .unwrap_or_default(),
            ),
        }
    }

    /// Write one slot of a field.
    ///
    /// Returns whether the stored value changed. Defined writes to playback
    /// and level are clamped.
    pub fn set(&mut self, field: Field, version: PropertyVersion, value: FieldValue) -> Result<bool> {
        let mismatch = || Error::FieldType {
            field: field.key(),
            expected: field.type_name(),
        };

        match (field, value) {
            (Field::Playback, FieldValue::Int(v)) => Ok(self.playback.set(version, v)),
            (Field::Level, FieldValue::Int(v)) => Ok(self.level.set(version, v)),
            (Field::JumpCueId, FieldValue::Text(v)) => Ok(self.jump_cue_id.set(version, v)),
            (field, FieldValue::Bool(v)) => match self.flag_mut(field) {
                Some(flag) => Ok(flag.set(version, v)),
                None => Err(mismatch()),
            },
            _ => Err(mismatch()),
        }
    }

    /// Plain values of one slot
    pub fn settings(&self, version: PropertyVersion) -> CueSettings {
        CueSettings {
            playback: *self.playback.get(version),
            level: *self.level.get(version),
            jump_cue_id: self.jump_cue_id.get(version).clone(),
            action_activate: *self.action_activate.get(version),
            action_level: *self.action_level.get(version),
            action_go: *self.action_go.get(version),
            action_stop: *self.action_stop.get(version),
            action_jump: *self.action_jump.get(version),
            action_release: *self.action_release.get(version),
        }
    }

    pub fn defined(&self) -> CueSettings {
        self.settings(PropertyVersion::Defined)
    }

    pub fn live(&self) -> CueSettings {
        self.settings(PropertyVersion::Live)
    }

    /// Validate the defined values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        self.defined().validate()
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Error text for the host, empty when valid
    pub fn error_message(&self) -> String {
        match self.validate() {
            Ok(()) => String::new(),
            Err(e) => e.to_string(),
        }
    }

    /// Copy every defined value to its live slot
    pub fn snapshot_live(&mut self) {
        self.playback.snapshot();
        self.level.snapshot();
        self.jump_cue_id.snapshot();
        self.action_activate.snapshot();
        self.action_level.snapshot();
        self.action_go.snapshot();
        self.action_stop.snapshot();
        self.action_jump.snapshot();
        self.action_release.snapshot();
    }

    /// Defined values as a persisted record
    pub fn to_record(&self) -> CueRecord {
        let s = self.defined();
        CueRecord {
            playback: Some(s.playback as i64),
            level: Some(s.level as i64),
            jump_cue_id: Some(s.jump_cue_id),
            action_activate: Some(s.action_activate),
            action_level: Some(s.action_level),
            action_go: Some(s.action_go),
            action_stop: Some(s.action_stop),
            action_jump: Some(s.action_jump),
            action_release: Some(s.action_release),
        }
    }

    /// Write every field present in the record to its defined slot.
    ///
    /// Returns the fields whose value changed.
    pub fn apply_record(&mut self, record: &CueRecord) -> Vec<Field> {
        let mut changed = Vec::new();
        for (field, value) in record.entries() {
            // Record entries always carry the field's own type
            if let Ok(true) = self.set(field, PropertyVersion::Defined, value) {
                changed.push(field);
            }
        }
        changed
    }
}

/// Flat persisted form of a cue. Absent keys leave the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CueRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_activate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_level: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_go: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_stop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_jump: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jump_cue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_release: Option<bool>,
}

impl CueRecord {
    /// Present entries as typed field values
    pub fn entries(&self) -> Vec<(Field, FieldValue)> {
        let mut entries = Vec::new();
        if let Some(v) = self.playback {
            entries.push((Field::Playback, FieldValue::Int(saturate_i16(v))));
        }
        if let Some(v) = self.action_activate {
            entries.push((Field::ActionActivate, FieldValue::Bool(v)));
        }
        if let Some(v) = self.action_level {
            entries.push((Field::ActionLevel, FieldValue::Bool(v)));
        }
        if let Some(v) = self.level {
            entries.push((Field::Level, FieldValue::Int(saturate_i16(v))));
        }
        if let Some(v) = self.action_go {
            entries.push((Field::ActionGo, FieldValue::Bool(v)));
        }
        if let Some(v) = self.action_stop {
            entries.push((Field::ActionStop, FieldValue::Bool(v)));
        }
        if let Some(v) = self.action_jump {
            entries.push((Field::ActionJump, FieldValue::Bool(v)));
        }
        if let Some(v) = &self.jump_cue_id {
            entries.push((Field::JumpCueId, FieldValue::Text(v.clone())));
        }
        if let Some(v) = self.action_release {
            entries.push((Field::ActionRelease, FieldValue::Bool(v)));
        }
        entries
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a flat record, or one wrapped in the host's class key
    pub fn from_json(json: &str) -> Result<Self> {
        let mut root: serde_json::Value = serde_json::from_str(json)?;
        let data = match root.get_mut(CLASS_NAME) {
            Some(inner) => inner.take(),
            None => root,
        };
        Ok(serde_json::from_value(data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_keys_roundtrip() {
        for field in Field::ALL {
            assert_eq!(field.key().parse::<Field>().unwrap(), field);
        }
        assert!(matches!(
            "jump_target".parse::<Field>(),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn test_parse_field_values() {
        assert_eq!(
            FieldValue::parse(Field::Playback, " 7 ").unwrap(),
            FieldValue::Int(7)
        );
        assert_eq!(
            FieldValue::parse(Field::Level, "99999").unwrap(),
            FieldValue::Int(i16::MAX)
        );
        assert_eq!(
            FieldValue::parse(Field::ActionGo, "on").unwrap(),
            FieldValue::Bool(true)
        );
        assert!(FieldValue::parse(Field::ActionGo, "maybe").is_err());
        assert!(FieldValue::parse(Field::Level, "full").is_err());
    }

    #[test]
    fn test_wrong_type_rejected() {
        let mut config = CueConfig::new();
        let result = config.set(
            Field::Playback,
            PropertyVersion::Defined,
            FieldValue::Bool(true),
        );
        assert!(matches!(result, Err(Error::FieldType { field: "playback", .. })));

        let result = config.set(
            Field::ActionGo,
            PropertyVersion::Defined,
            FieldValue::Int(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_stop_sends_activate() {
        assert_eq!(Action::Stop.operation(), Operation::Activate);
        assert_eq!(Action::Release.operation(), Operation::Release);
    }
}
