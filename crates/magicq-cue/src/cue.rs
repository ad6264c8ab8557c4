//! The MagicQ cue
//!
//! A zero-length action cue. When its pre-wait ends it sends one OSC command
//! per enabled action, built from the values captured when it started.

use crate::config::OscSettings;
use crate::error::{CueError, Result, TransportError};
use crate::lifecycle::{is_fire_instant, ClockTime, CueLifecycle, CueState, TimedLifecycle};
use crate::socket::{SocketBinder, UdpBinder};
use crate::transmitter::OscTransmitter;
use magicq_core::{
    Action, CueConfig, CueRecord, Field, FieldValue, Operation, PropertyVersion, CLASS_NAME,
};
use tracing::{debug, info, warn};

/// Name given to new cues
pub const DEFAULT_NAME: &str = "MagicQ Action";

/// Observer for cue changes. Called synchronously on the host thread.
pub trait CueListener {
    /// A defined value was written
    fn field_changed(&mut self, field: Field, value: &FieldValue);

    fn state_changed(&mut self, _state: CueState) {}

    /// Editors showing this cue should redraw
    fn refresh(&mut self) {}
}

pub trait Playable {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn stop(&mut self);
}

pub trait Pulsable {
    fn pulse(&mut self, clock: ClockTime);
}

pub trait Persistable {
    fn to_json(&self) -> Result<String>;

    fn from_json(&mut self, json: &str) -> Result<()>;
}

/// Outcome of one command at a fire instant
#[derive(Debug)]
pub struct SendReport {
    pub action: Action,
    pub operation: Operation,
    pub address: String,
    pub result: std::result::Result<usize, TransportError>,
}

impl SendReport {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// A cue sending MagicQ remote playback commands
pub struct MagicQCue<L: CueLifecycle = TimedLifecycle, B: SocketBinder = UdpBinder> {
    name: String,
    config: CueConfig,
    lifecycle: L,
    transmitter: OscTransmitter<B>,
    listeners: Vec<Box<dyn CueListener>>,
    notifications_paused: bool,
    /// Set once the commands for the current run have gone out
    fired: bool,
    last_fire: Vec<SendReport>,
}

impl MagicQCue {
    /// Create a cue using settings from the environment
    pub fn new() -> Self {
        Self::with_settings(OscSettings::from_env())
    }

    pub fn with_settings(settings: OscSettings) -> Self {
        Self::with_parts(settings, TimedLifecycle::default(), UdpBinder)
    }
}

impl Default for MagicQCue {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: CueLifecycle, B: SocketBinder> MagicQCue<L, B> {
    pub fn with_parts(settings: OscSettings, lifecycle: L, binder: B) -> Self {
        let mut cue = Self {
            name: DEFAULT_NAME.to_string(),
            config: CueConfig::new(),
            lifecycle,
            transmitter: OscTransmitter::with_binder(settings, binder),
            listeners: Vec::new(),
            notifications_paused: false,
            fired: false,
            last_fire: Vec::new(),
        };

        // Nothing is chosen yet, so this puts the cue in the error state
        cue.update_error_state();
        cue
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn config(&self) -> &CueConfig {
        &self.config
    }

    pub fn state(&self) -> CueState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    pub fn transmitter(&self) -> &OscTransmitter<B> {
        &self.transmitter
    }

    pub fn transmitter_mut(&mut self) -> &mut OscTransmitter<B> {
        &mut self.transmitter
    }

    pub fn add_listener(&mut self, listener: Box<dyn CueListener>) {
        self.listeners.push(listener);
    }

    /// Suspend listener callbacks, e.g. while an editor loads the cue
    pub fn pause_notifications(&mut self, paused: bool) {
        self.notifications_paused = paused;
    }

    /// Write a defined value and revalidate.
    ///
    /// Listeners hear about the write only if the stored value changed.
    /// Returns whether it did.
    pub fn set(&mut self, field: Field, value: FieldValue) -> Result<bool> {
        let changed = self.config.set(field, PropertyVersion::Defined, value)?;
        let notify = changed && !self.notifications_paused;

        if notify {
            let stored = self.config.get(field, PropertyVersion::Defined);
            for listener in &mut self.listeners {
                listener.field_changed(field, &stored);
            }
        }

        self.update_error_state();

        if notify {
            for listener in &mut self.listeners {
                listener.refresh();
            }
        }

        Ok(changed)
    }

    /// [`set`](Self::set) addressed by persisted key
    pub fn set_field(&mut self, name: &str, value: FieldValue) -> Result<bool> {
        let field: Field = name.parse()?;
        self.set(field, value)
    }

    /// [`set_field`](Self::set_field) with the value given as operator text
    pub fn set_field_text(&mut self, name: &str, text: &str) -> Result<bool> {
        let field: Field = name.parse()?;
        let value = FieldValue::parse(field, text)?;
        self.set(field, value)
    }

    /// Display text for a field shown in the cue list
    pub fn get_field(&self, name: &str) -> Option<String> {
        let defined = self.config.defined();
        match name {
            "playback" => Some(defined.playback.to_string()),
            "level" => Some(defined.level.to_string()),
            "jump_target" => Some(defined.jump_cue_id),
            "name" => Some(self.name.clone()),
            _ => None,
        }
    }

    /// Error text for the cue list, empty when the cue can play
    pub fn error_message(&self) -> String {
        self.config.error_message()
    }

    /// Report the configuration and sync the Error state with it.
    ///
    /// Returns true if the configuration is invalid. A running cue keeps
    /// running on its live values; the state is corrected once it stops.
    fn update_error_state(&mut self) -> bool {
        let state = self.lifecycle.state();
        match self.config.validate() {
            Err(e) => {
                if !state.is_playing() && state != CueState::Paused && state != CueState::Error {
                    debug!("Cue '{}' invalid: {}", self.name, e);
                    self.change_state(CueState::Error);
                }
                true
            }
            Ok(()) => {
                if state == CueState::Error {
                    self.change_state(CueState::Stopped);
                }
                false
            }
        }
    }

    fn change_state(&mut self, state: CueState) {
        self.lifecycle.set_state(state);
        self.notify_state(state);
    }

    fn notify_state(&mut self, state: CueState) {
        for listener in &mut self.listeners {
            listener.state_changed(state);
        }
    }

    /// Send every enabled action from the live values, in fire order
    pub fn fire_actions(&mut self) -> &[SendReport] {
        let live = self.config.live();
        let mut reports = Vec::new();

        for action in live.enabled_actions() {
            let operation = action.operation();
            let address = operation.address(&live);
            let result = self.transmitter.send(operation, &live);

            if let Err(e) = &result {
                warn!("Cue '{}': {} not sent: {}", self.name, address, e);
            }

            reports.push(SendReport {
                action,
                operation,
                address,
                result,
            });
        }

        let sent = reports.iter().filter(|r| r.is_ok()).count();
        info!("Cue '{}' fired {}/{} commands", self.name, sent, reports.len());

        self.last_fire = reports;
        &self.last_fire
    }

    /// Reports from the most recent fire instant
    pub fn last_fire(&self) -> &[SendReport] {
        &self.last_fire
    }

    /// Persisted form of the defined values
    pub fn to_record(&self) -> CueRecord {
        self.config.to_record()
    }

    /// Load the fields present in `record`, then revalidate
    pub fn apply_record(&mut self, record: &CueRecord) -> Result<()> {
        for (field, value) in record.entries() {
            self.set(field, value)?;
        }
        self.update_error_state();
        Ok(())
    }
}

impl<L: CueLifecycle, B: SocketBinder> Playable for MagicQCue<L, B> {
    fn play(&mut self) -> Result<()> {
        let before = self.lifecycle.state();
        if !self.lifecycle.play_base() {
            return Err(match self.config.validate() {
                Err(e) if before == CueState::Error => e.into(),
                _ => CueError::NotPlayable(before),
            });
        }

        if let Err(e) = self.config.validate() {
            self.change_state(CueState::Error);
            return Err(e.into());
        }

        // Resuming keeps the values captured at the start of the run
        if before != CueState::Paused {
            self.config.snapshot_live();
            self.fired = false;
            self.last_fire.clear();
            info!("Cue '{}' playing", self.name);
        }

        self.notify_state(self.lifecycle.state());
        Ok(())
    }

    fn pause(&mut self) {
        self.lifecycle.pause_base();
        self.notify_state(self.lifecycle.state());
    }

    fn stop(&mut self) {
        self.lifecycle.stop_base();
        self.notify_state(self.lifecycle.state());
        self.update_error_state();
    }
}

impl<L: CueLifecycle, B: SocketBinder> Pulsable for MagicQCue<L, B> {
    fn pulse(&mut self, clock: ClockTime) {
        let before = self.lifecycle.state();
        self.lifecycle.pulse_base(clock);
        let after = self.lifecycle.state();

        if before == after {
            return;
        }
        self.notify_state(after);

        if is_fire_instant(before, after) && !self.fired {
            self.fired = true;
            self.fire_actions();
        }

        if after == CueState::Stopped {
            self.update_error_state();
        }
    }
}

impl<L: CueLifecycle, B: SocketBinder> Persistable for MagicQCue<L, B> {
    fn to_json(&self) -> Result<String> {
        Ok(self.to_record().to_json()?)
    }

    fn from_json(&mut self, json: &str) -> Result<()> {
        let record = CueRecord::from_json(json).map_err(|e| {
            warn!("Cue '{}': could not read {} data: {}", self.name, CLASS_NAME, e);
            e
        })?;
        self.apply_record(&record)
    }
}
