//! Fixtures shared by the cue integration tests

#![allow(dead_code)]

use magicq_cue::error::TransportResult;
use magicq_cue::{
    CueListener, CueLifecycle, CueState, DatagramSocket, Field, FieldValue, SocketBinder,
    TransportError,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::rc::Rc;

/// Shared view of everything the mock sockets did
#[derive(Clone, Default)]
pub struct Wire {
    /// (socket id, datagram, destination)
    pub sent: Rc<RefCell<Vec<(usize, Vec<u8>, SocketAddr)>>>,
    pub binds: Rc<Cell<usize>>,
    /// Address of every successful bind
    pub bound: Rc<RefCell<Vec<SocketAddr>>>,
    pub drops: Rc<Cell<usize>>,
    /// Number of upcoming sends that fail
    pub fail_sends: Rc<Cell<usize>>,
    /// Number of upcoming binds that fail
    pub fail_binds: Rc<Cell<usize>>,
}

impl Wire {
    pub fn addresses(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|(_, datagram, _)| magicq_test_utils::address_of(datagram))
            .collect()
    }

    pub fn socket_ids(&self) -> Vec<usize> {
        self.sent.borrow().iter().map(|(id, _, _)| *id).collect()
    }

    pub fn binder(&self) -> MockBinder {
        MockBinder { wire: self.clone() }
    }
}

fn take_one(counter: &Cell<usize>) -> bool {
    let n = counter.get();
    if n > 0 {
        counter.set(n - 1);
        true
    } else {
        false
    }
}

pub struct MockSocket {
    id: usize,
    wire: Wire,
}

impl DatagramSocket for MockSocket {
    fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        if take_one(&self.wire.fail_sends) {
            return Err(io::Error::new(io::ErrorKind::Other, "network is unreachable"));
        }
        self.wire
            .sent
            .borrow_mut()
            .push((self.id, buf.to_vec(), target));
        Ok(buf.len())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Ok(SocketAddr::from(([0, 0, 0, 0], 40_000 + self.id as u16)))
    }
}

impl Drop for MockSocket {
    fn drop(&mut self) {
        self.wire.drops.set(self.wire.drops.get() + 1);
    }
}

pub struct MockBinder {
    wire: Wire,
}

impl SocketBinder for MockBinder {
    fn bind(&mut self, addr: SocketAddr) -> TransportResult<Box<dyn DatagramSocket>> {
        if take_one(&self.wire.fail_binds) {
            return Err(TransportError::Bind {
                addr,
                source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
            });
        }

        let id = self.wire.binds.get() + 1;
        self.wire.binds.set(id);
        self.wire.bound.borrow_mut().push(addr);
        Ok(Box::new(MockSocket {
            id,
            wire: self.wire.clone(),
        }))
    }
}

/// Lifecycle that moves through a fixed list of phases, one per pulse
pub struct ScriptedLifecycle {
    state: CueState,
    script: VecDeque<CueState>,
}

impl ScriptedLifecycle {
    pub fn new(script: &[CueState]) -> Self {
        Self {
            state: CueState::Stopped,
            script: script.iter().copied().collect(),
        }
    }
}

impl CueLifecycle for ScriptedLifecycle {
    fn state(&self) -> CueState {
        self.state
    }

    fn set_state(&mut self, state: CueState) {
        self.state = state;
    }

    fn play_base(&mut self) -> bool {
        if matches!(self.state, CueState::Stopped | CueState::Paused) {
            self.state = CueState::PlayingPre;
            true
        } else {
            false
        }
    }

    fn pulse_base(&mut self, _clock: u64) {
        if let Some(next) = self.script.pop_front() {
            self.state = next;
        }
    }

    fn pause_base(&mut self) {
        self.state = CueState::Paused;
    }

    fn stop_base(&mut self) {
        self.state = CueState::Stopped;
    }
}

/// Everything a listener saw
#[derive(Clone, Default)]
pub struct Events {
    pub fields: Rc<RefCell<Vec<(Field, FieldValue)>>>,
    pub states: Rc<RefCell<Vec<CueState>>>,
    pub refreshes: Rc<Cell<usize>>,
}

impl Events {
    pub fn listener(&self) -> Box<dyn CueListener> {
        Box::new(RecordingListener {
            events: self.clone(),
        })
    }
}

struct RecordingListener {
    events: Events,
}

impl CueListener for RecordingListener {
    fn field_changed(&mut self, field: Field, value: &FieldValue) {
        self.events.fields.borrow_mut().push((field, value.clone()));
    }

    fn state_changed(&mut self, state: CueState) {
        self.events.states.borrow_mut().push(state);
    }

    fn refresh(&mut self) {
        self.events.refreshes.set(self.events.refreshes.get() + 1);
    }
}
