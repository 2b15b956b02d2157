use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use log::debug;
use mender_netup::{NetEvent, NetEventListener, NetEventSource, SubscribeError};

const MAX_LISTENERS: usize = 4;

type Listeners = heapless::Vec<&'static dyn NetEventListener, MAX_LISTENERS>;

pub(crate) struct EventDispatcher {
    listeners: Mutex<CriticalSectionRawMutex, RefCell<Listeners>>,
}

impl EventDispatcher {
    pub(crate) const fn new() -> Self {
        Self {
            listeners: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    /// Listeners run outside the critical section.
    pub(crate) fn dispatch(&self, event: &NetEvent<'_>) {
        let listeners = self.listeners.lock(|listeners| listeners.borrow().clone());
        debug!(
            "net: event={} iface={} listeners={}",
            event.kind().as_str(),
            event.iface(),
            listeners.len()
        );
        for listener in listeners.iter() {
            listener.on_event(event);
        }
    }
}

impl NetEventSource<'static> for EventDispatcher {
    fn subscribe(&self, listener: &'static dyn NetEventListener) -> Result<(), SubscribeError> {
        self.listeners.lock(|listeners| {
            listeners
                .borrow_mut()
                .push(listener)
                .map_err(|_| SubscribeError::Full)
        })
    }
}
