use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use tokio::{select, sync::mpsc::Receiver};
use tokio_util::sync::CancellationToken;

use super::{Command, Shared};
use crate::{Observer, ObserverId};

struct ObserverEntry<V> {
    id: ObserverId,
    observer: Box<dyn Observer<V>>,
    token: CancellationToken,
    active: bool,
    last_version: u64,
}

/// The delivery context of one container.
///
/// Owns the observers and the latest value. Every notification happens
/// inside [`run`](Self::run), one command at a time.
pub(crate) struct Dispatcher<V> {
    receiver: Receiver<Command<V>>,
    shared: Arc<Shared<V>>,
    observers: Vec<ObserverEntry<V>>,
    latest: Option<V>,
    version: u64,
}

impl<V: Clone + Send + 'static> Dispatcher<V> {
    pub fn new(receiver: Receiver<Command<V>>, shared: Arc<Shared<V>>) -> Self {
        Self {
            receiver,
            shared,
            observers: Vec::new(),
            latest: None,
            version: 0,
        }
    }

    pub async fn run(&mut self) {
        // Signals completion to every `close()` caller, even if shutdown panics.
        let _done = self.shared.done.clone().drop_guard();
        let cancel_token = self.shared.cancel_token.clone();
        loop {
            select! {
                _ = cancel_token.cancelled() => break,
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.receiver.close();
        while let Ok(cmd) = self.receiver.try_recv() {
            self.handle_command(cmd);
        }
        for entry in self.observers.drain(..) {
            entry.token.cancel();
        }
        self.shared.set_observer_count(0);
        tracing::debug!(live_data = %self.shared.config.name, "dispatcher stopped");
    }

    fn handle_command(&mut self, cmd: Command<V>) {
        self.prune();
        match cmd {
            Command::Publish(value) => self.publish(value),
            Command::Observe {
                id,
                observer,
                token,
            } => self.attach(id, observer, token),
            Command::SetActive(id, active) => self.set_active(id, active),
            Command::Flush(resp) => {
                let _ = resp.send(());
            }
        }
        self.prune();
    }

    fn publish(&mut self, value: V) {
        self.version += 1;
        self.shared.set_latest(value.clone(), self.version);
        self.latest = Some(value.clone());
        tracing::trace!(
            live_data = %self.shared.config.name,
            version = self.version,
            observers = self.observers.len(),
            "dispatching value"
        );
        let name = &self.shared.config.name;
        for entry in self.observers.iter_mut().filter(|e| e.active) {
            notify(entry, &value, self.version, name);
        }
    }

    fn attach(&mut self, id: ObserverId, observer: Box<dyn Observer<V>>, token: CancellationToken) {
        if token.is_cancelled() {
            return;
        }
        tracing::debug!(
            live_data = %self.shared.config.name,
            observer_id = id,
            "observer attached"
        );
        self.observers.push(ObserverEntry {
            id,
            observer,
            token,
            active: true,
            last_version: 0,
        });
        if let (Some(value), Some(entry)) = (self.latest.clone(), self.observers.last_mut()) {
            notify(entry, &value, self.version, &self.shared.config.name);
        }
    }

    fn set_active(&mut self, id: ObserverId, active: bool) {
        let Some(entry) = self.observers.iter_mut().find(|e| e.id == id) else {
            return;
        };
        if entry.active == active {
            return;
        }
        entry.active = active;
        tracing::debug!(
            live_data = %self.shared.config.name,
            observer_id = id,
            active,
            "observer state changed"
        );
        if let Some(value) = self.latest.as_ref().filter(|_| active) {
            notify(entry, value, self.version, &self.shared.config.name);
        }
    }

    fn prune(&mut self) {
        let before = self.observers.len();
        self.observers.retain(|e| !e.token.is_cancelled());
        if self.observers.len() != before {
            tracing::debug!(
                live_data = %self.shared.config.name,
                removed = before - self.observers.len(),
                "observers detached"
            );
        }
        self.shared.set_observer_count(self.observers.len());
    }
}

/// Hands `value` to one observer unless it has already seen `version`.
///
/// A panicking observer is cancelled; the next prune removes it.
fn notify<V: 'static>(entry: &mut ObserverEntry<V>, value: &V, version: u64, name: &str) {
    if entry.token.is_cancelled() || entry.last_version >= version {
        return;
    }
    entry.last_version = version;
    let observer = &mut entry.observer;
    let result = catch_unwind(AssertUnwindSafe(|| observer.on_changed(value)));
    if result.is_err() {
        tracing::error!(live_data = %name, observer_id = entry.id, "Observer panicked, removing");
        entry.token.cancel();
    }
}
