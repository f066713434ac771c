// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// An unbounded multi-producer channel owned by one consumer.
///
/// Producers (state components, observers, tick listeners) hold cloned
/// [`flume::Sender`]s; the owner drains the receiver once per frame before
/// running its compilation cascade.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + Sync + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> EventBus<T> {
    /// Creates a new bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::trace!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends an event, logging an error if the receiver is gone.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to send event: {e}. Receiver likely disconnected.");
        }
    }

    /// Returns a clone of the sender end of the channel.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiver end. Intended for the owner of the bus.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event queued so far, in send order, without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting to be drained.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flume::TryRecvError;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum TestEvent {
        CoreReplaced { entity: u64, slot: u8 },
        EntityRemoved(u64),
    }

    #[test]
    fn empty_bus_has_nothing_pending() {
        let bus = EventBus::<TestEvent>::new();
        assert_eq!(bus.pending(), 0);
        assert!(bus.drain().is_empty());
        assert_eq!(bus.receiver().try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn drain_preserves_send_order() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        sender
            .send(TestEvent::CoreReplaced { entity: 1, slot: 3 })
            .expect("send should succeed");
        bus.publish(TestEvent::EntityRemoved(1));

        assert_eq!(bus.pending(), 2);
        assert_eq!(
            bus.drain(),
            vec![
                TestEvent::CoreReplaced { entity: 1, slot: 3 },
                TestEvent::EntityRemoved(1)
            ]
        );
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn events_from_another_thread_arrive() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        thread::spawn(move || {
            sender
                .send(TestEvent::EntityRemoved(7))
                .expect("send from thread failed");
        })
        .join()
        .expect("thread join failed");

        assert_eq!(bus.drain(), vec![TestEvent::EntityRemoved(7)]);
    }

    #[test]
    fn send_fails_after_bus_dropped() {
        let bus = EventBus::<TestEvent>::new();
        let sender = bus.sender();
        drop(bus);
        assert!(sender.send(TestEvent::EntityRemoved(0)).is_err());
    }
}
