// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dedicated scrolling thread.
//!
//! The thread owns the event loop; the [`ScrollingTree`] it drives lives
//! behind a mutex shared with the main thread, which commits into it
//! directly. Wheel events and animation ticks arrive as messages over a
//! `crossbeam-channel`; after each one the thread repositions the affected
//! layers.

use core::cell::Cell;
use core::time::Duration;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use strata_core::trace::Tracer;

use crate::tree::ScrollingTree;
use crate::wheel::{EventTargeting, WheelEvent, WheelEventHandlingResult};

thread_local! {
    static IS_SCROLLING_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Returns `true` on a thread started by [`ScrollingThread::spawn`].
#[must_use]
pub fn is_scrolling_thread() -> bool {
    IS_SCROLLING_THREAD.with(Cell::get)
}

enum Message {
    WheelEvent {
        event: WheelEvent,
        targeting: EventTargeting,
        reply: Option<Sender<WheelEventHandlingResult>>,
    },
    AnimationFrame {
        elapsed: Duration,
        reply: Sender<bool>,
    },
    ApplyLayerPositions,
    Shutdown,
}

/// Handle to the scrolling thread.
///
/// Dropping the handle stops the thread and joins it.
pub struct ScrollingThread {
    tree: Arc<Mutex<ScrollingTree>>,
    sender: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for ScrollingThread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScrollingThread")
            .field("running", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl ScrollingThread {
    /// Starts a thread driving `tree`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned.
    pub fn spawn(tree: ScrollingTree) -> io::Result<Self> {
        let tree = Arc::new(Mutex::new(tree));
        let (sender, receiver) = crossbeam_channel::unbounded();
        let shared = Arc::clone(&tree);
        let handle = std::thread::Builder::new()
            .name("strata-scrolling".into())
            .spawn(move || run(&shared, &receiver))?;
        Ok(Self {
            tree,
            sender,
            handle: Some(handle),
        })
    }

    /// The tree the thread drives.
    ///
    /// The main thread locks it to commit state or take scroll updates.
    #[must_use]
    pub fn tree(&self) -> &Arc<Mutex<ScrollingTree>> {
        &self.tree
    }

    /// Handles `event` on the scrolling thread and waits for the result.
    ///
    /// Reports the event as unhandled if the thread is gone.
    pub fn handle_wheel_event(
        &self,
        event: WheelEvent,
        targeting: EventTargeting,
    ) -> WheelEventHandlingResult {
        let (reply, result) = crossbeam_channel::bounded(1);
        let message = Message::WheelEvent {
            event,
            targeting,
            reply: Some(reply),
        };
        if self.sender.send(message).is_err() {
            log::warn!("scrolling thread is gone; dropping wheel event");
            return WheelEventHandlingResult::unhandled();
        }
        result.recv().unwrap_or_default()
    }

    /// Queues `event` without waiting for the result.
    pub fn dispatch_wheel_event(&self, event: WheelEvent, targeting: EventTargeting) {
        let message = Message::WheelEvent {
            event,
            targeting,
            reply: None,
        };
        if self.sender.send(message).is_err() {
            log::warn!("scrolling thread is gone; dropping wheel event");
        }
    }

    /// Advances snap animations by `elapsed` and waits.
    ///
    /// Returns `true` while any node is still animating.
    pub fn animate(&self, elapsed: Duration) -> bool {
        let (reply, result) = crossbeam_channel::bounded(1);
        if self
            .sender
            .send(Message::AnimationFrame { elapsed, reply })
            .is_err()
        {
            return false;
        }
        result.recv().unwrap_or(false)
    }

    /// Asks the thread to reposition layers after a main-thread commit.
    pub fn apply_layer_positions(&self) {
        if self.sender.send(Message::ApplyLayerPositions).is_err() {
            log::warn!("scrolling thread is gone; layer positions not applied");
        }
    }
}

impl Drop for ScrollingThread {
    fn drop(&mut self) {
        let _ = self.sender.send(Message::Shutdown);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            log::error!("scrolling thread panicked");
        }
    }
}

fn run(tree: &Mutex<ScrollingTree>, receiver: &Receiver<Message>) {
    IS_SCROLLING_THREAD.with(|flag| flag.set(true));
    log::debug!("scrolling thread started");
    while let Ok(message) = receiver.recv() {
        match message {
            Message::WheelEvent {
                event,
                targeting,
                reply,
            } => {
                let result = {
                    let mut tree = tree.lock();
                    let result = tree.handle_wheel_event(&event, targeting);
                    tree.apply_layer_positions(&mut Tracer::none());
                    result
                };
                if let Some(reply) = reply {
                    let _ = reply.send(result);
                }
            }
            Message::AnimationFrame { elapsed, reply } => {
                let animating = {
                    let mut tree = tree.lock();
                    let animating = tree.animate_snap(elapsed);
                    tree.apply_layer_positions(&mut Tracer::none());
                    animating
                };
                let _ = reply.send(animating);
            }
            Message::ApplyLayerPositions => {
                tree.lock().apply_layer_positions(&mut Tracer::none());
            }
            Message::Shutdown => break,
        }
    }
    log::debug!("scrolling thread stopped");
}
