//! Background thread executing service requests.
//!
//! Requests are queued over a channel and run one at a time; completed
//! results are polled without blocking from the UI loop. The worker does
//! not interpret results; the session decides whether one is still current.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{ServiceError, ServiceReply, ServiceRequest, Services};
use crate::session::Ticket;

/// Message sent to the worker thread.
enum ThreadMessage {
    Run(Ticket, ServiceRequest),
    Shutdown,
}

/// A finished request.
#[derive(Debug)]
pub struct Completed {
    pub ticket: Ticket,
    pub result: Result<ServiceReply, ServiceError>,
}

/// Owns the service thread and its channels.
pub struct ServiceWorker {
    request_tx: Sender<ThreadMessage>,
    result_rx: Receiver<Completed>,
    /// Handle to the background thread (for joining on drop)
    thread_handle: Option<JoinHandle<()>>,
    pending: usize,
}

impl ServiceWorker {
    /// Spawn the worker thread, moving `services` onto it.
    pub fn spawn(services: Services) -> Result<Self, ServiceError> {
        let (request_tx, request_rx) = mpsc::channel::<ThreadMessage>();
        let (result_tx, result_rx) = mpsc::channel::<Completed>();

        let thread_handle = thread::Builder::new()
            .name("service-worker".to_string())
            .spawn(move || {
                log::info!("Service worker thread started");
                Self::thread_loop(&services, request_rx, result_tx);
                log::info!("Service worker thread exiting");
            })
            .map_err(|e| ServiceError::io("service-worker", e))?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: 0,
        })
    }

    fn thread_loop(services: &Services, request_rx: Receiver<ThreadMessage>, result_tx: Sender<Completed>) {
        loop {
            match request_rx.recv() {
                Ok(ThreadMessage::Run(ticket, request)) => {
                    log::debug!("Running {} request {:?}", request.kind(), ticket);
                    let result = services.execute(&request);
                    if let Err(e) = &result {
                        log::debug!("{} request {:?} failed: {}", request.kind(), ticket, e);
                    }
                    if result_tx.send(Completed { ticket, result }).is_err() {
                        log::warn!("Result channel closed, service worker exiting");
                        break;
                    }
                }
                Ok(ThreadMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, service worker exiting");
                    break;
                }
            }
        }
    }

    /// Queue a request. Fails only if the thread has gone away.
    pub fn submit(&mut self, ticket: Ticket, request: ServiceRequest) -> Result<(), ServiceError> {
        self.request_tx
            .send(ThreadMessage::Run(ticket, request))
            .map_err(|_| ServiceError::Disconnected)?;
        self.pending += 1;
        Ok(())
    }

    /// Take the oldest completed result, if any. Non-blocking.
    pub fn take_one_result(&mut self) -> Option<Completed> {
        match self.result_rx.try_recv() {
            Ok(done) => {
                self.pending = self.pending.saturating_sub(1);
                Some(done)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("Service worker disconnected");
                None
            }
        }
    }

    /// Block up to `timeout` for the next result.
    pub fn wait_result(&mut self, timeout: Duration) -> Option<Completed> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(done) => {
                self.pending = self.pending.saturating_sub(1);
                Some(done)
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Service worker disconnected");
                None
            }
        }
    }

    /// Requests submitted but not yet taken.
    pub fn pending_count(&self) -> usize {
        self.pending
    }
}

impl Drop for ServiceWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down service worker");
        let _ = self.request_tx.send(ThreadMessage::Shutdown);
        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Service worker panicked: {:?}", e);
            }
        }
    }
}
