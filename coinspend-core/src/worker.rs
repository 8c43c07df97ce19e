//! Background spend attempts
//!
//! Each call spawns one thread for one attempt and hands back a
//! [`SpendHandle`] that receives the single result over a bounded channel.
//! Attempts share nothing but the coordinator, and the coordinator holds no
//! per-attempt state.

use crossbeam_channel::{bounded, Receiver, TryRecvError};
use log::debug;
use std::sync::Arc;
use std::thread;

use coinspend_common::error::{SpendError, SpendResult};

use crate::collaborators::SpendSource;
use crate::coordinator::{
    PrepareRequest, PreparedSpend, SpendCoordinator, SpendReceipt, SpendRequest,
};

/// Pending result of a background step
#[derive(Debug)]
pub struct SpendHandle<T> {
    receiver: Receiver<SpendResult<Option<T>>>,
}

impl<T> SpendHandle<T> {
    /// Block until the worker delivers its result
    pub fn wait(self) -> SpendResult<Option<T>> {
        self.receiver.recv().unwrap_or_else(|_| Err(worker_lost()))
    }

    /// The result if it is ready, without blocking
    ///
    /// The result is delivered once; later calls report a lost worker.
    pub fn try_result(&self) -> Option<SpendResult<Option<T>>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }
}

fn worker_lost() -> SpendError {
    SpendError::Worker("spend worker stopped without a result".to_string())
}

fn spawn<T, F>(name: &str, job: F) -> SpendResult<SpendHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> SpendResult<Option<T>> + Send + 'static,
{
    let (sender, receiver) = bounded(1);
    let thread_name = name.to_string();

    thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let result = job();
            if sender.send(result).is_err() {
                debug!("{}: handle dropped before the result arrived", thread_name);
            }
        })
        .map_err(|e| SpendError::Worker(format!("failed to spawn {}: {}", name, e)))?;

    Ok(SpendHandle { receiver })
}

/// Run [`SpendCoordinator::prepare`] on its own thread
pub fn spawn_prepare(
    coordinator: Arc<SpendCoordinator>,
    request: PrepareRequest,
) -> SpendResult<SpendHandle<PreparedSpend>> {
    spawn("coinspend-prepare", move || coordinator.prepare(&request))
}

/// Run [`SpendCoordinator::execute`] on its own thread
pub fn spawn_execute(
    coordinator: Arc<SpendCoordinator>,
    prepared: PreparedSpend,
    request: SpendRequest,
) -> SpendResult<SpendHandle<SpendReceipt>> {
    spawn("coinspend-execute", move || {
        coordinator.execute(&prepared, &request)
    })
}

/// Prepare then execute on one thread; execute is skipped if prepare finds
/// no funds
///
/// The payments are validated before the worker starts, so an invalid
/// request fails here and nothing is fetched.
pub fn spawn_spend(
    coordinator: Arc<SpendCoordinator>,
    source: SpendSource,
    request: SpendRequest,
) -> SpendResult<SpendHandle<SpendReceipt>> {
    coordinator.validate(&request)?;
    let prepare = PrepareRequest::for_spend(source, &request);

    spawn("coinspend-spend", move || match coordinator.prepare(&prepare)? {
        Some(prepared) => coordinator.execute(&prepared, &request),
        None => Ok(None),
    })
}
