//! In-flight remote calls for one kind of action.
//!
//! Each dispatch runs a blocking backend call on the `AsyncComputeTaskPool`
//! and is tagged with a sequence number. Completed calls are collected by
//! polling once per update; a completion whose sequence number is older than
//! the newest one issued on the same channel is marked stale.

use bevy::tasks::{block_on, AsyncComputeTaskPool, Task};

use crate::prediction::PredictionError;

/// What to do when a call is requested while another is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPolicy {
    /// Refuse the new request until the running one completes.
    SingleFlight,
    /// Issue the new request; the older one will complete as stale.
    Supersede,
}

/// Returned by [`RemoteChannel::dispatch`] under [`DispatchPolicy::SingleFlight`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelBusy {
    pub in_flight_seq: u64,
}

/// The three observable results of a remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteOutcome<T> {
    Success(T),
    /// Network failure, timeout or error status. Local state stands.
    RemoteFailure(String),
    /// The response could not be used. Local state stands.
    MalformedIgnored(String),
}

impl<T> From<Result<T, PredictionError>> for RemoteOutcome<T> {
    fn from(result: Result<T, PredictionError>) -> Self {
        match result {
            Ok(value) => RemoteOutcome::Success(value),
            Err(PredictionError::RemoteUnavailable(msg)) => RemoteOutcome::RemoteFailure(msg),
            Err(PredictionError::MalformedResponse(msg)) => RemoteOutcome::MalformedIgnored(msg),
        }
    }
}

struct InFlight<T, C> {
    seq: u64,
    context: C,
    task: Task<Result<T, PredictionError>>,
}

pub struct Completed<T, C> {
    pub seq: u64,
    pub context: C,
    pub outcome: RemoteOutcome<T>,
    /// A newer request was issued on this channel after this one.
    pub stale: bool,
}

pub struct RemoteChannel<T, C = ()> {
    policy: DispatchPolicy,
    last_issued: u64,
    in_flight: Vec<InFlight<T, C>>,
}

impl<T: Send + 'static, C> RemoteChannel<T, C> {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            last_issued: 0,
            in_flight: Vec::new(),
        }
    }

    /// Spawn `call` on the async compute pool and return its sequence number.
    pub fn dispatch<F>(&mut self, context: C, call: F) -> Result<u64, ChannelBusy>
    where
        F: FnOnce() -> Result<T, PredictionError> + Send + 'static,
    {
        if self.policy == DispatchPolicy::SingleFlight {
            if let Some(running) = self.in_flight.first() {
                return Err(ChannelBusy {
                    in_flight_seq: running.seq,
                });
            }
        }
        self.last_issued += 1;
        let seq = self.last_issued;
        let task = AsyncComputeTaskPool::get().spawn(async move { call() });
        self.in_flight.push(InFlight { seq, context, task });
        Ok(seq)
    }

    /// Collect every call that has finished, oldest first.
    ///
    /// Tasks that are still running stay in the channel; dropping a bevy
    /// `Task` would cancel it.
    pub fn poll(&mut self) -> Vec<Completed<T, C>> {
        let mut done = Vec::new();
        let mut i = 0;
        while i < self.in_flight.len() {
            let finished = block_on(futures_lite::future::poll_once(
                &mut self.in_flight[i].task,
            ));
            match finished {
                Some(result) => {
                    let entry = self.in_flight.remove(i);
                    done.push(Completed {
                        seq: entry.seq,
                        context: entry.context,
                        outcome: result.into(),
                        stale: entry.seq < self.last_issued,
                    });
                }
                None => i += 1,
            }
        }
        done.sort_by_key(|c| c.seq);
        done
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn last_issued(&self) -> u64 {
        self.last_issued
    }

    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }
}
