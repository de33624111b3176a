//! Generation observers.
//!
//! Snapshots are pushed through a bounded queue and delivered by one
//! background thread, so slow observers never run on the engine thread.
//! The engine joins that thread before a run returns.

use super::config::ObserverPolicy;
use super::types::PopulationData;
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{Scope, ScopedJoinHandle};

/// Receives a snapshot after every evaluated generation.
pub trait EvolutionObserver<T>: Send + Sync {
    /// Called once per generation, in generation order.
    fn population_update(&self, data: &PopulationData<T>);
}

/// Adapts a closure into an [`EvolutionObserver`].
///
/// ```
/// use u_evolve::engine::{FnObserver, PopulationData};
///
/// let observer = FnObserver::new(|data: &PopulationData<String>| {
///     println!("generation {}: {}", data.generation, data.best_fitness());
/// });
/// ```
pub struct FnObserver<F> {
    f: F,
}

impl<F> FnObserver<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<T, F> EvolutionObserver<T> for FnObserver<F>
where
    F: Fn(&PopulationData<T>) + Send + Sync,
{
    fn population_update(&self, data: &PopulationData<T>) {
        (self.f)(data)
    }
}

impl<F> fmt::Debug for FnObserver<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnObserver")
    }
}

/// Queue plus consumer thread for one run.
pub(crate) struct ObserverDispatcher<'scope, T> {
    sender: Option<Sender<PopulationData<T>>>,
    consumer: Option<ScopedJoinHandle<'scope, ()>>,
    policy: ObserverPolicy,
    dropped: u64,
}

impl<'scope, T: Send + 'scope> ObserverDispatcher<'scope, T> {
    /// Spawns the consumer. With no observers nothing is spawned and
    /// [`is_active`](Self::is_active) is false.
    pub(crate) fn start<'env>(
        scope: &'scope Scope<'scope, 'env>,
        observers: &'scope [Box<dyn EvolutionObserver<T>>],
        capacity: usize,
        policy: ObserverPolicy,
    ) -> Self {
        if observers.is_empty() {
            return Self {
                sender: None,
                consumer: None,
                policy,
                dropped: 0,
            };
        }

        let (sender, receiver) = bounded::<PopulationData<T>>(capacity);
        let consumer = scope.spawn(move || {
            for data in receiver.iter() {
                for observer in observers {
                    let delivered = panic::catch_unwind(AssertUnwindSafe(|| {
                        observer.population_update(&data)
                    }));
                    if let Err(payload) = delivered {
                        log::warn!(
                            "observer panicked at generation {}: {}",
                            data.generation,
                            panic_message(payload.as_ref())
                        );
                    }
                }
            }
        });

        Self {
            sender: Some(sender),
            consumer: Some(consumer),
            policy,
            dropped: 0,
        }
    }

    /// Whether any observer is listening.
    pub(crate) fn is_active(&self) -> bool {
        self.sender.is_some()
    }

    /// Queues a snapshot according to the back-pressure policy.
    pub(crate) fn notify(&mut self, data: PopulationData<T>) {
        let Some(sender) = &self.sender else {
            return;
        };
        let delivered = match self.policy {
            ObserverPolicy::Block => sender.send(data).is_ok(),
            ObserverPolicy::DropNewest => match sender.try_send(data) {
                Ok(()) => true,
                Err(TrySendError::Full(data)) => {
                    log::debug!(
                        "observer queue full, dropping snapshot of generation {}",
                        data.generation
                    );
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
        };
        if !delivered {
            self.dropped += 1;
        }
    }

    /// Closes the queue, waits for every queued snapshot to be delivered,
    /// and returns the number of dropped snapshots.
    pub(crate) fn finish(mut self) -> u64 {
        self.sender.take();
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                log::warn!("observer thread terminated abnormally");
            }
        }
        if self.dropped > 0 {
            log::warn!("{} observer snapshots dropped", self.dropped);
        }
        self.dropped
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::PopulationStats;
    use crate::evaluation::FitnessDirection;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn snapshot(generation: usize) -> PopulationData<u8> {
        PopulationData {
            best_candidate: 0,
            stats: PopulationStats::from_scores(&[1.0], FitnessDirection::Natural),
            direction: FitnessDirection::Natural,
            elite_count: 0,
            generation,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn test_block_delivers_everything_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observers: Vec<Box<dyn EvolutionObserver<u8>>> =
            vec![Box::new(FnObserver::new(move |d: &PopulationData<u8>| {
                sink.lock().unwrap().push(d.generation)
            }))];

        let dropped = std::thread::scope(|scope| {
            let mut dispatcher = ObserverDispatcher::start(scope, &observers, 1, ObserverPolicy::Block);
            assert!(dispatcher.is_active());
            for g in 0..20 {
                dispatcher.notify(snapshot(g));
            }
            dispatcher.finish()
        });

        assert_eq!(dropped, 0);
        assert_eq!(*seen.lock().unwrap(), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_drop_newest_counts_losses() {
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let observers: Vec<Box<dyn EvolutionObserver<u8>>> =
            vec![Box::new(FnObserver::new(move |_: &PopulationData<u8>| {
                std::thread::sleep(Duration::from_millis(5));
                *sink.lock().unwrap() += 1;
            }))];

        let dropped = std::thread::scope(|scope| {
            let mut dispatcher =
                ObserverDispatcher::start(scope, &observers, 1, ObserverPolicy::DropNewest);
            for g in 0..30 {
                dispatcher.notify(snapshot(g));
            }
            dispatcher.finish()
        });

        let seen = *seen.lock().unwrap();
        assert_eq!(seen as u64 + dropped, 30);
        assert!(dropped > 0);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_others() {
        let seen = Arc::new(Mutex::new(0usize));
        let sink = Arc::clone(&seen);
        let observers: Vec<Box<dyn EvolutionObserver<u8>>> = vec![
            Box::new(FnObserver::new(|_: &PopulationData<u8>| panic!("broken observer"))),
            Box::new(FnObserver::new(move |_: &PopulationData<u8>| {
                *sink.lock().unwrap() += 1
            })),
        ];

        std::thread::scope(|scope| {
            let mut dispatcher = ObserverDispatcher::start(scope, &observers, 4, ObserverPolicy::Block);
            for g in 0..3 {
                dispatcher.notify(snapshot(g));
            }
            dispatcher.finish()
        });

        assert_eq!(*seen.lock().unwrap(), 3);
    }

    #[test]
    fn test_no_observers_is_inactive() {
        let observers: Vec<Box<dyn EvolutionObserver<u8>>> = Vec::new();
        std::thread::scope(|scope| {
            let mut dispatcher = ObserverDispatcher::start(scope, &observers, 4, ObserverPolicy::Block);
            assert!(!dispatcher.is_active());
            dispatcher.notify(snapshot(0));
            assert_eq!(dispatcher.finish(), 0);
        });
    }
}
