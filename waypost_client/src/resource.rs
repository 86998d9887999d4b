use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;

/// Shared loading-state cell behind every fetched view: the current
/// value, whether a fetch is in flight, and the last error.
///
/// Each `load` bumps a generation counter before awaiting; when the
/// fetch resolves, a completion whose generation no longer matches is
/// discarded. Two overlapping loads therefore settle on the newer one
/// no matter which response arrives first.
pub struct Resource<T> {
    state: Arc<Mutex<State<T>>>,
}

struct State<T> {
    data: Option<T>,
    loading: bool,
    error: Option<String>,
    generation: u64,
}

impl<T> Clone for Resource<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Resource<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                data: None,
                loading: false,
                error: None,
                generation: 0,
            })),
        }
    }

    /// One fetch per call. Flips `loading` on before the future runs and
    /// off when this load's result is applied. A failed fetch records the
    /// error and leaves any previously loaded data in place.
    pub async fn load<F, Fut>(&self, fetch: F)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let generation = {
            let mut state = self.state.lock().expect("resource lock");
            state.generation += 1;
            state.loading = true;
            state.generation
        };

        let result = fetch().await;

        let mut state = self.state.lock().expect("resource lock");
        if state.generation != generation {
            // A newer load superseded this one; drop the result.
            return;
        }
        state.loading = false;
        match result {
            Ok(data) => {
                state.data = Some(data);
                state.error = None;
            }
            Err(err) => {
                state.error = Some(err.to_string());
            }
        }
    }

    pub fn loading(&self) -> bool {
        self.state.lock().expect("resource lock").loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().expect("resource lock").error.clone()
    }

    pub fn with_data<R>(&self, f: impl FnOnce(Option<&T>) -> R) -> R {
        let state = self.state.lock().expect("resource lock");
        f(state.data.as_ref())
    }
}

impl<T: Clone> Resource<T> {
    pub fn data(&self) -> Option<T> {
        self.state.lock().expect("resource lock").data.clone()
    }
}

/// Rejects a second mutation while one is still in flight. Take a
/// permit before submitting; the slot frees when the permit drops.
#[derive(Clone, Default)]
pub struct MutationGuard {
    in_flight: Arc<AtomicBool>,
}

impl MutationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Option<MutationPermit> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Some(MutationPermit {
                in_flight: Arc::clone(&self.in_flight),
            })
        } else {
            None
        }
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

pub struct MutationPermit {
    in_flight: Arc<AtomicBool>,
}

impl Drop for MutationPermit {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::Release);
    }
}
