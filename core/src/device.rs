//! Where integral evaluation runs.
use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeDevice {
    #[default]
    Serial,
    /// Split matrix rows over a rayon thread pool. Without the `rayon` feature this behaves
    /// exactly like [`ComputeDevice::Serial`].
    Parallel { threads: NonZeroUsize },
}

impl ComputeDevice {
    /// Pick the parallel device when it is compiled in and the machine has more than one
    /// hardware thread.
    pub fn detect() -> Self {
        let available = std::thread::available_parallelism().ok();

        match available {
            Some(threads) if cfg!(feature = "rayon") && threads.get() > 1 => {
                ComputeDevice::Parallel { threads }
            }
            _ => ComputeDevice::Serial,
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, ComputeDevice::Parallel { .. })
    }
}

impl std::fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComputeDevice::Serial => f.write_str("serial"),
            ComputeDevice::Parallel { threads } => write!(f, "parallel ({threads} threads)"),
        }
    }
}

/// Explicit configuration handed to every evaluation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluationContext {
    pub device: ComputeDevice,
}

impl EvaluationContext {
    pub fn new(device: ComputeDevice) -> Self {
        Self { device }
    }

    pub fn serial() -> Self {
        Self::new(ComputeDevice::Serial)
    }

    pub fn detect() -> Self {
        Self::new(ComputeDevice::detect())
    }

    /// Evaluate `f` for every index in `0..n` on this context's device. The output is in index
    /// order regardless of the device.
    pub(crate) fn map_indexed<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        #[cfg(feature = "rayon")]
        if let ComputeDevice::Parallel { threads } = self.device {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};

            match rayon::ThreadPoolBuilder::new()
                .num_threads(threads.get())
                .build()
            {
                Ok(pool) => return pool.install(|| (0..n).into_par_iter().map(&f).collect()),
                Err(error) => log::warn!("could not start {threads} threads ({error}), running serially"),
            }
        }

        (0..n).map(f).collect()
    }
}
