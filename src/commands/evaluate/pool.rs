use std::collections::HashMap;
use std::hash::Hash;

use anyhow::{Context, Result};
use rayon::prelude::*;

/// Bounded fan-out for independent scoring units.
///
/// Each unit yields a `(key, value)` pair and the pairs are reduced into a
/// map, so completion order never reaches the caller. One worker runs the
/// units inline on the calling thread; otherwise a single thread pool is
/// started here and shared by every scoring pass of the run.
#[derive(Debug)]
pub struct WorkerPool {
    workers: usize,
    chunk_size: usize,
    threads: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub fn new(workers: usize, chunk_size: usize) -> Result<Self> {
        let workers = workers.max(1);
        let threads = if workers == 1 {
            None
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .with_context(|| format!("failed to start worker pool with {workers} threads"))?;
            Some(pool)
        };

        Ok(Self {
            workers,
            chunk_size: chunk_size.max(1),
            threads,
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn map_keyed<T, K, V, F>(&self, units: &[T], score: F) -> Result<HashMap<K, V>>
    where
        T: Sync,
        K: Eq + Hash + Send,
        V: Send,
        F: Fn(&T) -> (K, V) + Sync + Send,
    {
        let Some(threads) = self.threads.as_ref() else {
            return Ok(units.iter().map(&score).collect());
        };

        let pairs = threads.install(|| {
            units
                .par_chunks(self.chunk_size)
                .flat_map_iter(|chunk| chunk.iter().map(&score).collect::<Vec<(K, V)>>())
                .collect::<Vec<(K, V)>>()
        });

        Ok(pairs.into_iter().collect())
    }
}
