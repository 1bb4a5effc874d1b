use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::Result;

/// Fork-join pool for per-channel work inside a single layer.
///
/// Channels are split into contiguous ranges, one range per worker.  Each
/// worker only receives the mutable slices belonging to its own channels, so
/// no mutable state is shared across channels.  Every call blocks until all
/// ranges have finished.
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    threads: usize,
    pool: Option<Arc<ThreadPool>>,
}

impl WorkerPool {
    /// A pool with `threads` workers; `threads <= 1` runs everything inline.
    pub fn new(threads: usize) -> Result<WorkerPool> {
        let pool = if threads > 1 {
            Some(Arc::new(ThreadPoolBuilder::new().num_threads(threads).build()?))
        } else {
            None
        };
        Ok(WorkerPool { threads: threads.max(1), pool })
    }

    pub fn inline() -> WorkerPool {
        WorkerPool { threads: 1, pool: None }
    }

    pub fn threads(&self) -> usize {
        self.threads.max(1)
    }

    /// Runs `f(channel, channel_slice)` for every channel of `data`.
    ///
    /// `data` must hold `channels` equally sized, contiguous channel slices.
    pub fn for_each_channel<A, F>(&self, channels: usize, data: &mut [A], f: F)
    where
        A: Send,
        F: Fn(usize, &mut [A]) + Sync,
    {
        let mut unit = vec![(); channels];
        self.for_each_channel_pair(channels, data, &mut unit, |ch, a, _| f(ch, a));
    }

    /// Like `for_each_channel`, but hands each worker matching channel slices
    /// of two buffers (e.g. pooled values and their max positions).
    pub fn for_each_channel_pair<A, B, F>(&self, channels: usize, a: &mut [A], b: &mut [B], f: F)
    where
        A: Send,
        B: Send,
        F: Fn(usize, &mut [A], &mut [B]) + Sync,
    {
        if channels == 0 {
            return;
        }
        let a_len = a.len() / channels;
        let b_len = b.len() / channels;
        if a_len == 0 || b_len == 0 {
            return;
        }

        let workers = self.threads().min(channels);
        let pool = match &self.pool {
            Some(pool) if workers > 1 => pool,
            _ => {
                for (ch, (a_ch, b_ch)) in a.chunks_mut(a_len).zip(b.chunks_mut(b_len)).enumerate() {
                    f(ch, a_ch, b_ch);
                }
                return;
            }
        };

        let per_worker = (channels + workers - 1) / workers;
        pool.install(|| {
            a.par_chunks_mut(per_worker * a_len)
                .zip(b.par_chunks_mut(per_worker * b_len))
                .enumerate()
                .for_each(|(worker, (a_range, b_range))| {
                    let first = worker * per_worker;
                    for (i, (a_ch, b_ch)) in a_range.chunks_mut(a_len).zip(b_range.chunks_mut(b_len)).enumerate() {
                        f(first + i, a_ch, b_ch);
                    }
                });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_visits_every_channel_in_order() {
        let pool = WorkerPool::inline();
        let mut data = vec![0usize; 12];
        pool.for_each_channel(4, &mut data, |ch, slice| slice.iter_mut().for_each(|v| *v = ch));
        assert_eq!(data, vec![0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3]);
    }

    #[test]
    fn parallel_matches_inline() {
        let pool = WorkerPool::new(3).unwrap();
        let mut values = vec![0.0f32; 7 * 4];
        let mut tags = vec![(0usize, 0usize); 7];
        pool.for_each_channel_pair(7, &mut values, &mut tags, |ch, v, t| {
            v.iter_mut().enumerate().for_each(|(i, x)| *x = (ch * 10 + i) as f32);
            t[0] = (ch, v.len());
        });
        for ch in 0..7 {
            assert_eq!(tags[ch], (ch, 4));
            assert_eq!(values[ch * 4 + 3], (ch * 10 + 3) as f32);
        }
    }
}
