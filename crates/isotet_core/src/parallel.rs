//! Data-parallel primitives the extraction stages are written against
//!
//! Every stage of the pipeline is a map, a scan, a gather, a vectorized
//! search or a scatter into disjoint output windows. [`ParallelBackend`] names
//! exactly those operations so the stages never depend on a particular
//! executor. [`RayonBackend`] runs them on a rayon thread pool;
//! [`SerialBackend`] runs them in order on the calling thread and gives the
//! reference result the parallel backend must reproduce.

use std::sync::Arc;

use rayon::prelude::*;

use crate::sink::OutputWindow;

/// Elements per block in the blocked parallel scan
const SCAN_BLOCK: usize = 16 * 1024;

/// Below this many windows a scatter is run serially on one thread
const WINDOW_GRAIN: usize = 256;

/// Operations a parallel executor provides to the pipeline
pub trait ParallelBackend: Send + Sync {
    /// Evaluate `f` at every index in `0..n`
    fn map_range<R, F>(&self, n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send;

    /// Running sums including the current element
    fn inclusive_scan(&self, input: &[usize]) -> Vec<usize>;

    /// Running sums excluding the current element; the first entry is 0
    fn exclusive_scan(&self, input: &[usize]) -> Vec<usize> {
        let inclusive = self.inclusive_scan(input);
        self.map_range(input.len(), |i| if i == 0 { 0 } else { inclusive[i - 1] })
    }

    /// `source[indices[i]]` for every `i`
    fn gather<T>(&self, source: &[T], indices: &[usize]) -> Vec<T>
    where
        T: Copy + Send + Sync,
    {
        self.map_range(indices.len(), |i| source[indices[i]])
    }

    /// For each `k` in `0..count`, the first position in the non-decreasing
    /// sequence `sorted` whose value is greater than `k`
    fn upper_bound_sequence(&self, sorted: &[usize], count: usize) -> Vec<usize> {
        self.map_range(count, |k| sorted.partition_point(|&value| value <= k))
    }

    /// Index of the first `i` in `0..n` for which `pred` holds
    fn find_first<P>(&self, n: usize, pred: P) -> Option<usize>
    where
        P: Fn(usize) -> bool + Sync + Send;

    /// Cut `window` at the offsets in `starts` and call `f(slot, sub_window)`
    /// once per slot
    ///
    /// `starts` must be non-decreasing, begin at 0 and stay within
    /// `window.len()`. Slot `i` covers `[starts[i], starts[i + 1])`; the last
    /// slot runs to the end of the window. Sub-windows never overlap, so `f`
    /// may run concurrently for different slots.
    fn for_each_window<F>(&self, starts: &[usize], window: OutputWindow<'_>, f: F)
    where
        F: Fn(usize, OutputWindow<'_>) + Sync + Send;
}

/// Run every primitive on the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialBackend;

impl ParallelBackend for SerialBackend {
    fn map_range<R, F>(&self, n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        (0..n).map(f).collect()
    }

    fn inclusive_scan(&self, input: &[usize]) -> Vec<usize> {
        let mut out = input.to_vec();
        scan_in_place(&mut out);
        out
    }

    fn find_first<P>(&self, n: usize, pred: P) -> Option<usize>
    where
        P: Fn(usize) -> bool + Sync + Send,
    {
        (0..n).find(|&i| pred(i))
    }

    fn for_each_window<F>(&self, starts: &[usize], window: OutputWindow<'_>, f: F)
    where
        F: Fn(usize, OutputWindow<'_>) + Sync + Send,
    {
        debug_assert!(starts.first().map_or(true, |&s| s == 0));
        visit_windows(0, starts, 0, window, &f);
    }
}

/// Run primitives on a rayon thread pool
///
/// Uses the global pool unless built with [`RayonBackend::with_threads`].
#[derive(Clone, Debug, Default)]
pub struct RayonBackend {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonBackend {
    /// Backend on the global rayon pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend on a dedicated pool of `threads` workers
    ///
    /// `threads == 0` lets rayon pick the worker count.
    pub fn with_threads(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("isotet-worker-{}", i))
            .build()?;
        Ok(Self { pool: Some(Arc::new(pool)) })
    }

    /// Number of worker threads the backend runs on
    pub fn thread_count(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn install<R, OP>(&self, op: OP) -> R
    where
        R: Send,
        OP: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl ParallelBackend for RayonBackend {
    fn map_range<R, F>(&self, n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        self.install(|| (0..n).into_par_iter().map(f).collect())
    }

    fn inclusive_scan(&self, input: &[usize]) -> Vec<usize> {
        let mut out = input.to_vec();
        if out.len() <= SCAN_BLOCK {
            scan_in_place(&mut out);
            return out;
        }

        self.install(|| {
            // Scan each block independently
            out.par_chunks_mut(SCAN_BLOCK).for_each(scan_in_place);

            // Carry block totals forward
            let mut carries: Vec<usize> = out
                .chunks(SCAN_BLOCK)
                .map(|block| block.last().copied().unwrap_or(0))
                .collect();
            let mut running = 0;
            for carry in carries.iter_mut() {
                let total = *carry;
                *carry = running;
                running += total;
            }

            out.par_chunks_mut(SCAN_BLOCK)
                .zip(carries.par_iter())
                .skip(1)
                .for_each(|(block, &carry)| {
                    for value in block.iter_mut() {
                        *value += carry;
                    }
                });
        });
        out
    }

    fn find_first<P>(&self, n: usize, pred: P) -> Option<usize>
    where
        P: Fn(usize) -> bool + Sync + Send,
    {
        self.install(|| (0..n).into_par_iter().position_first(pred))
    }

    fn for_each_window<F>(&self, starts: &[usize], window: OutputWindow<'_>, f: F)
    where
        F: Fn(usize, OutputWindow<'_>) + Sync + Send,
    {
        debug_assert!(starts.first().map_or(true, |&s| s == 0));
        self.install(|| split_windows(0, starts, 0, window, &f));
    }
}

fn scan_in_place(values: &mut [usize]) {
    let mut running = 0;
    for value in values.iter_mut() {
        running += *value;
        *value = running;
    }
}

/// Halve the slot range until it is small, then visit serially
///
/// `base` is the output offset at which `window` begins.
fn split_windows<F>(first_slot: usize, starts: &[usize], base: usize, window: OutputWindow<'_>, f: &F)
where
    F: Fn(usize, OutputWindow<'_>) + Sync,
{
    if starts.len() <= WINDOW_GRAIN {
        visit_windows(first_slot, starts, base, window, f);
        return;
    }

    let mid = starts.len() / 2;
    let (left, right) = window.split_at(starts[mid] - base);
    let (left_starts, right_starts) = starts.split_at(mid);
    rayon::join(
        || split_windows(first_slot, left_starts, base, left, f),
        || split_windows(first_slot + mid, right_starts, right_starts[0], right, f),
    );
}

fn visit_windows<F>(first_slot: usize, starts: &[usize], base: usize, window: OutputWindow<'_>, f: &F)
where
    F: Fn(usize, OutputWindow<'_>),
{
    let end = base + window.len();
    let mut rest = window;
    for (i, &start) in starts.iter().enumerate() {
        let next = starts.get(i + 1).copied().unwrap_or(end);
        let (head, tail) = rest.split_at(next - start);
        f(first_slot + i, head);
        rest = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isotet_math::{Vec3, Vec4};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn backends() -> (SerialBackend, RayonBackend) {
        (SerialBackend, RayonBackend::new())
    }

    #[test]
    fn test_inclusive_scan_small() {
        let (serial, rayon) = backends();
        let input = [1, 0, 2, 0, 0, 3];
        assert_eq!(serial.inclusive_scan(&input), vec![1, 1, 3, 3, 3, 6]);
        assert_eq!(rayon.inclusive_scan(&input), vec![1, 1, 3, 3, 3, 6]);
    }

    #[test]
    fn test_exclusive_scan_small() {
        let (serial, rayon) = backends();
        let input = [3, 6, 3];
        assert_eq!(serial.exclusive_scan(&input), vec![0, 3, 9]);
        assert_eq!(rayon.exclusive_scan(&input), vec![0, 3, 9]);
        assert!(rayon.exclusive_scan(&[]).is_empty());
    }

    #[test]
    fn test_blocked_scan_matches_serial() {
        let (serial, rayon) = backends();
        let input: Vec<usize> = (0..SCAN_BLOCK * 3 + 17).map(|i| (i * 7919) % 5).collect();
        assert_eq!(rayon.inclusive_scan(&input), serial.inclusive_scan(&input));
        assert_eq!(rayon.exclusive_scan(&input), serial.exclusive_scan(&input));
    }

    #[test]
    fn test_upper_bound_sequence_recovers_positions() {
        let (_, rayon) = backends();
        // Flags 0 1 1 0 1 -> inclusive scan 0 1 2 2 3
        let scanned = [0, 1, 2, 2, 3];
        assert_eq!(rayon.upper_bound_sequence(&scanned, 3), vec![1, 2, 4]);
        assert!(rayon.upper_bound_sequence(&scanned, 0).is_empty());
    }

    #[test]
    fn test_gather() {
        let (_, rayon) = backends();
        let source = [10, 20, 30, 40];
        assert_eq!(rayon.gather(&source, &[3, 0, 2]), vec![40, 10, 30]);
    }

    #[test]
    fn test_find_first() {
        let (serial, rayon) = backends();
        assert_eq!(serial.find_first(100, |i| i * i > 50), Some(8));
        assert_eq!(rayon.find_first(100_000, |i| i % 777 == 776), Some(776));
        assert_eq!(rayon.find_first(10, |_| false), None);
    }

    #[test]
    fn test_windows_cover_output_exactly_once() {
        let (serial, rayon) = backends();
        let counts: Vec<usize> = (0..2000).map(|i| if i % 3 == 0 { 6 } else { 3 }).collect();
        let starts = serial.exclusive_scan(&counts);
        let total: usize = counts.iter().sum();

        for parallel in [false, true] {
            let mut p = vec![Vec4::ZERO; total];
            let mut n = vec![Vec3::ZERO; total];
            let mut s = vec![-1.0f32; total];
            let visited = AtomicUsize::new(0);
            let window = OutputWindow::new(&mut p, &mut n, &mut s);
            let fill = |slot: usize, w: OutputWindow<'_>| {
                assert_eq!(w.len(), counts[slot]);
                for value in w.scalars.iter_mut() {
                    assert_eq!(*value, -1.0);
                    *value = slot as f32;
                }
                visited.fetch_add(1, Ordering::Relaxed);
            };
            if parallel {
                rayon.for_each_window(&starts, window, fill);
            } else {
                serial.for_each_window(&starts, window, fill);
            }

            assert_eq!(visited.load(Ordering::Relaxed), counts.len());
            for (slot, &start) in starts.iter().enumerate() {
                for v in start..start + counts[slot] {
                    assert_eq!(s[v], slot as f32);
                }
            }
        }
    }

    #[test]
    fn test_for_each_window_empty() {
        let (_, rayon) = backends();
        let mut p: Vec<Vec4> = Vec::new();
        let mut n: Vec<Vec3> = Vec::new();
        let mut s: Vec<f32> = Vec::new();
        let window = OutputWindow::new(&mut p, &mut n, &mut s);
        rayon.for_each_window(&[], window, |_, _| panic!("no slots to visit"));
    }

    #[test]
    fn test_dedicated_pool() {
        let backend = RayonBackend::with_threads(2).unwrap();
        assert_eq!(backend.thread_count(), 2);
        assert_eq!(backend.map_range(4, |i| i * 2), vec![0, 2, 4, 6]);
    }
}
