use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::exemplar::ExemplarIndex;
use crate::matcher::Matcher;
use crate::neighborhood::{Plane, Point3, Window};
use crate::volume::Volume;
use crate::{Color, Error};

#[derive(Debug)]
pub struct SynthesisParams {
    /// Edge length of the generated volume
    pub(crate) volume_size: u32,
    /// Number of full passes over the volume
    pub(crate) iterations: u32,
    /// Seed for the initial noise
    pub(crate) seed: u64,
    pub(crate) max_thread_count: usize,
}

/// Helper struct for passing progress information to external callers
pub struct ProgressStat {
    /// The current amount of work that has been done
    pub current: usize,
    /// The total amount of work to do
    pub total: usize,
}

/// The current state of the synthesis
pub struct ProgressUpdate<'a> {
    /// The volume as of the last finished pass, or the initial noise
    pub volume: &'a Volume,
    /// Voxels resolved over all passes
    pub total: ProgressStat,
    /// Voxels resolved in the current pass
    pub pass: ProgressStat,
    /// Zero based index of the current pass
    pub pass_index: u32,
    /// Summed best match distances of the pass, only set once the pass has
    /// finished and `volume` holds its result
    pub energy: Option<u64>,
}

/// Allows the synthesizer to update external callers with the current
/// progress of the synthesis
pub trait GeneratorProgress {
    fn update(&mut self, info: ProgressUpdate<'_>);
}

impl<G> GeneratorProgress for G
where
    G: FnMut(ProgressUpdate<'_>) + Send,
{
    fn update(&mut self, info: ProgressUpdate<'_>) {
        self(info)
    }
}

/// Stops a running synthesis at the next pass boundary.
///
/// Clones share the same flag, so a clone can be handed to a progress
/// callback or another thread.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why the synthesis stopped
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    /// Every configured pass ran
    Exhausted,
    /// A `CancelToken` stopped the synthesis between passes
    Cancelled { completed_passes: u32 },
}

pub(crate) struct Outcome {
    pub(crate) volume: Volume,
    pub(crate) energies: Vec<u64>,
    pub(crate) termination: Termination,
}

pub(crate) struct Synthesizer<'a> {
    index: &'a ExemplarIndex,
    current: Volume,
    next: Volume,
    window: Window,
}

impl<'a> Synthesizer<'a> {
    /// Allocates both volumes and fills the current one with seeded noise
    pub(crate) fn new(index: &'a ExemplarIndex, params: &SynthesisParams) -> Result<Self, Error> {
        let mut current = Volume::new(params.volume_size)?;
        let next = Volume::new(params.volume_size)?;

        let mut rng = Pcg32::seed_from_u64(params.seed);
        current.init_random(&mut rng);

        Ok(Self {
            index,
            current,
            next,
            window: index.window(),
        })
    }

    /// Runs every pass, or stops early if `cancel` is set between passes
    pub(crate) fn resolve(
        mut self,
        params: &SynthesisParams,
        mut progress: Option<Box<dyn GeneratorProgress>>,
        cancel: Option<&CancelToken>,
    ) -> Result<Outcome, Error> {
        let mut energies = Vec::with_capacity(params.iterations as usize);
        let mut termination = Termination::Exhausted;

        let voxels = self.current.as_slice().len();
        let total_voxels = voxels * params.iterations as usize;

        log::debug!(
            "synthesizing a {0}x{0}x{0} volume, {1} passes on up to {2} threads",
            params.volume_size,
            params.iterations,
            params.max_thread_count
        );

        for pass in 0..params.iterations {
            if cancel.map_or(false, CancelToken::is_cancelled) {
                log::info!("synthesis cancelled after {} passes", pass);
                termination = Termination::Cancelled {
                    completed_passes: pass,
                };
                break;
            }

            let done_before = voxels * pass as usize;
            let energy = self.run_pass(params.max_thread_count, |volume, current| {
                if let Some(ref mut progress) = progress {
                    progress.update(ProgressUpdate {
                        volume,
                        total: ProgressStat {
                            total: total_voxels,
                            current: done_before + current,
                        },
                        pass: ProgressStat {
                            total: voxels,
                            current,
                        },
                        pass_index: pass,
                        energy: None,
                    });
                }
            })?;

            log::info!(
                "pass {}/{} finished with energy {}",
                pass + 1,
                params.iterations,
                energy
            );
            energies.push(energy);

            if let Some(ref mut progress) = progress {
                progress.update(ProgressUpdate {
                    volume: &self.current,
                    total: ProgressStat {
                        total: total_voxels,
                        current: done_before + voxels,
                    },
                    pass: ProgressStat {
                        total: voxels,
                        current: voxels,
                    },
                    pass_index: pass,
                    energy: Some(energy),
                });
            }
        }

        Ok(Outcome {
            volume: self.current,
            energies,
            termination,
        })
    }

    /// Recomputes every voxel of the next volume from the current one, then
    /// swaps the two. Returns the summed best match distances.
    ///
    /// `on_progress` is called from this thread with the current volume and
    /// the number of voxels resolved so far while the workers run.
    pub(crate) fn run_pass<F>(
        &mut self,
        max_workers: usize,
        mut on_progress: F,
    ) -> Result<u64, Error>
    where
        F: FnMut(&Volume, usize),
    {
        let size = self.current.size() as usize;
        let slab = size * size;

        // Workers own whole x-slabs of the next volume
        let n_workers = max_workers.max(1).min(size);
        let slabs_per_worker = (size + n_workers - 1) / n_workers;

        let index = self.index;
        let window = self.window;
        let current = &self.current;
        let processed = AtomicUsize::new(0);

        let energy = if n_workers == 1 || cfg!(target_arch = "wasm32") {
            resolve_slabs(index, current, window, 0, self.next.as_mut_slice(), &processed)?
        } else {
            parallel_pass(
                index,
                current,
                window,
                self.next.as_mut_slice(),
                slab * slabs_per_worker,
                &processed,
                &mut on_progress,
            )?
        };

        std::mem::swap(&mut self.current, &mut self.next);

        Ok(energy)
    }
}

#[cfg(target_arch = "wasm32")]
fn parallel_pass<F>(
    index: &ExemplarIndex,
    current: &Volume,
    window: Window,
    next: &mut [Color],
    _chunk_len: usize,
    processed: &AtomicUsize,
    _on_progress: &mut F,
) -> Result<u64, Error>
where
    F: FnMut(&Volume, usize),
{
    // for WASM we do not have threads and crossbeam panics
    resolve_slabs(index, current, window, 0, next, processed)
}

#[cfg(not(target_arch = "wasm32"))]
fn parallel_pass<F>(
    index: &ExemplarIndex,
    current: &Volume,
    window: Window,
    next: &mut [Color],
    chunk_len: usize,
    processed: &AtomicUsize,
    on_progress: &mut F,
) -> Result<u64, Error>
where
    F: FnMut(&Volume, usize),
{
    struct Finished<'a>(&'a AtomicUsize);

    impl Drop for Finished<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::Release);
        }
    }

    let slab = (current.size() as usize).pow(2);
    let chunks: Vec<&mut [Color]> = next.chunks_mut(chunk_len).collect();
    let remaining_threads = AtomicUsize::new(chunks.len());

    let results = crossbeam_utils::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| {
                let remaining_threads = &remaining_threads;
                scope.spawn(move |_| {
                    let _finished = Finished(remaining_threads);
                    resolve_slabs(index, current, window, i * chunk_len / slab, chunk, processed)
                })
            })
            .collect();

        let mut last = 0;
        while remaining_threads.load(Ordering::Acquire) != 0 {
            let now = processed.load(Ordering::Relaxed);
            if now != last {
                on_progress(current, now);
                last = now;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|e| std::panic::resume_unwind(e));

    results.into_iter().sum()
}

/// Resolves consecutive x-slabs starting at `first_x` into `out`, reading
/// only from `current`.
fn resolve_slabs(
    index: &ExemplarIndex,
    current: &Volume,
    window: Window,
    first_x: usize,
    out: &mut [Color],
    processed: &AtomicUsize,
) -> Result<u64, Error> {
    let size = current.size() as usize;
    let offset = first_x * size * size;

    let mut matcher = Matcher::new(index);
    let mut energy = 0u64;

    for (i, voxel) in out.iter_mut().enumerate() {
        let flat = offset + i;
        let (x, y, z) = (flat / (size * size), (flat / size) % size, flat % size);
        let p = Point3::new(x as i32, y as i32, z as i32);

        let mut colors = [Color::BLACK; 3];
        for (color, &plane) in colors.iter_mut().zip(Plane::ALL.iter()) {
            let query = current.neighborhood(p, plane, window);
            let best = matcher.find_best_match(&query, current)?;
            energy += u64::from(best.distance);
            *color = best.color;
        }

        *voxel = Color::average(colors[0], colors[1], colors[2]);

        if z + 1 == size {
            processed.fetch_add(size, Ordering::Relaxed);
        }
    }

    Ok(energy)
}
