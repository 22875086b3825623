use std::cmp::Reverse;
use std::sync::Arc;

use itertools::Itertools;
use log::{info, warn};
use ordered_float::NotNan;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::entities::{Bin, Item};
use crate::placer::{NfpPlacer, PackResult, PlacerConfig};

/// Configuration of the [`FirstFitSelection`] heuristic.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FirstFitConfig {
    /// Pre-reject items that cannot be packed into an empty bin.
    /// Can take a long time when there are a lot of items.
    pub verify_items: bool,
    /// While computing a position in the current bin, speculatively compute one in the next
    /// bin. Helps when many bins are in play and rejections are common.
    pub texture_parallel: bool,
    /// Compute positions in every existing bin concurrently. Can consume a lot of resources,
    /// but can also be the fastest option.
    pub texture_parallel_hard: bool,
}

impl Default for FirstFitConfig {
    fn default() -> Self {
        FirstFitConfig {
            verify_items: true,
            texture_parallel: false,
            texture_parallel_hard: false,
        }
    }
}

/// Reports the number of items still waiting to be packed.
pub type ProgressCallback = Arc<dyn Fn(usize) + Send + Sync>;

/// Polled between items and between bins; returning `true` stops the run,
/// retaining all progress made so far.
pub type StopCondition = Arc<dyn Fn() -> bool + Send + Sync>;

/// First-fit selection: every item goes into the lowest-indexed bin whose placer accepts it,
/// opening a new bin when none does. Items are processed in descending (priority, area) order.
pub struct FirstFitSelection {
    config: FirstFitConfig,
    packed_bins: Vec<Vec<Item>>,
    last_packed_bin_id: Option<usize>,
    progress: Option<ProgressCallback>,
    stop_condition: Option<StopCondition>,
}

impl Default for FirstFitSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl FirstFitSelection {
    pub fn new() -> Self {
        FirstFitSelection {
            config: FirstFitConfig::default(),
            packed_bins: Vec::new(),
            last_packed_bin_id: None,
            progress: None,
            stop_condition: None,
        }
    }

    pub fn configure(&mut self, config: FirstFitConfig) {
        self.config = config;
    }

    pub fn set_progress(&mut self, progress: ProgressCallback) {
        self.progress = Some(progress);
    }

    pub fn set_stop_condition(&mut self, stop_condition: StopCondition) {
        self.stop_condition = Some(stop_condition);
    }

    /// The contents of every bin after the last [`Self::pack_items`] run.
    pub fn packed_bins(&self) -> &[Vec<Item>] {
        &self.packed_bins
    }

    pub fn last_packed_bin_id(&self) -> Option<usize> {
        self.last_packed_bin_id
    }

    /// Packs `items` into copies of `bin`, writing accepted placements (translation, rotation
    /// and `bin_id`) back into the slice. Fixed items are preloaded into their declared bins;
    /// items that fit nowhere are left unpacked with `bin_id == None`.
    pub fn pack_items(&mut self, items: &mut [Item], bin: &Bin, pconfig: &PlacerConfig) {
        self.packed_bins.clear();
        self.last_packed_bin_id = None;

        let stopcond = self.stop_condition.clone();
        let cancelled = move || stopcond.as_ref().is_some_and(|c| c());

        //fixed items go straight into their declared bin slot
        let mut store: Vec<usize> = Vec::with_capacity(items.len());
        for (idx, item) in items.iter_mut().enumerate() {
            if item.fixed {
                let bin_idx = item.bin_id.unwrap_or(0);
                item.bin_id = Some(bin_idx);
                while self.packed_bins.len() <= bin_idx {
                    self.packed_bins.push(Vec::new());
                }
                self.packed_bins[bin_idx].push(item.clone());
            } else {
                store.push(idx);
            }
        }

        //one placer per pre-existing bin, preloading its items
        let mut placers: Vec<NfpPlacer> = self
            .packed_bins
            .iter()
            .map(|group| {
                let mut placer = NfpPlacer::new(bin.clone());
                placer.configure(pconfig.clone());
                placer.preload(group);
                placer
            })
            .collect();

        //descending priority, ties broken by descending area
        let store = store
            .into_iter()
            .sorted_by_cached_key(|&i| {
                (
                    Reverse(items[i].priority),
                    Reverse(NotNan::new(items[i].area()).expect("item area is NaN")),
                )
            })
            .collect_vec();

        let store = match self.config.verify_items {
            false => store,
            true => store
                .into_iter()
                .filter(|&i| {
                    let mut probe = NfpPlacer::new(bin.clone());
                    probe.configure(pconfig.clone());
                    let fits = probe.try_pack(&items[i], &[]).is_packed();
                    if !fits {
                        warn!(
                            "[FF] item {} cannot be packed into an empty bin, dropping it",
                            items[i].id
                        );
                    }
                    fits
                })
                .collect_vec(),
        };

        let mut remaining_count = items.len();

        for pos in 0..store.len() {
            if cancelled() {
                break;
            }
            let idx = store[pos];
            let candidate = items[idx].clone();
            let remaining: Vec<Item> = store[pos + 1..].iter().map(|&i| items[i].clone()).collect();

            let mut accepted = self.try_existing_bins(&placers, &candidate, &remaining, &cancelled);

            if accepted.is_none() && !cancelled() {
                //no bin accepted, open a fresh one
                let mut placer = NfpPlacer::new(bin.clone());
                placer.configure(pconfig.clone());
                let result = placer.try_pack(&candidate, &remaining);
                match result.is_packed() {
                    true => {
                        placers.push(placer);
                        self.packed_bins.push(Vec::new());
                        accepted = Some((placers.len() - 1, result));
                    }
                    false => warn!(
                        "[FF] item {} does not fit a fresh bin (overfit {:.3}), leaving it unpacked",
                        candidate.id,
                        result.overfit()
                    ),
                }
            }

            if let Some((bin_idx, result)) = accepted {
                if let PackResult::Packed { item: placed } = &result {
                    items[idx].set_translation(placed.translation());
                    items[idx].set_rotation(placed.rotation());
                    items[idx].bin_id = Some(bin_idx);
                }
                placers[bin_idx].accept(result);
                self.packed_bins[bin_idx] = placers[bin_idx].items().to_vec();
                self.last_packed_bin_id = Some(bin_idx);
                remaining_count -= 1;
                if let Some(progress) = &self.progress {
                    progress(remaining_count);
                }
                info!("[FF] item {} packed into bin {bin_idx}", items[idx].id);
            }
        }

        //final alignment per bin, then write the aligned transforms back
        for (bin_idx, placer) in placers.iter_mut().enumerate() {
            let aligned = placer.clear_items();
            for placed in &aligned {
                if let Some(original) = items.iter_mut().find(|it| it.id == placed.id) {
                    original.set_translation(placed.translation());
                    original.set_rotation(placed.rotation());
                }
            }
            self.packed_bins[bin_idx] = aligned;
        }
    }

    /// Tries the existing bins in index order; the lowest-indexed accepting bin wins in every
    /// scheduling mode.
    fn try_existing_bins(
        &self,
        placers: &[NfpPlacer],
        candidate: &Item,
        remaining: &[Item],
        cancelled: &(impl Fn() -> bool + Sync),
    ) -> Option<(usize, PackResult)> {
        if self.config.texture_parallel_hard {
            //fan out over every bin at once, then collect in index order
            let results: Vec<PackResult> = placers
                .par_iter()
                .map(|placer| placer.try_pack(candidate, remaining))
                .collect();
            results.into_iter().enumerate().find(|(_, r)| r.is_packed())
        } else if self.config.texture_parallel {
            //while bin j is evaluated, speculatively evaluate bin j + 1;
            //an acceptance drops the speculative result, a rejection consumes it next step
            let mut speculative: Option<PackResult> = None;
            let mut j = 0;
            while j < placers.len() && !cancelled() {
                let (result, next) = match speculative.take() {
                    Some(ready) => (ready, None),
                    None => match placers.get(j + 1) {
                        Some(next_placer) => {
                            let current_placer = &placers[j];
                            let (current, next) = rayon::join(
                                || current_placer.try_pack(candidate, remaining),
                                || next_placer.try_pack(candidate, remaining),
                            );
                            (current, Some(next))
                        }
                        None => (placers[j].try_pack(candidate, remaining), None),
                    },
                };
                if result.is_packed() {
                    return Some((j, result));
                }
                speculative = next;
                j += 1;
            }
            None
        } else {
            for (j, placer) in placers.iter().enumerate() {
                if cancelled() {
                    return None;
                }
                let result = placer.try_pack(candidate, remaining);
                if result.is_packed() {
                    return Some((j, result));
                }
            }
            None
        }
    }
}
