use log::{debug, error, warn};
use ordered_float::OrderedFloat;

use crate::entities::{Bin, Item};
use crate::geometry::Transformation;
use crate::geometry::boolean;
use crate::geometry::convex_hull::convex_hull_from_points;
use crate::geometry::geo_traits::Transformable;
use crate::geometry::primitives::{Circle, Point, Polygon, Rect};
use crate::opt::{OptResult, StopCriteria, optimize_min};
use crate::placer::config::{Alignment, PlacerConfig};
use crate::placer::edge_cache::EdgeCache;
use crate::placer::nfp_builder::calc_nfp;
use crate::util::switch_par_map;

/// Outcome of [`NfpPlacer::try_pack`].
#[derive(Debug)]
pub enum PackResult {
    /// A feasible placement was found; the item carries the accepted translation and rotation.
    Packed { item: Item },
    /// No feasible placement exists; `overfit` measures how far out of the bin the best
    /// attempted placement fell.
    Failed { overfit: f64 },
}

impl PackResult {
    pub fn is_packed(&self) -> bool {
        matches!(self, PackResult::Packed { .. })
    }

    pub fn overfit(&self) -> f64 {
        match self {
            PackResult::Packed { .. } => 0.0,
            PackResult::Failed { overfit } => *overfit,
        }
    }
}

/// Places items into a single bin by searching the boundary of the merged no-fit polygon.
///
/// [`NfpPlacer::try_pack`] is free of side effects: the pile only changes when a successful
/// result is passed to [`NfpPlacer::accept`].
pub struct NfpPlacer {
    bin: Bin,
    config: PlacerConfig,
    /// √(bin area), fixed at construction; normalizes the default objective
    norming_factor: f64,
    items: Vec<Item>,
    /// Union of the transformed shapes of all placed items
    merged_pile: Vec<Polygon>,
}

/// Position of one local optimum on the merged NFP: which polygon, which of its rings,
/// and the normalized parameter along that ring.
#[derive(Clone, Copy, Debug)]
struct Optimum {
    relpos: f64,
    nfp: usize,
    hole: Option<usize>,
}

/// Best placement found for a single rotation.
struct ResultCandidate {
    score: f64,
    translation: Point,
    rotation: f64,
    /// Lowest overfit among seeds that failed the boundary check
    best_overfit: f64,
}

impl NfpPlacer {
    pub fn new(bin: Bin) -> Self {
        let norming_factor = bin.area().sqrt();
        NfpPlacer {
            bin,
            config: PlacerConfig::default(),
            norming_factor,
            items: Vec::new(),
            merged_pile: Vec::new(),
        }
    }

    pub fn configure(&mut self, config: PlacerConfig) {
        self.config = config;
    }

    pub fn bin(&self) -> &Bin {
        &self.bin
    }

    /// The items placed so far.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The union of the transformed shapes of all placed items.
    pub fn merged_pile(&self) -> &[Polygon] {
        &self.merged_pile
    }

    /// Installs pre-placed items with their transformations as-is and fires `on_preload`.
    pub fn preload(&mut self, preloaded: &[Item]) {
        let start = self.items.len();
        for item in preloaded {
            let item = item.clone();
            self.merged_pile = boolean::merge(&self.merged_pile, &item.transformed().shape);
            self.items.push(item);
        }
        if let Some(cb) = self.config.on_preload.clone() {
            let NfpPlacer { items, config, .. } = self;
            cb(&items[start..], config);
        }
    }

    /// Searches for the best feasible placement of `item` given the current pile.
    ///
    /// `remaining` is only forwarded to the observer callbacks and the client objective;
    /// the search itself does not consult it.
    pub fn try_pack(&self, item: &Item, remaining: &[Item]) -> PackResult {
        if let Some(cb) = &self.config.before_packing {
            cb(&self.merged_pile, &self.items, remaining);
        }

        let result = match self.items.is_empty() {
            true => self.pack_first(item),
            false => self.pack_against_pile(item),
        };

        match &result {
            PackResult::Packed { item } => debug!(
                "[NFP] item {} placeable at ({:.3}, {:.3}), r: {:.3}",
                item.id,
                item.translation().0,
                item.translation().1,
                item.rotation()
            ),
            PackResult::Failed { overfit } => {
                debug!("[NFP] item {} does not fit, overfit: {overfit:.3}", item.id)
            }
        }

        if let Some(cb) = &self.config.after_packing {
            cb(&self.merged_pile, &self.items, remaining);
        }

        result
    }

    /// Commits a result: the pile is mutated iff it is a success (overfit zero).
    pub fn accept(&mut self, result: PackResult) {
        if let PackResult::Packed { item } = result {
            self.merged_pile = boolean::merge(&self.merged_pile, &item.transformed().shape);
            self.items.push(item);
        }
    }

    /// Runs the final alignment pass and empties the placer, returning the aligned items.
    pub fn clear_items(&mut self) -> Vec<Item> {
        self.final_align();
        self.merged_pile.clear();
        std::mem::take(&mut self.items)
    }

    /// The very first item is simply snapped to the bin's starting anchor; the rotation scan
    /// picks the orientation with the lowest overfit.
    fn pack_first(&self, item: &Item) -> PackResult {
        let initial_translation = item.translation();
        let initial_rotation = item.rotation();

        let mut best = item.clone();
        self.set_initial_position(&mut best);
        let mut best_overfit = self
            .bin
            .overfit_hull(&best.transformed().shape.outer.points);

        for &rot in &self.config.rotations {
            let mut cand = item.clone();
            cand.set_translation(initial_translation);
            cand.set_rotation(initial_rotation + rot);
            self.set_initial_position(&mut cand);
            let overfit = self
                .bin
                .overfit_hull(&cand.transformed().shape.outer.points);
            if overfit < best_overfit {
                best_overfit = overfit;
                best = cand;
            }
        }

        match best_overfit <= 0.0 {
            true => PackResult::Packed { item: best },
            false => PackResult::Failed {
                overfit: best_overfit,
            },
        }
    }

    fn pack_against_pile(&self, item: &Item) -> PackResult {
        //no prior best exists at entry
        let global_score = f64::INFINITY;

        let initial_translation = item.translation();
        let initial_rotation = item.rotation();

        let bin = &self.bin;
        let bin_bbox = bin.bbox();
        let pile_bbox = self.pile_bbox().unwrap_or_else(|| {
            //the merged pile degenerated, fall back to the placed items themselves
            self.items
                .iter()
                .map(|i| i.bbox())
                .reduce(Rect::bounding_rect)
                .expect("at least one item is placed")
        });
        let norm = self.norming_factor;
        let alignment = self.config.alignment;

        //warm the derived caches of every participant before any fan-out,
        //so the parallel tasks below only ever read
        for placed in &self.items {
            placed.transformed();
        }

        let custom_objective = self.config.object_function.clone();
        let objective = move |itm: &Item| -> f64 {
            match &custom_objective {
                Some(f) => f(itm),
                None => {
                    let full_bbox = Rect::bounding_rect(pile_bbox, itm.bbox());
                    let mut score = (full_bbox.width() + full_bbox.height()) / norm;
                    //the inside check has to be strict if no alignment pass will run
                    score += match alignment == Alignment::DontAlign {
                        true => match bin_bbox.contains(&full_bbox) {
                            true => 0.0,
                            false => norm,
                        },
                        false => {
                            let miss = bin.overfit_bbox(full_bbox).max(0.0);
                            miss * miss
                        }
                    };
                    score
                }
            }
        };

        let candidates: Vec<ResultCandidate> =
            switch_par_map(&self.config.rotations, self.config.parallel, |&rotation| {
                self.evaluate_rotation(
                    item,
                    rotation,
                    initial_translation,
                    initial_rotation,
                    &objective,
                )
            });

        let best = candidates
            .iter()
            .min_by_key(|c| OrderedFloat(c.score));

        match best {
            Some(best) if best.score < global_score => {
                let mut packed = item.clone();
                packed.set_translation(best.translation);
                packed.set_rotation(best.rotation);
                PackResult::Packed { item: packed }
            }
            _ => {
                let overfit = candidates
                    .iter()
                    .map(|c| c.best_overfit)
                    .fold(f64::INFINITY, f64::min);
                PackResult::Failed { overfit }
            }
        }
    }

    /// Evaluates a single rotation: builds the merged NFP against the pile, seeds the
    /// minimizer at every corner of every NFP ring and keeps the best seed that survives
    /// the boundary check.
    fn evaluate_rotation(
        &self,
        item: &Item,
        rotation: f64,
        initial_translation: Point,
        initial_rotation: f64,
        objective: &(impl Fn(&Item) -> f64 + Sync),
    ) -> ResultCandidate {
        let mut current = item.clone();
        current.set_translation(initial_translation);
        current.set_rotation(initial_rotation + rotation);
        current.transformed(); //warm the cache before fanning out over seeds

        let nfps = calc_nfp(&self.items, &current, self.config.parallel);
        let reference = current.transformed().reference_vertex;
        let startpos = current.translation();

        let ecache: Vec<EdgeCache> = nfps
            .iter()
            .map(|nfp| EdgeCache::new(nfp, self.config.accuracy))
            .collect();

        let nfp_point = |o: &Optimum| -> Point {
            match o.hole {
                None => ecache[o.nfp].coords(o.relpos),
                Some(h) => ecache[o.nfp].hole_coords(h, o.relpos),
            }
        };

        //translating the item so its reference vertex lands on `v`
        let place_at = |v: Point, itm: &mut Item| {
            itm.set_translation(v - reference + startpos);
        };

        //hull of pile and candidate must fit the bin for the seed to be feasible
        let boundary_check = |o: &Optimum| -> f64 {
            let mut probe = current.clone();
            place_at(nfp_point(o), &mut probe);

            let mut points: Vec<Point> = self
                .merged_pile
                .iter()
                .flat_map(|p| p.outer.points.iter().copied())
                .collect();
            points.extend(probe.transformed().shape.outer.points.iter().copied());
            let hull = convex_hull_from_points(points);

            match self.config.alignment == Alignment::DontAlign {
                true => match self.bin.contains_hull(&hull) {
                    true => -1.0,
                    false => 1.0,
                },
                false => self.bin.overfit_hull(&hull),
            }
        };

        let stop = StopCriteria {
            max_iterations: (1000.0 * self.config.accuracy).floor() as usize,
            relative_score_difference: 1e-20,
        };

        let optimize_seed = |nfp: usize, hole: Option<usize>, seed: f64| -> OptResult {
            let mut probe = current.clone();
            let outcome = optimize_min(
                |relpos| {
                    let o = Optimum { relpos, nfp, hole };
                    place_at(nfp_point(&o), &mut probe);
                    objective(&probe)
                },
                seed,
                (0.0, 1.0),
                &stop,
            );
            match outcome {
                Ok(r) => r,
                Err(e) => {
                    error!("minimizer failed on seed {seed}: {e}");
                    OptResult {
                        optimum: seed,
                        score: f64::INFINITY,
                    }
                }
            }
        };

        let mut best_score = f64::INFINITY;
        let mut optimum: Option<Optimum> = None;
        let mut best_local_overfit = f64::INFINITY;

        for (ch, cache) in ecache.iter().enumerate() {
            if cache.is_degenerate() {
                warn!("degenerate no-fit polygon, no seeds to explore");
                continue;
            }

            let mut rings: Vec<(Option<usize>, &[f64])> = vec![(None, cache.corners())];
            if self.config.explore_holes {
                rings.extend((0..cache.n_holes()).map(|h| (Some(h), cache.hole_corners(h))));
            }

            for (hole, corners) in rings {
                if corners.is_empty() {
                    continue;
                }

                //local optimization with the ring corners as starting points
                let results = switch_par_map(corners, self.config.parallel, |&seed| {
                    optimize_seed(ch, hole, seed)
                });

                let minimal = results
                    .iter()
                    .min_by_key(|r| OrderedFloat(r.score))
                    .expect("at least one seed result");

                if minimal.score < best_score {
                    let o = Optimum {
                        relpos: minimal.optimum,
                        nfp: ch,
                        hole,
                    };
                    let miss = boundary_check(&o);
                    if miss <= 0.0 {
                        best_score = minimal.score;
                        optimum = Some(o);
                    } else {
                        best_local_overfit = best_local_overfit.min(miss);
                    }
                }
            }
        }

        match optimum {
            Some(o) => ResultCandidate {
                score: best_score,
                translation: nfp_point(&o) - reference + startpos,
                rotation: initial_rotation + rotation,
                best_overfit: best_local_overfit,
            },
            None => ResultCandidate {
                score: f64::INFINITY,
                translation: startpos,
                rotation: initial_rotation + rotation,
                best_overfit: best_local_overfit,
            },
        }
    }

    /// Snaps the item's starting anchor onto the bin's corresponding anchor.
    fn set_initial_position(&self, item: &mut Item) {
        let bb = item.bbox();
        let bin_bbox = self.bin.bbox();
        if let (Some(ci), Some(cb)) = (
            self.config.starting_point.anchor(&bb),
            self.config.starting_point.anchor(&bin_bbox),
        ) {
            item.translate(cb - ci);
        }
    }

    /// Translates the whole pile so its anchor coincides with the bin's anchor.
    /// A pure post-pass; the relative placements are unchanged.
    fn final_align(&mut self) {
        if self.items.is_empty() || self.config.alignment == Alignment::DontAlign {
            return;
        }

        let d = match &self.bin {
            Bin::Circle(cbin) => {
                //circular bins align on bounding circles instead of bounding boxes
                let points: Vec<Point> = self
                    .items
                    .iter()
                    .flat_map(|i| i.transformed().shape.outer.points.iter().copied())
                    .collect();
                let hull = convex_hull_from_points(points);
                cbin.center - Circle::bounding_circle(&hull).center
            }
            _ => {
                let bb = self
                    .items
                    .iter()
                    .map(|i| i.bbox())
                    .reduce(Rect::bounding_rect)
                    .expect("items not empty");
                let ci = self
                    .config
                    .alignment
                    .anchor(&bb)
                    .expect("alignment is not DontAlign");
                let cb = self
                    .config
                    .alignment
                    .anchor(&self.bin.bbox())
                    .expect("alignment is not DontAlign");
                cb - ci
            }
        };

        for item in &mut self.items {
            item.translate(d);
        }
        let t = Transformation::from_translation(d.into());
        for shape in &mut self.merged_pile {
            shape.transform(&t);
        }
    }

    fn pile_bbox(&self) -> Option<Rect> {
        self.merged_pile
            .iter()
            .map(|p| p.bbox())
            .reduce(Rect::bounding_rect)
    }
}
