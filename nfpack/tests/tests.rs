#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use float_cmp::approx_eq;
    use test_case::test_case;

    use nfpack::entities::{Bin, Item};
    use nfpack::geometry::primitives::{Circle, Point, Polygon, Rect, SPolygon};
    use nfpack::placer::{Alignment, NfpPlacer, PlacerConfig};
    use nfpack::selector::{FirstFitConfig, FirstFitSelection};

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn rect_item(id: usize, w: f64, h: f64, priority: i32) -> Item {
        let outer = SPolygon::new(vec![
            Point(0.0, 0.0),
            Point(w, 0.0),
            Point(w, h),
            Point(0.0, h),
        ])
        .unwrap();
        Item::new(id, Polygon::from_outer(outer), priority)
    }

    fn square_item(id: usize, side: f64, priority: i32) -> Item {
        rect_item(id, side, side, priority)
    }

    fn box_bin(w: f64, h: f64) -> Bin {
        Bin::Rect(Rect::try_new(0.0, 0.0, w, h).unwrap())
    }

    fn serial_config() -> PlacerConfig {
        PlacerConfig {
            parallel: false,
            accuracy: 1.0,
            ..PlacerConfig::default()
        }
    }

    fn to_geo_polygon(item: &Item) -> geo_types::Polygon<f64> {
        let points: Vec<(f64, f64)> = item
            .transformed()
            .shape
            .outer
            .points
            .iter()
            .map(|p| (p.0, p.1))
            .collect();
        geo_types::Polygon::new(geo_types::LineString::from(points), vec![])
    }

    fn overlap_area(a: &Item, b: &Item) -> f64 {
        use geo::{Area, BooleanOps};
        to_geo_polygon(a)
            .intersection(&to_geo_polygon(b))
            .unsigned_area()
    }

    fn assert_inside_box_bin(item: &Item, bin: &Bin) {
        let bb = bin.bbox();
        for p in &item.transformed().shape.outer.points {
            assert!(
                p.0 >= bb.x_min - 1e-6
                    && p.0 <= bb.x_max + 1e-6
                    && p.1 >= bb.y_min - 1e-6
                    && p.1 <= bb.y_max + 1e-6,
                "item {} vertex {p:?} outside bin {bb:?}",
                item.id
            );
        }
    }

    /// S1: four small squares all go into one bin, without overlap, and the
    /// bottom-left alignment pushes the pile into the bin's corner.
    #[test]
    fn four_squares_fill_one_bin() {
        init_logger();
        let bin = box_bin(100.0, 100.0);
        let mut items: Vec<Item> = (0..4).map(|id| square_item(id, 20.0, 0)).collect();

        let pconfig = PlacerConfig {
            alignment: Alignment::BottomLeft,
            starting_point: Alignment::BottomLeft,
            ..serial_config()
        };

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &pconfig);

        assert_eq!(selection.packed_bins().len(), 1);
        for item in &items {
            assert_eq!(item.bin_id, Some(0));
            assert_inside_box_bin(item, &bin);
        }
        for i in 0..items.len() {
            for j in i + 1..items.len() {
                let overlap = overlap_area(&items[i], &items[j]);
                assert!(overlap < 1e-6, "items {i} and {j} overlap by {overlap}");
            }
        }

        //the aligned pile touches the bin's bottom-left corner
        let pile_bb = items
            .iter()
            .map(|i| i.bbox())
            .reduce(Rect::bounding_rect)
            .unwrap();
        assert!(approx_eq!(f64, pile_bb.x_min, 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f64, pile_bb.y_min, 0.0, epsilon = 1e-6));
    }

    /// S2: two squares that cannot share a bin end up in two bins, in input order.
    #[test]
    fn oversized_pair_opens_a_second_bin() {
        let bin = box_bin(50.0, 50.0);
        let mut items = vec![square_item(0, 40.0, 0), square_item(1, 40.0, 0)];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        assert_eq!(selection.packed_bins().len(), 2);
        assert_eq!(items[0].bin_id, Some(0));
        assert_eq!(items[1].bin_id, Some(1));
        assert_eq!(selection.packed_bins()[0].len(), 1);
        assert_eq!(selection.packed_bins()[1].len(), 1);
    }

    /// S3: an item that fits no bin is dropped or left unpacked, and never reported as progress.
    #[test_case(true; "verified items are dropped")]
    #[test_case(false; "unverified items are left unpacked")]
    fn unpackable_item_is_never_packed(verify_items: bool) {
        init_logger();
        let bin = Bin::Circle(Circle::new(Point(0.0, 0.0), 30.0));
        let mut items = vec![square_item(0, 50.0, 0)];

        let progress_calls = Arc::new(AtomicUsize::new(0));
        let progress_calls_cb = progress_calls.clone();

        let mut selection = FirstFitSelection::new();
        selection.configure(FirstFitConfig {
            verify_items,
            ..FirstFitConfig::default()
        });
        selection.set_progress(Arc::new(move |_| {
            progress_calls_cb.fetch_add(1, Ordering::Relaxed);
        }));
        selection.pack_items(&mut items, &bin, &serial_config());

        assert_eq!(items[0].bin_id, None);
        assert_eq!(progress_calls.load(Ordering::Relaxed), 0);
        assert!(selection.packed_bins().iter().all(|b| b.is_empty()));
    }

    /// S4: with two allowed rotations scoring equally, the earlier rotation wins.
    #[test]
    fn rotation_ties_break_towards_the_first() {
        let bin = box_bin(100.0, 100.0);
        let mut items = vec![rect_item(0, 10.0, 80.0, 5)];

        let pconfig = PlacerConfig {
            rotations: vec![0.0, FRAC_PI_2],
            ..serial_config()
        };

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &pconfig);

        assert_eq!(items[0].bin_id, Some(0));
        assert!(approx_eq!(f64, items[0].rotation(), 0.0, epsilon = 1e-9));
    }

    /// S5: all scheduling modes produce identical packings; first-fit discipline is
    /// independent of how the per-bin work is scheduled.
    #[test]
    fn scheduling_modes_agree() {
        let run = |selector_config: FirstFitConfig| -> Vec<(Option<usize>, Point, f64)> {
            let bin = box_bin(50.0, 50.0);
            let mut items = vec![
                square_item(0, 30.0, 0),
                square_item(1, 30.0, 0),
                square_item(2, 15.0, 0),
                square_item(3, 15.0, 0),
                square_item(4, 10.0, 0),
            ];
            let mut selection = FirstFitSelection::new();
            selection.configure(selector_config);
            selection.pack_items(&mut items, &bin, &serial_config());
            items
                .iter()
                .map(|i| (i.bin_id, i.translation(), i.rotation()))
                .collect()
        };

        let serial = run(FirstFitConfig::default());
        let one_ahead = run(FirstFitConfig {
            texture_parallel: true,
            ..FirstFitConfig::default()
        });
        let hard = run(FirstFitConfig {
            texture_parallel_hard: true,
            ..FirstFitConfig::default()
        });

        assert_eq!(serial, one_ahead);
        assert_eq!(serial, hard);
    }

    /// S6: preloaded items keep their transformations; new items pack around them.
    #[test]
    fn preloaded_items_are_untouched() {
        let bin = box_bin(100.0, 100.0);

        let mut preloaded: Vec<Item> = (0..3)
            .map(|id| {
                let mut item = square_item(id, 20.0, 0).into_fixed(0);
                item.set_translation(Point(5.0 + 25.0 * id as f64, 5.0));
                item
            })
            .collect();
        let preloaded_placements: Vec<(Point, f64)> = preloaded
            .iter()
            .map(|i| (i.translation(), i.rotation()))
            .collect();

        let mut items = preloaded.drain(..).collect::<Vec<_>>();
        items.push(square_item(3, 15.0, 0));
        items.push(square_item(4, 15.0, 0));

        let pconfig = PlacerConfig {
            alignment: Alignment::DontAlign,
            ..serial_config()
        };

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &pconfig);

        for (item, (translation, rotation)) in items.iter().take(3).zip(&preloaded_placements) {
            assert_eq!(item.translation(), *translation);
            assert_eq!(item.rotation(), *rotation);
            assert_eq!(item.bin_id, Some(0));
        }
        for item in items.iter().skip(3) {
            assert_eq!(item.bin_id, Some(0));
            assert_inside_box_bin(item, &bin);
        }
        for i in 0..items.len() {
            for j in i + 1..items.len() {
                let overlap = overlap_area(&items[i], &items[j]);
                assert!(overlap < 1e-6, "items {i} and {j} overlap by {overlap}");
            }
        }
    }

    /// Property 3: a later, smaller item goes into the lowest-indexed bin that accepts it.
    #[test]
    fn first_fit_prefers_the_lowest_bin() {
        let bin = box_bin(50.0, 50.0);
        let mut items = vec![
            square_item(0, 40.0, 0),
            square_item(1, 40.0, 0),
            square_item(2, 10.0, 0),
        ];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        //the two large squares occupy bins 0 and 1; the small one fits next to the first
        assert_eq!(items[0].bin_id, Some(0));
        assert_eq!(items[1].bin_id, Some(1));
        assert_eq!(items[2].bin_id, Some(0));
    }

    /// Property 8: serial runs are deterministic.
    #[test]
    fn serial_runs_are_deterministic() {
        let run = || -> Vec<(Option<usize>, Point, f64)> {
            let bin = box_bin(60.0, 60.0);
            let mut items = vec![
                rect_item(0, 30.0, 12.0, 0),
                rect_item(1, 25.0, 18.0, 0),
                square_item(2, 20.0, 0),
                rect_item(3, 40.0, 8.0, 0),
            ];
            let mut selection = FirstFitSelection::new();
            selection.pack_items(&mut items, &bin, &serial_config());
            items
                .iter()
                .map(|i| (i.bin_id, i.translation(), i.rotation()))
                .collect()
        };

        assert_eq!(run(), run());
    }

    /// Property 9: the progress callback fires once per packed item, strictly decreasing.
    #[test]
    fn progress_is_strictly_decreasing() {
        let bin = box_bin(100.0, 100.0);
        let mut items: Vec<Item> = (0..4).map(|id| square_item(id, 20.0, 0)).collect();

        let reported = Arc::new(Mutex::new(Vec::new()));
        let reported_cb = reported.clone();

        let mut selection = FirstFitSelection::new();
        selection.set_progress(Arc::new(move |remaining| {
            reported_cb.lock().unwrap().push(remaining);
        }));
        selection.pack_items(&mut items, &bin, &serial_config());

        let reported = reported.lock().unwrap();
        assert_eq!(reported.len(), 4);
        assert!(reported.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(*reported.last().unwrap(), 0);
    }

    /// Items are packed in descending (priority, area) order.
    #[test]
    fn priority_beats_area() {
        let bin = box_bin(50.0, 50.0);
        //the small square has the higher priority, so it must claim bin 0 first
        let mut items = vec![square_item(0, 40.0, 0), square_item(1, 10.0, 7)];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        assert_eq!(items[1].bin_id, Some(0));
        //the large square still fits beside it in the same bin
        assert_eq!(items[0].bin_id, Some(0));
    }

    /// Cancellation between items retains all progress made so far.
    #[test]
    fn cancellation_stops_between_items() {
        let bin = box_bin(100.0, 100.0);
        let mut items: Vec<Item> = (0..3).map(|id| square_item(id, 20.0, 0)).collect();

        let packed_count = Arc::new(AtomicUsize::new(0));
        let packed_count_progress = packed_count.clone();
        let packed_count_stop = packed_count.clone();

        let mut selection = FirstFitSelection::new();
        selection.set_progress(Arc::new(move |_| {
            packed_count_progress.fetch_add(1, Ordering::Relaxed);
        }));
        selection.set_stop_condition(Arc::new(move || {
            packed_count_stop.load(Ordering::Relaxed) >= 1
        }));
        selection.pack_items(&mut items, &bin, &serial_config());

        let n_packed = items.iter().filter(|i| i.bin_id.is_some()).count();
        assert_eq!(n_packed, 1);
        assert_eq!(selection.packed_bins()[0].len(), 1);
    }

    /// The observer callbacks fire around every placement attempt.
    #[test]
    fn packing_callbacks_fire() {
        let bin = box_bin(100.0, 100.0);
        let before = Arc::new(AtomicUsize::new(0));
        let after = Arc::new(AtomicUsize::new(0));
        let before_cb = before.clone();
        let after_cb = after.clone();

        let pconfig = PlacerConfig {
            before_packing: Some(Arc::new(move |_, _, _| {
                before_cb.fetch_add(1, Ordering::Relaxed);
            })),
            after_packing: Some(Arc::new(move |_, _, _| {
                after_cb.fetch_add(1, Ordering::Relaxed);
            })),
            ..serial_config()
        };

        let mut items = vec![square_item(0, 20.0, 0), square_item(1, 20.0, 0)];
        let mut selection = FirstFitSelection::new();
        selection.configure(FirstFitConfig {
            verify_items: false,
            ..FirstFitConfig::default()
        });
        selection.pack_items(&mut items, &bin, &pconfig);

        assert_eq!(before.load(Ordering::Relaxed), after.load(Ordering::Relaxed));
        assert!(before.load(Ordering::Relaxed) >= 2);
    }

    /// A moderate item packs into a circular bin.
    #[test]
    fn circle_bin_accepts_a_fitting_item() {
        let bin = Bin::Circle(Circle::new(Point(0.0, 0.0), 30.0));
        let mut items = vec![square_item(0, 20.0, 0)];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        assert_eq!(items[0].bin_id, Some(0));
    }

    /// A small item packs into a polygonal bin.
    #[test]
    fn polygon_bin_accepts_a_fitting_item() {
        let bin = Bin::Polygon(
            SPolygon::new(vec![
                Point(0.0, 0.0),
                Point(60.0, 0.0),
                Point(60.0, 60.0),
                Point(0.0, 60.0),
            ])
            .unwrap(),
        );
        let mut items = vec![square_item(0, 20.0, 0)];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        assert_eq!(items[0].bin_id, Some(0));
    }

    /// The placer is side-effect free until a result is accepted.
    #[test]
    fn try_pack_has_no_side_effects() {
        let mut placer = NfpPlacer::new(box_bin(100.0, 100.0));
        placer.configure(serial_config());

        let first = square_item(0, 20.0, 0);
        let result = placer.try_pack(&first, &[]);
        assert!(result.is_packed());
        assert!(placer.items().is_empty());
        assert!(placer.merged_pile().is_empty());

        placer.accept(result);
        assert_eq!(placer.items().len(), 1);
        assert_eq!(placer.merged_pile().len(), 1);
    }

    #[test]
    fn selector_config_serde_round_trip() {
        let config = FirstFitConfig {
            verify_items: false,
            texture_parallel: true,
            texture_parallel_hard: false,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: FirstFitConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.verify_items, back.verify_items);
        assert_eq!(config.texture_parallel, back.texture_parallel);
        assert_eq!(config.texture_parallel_hard, back.texture_parallel_hard);
    }

    #[test]
    fn svg_export_renders_a_packed_bin() {
        let bin = box_bin(100.0, 100.0);
        let mut items = vec![square_item(0, 20.0, 0), square_item(1, 20.0, 0)];

        let mut selection = FirstFitSelection::new();
        selection.pack_items(&mut items, &bin, &serial_config());

        let document = nfpack::io::packed_bin_to_svg(&bin, &selection.packed_bins()[0]);
        let rendered = document.to_string();
        assert!(rendered.contains("<path"));
        assert!(rendered.contains("viewBox"));
    }

    /// Preloading fires the on_preload observer with the preloaded group.
    #[test]
    fn preload_fires_observer() {
        let preloaded_seen = Arc::new(AtomicUsize::new(0));
        let preloaded_seen_cb = preloaded_seen.clone();

        let mut placer = NfpPlacer::new(box_bin(100.0, 100.0));
        placer.configure(PlacerConfig {
            on_preload: Some(Arc::new(move |group, _config| {
                preloaded_seen_cb.store(group.len(), Ordering::Relaxed);
            })),
            ..serial_config()
        });

        let mut a = square_item(0, 20.0, 0);
        a.set_translation(Point(10.0, 10.0));
        let mut b = square_item(1, 20.0, 0);
        b.set_translation(Point(40.0, 10.0));
        placer.preload(&[a, b]);

        assert_eq!(preloaded_seen.load(Ordering::Relaxed), 2);
        assert_eq!(placer.items().len(), 2);
    }
}
