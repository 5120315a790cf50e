mod util;

use forest_domains::prelude::*;
use util::*;

fn refined_sw() -> QuadForest {
    let mut forest = QuadForest::uniform(Connectivity::unit(), 1).unwrap();
    forest.refine_cells(&[cell2(0, 1, 0, 0)]).unwrap();
    forest
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

#[test]
fn single_root_block() {
    let forest = QuadForest::new(Connectivity::unit());
    let config = PatchConfig::new([10, 10], 1).unwrap();
    let mut generator = DomainGenerator::new(forest.serial_view(), config, UnitBlockMap).unwrap();

    let domain = generator.finest_domain().unwrap();
    assert_eq!((domain.id(), domain.level()), (0, 0));
    assert_eq!(domain.num_local_patches(), 1);
    assert_eq!(domain.num_global_patches(), 1);
    assert_eq!(domain.num_global_cells(), 100);

    let patch = &domain.patches()[0];
    assert_eq!((patch.id, patch.rank, patch.local_index), (0, 0, 0));
    assert_eq!(patch.parent_id, None);
    assert!(patch.child_ids.iter().all(Option::is_none));
    assert_eq!(patch.starts, [0.0, 0.0]);
    assert!(patch.spacings.iter().all(|&h| approx(h, 0.1)));
    assert!(patch.nbr_ids().is_empty());
    assert!(Side::<2>::values().all(|s| !patch.has_nbr(s)));
    assert!(Corner::<2>::values().all(|c| !patch.has_nbr(c)));

    assert!(!generator.has_coarser_domain());
    assert_eq!(
        generator.coarser_domain().unwrap_err(),
        DomainError::GeneratorExhausted
    );
}

#[test]
fn uniform_level_one() {
    let forest = QuadForest::uniform(Connectivity::unit(), 1).unwrap();
    let domains = serial_domains(&forest);
    assert_eq!(domains.len(), 2);
    let (fine, coarse) = (&domains[0], &domains[1]);
    assert_eq!(fine.num_global_patches(), 4);

    for (i, patch) in fine.patches().iter().enumerate() {
        assert_eq!(patch.id, i);
        let normal_sides = Side::<2>::values()
            .filter(|&s| patch.nbr_type(s).unwrap() == Some(NbrType::Normal))
            .count();
        assert_eq!(normal_sides, 2, "patch {i}");
        let corners: Vec<_> = Corner::<2>::values().filter(|&c| patch.has_nbr(c)).collect();
        // the only corner neighbor is diagonally across the block center
        assert_eq!(corners, vec![Corner::<2>::new(3 - i).unwrap()]);
        assert_eq!(patch.normal_nbr_info(corners[0]).unwrap().id, 3 - i);
        assert_eq!(patch.parent_id, Some(0));
        assert_eq!(patch.orth_on_parent, Orthant::<2>::from_index(i));
    }
    let sw = &fine.patches()[0];
    assert_eq!(sw.normal_nbr_info(Side::<2>::EAST).unwrap().id, 1);
    assert_eq!(sw.normal_nbr_info(Side::<2>::NORTH).unwrap().id, 2);
    assert!(!sw.has_nbr(Side::<2>::WEST));

    assert_eq!((coarse.id(), coarse.level()), (1, 0));
    let root = &coarse.patches()[0];
    assert_eq!(root.id, 0);
    assert_eq!(
        root.child_ids,
        vec![Some(0), Some(1), Some(2), Some(3)]
    );
    assert!(!root.has_coarse_parent());
    assert_eq!(root.spacings, [0.25, 0.25]);
    assert_links_consistent(fine, coarse);
    assert_side_symmetry(fine);
}

#[test]
fn refined_quadrant_sequence() {
    let forest = refined_sw();
    let domains = serial_domains(&forest);
    let counts: Vec<_> = domains.iter().map(|d| d.num_global_patches()).collect();
    assert_eq!(counts, vec![7, 4, 1]);
    let ids: Vec<_> = domains.iter().map(|d| (d.id(), d.level())).collect();
    assert_eq!(ids, vec![(0, 2), (1, 1), (2, 0)]);
    for pair in domains.windows(2) {
        assert_links_consistent(&pair[0], &pair[1]);
    }
    for domain in &domains {
        assert_side_symmetry(domain);
    }
}

#[test]
fn refined_quadrant_neighbors() {
    let forest = refined_sw();
    let domains = serial_domains(&forest);
    let finest = &domains[0];

    let se = patch_at(finest, cell2(0, 1, 1, 0));
    assert_eq!(se.id, 4);
    assert_eq!(se.fine_nbr_info(Side::<2>::WEST).unwrap().ids, vec![1, 3]);

    let sw_se = patch_at(finest, cell2(0, 2, 1, 0));
    let east = sw_se.coarse_nbr_info(Side::<2>::EAST).unwrap();
    assert_eq!((east.id, east.orth_on_coarse), (4, Orthant::<1>::LOWER));
    // the NE corner of sw_se hangs on the middle of se's west side
    assert!(!sw_se.has_nbr(Corner::<2>::NE));

    let sw_ne = patch_at(finest, cell2(0, 2, 1, 1));
    let east = sw_ne.coarse_nbr_info(Side::<2>::EAST).unwrap();
    assert_eq!((east.id, east.orth_on_coarse), (4, Orthant::<1>::UPPER));
    let north = sw_ne.coarse_nbr_info(Side::<2>::NORTH).unwrap();
    assert_eq!((north.id, north.orth_on_coarse), (5, Orthant::<1>::UPPER));
    assert_eq!(sw_ne.coarse_nbr_info(Corner::<2>::NE).unwrap().id, 6);

    let nw = patch_at(finest, cell2(0, 1, 0, 1));
    assert_eq!(nw.fine_nbr_info(Side::<2>::SOUTH).unwrap().ids, vec![2, 3]);
    let sw_nw = patch_at(finest, cell2(0, 2, 0, 1));
    let north = sw_nw.coarse_nbr_info(Side::<2>::NORTH).unwrap();
    assert_eq!((north.id, north.orth_on_coarse), (5, Orthant::<1>::LOWER));

    let ne = patch_at(finest, cell2(0, 1, 1, 1));
    assert_eq!(ne.fine_nbr_info(Corner::<2>::SW).unwrap().ids, vec![3]);
    assert_eq!(ne.nbr_ids(), vec![3, 4, 5]);
}

#[test]
fn leaves_are_carried_to_finer_domains() {
    let forest = refined_sw();
    let domains = serial_domains(&forest);

    let se = patch_at(&domains[0], cell2(0, 1, 1, 0));
    assert_eq!(se.parent_id, Some(4));
    assert_eq!(se.parent_rank, Some(0));
    assert!(se.orth_on_parent.is_null());
    assert_eq!(se.refine_level, 1);
    assert_eq!(se.spacings, [0.125, 0.125]);

    let level1 = &domains[1];
    let sw = patch_at(level1, cell2(0, 1, 0, 0));
    assert_eq!(sw.id, 0);
    assert_eq!(sw.child_ids, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(sw.orth_on_parent, Orthant::<2>::SW);
    let se = patch_at(level1, cell2(0, 1, 1, 0));
    assert_eq!(se.child_ids, vec![Some(4), None, None, None]);
    assert_eq!(se.orth_on_parent, Orthant::<2>::SE);
    // once merged, the sw patch is a plain normal neighbor
    assert_eq!(se.normal_nbr_info(Side::<2>::WEST).unwrap().id, 0);

    let root = &domains[2].patches()[0];
    assert_eq!(root.child_ids, vec![Some(0), Some(4), Some(5), Some(6)]);
}

#[test]
fn brick_of_two_blocks() {
    let forest = QuadForest::uniform(Connectivity::brick([2, 1], [false; 2]).unwrap(), 1).unwrap();
    let domains = serial_domains(&forest);
    let (fine, coarse) = (&domains[0], &domains[1]);
    assert_eq!(fine.num_global_patches(), 8);
    assert_eq!(coarse.num_global_patches(), 2);

    let b0_se = patch_at(fine, cell2(0, 1, 1, 0));
    assert_eq!(b0_se.id, 1);
    assert_eq!(b0_se.normal_nbr_info(Side::<2>::EAST).unwrap().id, 4);
    assert_eq!(b0_se.normal_nbr_info(Corner::<2>::NE).unwrap().id, 6);
    let b1_sw = patch_at(fine, cell2(1, 1, 0, 0));
    assert_eq!(b1_sw.id, 4);
    assert_eq!(b1_sw.normal_nbr_info(Side::<2>::WEST).unwrap().id, 1);

    let ids: Vec<_> = coarse.patches().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 4]);
    let b0 = &coarse.patches()[0];
    assert_eq!(b0.normal_nbr_info(Side::<2>::EAST).unwrap().id, 4);
    assert!(!b0.has_nbr(Side::<2>::WEST));
    assert_links_consistent(fine, coarse);
    assert_side_symmetry(fine);
    assert_side_symmetry(coarse);
}

#[test]
fn brick_geometry_follows_block_map() {
    let forest = QuadForest::uniform(Connectivity::brick([2, 1], [false; 2]).unwrap(), 1).unwrap();
    let block_map = BrickBlockMap::new([2, 1], [0.0, 0.0], [2.0, 1.0]).unwrap();
    let config = PatchConfig::new([5, 5], 1).unwrap();
    let domains: Vec<_> = DomainGenerator::new(forest.serial_view(), config, block_map)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let fine = &domains[0];
    let b1_ne = patch_at(fine, cell2(1, 1, 1, 1));
    assert_eq!(b1_ne.starts, [1.5, 0.5]);
    assert!(b1_ne.spacings.iter().all(|&h| approx(h, 0.1)));
    let total: f64 = fine.local_volume();
    assert!(approx(total, 2.0));

    let coarse = &domains[1];
    let b1 = &coarse.patches()[1];
    assert_eq!(b1.starts, [1.0, 0.0]);
    assert!(b1.spacings.iter().all(|&h| approx(h, 0.2)));
    assert!(approx(coarse.local_volume(), 2.0));
}

#[test]
fn closure_block_map() {
    let forest = QuadForest::uniform(Connectivity::unit(), 1).unwrap();
    let stretch = |_block: usize, x: [f64; 2]| [4.0 * x[0], 2.0 + x[1]];
    let config = PatchConfig::new([2, 4], 0).unwrap();
    let domain = DomainGenerator::new(forest.serial_view(), config, stretch)
        .unwrap()
        .finest_domain()
        .unwrap();
    let ne = patch_at(&domain, cell2(0, 1, 1, 1));
    assert_eq!(ne.starts, [2.0, 2.5]);
    assert_eq!(ne.spacings, [1.0, 0.125]);
    assert_eq!(ne.num_ghost_cells, 0);
}

#[test]
fn mirrored_block_map() {
    let forest = QuadForest::uniform(Connectivity::unit(), 1).unwrap();
    let mirror = |_block: usize, x: [f64; 2]| [1.0 - x[0], x[1]];
    let config = PatchConfig::new([4, 4], 1).unwrap();
    let domains: Vec<_> = DomainGenerator::new(forest.serial_view(), config, mirror)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(domains.len(), 2);

    let sw = patch_at(&domains[0], cell2(0, 1, 0, 0));
    assert_eq!(sw.starts, [1.0, 0.0]);
    assert_eq!(sw.spacings, [-0.125, 0.125]);
    assert_eq!(sw.volume(), 0.25);
    for domain in &domains {
        assert!((domain.local_volume() - 1.0).abs() < 1e-12);
    }
    assert_eq!(domains[1].patches()[0].spacings, [-0.25, 0.25]);
}

#[test]
fn periodic_brick_wraps_around() {
    let conn = Connectivity::brick([2, 1], [true, false]).unwrap();
    let forest = QuadForest::uniform(conn, 1).unwrap();
    let domains = serial_domains(&forest);

    let b1_se = patch_at(&domains[0], cell2(1, 1, 1, 0));
    assert_eq!(b1_se.normal_nbr_info(Side::<2>::EAST).unwrap().id, 0);
    assert_eq!(b1_se.normal_nbr_info(Corner::<2>::NE).unwrap().id, 2);
    assert!(!b1_se.has_nbr(Side::<2>::SOUTH));

    let b0 = &domains[1].patches()[0];
    assert_eq!(b0.normal_nbr_info(Side::<2>::WEST).unwrap().id, 4);
    assert_eq!(b0.normal_nbr_info(Side::<2>::EAST).unwrap().id, 4);
    for domain in &domains {
        assert_side_symmetry(domain);
    }
}

#[test]
fn refinement_across_a_block_boundary() {
    let mut forest =
        QuadForest::uniform(Connectivity::brick([2, 1], [false; 2]).unwrap(), 1).unwrap();
    forest.refine_cells(&[cell2(1, 1, 0, 0)]).unwrap();
    assert!(forest.is_balanced());
    let domains = serial_domains(&forest);
    assert_eq!(
        domains.iter().map(|d| d.num_global_patches()).collect::<Vec<_>>(),
        vec![11, 8, 2]
    );

    let finest = &domains[0];
    let b0_se = patch_at(finest, cell2(0, 1, 1, 0));
    // block 1's refined SW quadrant: ids 4 (SW) and 6 (NW) touch block 0
    assert_eq!(b0_se.fine_nbr_info(Side::<2>::EAST).unwrap().ids, vec![4, 6]);
    let b1_nw_of_sw = patch_at(finest, cell2(1, 2, 0, 1));
    let west = b1_nw_of_sw.coarse_nbr_info(Side::<2>::WEST).unwrap();
    assert_eq!((west.id, west.orth_on_coarse), (1, Orthant::<1>::UPPER));
    for pair in domains.windows(2) {
        assert_links_consistent(&pair[0], &pair[1]);
    }
}

#[test]
fn unbalanced_forest_is_fatal() {
    let mut forest = refined_sw();
    forest.refine_cells(&[cell2(0, 2, 1, 1)]).unwrap();
    assert!(!forest.is_balanced());

    let config = PatchConfig::new([4, 4], 1).unwrap();
    let mut generator = DomainGenerator::new(forest.serial_view(), config, UnitBlockMap).unwrap();
    let err = generator.next().unwrap().unwrap_err();
    assert!(matches!(err, DomainError::UnbalancedForest { block: 0, level: 3, .. }));
    assert!(err.is_fatal());
    assert!(generator.next().is_none());

    forest.balance().unwrap();
    let domains = serial_domains(&forest);
    assert_eq!(domains.len(), 4);
    assert_eq!(domains[3].num_global_patches(), 1);
}

#[test]
fn json_export_shape() {
    let forest = refined_sw();
    let domains = serial_domains(&forest);
    let value = serde_json::to_value(&domains[0]).unwrap();

    assert_eq!(value["id"], 0);
    assert_eq!(value["level"], 2);
    assert_eq!(value["ns"], serde_json::json!([4, 4]));
    assert_eq!(value["num_ghost_cells"], 1);
    assert_eq!(value["num_global_patches"], 7);
    let patches = value["patches"].as_array().unwrap();
    assert_eq!(patches.len(), 7);

    let sw_se = &patches[1];
    assert_eq!(sw_se["id"], 1);
    assert_eq!(sw_se["orth_on_parent"], "SE");
    assert_eq!(sw_se["side_nbrs"][1]["type"], "COARSE");
    assert_eq!(sw_se["side_nbrs"][1]["id"], 4);
    assert_eq!(sw_se["side_nbrs"][1]["orth_on_coarse"], "LOWER");
    assert_eq!(sw_se["side_nbrs"][0]["type"], "NORMAL");
    assert_eq!(sw_se["side_nbrs"][2]["type"], "ABSENT");

    let se = &patches[4];
    assert_eq!(se["orth_on_parent"], serde_json::Value::Null);
    assert_eq!(se["side_nbrs"][0]["type"], "FINE");
    assert_eq!(se["side_nbrs"][0]["ids"], serde_json::json!([1, 3]));
}
