mod util;

use forest_domains::prelude::*;
use util::*;

fn refined_bsw() -> OctForest {
    let mut forest = OctForest::uniform(Connectivity::unit(), 1).unwrap();
    forest.refine_cells(&[cell3(0, 1, 0, 0, 0)]).unwrap();
    forest
}

#[test]
fn uniform_octants_see_each_other() {
    let forest = OctForest::uniform(Connectivity::unit(), 1).unwrap();
    let domains = serial_domains(&forest);
    assert_eq!(domains.len(), 2);
    let fine = &domains[0];
    assert_eq!(fine.num_global_patches(), 8);

    for (i, patch) in fine.patches().iter().enumerate() {
        assert_eq!(patch.id, i);
        assert_eq!(patch.side_nbrs().iter().filter(|n| !n.is_absent()).count(), 3);
        // one edge neighbor per axis, one corner neighbor
        assert_eq!(patch.edge_nbrs().iter().filter(|n| !n.is_absent()).count(), 3);
        let corners: Vec<_> = Corner::<3>::values().filter(|&c| patch.has_nbr(c)).collect();
        assert_eq!(corners, vec![Corner::<3>::new(7 - i).unwrap()]);
        assert_eq!(patch.orth_on_parent, Orthant::<3>::from_index(i));
    }

    let bsw = &fine.patches()[0];
    assert_eq!(bsw.normal_nbr_info(Side::<3>::EAST).unwrap().id, 1);
    assert_eq!(bsw.normal_nbr_info(Side::<3>::NORTH).unwrap().id, 2);
    assert_eq!(bsw.normal_nbr_info(Side::<3>::TOP).unwrap().id, 4);
    assert_eq!(bsw.normal_nbr_info(Edge::<3>::TN).unwrap().id, 6);
    assert_eq!(bsw.normal_nbr_info(Edge::<3>::TE).unwrap().id, 5);
    assert_eq!(bsw.normal_nbr_info(Edge::<3>::NE).unwrap().id, 3);
    assert_eq!(bsw.normal_nbr_info(Corner::<3>::TNE).unwrap().id, 7);
    assert!(!bsw.has_nbr(Edge::<3>::BS));

    let root = &domains[1].patches()[0];
    assert_eq!(root.child_ids, (0..8).map(Some).collect::<Vec<_>>());
    assert_eq!(root.num_cells(), 64);
    assert_links_consistent(fine, &domains[1]);
    assert_side_symmetry(fine);
}

#[test]
fn refined_octant_faces() {
    let forest = refined_bsw();
    let domains = serial_domains(&forest);
    let counts: Vec<_> = domains.iter().map(|d| d.num_global_patches()).collect();
    assert_eq!(counts, vec![15, 8, 1]);
    let finest = &domains[0];

    let bse = patch_at(finest, cell3(0, 1, 1, 0, 0));
    assert_eq!(bse.id, 8);
    let west = bse.fine_nbr_info(Side::<3>::WEST).unwrap();
    assert_eq!(west.ids, vec![1, 3, 5, 7]);
    assert_eq!(west.ranks, vec![0; 4]);

    let tne_child = patch_at(finest, cell3(0, 2, 1, 1, 1));
    assert_eq!(tne_child.id, 7);
    let east = tne_child.coarse_nbr_info(Side::<3>::EAST).unwrap();
    assert_eq!((east.id, east.orth_on_coarse), (8, Orthant::<2>::NE));
    let top = tne_child.coarse_nbr_info(Side::<3>::TOP).unwrap();
    assert_eq!((top.id, top.orth_on_coarse), (11, Orthant::<2>::NE));

    let bsw_child = patch_at(finest, cell3(0, 2, 0, 0, 0));
    assert!(!bsw_child.has_nbr(Side::<3>::WEST));
    assert_eq!(bsw_child.normal_nbr_info(Side::<3>::EAST).unwrap().id, 1);

    for domain in &domains {
        assert_side_symmetry(domain);
    }
    for pair in domains.windows(2) {
        assert_links_consistent(&pair[0], &pair[1]);
    }
}

#[test]
fn refined_octant_edges_and_corners() {
    let forest = refined_bsw();
    let finest = &serial_domains(&forest)[0];

    let bne = patch_at(finest, cell3(0, 1, 1, 1, 0));
    assert_eq!(bne.id, 10);
    assert_eq!(bne.fine_nbr_info(Edge::<3>::SW).unwrap().ids, vec![3, 7]);

    let lower = patch_at(finest, cell3(0, 2, 1, 1, 0));
    let edge = lower.coarse_nbr_info(Edge::<3>::NE).unwrap();
    assert_eq!((edge.id, edge.orth_on_coarse), (10, Orthant::<1>::LOWER));
    let upper = patch_at(finest, cell3(0, 2, 1, 1, 1));
    let edge = upper.coarse_nbr_info(Edge::<3>::NE).unwrap();
    assert_eq!((edge.id, edge.orth_on_coarse), (10, Orthant::<1>::UPPER));

    // not along the coarse patch's edge: the edge hangs on a face
    let bse_child = patch_at(finest, cell3(0, 2, 1, 0, 0));
    assert!(!bse_child.has_nbr(Edge::<3>::NE));
    assert_eq!(
        bse_child.coarse_nbr_info(Side::<3>::EAST).unwrap().orth_on_coarse,
        Orthant::<2>::SW
    );

    let tne = patch_at(finest, cell3(0, 1, 1, 1, 1));
    assert_eq!(tne.id, 14);
    assert_eq!(tne.fine_nbr_info(Corner::<3>::BSW).unwrap().ids, vec![7]);
    assert_eq!(upper.coarse_nbr_info(Corner::<3>::TNE).unwrap().id, 14);
    assert!(!lower.has_nbr(Corner::<3>::TNE));
}

#[test]
fn edges_across_brick_blocks() {
    let forest = OctForest::new(Connectivity::brick([2, 2, 1], [false; 3]).unwrap());
    let domains = serial_domains(&forest);
    assert_eq!(domains.len(), 1);
    let b0 = &domains[0].patches()[0];
    assert_eq!(b0.normal_nbr_info(Side::<3>::EAST).unwrap().id, 1);
    assert_eq!(b0.normal_nbr_info(Side::<3>::NORTH).unwrap().id, 2);
    assert_eq!(b0.normal_nbr_info(Edge::<3>::NE).unwrap().id, 3);
    assert!(!b0.has_nbr(Edge::<3>::TE));
    assert!(!b0.has_nbr(Side::<3>::TOP));
    assert!(b0.corner_nbrs().iter().all(NbrInfo::is_absent));
    assert_eq!(b0.nbr_ids(), vec![1, 2, 3]);
}
