#![allow(dead_code)]
use forest_domains::prelude::*;
use forest_domains::topology::{Dim, SupportedDim};

pub fn cell2(block: usize, level: u8, x: u32, y: u32) -> TreeCell<2> {
    TreeCell {
        block,
        level,
        coords: [x, y],
    }
}

pub fn cell3(block: usize, level: u8, x: u32, y: u32, z: u32) -> TreeCell<3> {
    TreeCell {
        block,
        level,
        coords: [x, y, z],
    }
}

/// Full domain sequence of one rank's view, finest first.
pub fn domains_of<const D: usize, F: ForestView<D>>(view: F, ns: [usize; D]) -> Vec<Domain<D>>
where
    Dim<D>: SupportedDim,
{
    let config = PatchConfig::new(ns, 1).unwrap();
    DomainGenerator::new(view, config, UnitBlockMap)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

/// Full domain sequence of the whole forest on a single rank.
pub fn serial_domains<const D: usize>(forest: &Forest<D>) -> Vec<Domain<D>>
where
    Dim<D>: SupportedDim,
{
    domains_of(forest.serial_view(), [4; D])
}

/// The local patch covering exactly `cell`.
pub fn patch_at<const D: usize>(domain: &Domain<D>, cell: TreeCell<D>) -> &Patch<D>
where
    Dim<D>: SupportedDim,
{
    domain
        .patches()
        .iter()
        .find(|p| *p.cell() == cell)
        .unwrap_or_else(|| panic!("no patch for {cell:?} at level {}", domain.level()))
}

/// Parent/child links between two consecutive single-rank domains agree.
pub fn assert_links_consistent<const D: usize>(fine: &Domain<D>, coarse: &Domain<D>)
where
    Dim<D>: SupportedDim,
{
    assert_eq!(coarse.level() + 1, fine.level());
    for child in fine.patches() {
        let parent_id = child.parent_id.expect("every patch below level 0 has a parent");
        let parent = coarse.patch(parent_id).expect("parent is local on a single rank");
        assert_eq!(child.parent_rank, Some(parent.rank));
        let slot = if child.has_coarse_parent() {
            child.orth_on_parent.index()
        } else {
            0
        };
        assert_eq!(parent.child_ids[slot], Some(child.id), "child {} of {}", child.id, parent.id);
        assert_eq!(parent.child_ranks[slot], Some(child.rank));
    }
    for parent in coarse.patches() {
        for id in parent.child_ids.iter().flatten() {
            assert_eq!(fine.patch(*id).and_then(|c| c.parent_id), Some(parent.id));
        }
    }
}

/// Every side neighbor record is answered by a matching record on the other
/// patch across the opposite side. Requires all patches to be local and all
/// block links to be unrotated.
pub fn assert_side_symmetry<const D: usize>(domain: &Domain<D>)
where
    Dim<D>: SupportedDim,
{
    for patch in domain.patches() {
        for side in Side::<D>::values() {
            let info = patch.nbr_info(side).unwrap();
            for id in info.ids() {
                let other = domain.patch(id).unwrap();
                let back = other.nbr_info(side.opposite()).unwrap();
                let expected = match info.nbr_type() {
                    Some(NbrType::Normal) => NbrType::Normal,
                    Some(NbrType::Coarse) => NbrType::Fine,
                    Some(NbrType::Fine) => NbrType::Coarse,
                    None => unreachable!(),
                };
                assert_eq!(back.nbr_type(), Some(expected), "{} {side} -> {id}", patch.id);
                assert!(back.ids().contains(&patch.id), "{} {side} -> {id}", patch.id);
            }
        }
    }
}
