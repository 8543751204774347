use std::collections::{BTreeSet, HashMap};

use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::error::{CoreError, CoreResult};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bbox {
    /// Lower-left corner.
    pub min: [f64; 2],
    /// Upper-right corner.
    pub max: [f64; 2],
}

impl Bbox {
    /// Create a box from two corners.
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    /// A square centered on `(x, y)` with the given half-width.
    pub fn around(x: f64, y: f64, half_width: f64) -> Self {
        Self {
            min: [x - half_width, y - half_width],
            max: [x + half_width, y + half_width],
        }
    }

    /// Return `true` if the two boxes overlap or touch.
    pub fn intersects(&self, other: &Bbox) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }

    fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(self.min, self.max)
    }
}

type Entry = GeomWithData<Rectangle<[f64; 2]>, EntityId>;

fn entry(id: EntityId, bbox: Bbox) -> Entry {
    GeomWithData::new(Rectangle::from_corners(bbox.min, bbox.max), id)
}

/// Maps entity ids to their footprint boxes and answers box queries.
///
/// Backed by an R*-tree. Every id may have at most one outstanding insert;
/// a delete must name the exact box of that insert. Violations are returned
/// as errors and mean the caller's bookkeeping is broken.
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<Entry>,
    boxes: HashMap<EntityId, Bbox>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("entries", &self.boxes.len())
            .finish()
    }
}

impl SpatialIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity's box.
    pub fn insert(&mut self, id: EntityId, bbox: Bbox) -> CoreResult<()> {
        if self.boxes.contains_key(&id) {
            return Err(CoreError::AlreadyIndexed { id });
        }
        self.tree.insert(entry(id, bbox));
        self.boxes.insert(id, bbox);
        Ok(())
    }

    /// Remove an entity's box. `bbox` must equal the box it was inserted with.
    pub fn delete(&mut self, id: EntityId, bbox: Bbox) -> CoreResult<()> {
        match self.boxes.get(&id) {
            None => return Err(CoreError::NotIndexed { id }),
            Some(stored) if *stored != bbox => return Err(CoreError::BoxMismatch { id }),
            Some(_) => {}
        }
        self.tree
            .remove(&entry(id, bbox))
            .ok_or(CoreError::NotIndexed { id })?;
        self.boxes.remove(&id);
        Ok(())
    }

    /// Return the ids of every entry whose box intersects `bbox`.
    pub fn query(&self, bbox: Bbox) -> BTreeSet<EntityId> {
        self.tree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .map(|e| e.data)
            .collect()
    }

    /// Return `true` if the id currently has an entry.
    pub fn contains(&self, id: EntityId) -> bool {
        self.boxes.contains_key(&id)
    }

    /// The box an id is currently indexed with.
    pub fn get(&self, id: EntityId) -> Option<Bbox> {
        self.boxes.get(&id).copied()
    }

    /// Every indexed id.
    pub fn ids(&self) -> BTreeSet<EntityId> {
        self.boxes.keys().copied().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Return `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.boxes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn everything() -> Bbox {
        Bbox::around(0.0, 0.0, 1.0e9)
    }

    #[test]
    fn insert_then_query() {
        let mut index = SpatialIndex::new();
        index.insert(EntityId(1), Bbox::around(0.0, 0.0, 1.0)).unwrap();
        index.insert(EntityId(-1), Bbox::around(10.0, 10.0, 1.0)).unwrap();

        let hits = index.query(Bbox::around(0.5, 0.5, 1.0));
        assert_eq!(hits.into_iter().collect::<Vec<_>>(), vec![EntityId(1)]);
        assert_eq!(index.query(everything()).len(), 2);
    }

    #[test]
    fn touching_boxes_intersect() {
        let mut index = SpatialIndex::new();
        index.insert(EntityId(0), Bbox::new([0.0, 0.0], [1.0, 1.0])).unwrap();
        assert!(index.query(Bbox::new([1.0, 1.0], [2.0, 2.0])).contains(&EntityId(0)));
        assert!(index.query(Bbox::new([1.5, 1.5], [2.0, 2.0])).is_empty());
    }

    #[test]
    fn delete_then_reinsert_same_id() {
        let mut index = SpatialIndex::new();
        let before = Bbox::around(0.0, 0.0, 2.0);
        let after = Bbox::around(5.0, 5.0, 3.0);
        index.insert(EntityId(4), before).unwrap();
        index.delete(EntityId(4), before).unwrap();
        index.insert(EntityId(4), after).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.get(EntityId(4)), Some(after));
        assert!(index.query(Bbox::around(0.0, 0.0, 0.5)).is_empty());
        assert!(index.query(Bbox::around(5.0, 5.0, 0.5)).contains(&EntityId(4)));
    }

    #[test]
    fn double_insert_is_rejected() {
        let mut index = SpatialIndex::new();
        let b = Bbox::around(0.0, 0.0, 1.0);
        index.insert(EntityId(2), b).unwrap();
        let err = index.insert(EntityId(2), b).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyIndexed { id } if id == EntityId(2)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn delete_of_unknown_id_is_rejected() {
        let mut index = SpatialIndex::new();
        let err = index
            .delete(EntityId(9), Bbox::around(0.0, 0.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotIndexed { .. }));
    }

    #[test]
    fn delete_with_stale_box_is_rejected() {
        let mut index = SpatialIndex::new();
        index.insert(EntityId(3), Bbox::around(0.0, 0.0, 1.0)).unwrap();
        let err = index
            .delete(EntityId(3), Bbox::around(0.0, 0.0, 2.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::BoxMismatch { .. }));
        assert!(index.contains(EntityId(3)));
    }

    #[test]
    fn bbox_intersection() {
        let a = Bbox::around(0.0, 0.0, 1.0);
        assert!(a.intersects(&Bbox::around(1.5, 0.0, 1.0)));
        assert!(!a.intersects(&Bbox::around(3.0, 0.0, 1.0)));
    }

    #[test]
    fn clear_empties_index() {
        let mut index = SpatialIndex::new();
        index.insert(EntityId(0), Bbox::around(0.0, 0.0, 1.0)).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert!(index.query(everything()).is_empty());
    }

    proptest! {
        #[test]
        fn index_matches_live_set(
            ops in prop::collection::vec((0i64..20, -100.0f64..100.0, -100.0f64..100.0, 0.5f64..10.0), 1..200),
        ) {
            let mut index = SpatialIndex::new();
            let mut live: HashMap<EntityId, Bbox> = HashMap::new();
            for (raw, x, y, half) in ops {
                let id = EntityId(raw - 10);
                match live.remove(&id) {
                    Some(bbox) => index.delete(id, bbox).unwrap(),
                    None => {
                        let bbox = Bbox::around(x, y, half);
                        index.insert(id, bbox).unwrap();
                        live.insert(id, bbox);
                    }
                }
            }
            let expected: BTreeSet<EntityId> = live.keys().copied().collect();
            prop_assert_eq!(index.query(everything()), expected.clone());
            prop_assert_eq!(index.ids(), expected);
        }
    }
}
