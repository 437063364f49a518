//! Atomic edits to a group of placed objects
//!
//! A transaction records the state of each object it touches when it is
//! opened. Every change is pushed into the owning cell's editor overlay
//! straight away, so it is visible to drawing and queries while the
//! transaction is still open. Cancelling, or dropping without a commit,
//! puts back the exact records that were found.

use super::{PlacementsEditor, TransactionFlags};
use crate::cell_renderer::{CellRenderer, PlacedObject};
use crate::core::types::{Affine3A, CellId, PlacementGuid};
use crate::math::Aabb;
use crate::scaffold::guid::{allocate_guid, object_id_top_part};
use crate::scaffold::strings::{format_supplements, parse_supplements};

const ID_TOP_MASK: u64 = 0xffff_ffff_0000_0000;
const ID_LOW_MASK: u64 = 0x0000_0000_ffff_ffff;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionType {
    Unchanged,
    Created,
    Deleted,
    Modified,
    /// The object couldn't be found when the transaction was opened
    Error,
}

/// Editable description of one object
#[derive(Clone, Debug, PartialEq)]
pub struct ObjTransDef {
    pub local_to_world: Affine3A,
    pub model: String,
    pub material: String,
    /// Comma separated supplement guids
    pub supplements: String,
    pub transaction: TransactionType,
}

impl ObjTransDef {
    pub fn new(local_to_world: Affine3A, model: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            local_to_world,
            model: model.into(),
            material: material.into(),
            supplements: String::new(),
            transaction: TransactionType::Unchanged,
        }
    }

    fn error() -> Self {
        Self {
            transaction: TransactionType::Error,
            ..Self::new(Affine3A::IDENTITY, "", "")
        }
    }

    fn from_placed(placed: &PlacedObject, cell_to_world: &Affine3A) -> Self {
        Self {
            local_to_world: *cell_to_world * placed.object.local_to_cell(),
            model: placed.model.clone(),
            material: placed.material.clone(),
            supplements: format_supplements(&placed.supplements),
            transaction: TransactionType::Unchanged,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Active,
    Committed,
}

pub struct Transaction<'t, 'e> {
    editor: &'t mut PlacementsEditor<'e>,
    objects: Vec<ObjTransDef>,
    original_state: Vec<ObjTransDef>,
    /// Records exactly as found, None for objects that didn't exist
    snapshots: Vec<Option<PlacedObject>>,
    original_guids: Vec<PlacementGuid>,
    /// Where each object currently lives in its overlay
    pushed_guids: Vec<PlacementGuid>,
    state: State,
}

impl<'t, 'e> Transaction<'t, 'e> {
    pub(super) fn new(editor: &'t mut PlacementsEditor<'e>, guids: &[PlacementGuid], flags: TransactionFlags) -> Self {
        let mut guids = guids.to_vec();
        guids.sort_unstable();
        guids.dedup();

        let mut kept = Vec::with_capacity(guids.len());
        let mut original_state = Vec::with_capacity(guids.len());
        let mut snapshots = Vec::with_capacity(guids.len());

        for group in guids.chunk_by_mut(|a, b| a.0 == b.0) {
            let Some(cell_to_world) = editor.cell_to_world(group[0].0) else {
                continue;
            };
            let content = editor.content(group[0].0);
            for guid in group.iter_mut() {
                let found = content.as_ref().and_then(|content| {
                    let cell = content.get();
                    let index = if flags.ignore_id_top_32_bits {
                        cell.objects().iter().position(|o| o.guid & ID_LOW_MASK == guid.1 & ID_LOW_MASK)
                    } else {
                        cell.find_object(guid.1)
                    };
                    PlacedObject::from_cell(cell, index?)
                });
                match found {
                    Some(placed) => {
                        guid.1 = placed.object.guid;
                        original_state.push(ObjTransDef::from_placed(&placed, &cell_to_world));
                        snapshots.push(Some(placed));
                    }
                    None => {
                        original_state.push(ObjTransDef::error());
                        snapshots.push(None);
                    }
                }
                kept.push(*guid);
            }
        }

        Self {
            editor,
            objects: original_state.clone(),
            original_state,
            snapshots,
            original_guids: kept.clone(),
            pushed_guids: kept,
            state: State::Active,
        }
    }

    pub fn object(&self, index: usize) -> &ObjTransDef {
        &self.objects[index]
    }

    pub fn original_state(&self, index: usize) -> &ObjTransDef {
        &self.original_state[index]
    }

    /// Current guid, which changes when the model or material does
    pub fn guid(&self, index: usize) -> PlacementGuid {
        self.pushed_guids[index]
    }

    pub fn original_guid(&self, index: usize) -> PlacementGuid {
        self.original_guids[index]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Bounds of the object's current model, waiting for it to load
    pub fn local_bounding_box(&self, index: usize) -> Option<Aabb> {
        self.editor.model_bounding_box_stall(&self.objects[index].model)
    }

    pub fn world_bounding_box(&self, index: usize) -> Option<Aabb> {
        let local = self.local_bounding_box(index)?;
        Some(local.transformed(&self.objects[index].local_to_world))
    }

    /// Replace an object's state. Refused for deleted objects; setting an
    /// object that didn't exist creates it.
    pub fn set_object(&mut self, index: usize, new_state: ObjTransDef) -> bool {
        if self.state != State::Active {
            return false;
        }
        let current = self.objects[index].transaction;
        if current == TransactionType::Deleted {
            return false;
        }
        let transaction = match current {
            TransactionType::Created | TransactionType::Error => TransactionType::Created,
            _ => TransactionType::Modified,
        };
        self.objects[index] = ObjTransDef { transaction, ..new_state };
        self.push_obj(index);
        true
    }

    /// Create an object in whichever cell captures the centre of its world
    /// bounds. False if the model has no bounds or no cell claims the point.
    pub fn create(&mut self, new_state: ObjTransDef) -> bool {
        if self.state != State::Active {
            return false;
        }
        let Some(bounding_box) = self.editor.model_bounding_box_stall(&new_state.model) else {
            return false;
        };
        let centre = new_state.local_to_world.transform_point3(bounding_box.center());
        let Some(cell) = self.editor.cells().capturing_cell(centre).map(|c| c.filename_hash) else {
            log::debug!("No cell captures ({}, {})", centre.x, centre.y);
            return false;
        };
        self.add_created(cell, None, bounding_box, new_state)
    }

    /// Create an object in a given cell, keeping the low 32 bits of the
    /// guid. False if the resulting id is already taken.
    pub fn create_with_guid(&mut self, guid: PlacementGuid, new_state: ObjTransDef) -> bool {
        if self.state != State::Active {
            return false;
        }
        let Some(bounding_box) = self.editor.model_bounding_box_stall(&new_state.model) else {
            return false;
        };
        self.add_created(guid.0, Some(guid.1), bounding_box, new_state)
    }

    pub fn delete(&mut self, index: usize) {
        if self.state != State::Active || self.objects[index].transaction == TransactionType::Error {
            return;
        }
        self.objects[index].transaction = TransactionType::Deleted;
        self.push_obj(index);
    }

    pub fn commit(&mut self) {
        self.state = State::Committed;
    }

    /// Revert every object and close the transaction
    pub fn cancel(&mut self) {
        if self.state == State::Active {
            self.undo_and_restart();
        }
        self.state = State::Committed;
    }

    /// Revert every object, leaving the transaction open
    pub fn undo_and_restart(&mut self) {
        if self.state != State::Active {
            return;
        }
        // A re-guided object can sit on the id of a deleted one, so every
        // pushed object is removed before any snapshot goes back.
        for index in 0..self.objects.len() {
            if matches!(self.objects[index].transaction, TransactionType::Deleted | TransactionType::Error) {
                continue;
            }
            let current = self.pushed_guids[index];
            // nothing was pushed to a cell without an overlay
            if let Some(overlay) = self.editor.existing_overlay(current.0) {
                if let Some(i) = overlay.find_object(current.1) {
                    overlay.remove_placement(i);
                }
            }
        }

        let scene = self.editor.scene();
        for index in 0..self.objects.len() {
            self.objects[index] = self.original_state[index].clone();
            let original = self.original_guids[index];
            if let (Some(snapshot), Some(overlay)) = (&self.snapshots[index], self.editor.existing_overlay(original.0)) {
                overlay.restore(scene.as_ref(), snapshot);
            }
            self.pushed_guids[index] = original;
        }
    }

    fn add_created(&mut self, cell: CellId, low_bits: Option<u64>, bounding_box: Aabb, new_state: ObjTransDef) -> bool {
        let Some(cell_to_world) = self.editor.cell_to_world(cell) else {
            return false;
        };
        let local_to_cell = cell_to_world.inverse() * new_state.local_to_world;
        let supplements = parse_supplements(&new_state.supplements);
        let top = object_id_top_part(&new_state.model, &new_state.material);
        let scene = self.editor.scene();
        let Some(overlay) = self.editor.overlay(cell) else {
            return false;
        };

        let id = match low_bits {
            Some(low) => top | (low & ID_LOW_MASK),
            None => allocate_guid(top, |id| overlay.has_object(id)),
        };
        let added = overlay.add_placement(
            scene.as_ref(),
            &local_to_cell,
            bounding_box.transformed(&local_to_cell),
            &new_state.model,
            &new_state.material,
            &supplements,
            id,
        );
        if added.is_none() {
            log::warn!("Placement id 0x{id:016x} already exists, not creating {}", new_state.model);
            return false;
        }

        let guid = (cell, id);
        let at = self.original_guids.partition_point(|g| *g < guid);
        self.original_state.insert(at, ObjTransDef::error());
        self.snapshots.insert(at, None);
        self.objects.insert(at, ObjTransDef { transaction: TransactionType::Created, ..new_state });
        self.original_guids.insert(at, guid);
        self.pushed_guids.insert(at, guid);
        true
    }

    /// Write the state of object `index` into its cell's overlay
    fn push_obj(&mut self, index: usize) {
        let new_state = self.objects[index].clone();
        let guid = self.pushed_guids[index];
        let Some(cell_to_world) = self.editor.cell_to_world(guid.0) else {
            return;
        };

        let placement = match new_state.transaction {
            TransactionType::Deleted | TransactionType::Error => None,
            _ => {
                let local_to_cell = cell_to_world.inverse() * new_state.local_to_world;
                let boundary = match self.editor.model_bounding_box_stall(&new_state.model) {
                    Some(bounding_box) => bounding_box.transformed(&local_to_cell),
                    None => {
                        log::warn!(
                            "Cannot get bounding box for model ({}) while updating placement object",
                            new_state.model
                        );
                        Aabb::EMPTY
                    }
                };
                Some((local_to_cell, boundary))
            }
        };

        let scene = self.editor.scene();
        let Some(overlay) = self.editor.overlay(guid.0) else {
            return;
        };
        let existing = overlay.find_object(guid.1);

        let Some((local_to_cell, boundary)) = placement else {
            if let Some(i) = existing {
                overlay.remove_placement(i);
            }
            return;
        };

        let supplements = parse_supplements(&new_state.supplements);
        let top = object_id_top_part(&new_state.model, &new_state.material);
        if top != guid.1 & ID_TOP_MASK {
            // model or material changed, so the object moves in the sort order
            if let Some(i) = existing {
                overlay.remove_placement(i);
            }
            let preferred = top | (guid.1 & ID_LOW_MASK);
            let id = if overlay.has_object(preferred) {
                allocate_guid(top, |id| overlay.has_object(id))
            } else {
                preferred
            };
            overlay.add_placement(
                scene.as_ref(),
                &local_to_cell,
                boundary,
                &new_state.model,
                &new_state.material,
                &supplements,
                id,
            );
            self.pushed_guids[index].1 = id;
        } else if let Some(i) = existing {
            overlay.update_placement(
                scene.as_ref(),
                i,
                &local_to_cell,
                boundary,
                &new_state.model,
                &new_state.material,
                &supplements,
            );
        } else {
            overlay.add_placement(
                scene.as_ref(),
                &local_to_cell,
                boundary,
                &new_state.model,
                &new_state.material,
                &supplements,
                guid.1,
            );
        }
    }
}

impl Drop for Transaction<'_, '_> {
    fn drop(&mut self) {
        if self.state == State::Active {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::cell::PlacementCellSet;
    use crate::core::types::Vec3;
    use crate::scene::AssetState;

    fn snapshot(editor: &mut PlacementsEditor<'_>, cell: CellId) -> crate::scaffold::PlacementsScaffold {
        editor.content(cell).unwrap().get().scaffold().clone()
    }

    fn guids_of(editor: &mut PlacementsEditor<'_>, cell: CellId) -> Vec<u64> {
        editor.content(cell).unwrap().get().objects().iter().map(|o| o.guid).collect()
    }

    #[test]
    fn test_cancel_restores_exact_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 3);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);

        let before = snapshot(&mut editor, cell);
        let guids = guids_of(&mut editor, cell);
        let (a, b, c) = (guids[0], guids[1], guids[2]);
        assert!(a < b && b < c);

        {
            let mut transaction = editor.create_transaction(&[(cell, c), (cell, a)], TransactionFlags::default());
            assert_eq!(transaction.object_count(), 2);
            assert_eq!(transaction.guid(0), (cell, a));

            let moved = ObjTransDef {
                local_to_world: Affine3A::from_translation(Vec3::new(60.0, 60.0, 0.0)),
                ..transaction.object(0).clone()
            };
            assert!(transaction.set_object(0, moved));
            assert_eq!(transaction.object(0).transaction, TransactionType::Modified);
            transaction.delete(1);
            assert!(!transaction.set_object(1, transaction.original_state(1).clone()));
            transaction.cancel();
        }

        assert_eq!(guids_of(&mut editor, cell), vec![a, b, c]);
        assert_eq!(snapshot(&mut editor, cell), before);
    }

    #[test]
    fn test_edits_visible_before_commit() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 3);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let guids = guids_of(&mut editor, cell);

        let mut transaction = editor.create_transaction(&[(cell, guids[1])], TransactionFlags::default());
        transaction.delete(0);
        transaction.commit();
        drop(transaction);

        assert_eq!(guids_of(&mut editor, cell), vec![guids[0], guids[2]]);
    }

    #[test]
    fn test_drop_without_commit_cancels() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 2);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let before = snapshot(&mut editor, cell);

        {
            let mut transaction = editor.create_transaction(&[], TransactionFlags::default());
            let created = ObjTransDef::new(Affine3A::from_translation(Vec3::new(80.0, 20.0, 0.0)), "rock.mdl", "stone.mat");
            assert!(transaction.create(created));
            assert_eq!(transaction.object(0).transaction, TransactionType::Created);
        }

        assert_eq!(snapshot(&mut editor, cell), {
            let mut expected = before.clone();
            // strings added by the create stay in the table
            expected.add_string("rock.mdl");
            expected.add_string("stone.mat");
            expected
        });
    }

    #[test]
    fn test_unknown_guid_is_error_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 1);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);

        let mut transaction = editor.create_transaction(&[(cell, 99), (12345, 1)], TransactionFlags::default());
        // guids in unregistered cells are dropped
        assert_eq!(transaction.object_count(), 1);
        assert_eq!(transaction.object(0).transaction, TransactionType::Error);

        transaction.delete(0);
        assert_eq!(transaction.object(0).transaction, TransactionType::Error);

        let state = ObjTransDef::new(Affine3A::from_translation(Vec3::new(30.0, 30.0, 0.0)), "tree.mdl", "bark.mat");
        assert!(transaction.set_object(0, state));
        assert_eq!(transaction.object(0).transaction, TransactionType::Created);
        assert_ne!(transaction.guid(0), transaction.original_guid(0));
        transaction.cancel();
        drop(transaction);

        assert_eq!(guids_of(&mut editor, cell).len(), 1);
    }

    #[test]
    fn test_created_guids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 0);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);

        let mut transaction = editor.create_transaction(&[], TransactionFlags::default());
        for i in 0..200 {
            let p = Vec3::new((i % 20) as f32 * 5.0, (i / 20) as f32 * 5.0, 0.0);
            assert!(transaction.create(ObjTransDef::new(Affine3A::from_translation(p), "rock.mdl", "stone.mat")));
        }
        assert!(!transaction.create(ObjTransDef::new(
            Affine3A::from_translation(Vec3::new(500.0, 0.0, 0.0)),
            "rock.mdl",
            "stone.mat",
        )));
        let guids: Vec<PlacementGuid> = (0..transaction.object_count()).map(|i| transaction.guid(i)).collect();
        assert!(guids.windows(2).all(|w| w[0] < w[1]));
        transaction.commit();
        drop(transaction);

        let top = object_id_top_part("rock.mdl", "stone.mat");
        let stored = guids_of(&mut editor, cell);
        assert_eq!(stored.len(), 200);
        assert!(stored.windows(2).all(|w| w[0] < w[1]));
        assert!(stored.iter().all(|g| g & ID_TOP_MASK == top));
    }

    #[test]
    fn test_create_with_guid_collision() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 1);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let existing = guids_of(&mut editor, cell)[0];

        let mut transaction = editor.create_transaction(&[], TransactionFlags::default());
        let state = ObjTransDef::new(Affine3A::IDENTITY, "tree.mdl", "bark.mat");
        assert!(!transaction.create_with_guid((cell, existing & ID_LOW_MASK), state.clone()));
        assert!(transaction.create_with_guid((cell, 7), state.clone()));
        assert_eq!(transaction.guid(0), (cell, object_id_top_part("tree.mdl", "bark.mat") | 7));
        assert!(!transaction.create_with_guid((4242, 8), state));
        transaction.commit();
    }

    #[test]
    fn test_model_change_reassigns_guid() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 2);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let before = snapshot(&mut editor, cell);
        let original = guids_of(&mut editor, cell)[0];

        let mut transaction = editor.create_transaction(&[(cell, original)], TransactionFlags::default());
        let changed = ObjTransDef {
            model: "rock.mdl".to_string(),
            ..transaction.object(0).clone()
        };
        assert!(transaction.set_object(0, changed));
        let (_, id) = transaction.guid(0);
        assert_eq!(id & ID_TOP_MASK, object_id_top_part("rock.mdl", "bark.mat"));
        assert_eq!(id & ID_LOW_MASK, original & ID_LOW_MASK);
        assert_eq!(transaction.original_guid(0), (cell, original));

        transaction.undo_and_restart();
        assert_eq!(transaction.guid(0), (cell, original));
        transaction.commit();
        drop(transaction);

        let after = snapshot(&mut editor, cell);
        assert_eq!(after.objects(), before.objects());
        assert_eq!(after.cell_space_boundaries(), before.cell_space_boundaries());
    }

    #[test]
    fn test_undo_after_guid_reused_by_model_change() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 0);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);

        let tree = ObjTransDef::new(Affine3A::from_translation(Vec3::new(10.0, 10.0, 0.0)), "tree.mdl", "bark.mat");
        let rock = ObjTransDef::new(Affine3A::from_translation(Vec3::new(20.0, 20.0, 0.0)), "rock.mdl", "stone.mat");
        let tree_id = object_id_top_part("tree.mdl", "bark.mat") | 7;
        let rock_id = object_id_top_part("rock.mdl", "stone.mat") | 7;
        {
            let mut transaction = editor.create_transaction(&[], TransactionFlags::default());
            assert!(transaction.create_with_guid((cell, 7), tree));
            assert!(transaction.create_with_guid((cell, 7), rock));
            transaction.commit();
        }
        let before = snapshot(&mut editor, cell);
        let mut expected = vec![tree_id, rock_id];
        expected.sort_unstable();
        assert_eq!(guids_of(&mut editor, cell), expected);

        // deleting the tree frees its id, which the rock then moves onto
        let edit = |transaction: &mut Transaction<'_, '_>| {
            let tree_index = (0..2).find(|&i| transaction.guid(i) == (cell, tree_id)).unwrap();
            let rock_index = 1 - tree_index;
            transaction.delete(tree_index);
            let retextured = ObjTransDef {
                model: "tree.mdl".to_string(),
                material: "bark.mat".to_string(),
                ..transaction.object(rock_index).clone()
            };
            assert!(transaction.set_object(rock_index, retextured));
            assert_eq!(transaction.guid(rock_index), (cell, tree_id));
        };

        {
            let mut transaction = editor.create_transaction(&[(cell, tree_id), (cell, rock_id)], TransactionFlags::default());
            edit(&mut transaction);
            transaction.undo_and_restart();
            assert_eq!(transaction.guid(0), transaction.original_guid(0));
            assert_eq!(transaction.guid(1), transaction.original_guid(1));
        }
        assert_eq!(snapshot(&mut editor, cell), before);

        {
            let mut transaction = editor.create_transaction(&[(cell, tree_id), (cell, rock_id)], TransactionFlags::default());
            edit(&mut transaction);
            transaction.cancel();
        }
        assert_eq!(guids_of(&mut editor, cell), expected);
        assert_eq!(snapshot(&mut editor, cell), before);
    }

    #[test]
    fn test_ignore_top_bits() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, _scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 2);
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let full = guids_of(&mut editor, cell)[1];

        let flags = TransactionFlags { ignore_id_top_32_bits: true };
        let transaction = editor.create_transaction(&[(cell, full & ID_LOW_MASK)], flags);
        assert_eq!(transaction.guid(0), (cell, full));
        assert_eq!(transaction.object(0).transaction, TransactionType::Unchanged);
        assert_eq!(transaction.object(0).model, "tree.mdl");
        assert_eq!(transaction.world_bounding_box(0).unwrap().center(), Vec3::new(15.0, 5.0, 0.0));
    }

    #[test]
    fn test_missing_bounding_box_pushes_empty_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let (mut cache, scene) = make_cache(dir.path());
        let mut cells = PlacementCellSet::new();
        let cell = write_cell(dir.path(), &mut cells, "a.plcs", 1);
        scene.set_model_state("broken.mdl", AssetState::Invalid("bad file".to_string()));
        let mut editor = PlacementsEditor::new(&mut cells, &mut cache);
        let original = guids_of(&mut editor, cell)[0];

        let mut transaction = editor.create_transaction(&[(cell, original)], TransactionFlags::default());
        let broken = ObjTransDef {
            model: "broken.mdl".to_string(),
            ..transaction.object(0).clone()
        };
        assert!(transaction.set_object(0, broken));
        assert!(!transaction.create(ObjTransDef::new(Affine3A::IDENTITY, "broken.mdl", "bark.mat")));
        let (_, id) = transaction.guid(0);
        transaction.commit();
        drop(transaction);

        let content = editor.content(cell).unwrap();
        let index = content.get().find_object(id).unwrap();
        assert!(!content.get().cell_space_boundaries()[index].is_valid());
    }
}
