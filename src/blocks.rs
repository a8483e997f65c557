use std::rc::Rc;
use tracing::debug;
use crate::error::{Error, Result};
use crate::geometry::block_at_minute;
use crate::models::{BlockPatch, RoutineBlock, Todo};
use crate::storage::{load_json, save_json, KeyValueStore, BLOCKS_KEY};
use crate::templates::default_blocks;

/// Today's live block set. Every mutation is persisted before it returns.
pub struct BlockStore {
    store: Rc<dyn KeyValueStore>,
    blocks: Vec<RoutineBlock>,
}

impl BlockStore {
    /// Loads the saved block set, or the first built-in template's blocks
    /// when nothing usable is stored.
    pub fn load(store: Rc<dyn KeyValueStore>) -> BlockStore {
        let blocks = load_json(store.as_ref(), BLOCKS_KEY).unwrap_or_else(default_blocks);
        BlockStore { store, blocks }
    }

    pub fn list(&self) -> &[RoutineBlock] {
        &self.blocks
    }

    pub fn get(&self, id: &str) -> Option<&RoutineBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// First-listed block covering `minute`.
    pub fn active_at(&self, minute: u32) -> Option<&RoutineBlock> {
        block_at_minute(&self.blocks, minute)
    }

    /// Appends a block. Ranges are checked by the caller, not here.
    pub fn add(&mut self, block: RoutineBlock) -> Result<()> {
        debug!(id = %block.id, "adding block");
        let mut next = self.blocks.clone();
        next.push(block);
        self.commit(next)
    }

    pub fn update(&mut self, id: &str, patch: BlockPatch) -> Result<&RoutineBlock> {
        let idx = self.position(id)?;
        let mut next = self.blocks.clone();
        patch.apply(&mut next[idx]);
        self.commit(next)?;
        Ok(&self.blocks[idx])
    }

    /// Removes a block and its todos. Unknown ids are a no-op.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next = self.blocks.iter().filter(|b| b.id != id).cloned().collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Replaces the whole set, e.g. on a template switch or schedule load.
    pub fn replace_all(&mut self, blocks: Vec<RoutineBlock>) -> Result<()> {
        debug!(count = blocks.len(), "replacing block set");
        self.commit(blocks)
    }

    pub fn add_todo(&mut self, block_id: &str, text: impl Into<String>) -> Result<Todo> {
        let idx = self.position(block_id)?;
        let todo = Todo::new(text);
        let mut next = self.blocks.clone();
        next[idx].todos.push(todo.clone());
        self.commit(next)?;
        Ok(todo)
    }

    /// Flips a todo's completion and returns the new state.
    pub fn toggle_todo(&mut self, block_id: &str, todo_id: &str) -> Result<bool> {
        let idx = self.position(block_id)?;
        let mut next = self.blocks.clone();
        let todo = next[idx]
            .todos
            .iter_mut()
            .find(|t| t.id == todo_id)
            .ok_or_else(|| Error::TodoNotFound { id: todo_id.to_string() })?;
        todo.completed = !todo.completed;
        let completed = todo.completed;
        self.commit(next)?;
        Ok(completed)
    }

    pub fn remove_todo(&mut self, block_id: &str, todo_id: &str) -> Result<()> {
        let idx = self.position(block_id)?;
        if !self.blocks[idx].todos.iter().any(|t| t.id == todo_id) {
            return Err(Error::TodoNotFound { id: todo_id.to_string() });
        }
        let mut next = self.blocks.clone();
        next[idx].todos.retain(|t| t.id != todo_id);
        self.commit(next)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| Error::BlockNotFound { id: id.to_string() })
    }

    /// Writes `next` and only then adopts it, so a failed write leaves the
    /// in-memory set matching storage.
    fn commit(&mut self, next: Vec<RoutineBlock>) -> Result<()> {
        save_json(self.store.as_ref(), BLOCKS_KEY, &next)?;
        self.blocks = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::free_slots;
    use crate::storage::{FlakyStore, MemoryStore};

    fn fresh() -> (Rc<MemoryStore>, BlockStore) {
        let mem = Rc::new(MemoryStore::new());
        let blocks = BlockStore::load(mem.clone());
        (mem, blocks)
    }

    #[test]
    fn empty_storage_loads_student_day() {
        let (_, blocks) = fresh();
        assert_eq!(blocks.list().len(), 4);
        assert!(blocks.list().iter().all(|b| b.id.starts_with("student-")));
        assert!(free_slots(blocks.list()).is_empty());
    }

    #[test]
    fn corrupt_storage_loads_student_day() {
        let mem = Rc::new(MemoryStore::new());
        mem.write(BLOCKS_KEY, "oops").unwrap();
        let blocks = BlockStore::load(mem);
        assert_eq!(blocks.list().len(), 4);
    }

    #[test]
    fn mutations_are_persisted_immediately() {
        let (mem, mut blocks) = fresh();
        blocks.replace_all(Vec::new()).unwrap();
        let b = RoutineBlock::new("Gym", "#FFB4D6", 360, 420);
        let id = b.id.clone();
        blocks.add(b).unwrap();

        let reloaded = BlockStore::load(mem.clone());
        assert_eq!(reloaded.list().len(), 1);

        blocks.update(&id, BlockPatch { title: Some("Run".into()), ..Default::default() }).unwrap();
        assert_eq!(BlockStore::load(mem.clone()).list()[0].title, "Run");

        assert!(blocks.delete(&id).unwrap());
        assert!(BlockStore::load(mem).list().is_empty());
    }

    #[test]
    fn update_unknown_block_is_not_found() {
        let (_, mut blocks) = fresh();
        let err = blocks.update("nope", BlockPatch::default()).unwrap_err();
        assert!(matches!(err, Error::BlockNotFound { .. }));
        assert!(!blocks.delete("nope").unwrap());
    }

    #[test]
    fn todo_lifecycle() {
        let (mem, mut blocks) = fresh();
        let todo = blocks.add_todo("student-study", "Read chapter 3").unwrap();
        assert!(blocks.toggle_todo("student-study", &todo.id).unwrap());
        assert!(!blocks.toggle_todo("student-study", &todo.id).unwrap());
        assert!(blocks.toggle_todo("student-study", "missing").is_err());

        let reloaded = BlockStore::load(mem.clone());
        assert_eq!(reloaded.get("student-study").unwrap().todos.len(), 1);

        blocks.remove_todo("student-study", &todo.id).unwrap();
        assert!(BlockStore::load(mem).get("student-study").unwrap().todos.is_empty());
    }

    #[test]
    fn failed_writes_leave_blocks_untouched() {
        let flaky = Rc::new(FlakyStore::default());
        let mut blocks = BlockStore::load(flaky.clone());
        flaky.fail_writes.set(true);

        assert!(blocks.add(RoutineBlock::new("Gym", "#FFB4D6", 360, 420)).is_err());
        let patch = BlockPatch { title: Some("Nap".into()), ..Default::default() };
        assert!(blocks.update("student-sleep-1", patch).is_err());
        assert!(blocks.delete("student-school").is_err());
        assert!(blocks.add_todo("student-study", "Read").is_err());
        assert!(blocks.replace_all(Vec::new()).is_err());

        assert_eq!(blocks.list(), default_blocks().as_slice());
    }

    #[test]
    fn active_block_uses_half_open_ranges() {
        let (_, blocks) = fresh();
        assert_eq!(blocks.active_at(479).unwrap().id, "student-sleep-1");
        assert_eq!(blocks.active_at(480).unwrap().id, "student-school");
    }
}
