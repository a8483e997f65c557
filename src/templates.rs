//! Named block sets: the two built-in days plus user-created templates.
//!
//! Built-ins are never deleted from storage. Removing one records it as
//! hidden so it can be restored later; custom templates are deleted outright.

use std::rc::Rc;
use tracing::{debug, info, warn};
use crate::blocks::BlockStore;
use crate::error::Result;
use crate::models::{deep_copy, new_id, RoutineBlock, Template};
use crate::storage::{
    load_json, save_json, KeyValueStore, CURRENT_TEMPLATE_KEY, CUSTOM_TEMPLATES_KEY,
    HIDDEN_TEMPLATES_KEY,
};

pub const STUDENT_ID: &str = "student";
pub const PROFESSIONAL_ID: &str = "professional";

fn block(id: &str, title: &str, color: &str, start_minute: u32, end_minute: u32) -> RoutineBlock {
    RoutineBlock {
        id: id.to_string(),
        title: title.to_string(),
        color: color.to_string(),
        start_minute,
        end_minute,
        todos: Vec::new(),
    }
}

/// The templates shipped with the planner, in display order.
pub fn built_in_templates() -> Vec<Template> {
    vec![
        Template {
            id: STUDENT_ID.to_string(),
            name: "Student".to_string(),
            blocks: vec![
                block("student-sleep-1", "Sleep", "#A8D8FF", 0, 480),
                block("student-school", "School", "#FFD6A5", 480, 960),
                block("student-study", "Study", "#CAFFBF", 960, 1200),
                block("student-free", "Free Time", "#E0D5FF", 1200, 1440),
            ],
        },
        Template {
            id: PROFESSIONAL_ID.to_string(),
            name: "Professional".to_string(),
            blocks: vec![
                block("pro-sleep", "Sleep", "#A8D8FF", 0, 420),
                block("pro-deepwork", "Deep Work", "#FFD6A5", 420, 840),
                block("pro-meetings", "Meetings", "#CAFFBF", 840, 1080),
                block("pro-personal", "Personal Time", "#E0D5FF", 1080, 1440),
            ],
        },
    ]
}

/// Blocks of the first built-in template, the fallback for every miss.
pub fn default_blocks() -> Vec<RoutineBlock> {
    built_in_templates().swap_remove(0).blocks
}

pub fn is_built_in(id: &str) -> bool {
    id == STUDENT_ID || id == PROFESSIONAL_ID
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone)]
struct BuiltIn {
    template: Template,
    visibility: Visibility,
}

pub struct TemplateStore {
    store: Rc<dyn KeyValueStore>,
    built_ins: Vec<BuiltIn>,
    custom: Vec<Template>,
    current_id: String,
}

impl TemplateStore {
    pub fn load(store: Rc<dyn KeyValueStore>) -> TemplateStore {
        let hidden: Vec<String> = load_json(store.as_ref(), HIDDEN_TEMPLATES_KEY).unwrap_or_default();
        let built_ins = built_in_templates()
            .into_iter()
            .map(|template| {
                let visibility = if hidden.contains(&template.id) {
                    Visibility::Hidden
                } else {
                    Visibility::Visible
                };
                BuiltIn { template, visibility }
            })
            .collect();
        let custom = load_json(store.as_ref(), CUSTOM_TEMPLATES_KEY).unwrap_or_default();
        let current_id = load_json(store.as_ref(), CURRENT_TEMPLATE_KEY)
            .unwrap_or_else(|| STUDENT_ID.to_string());
        TemplateStore { store, built_ins, custom, current_id }
    }

    /// Visible built-ins first, then custom templates in creation order.
    pub fn list_all(&self) -> Vec<&Template> {
        self.built_ins
            .iter()
            .filter(|b| b.visibility == Visibility::Visible)
            .map(|b| &b.template)
            .chain(self.custom.iter())
            .collect()
    }

    /// Looks up a visible template. Hidden built-ins do not resolve.
    pub fn get_by_id(&self, id: &str) -> Option<&Template> {
        self.list_all().into_iter().find(|t| t.id == id)
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.built_ins
            .iter()
            .find(|b| b.template.id == id)
            .map(|b| b.visibility)
    }

    pub fn current_id(&self) -> &str {
        &self.current_id
    }

    /// The active template, or the student day if the stored id no longer
    /// resolves.
    pub fn current(&self) -> Template {
        match self.get_by_id(&self.current_id) {
            Some(t) => t.clone(),
            None => self.fallback(),
        }
    }

    /// Loads a template into `blocks` and returns the loaded blocks.
    ///
    /// Unknown ids fall back to the student day without recording the bad
    /// id as current. The id is recorded only after the blocks are saved.
    pub fn switch_to(&mut self, id: &str, blocks: &mut BlockStore) -> Result<Vec<RoutineBlock>> {
        let Some(template) = self.get_by_id(id) else {
            warn!(template = id, "template not found, loading the default day");
            let loaded = self.fallback().blocks;
            blocks.replace_all(loaded.clone())?;
            return Ok(loaded);
        };
        let loaded = deep_copy(&template.blocks);
        blocks.replace_all(loaded.clone())?;
        self.set_current(id)?;
        info!(template = id, "switched template");
        Ok(loaded)
    }

    /// Switches to the first visible template after the active one was
    /// removed. With nothing visible the student day is loaded and recorded.
    pub fn switch_to_surviving(&mut self, blocks: &mut BlockStore) -> Result<String> {
        match self.list_all().first().map(|t| t.id.clone()) {
            Some(id) => {
                self.switch_to(&id, blocks)?;
                Ok(id)
            }
            None => {
                blocks.replace_all(self.fallback().blocks)?;
                self.set_current(STUDENT_ID)?;
                Ok(STUDENT_ID.to_string())
            }
        }
    }

    /// Saves a copy of `blocks` as a new custom template.
    pub fn create_from_current_blocks(&mut self, name: &str, blocks: &[RoutineBlock]) -> Result<Template> {
        let template = Template {
            id: new_id("custom"),
            name: name.to_string(),
            blocks: deep_copy(blocks),
        };
        let mut next = self.custom.clone();
        next.push(template.clone());
        self.commit_custom(next)?;
        info!(template = %template.id, name, "created template");
        Ok(template)
    }

    /// Hides a built-in or deletes a custom template.
    ///
    /// Returns `false` only for an unknown custom id. The active template is
    /// not reassigned; callers switch away themselves.
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        if let Some(visibility) = self.visibility(id) {
            if visibility == Visibility::Visible {
                self.commit_visibility(id, Visibility::Hidden)?;
                info!(template = id, "hid built-in template");
            }
            return Ok(true);
        }
        if !self.custom.iter().any(|t| t.id == id) {
            return Ok(false);
        }
        let next = self.custom.iter().filter(|t| t.id != id).cloned().collect();
        self.commit_custom(next)?;
        debug!(template = id, "deleted custom template");
        Ok(true)
    }

    /// Makes a hidden built-in visible again. `false` if `id` is not a
    /// built-in.
    pub fn restore(&mut self, id: &str) -> Result<bool> {
        match self.visibility(id) {
            Some(Visibility::Hidden) => {
                self.commit_visibility(id, Visibility::Visible)?;
                Ok(true)
            }
            Some(Visibility::Visible) => Ok(true),
            None => Ok(false),
        }
    }

    pub fn is_built_in(&self, id: &str) -> bool {
        is_built_in(id)
    }

    fn fallback(&self) -> Template {
        built_in_templates().swap_remove(0)
    }

    fn set_current(&mut self, id: &str) -> Result<()> {
        save_json(self.store.as_ref(), CURRENT_TEMPLATE_KEY, id)?;
        self.current_id = id.to_string();
        Ok(())
    }

    fn commit_custom(&mut self, next: Vec<Template>) -> Result<()> {
        save_json(self.store.as_ref(), CUSTOM_TEMPLATES_KEY, &next)?;
        self.custom = next;
        Ok(())
    }

    /// Saves the hidden set as it would be with `id` set to `visibility`,
    /// then applies the change.
    fn commit_visibility(&mut self, id: &str, visibility: Visibility) -> Result<()> {
        let hidden: Vec<&str> = self
            .built_ins
            .iter()
            .filter(|b| {
                let v = if b.template.id == id { visibility } else { b.visibility };
                v == Visibility::Hidden
            })
            .map(|b| b.template.id.as_str())
            .collect();
        save_json(self.store.as_ref(), HIDDEN_TEMPLATES_KEY, &hidden)?;
        if let Some(built_in) = self.built_ins.iter_mut().find(|b| b.template.id == id) {
            built_in.visibility = visibility;
        }
        Ok(())
    }
}
