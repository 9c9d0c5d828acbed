use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::animation::Animation;
use crate::geometry::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimationDefId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub id: AnimationDefId,
    pub def_name: String,
    pub texture: String,
    pub frame_count: u32,
    pub speed: u32,
    pub width: f32,
    pub height: f32,
}

impl AnimationDef {
    pub fn instantiate(&self) -> Animation {
        Animation::new(
            self.def_name.clone(),
            self.frame_count,
            self.speed,
            Vec2::new(self.width, self.height),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontDef {
    pub def_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("unknown animation '{name}'")]
    UnknownAnimation { name: String },
    #[error("unknown font '{name}'")]
    UnknownFont { name: String },
}

/// Name-keyed lookup service the simulation consumes.
pub trait Assets {
    fn find_animation(&self, name: &str) -> Option<Animation>;

    fn find_font(&self, name: &str) -> Option<&FontDef>;

    fn animation(&self, name: &str) -> Result<Animation, AssetError> {
        self.find_animation(name)
            .ok_or_else(|| AssetError::UnknownAnimation {
                name: name.to_string(),
            })
    }

    fn font(&self, name: &str) -> Result<&FontDef, AssetError> {
        self.find_font(name).ok_or_else(|| AssetError::UnknownFont {
            name: name.to_string(),
        })
    }

    fn has_animation(&self, name: &str) -> bool {
        self.find_animation(name).is_some()
    }
}

#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    animation_defs: Vec<AnimationDef>,
    animation_ids_by_name: HashMap<String, AnimationDefId>,
    font_defs: HashMap<String, FontDef>,
}

impl DefDatabase {
    pub fn from_defs(mut animation_defs: Vec<AnimationDef>, font_defs: Vec<FontDef>) -> Self {
        let mut animation_ids_by_name = HashMap::with_capacity(animation_defs.len());
        for (idx, def) in animation_defs.iter_mut().enumerate() {
            let id = AnimationDefId(idx as u32);
            def.id = id;
            animation_ids_by_name.insert(def.def_name.clone(), id);
        }
        let font_defs = font_defs
            .into_iter()
            .map(|def| (def.def_name.clone(), def))
            .collect();
        Self {
            animation_defs,
            animation_ids_by_name,
            font_defs,
        }
    }

    pub fn animation_def_id_by_name(&self, name: &str) -> Option<AnimationDefId> {
        self.animation_ids_by_name.get(name).copied()
    }

    pub fn animation_def(&self, id: AnimationDefId) -> Option<&AnimationDef> {
        self.animation_defs.get(id.0 as usize)
    }

    pub fn animation_defs(&self) -> &[AnimationDef] {
        &self.animation_defs
    }

    pub fn font_count(&self) -> usize {
        self.font_defs.len()
    }
}

impl Assets for DefDatabase {
    fn find_animation(&self, name: &str) -> Option<Animation> {
        self.animation_def_id_by_name(name)
            .and_then(|id| self.animation_def(id))
            .map(AnimationDef::instantiate)
    }

    fn find_font(&self, name: &str) -> Option<&FontDef> {
        self.font_defs.get(name)
    }
}
