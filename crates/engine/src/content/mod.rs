mod compiler;
mod database;

pub use compiler::{compile_def_database, ContentCompileError, DefProblem};
pub use database::{AnimationDef, AnimationDefId, AssetError, Assets, DefDatabase, FontDef};
