use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;

use super::database::{AnimationDef, AnimationDefId, DefDatabase, FontDef};

const ANIMATION_FIELDS: &[&str] = &["defName", "texture", "frameCount", "speed", "width", "height"];
const FONT_FIELDS: &[&str] = &["defName", "path"];

#[derive(Debug, Error)]
pub enum ContentCompileError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{file}:{line}:{column}: {problem}")]
    Def {
        file: PathBuf,
        line: u32,
        column: u32,
        problem: DefProblem,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefProblem {
    #[error("malformed XML: {0}")]
    Malformed(String),
    #[error("root element must be <Defs>, found <{0}>")]
    NotDefs(String),
    #[error("unsupported def <{0}>; expected <AnimationDef> or <FontDef>")]
    UnknownDef(String),
    #[error("unknown field <{0}>")]
    UnknownField(String),
    #[error("field <{0}> appears twice")]
    RepeatedField(String),
    #[error("missing field <{0}>")]
    MissingField(&'static str),
    #[error("<{field}> value '{value}' {rule}")]
    InvalidValue {
        field: &'static str,
        value: String,
        rule: &'static str,
    },
    #[error("defName '{0}' is already used by another animation or font")]
    DuplicateName(String),
}

/// Reads every `*.xml` under `content_dir`, in path order, into one database.
/// Animation and font names share a namespace.
pub fn compile_def_database(content_dir: &Path) -> Result<DefDatabase, ContentCompileError> {
    let mut names = HashSet::new();
    let mut animations = Vec::new();
    let mut fonts = Vec::new();

    for file in xml_files(content_dir)? {
        let text = fs::read_to_string(&file).map_err(|source| ContentCompileError::Read {
            path: file.clone(),
            source,
        })?;
        let doc = Document::parse(&text).map_err(|err| ContentCompileError::Def {
            file: file.clone(),
            line: err.pos().row,
            column: err.pos().col,
            problem: DefProblem::Malformed(err.to_string()),
        })?;
        let src = DefSource { file: &file, doc: &doc };

        let root = doc.root_element();
        if root.tag_name().name() != "Defs" {
            let found = root.tag_name().name().to_string();
            return Err(src.fail(root, DefProblem::NotDefs(found)));
        }
        for def in root.children().filter(|node| node.is_element()) {
            let name = match def.tag_name().name() {
                "AnimationDef" => {
                    let parsed = animation_def(&src, def)?;
                    let name = parsed.def_name.clone();
                    animations.push(parsed);
                    name
                }
                "FontDef" => {
                    let parsed = font_def(&src, def)?;
                    let name = parsed.def_name.clone();
                    fonts.push(parsed);
                    name
                }
                other => return Err(src.fail(def, DefProblem::UnknownDef(other.to_string()))),
            };
            if !names.insert(name.clone()) {
                return Err(src.fail(def, DefProblem::DuplicateName(name)));
            }
        }
    }

    Ok(DefDatabase::from_defs(animations, fonts))
}

fn xml_files(content_dir: &Path) -> Result<Vec<PathBuf>, ContentCompileError> {
    let mut found = Vec::new();
    let mut pending = vec![content_dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let unreadable = |source| ContentCompileError::Read {
            path: dir.clone(),
            source,
        };
        for entry in fs::read_dir(&dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
            {
                found.push(path);
            }
        }
    }
    found.sort();
    Ok(found)
}

struct DefSource<'a, 'input> {
    file: &'a Path,
    doc: &'a Document<'input>,
}

impl DefSource<'_, '_> {
    fn fail(&self, node: Node<'_, '_>, problem: DefProblem) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError::Def {
            file: self.file.to_path_buf(),
            line: pos.row,
            column: pos.col,
            problem,
        }
    }
}

type Fields<'a, 'input> = HashMap<&'static str, Node<'a, 'input>>;

fn fields<'a, 'input>(
    src: &DefSource<'_, '_>,
    def: Node<'a, 'input>,
    accepted: &[&'static str],
) -> Result<Fields<'a, 'input>, ContentCompileError> {
    let mut found = Fields::new();
    for field in def.children().filter(|node| node.is_element()) {
        let name = field.tag_name().name();
        let Some(&key) = accepted.iter().find(|&&known| known == name) else {
            return Err(src.fail(field, DefProblem::UnknownField(name.to_string())));
        };
        if found.insert(key, field).is_some() {
            return Err(src.fail(field, DefProblem::RepeatedField(name.to_string())));
        }
    }
    Ok(found)
}

/// `None` when the field is absent; present fields must parse and pass `valid`.
fn value<T: FromStr>(
    src: &DefSource<'_, '_>,
    fields: &Fields<'_, '_>,
    field: &'static str,
    valid: fn(&T) -> bool,
    rule: &'static str,
) -> Result<Option<T>, ContentCompileError> {
    let Some(node) = fields.get(field) else {
        return Ok(None);
    };
    let raw = node.text().map(str::trim).unwrap_or_default();
    match raw.parse::<T>() {
        Ok(parsed) if valid(&parsed) => Ok(Some(parsed)),
        _ => Err(src.fail(
            *node,
            DefProblem::InvalidValue {
                field,
                value: raw.to_string(),
                rule,
            },
        )),
    }
}

fn name_value(
    src: &DefSource<'_, '_>,
    fields: &Fields<'_, '_>,
    field: &'static str,
) -> Result<Option<String>, ContentCompileError> {
    value(src, fields, field, |name: &String| !name.is_empty(), "must not be empty")
}

fn extent(
    src: &DefSource<'_, '_>,
    def: Node<'_, '_>,
    fields: &Fields<'_, '_>,
    field: &'static str,
) -> Result<f32, ContentCompileError> {
    value(
        src,
        fields,
        field,
        |size: &f32| size.is_finite() && *size > 0.0,
        "must be a number > 0",
    )?
    .ok_or_else(|| src.fail(def, DefProblem::MissingField(field)))
}

fn animation_def(
    src: &DefSource<'_, '_>,
    def: Node<'_, '_>,
) -> Result<AnimationDef, ContentCompileError> {
    let fields = fields(src, def, ANIMATION_FIELDS)?;
    let def_name = name_value(src, &fields, "defName")?
        .ok_or_else(|| src.fail(def, DefProblem::MissingField("defName")))?;
    let texture = name_value(src, &fields, "texture")?;
    let frame_count = value(
        src,
        &fields,
        "frameCount",
        |count: &u32| *count >= 1,
        "must be a whole number >= 1",
    )?;
    let speed = value(src, &fields, "speed", |_: &u32| true, "must be a whole number")?;

    Ok(AnimationDef {
        id: AnimationDefId(0),
        texture: texture.unwrap_or_else(|| def_name.clone()),
        frame_count: frame_count.unwrap_or(1),
        speed: speed.unwrap_or(0),
        width: extent(src, def, &fields, "width")?,
        height: extent(src, def, &fields, "height")?,
        def_name,
    })
}

fn font_def(src: &DefSource<'_, '_>, def: Node<'_, '_>) -> Result<FontDef, ContentCompileError> {
    let fields = fields(src, def, FONT_FIELDS)?;
    let def_name = name_value(src, &fields, "defName")?
        .ok_or_else(|| src.fail(def, DefProblem::MissingField("defName")))?;
    let path = name_value(src, &fields, "path")?
        .ok_or_else(|| src.fail(def, DefProblem::MissingField("path")))?;
    Ok(FontDef {
        def_name,
        path: PathBuf::from(path),
    })
}
