use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{Animation, AssetError, Assets, Vec2};
use thiserror::Error;

use super::config::SimConfig;

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: unexpected end of level while reading {expected}")]
    UnexpectedEnd { line: usize, expected: &'static str },
    #[error("line {line}: {field} '{value}' is not a valid number")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: {field} '{value}' is not a boolean (true/false/1/0)")]
    InvalidBool {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("line {line}: unknown record kind '{kind}'")]
    UnknownRecord { line: usize, kind: String },
    #[error("line {line}: weapon template '{name}' is not defined")]
    UnknownWeapon { line: usize, name: String },
    #[error("line {line}: weapon template '{name}' is already defined on line {first_line}")]
    DuplicateWeapon {
        line: usize,
        name: String,
        first_line: usize,
    },
    #[error(
        "line {line}: weapon '{name}' has lifespanTicks {ticks}; held weapons need >= 0 \
and the player's swung weapon needs > 0"
    )]
    InvalidLifespan {
        line: usize,
        name: String,
        ticks: i32,
    },
    #[error("line {line}: unknown enemy behaviour '{directive}'; expected Follow or Patrol")]
    UnknownDirective { line: usize, directive: String },
    #[error("line {line}: patrol route needs at least one waypoint")]
    InvalidPatrol { line: usize },
    #[error("line {line}: a level may contain only one Player record")]
    DuplicatePlayer { line: usize },
    #[error("level has no Player record")]
    MissingPlayer,
    #[error("line {line}: {source}")]
    Asset {
        line: usize,
        #[source]
        source: AssetError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeaponTemplate {
    pub(crate) name: String,
    pub(crate) animation: Animation,
    /// Box offset for a right-facing wielder.
    pub(crate) box_offset: Vec2,
    pub(crate) box_size: Vec2,
    pub(crate) damage: i32,
    pub(crate) lifespan_ticks: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TileSpec {
    pub(crate) animation: Animation,
    pub(crate) pos: Vec2,
    pub(crate) box_offset: Vec2,
    pub(crate) box_size: Vec2,
    pub(crate) block_move: bool,
    pub(crate) block_vision: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DecorationSpec {
    pub(crate) animation: Animation,
    pub(crate) pos: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlayerConfig {
    pub(crate) sprite: String,
    pub(crate) animation: Animation,
    pub(crate) pos: Vec2,
    pub(crate) box_offset: Vec2,
    pub(crate) box_size: Vec2,
    pub(crate) speed: f32,
    pub(crate) health: i32,
    pub(crate) weapon: WeaponTemplate,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EnemyBehavior {
    Follow { speed: f32 },
    Patrol { speed: f32, waypoints: Vec<Vec2> },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EnemySpec {
    pub(crate) sprite: String,
    pub(crate) animation: Animation,
    pub(crate) pos: Vec2,
    pub(crate) box_offset: Vec2,
    pub(crate) box_size: Vec2,
    pub(crate) block_move: bool,
    pub(crate) block_vision: bool,
    pub(crate) health: i32,
    pub(crate) weapon: WeaponTemplate,
    pub(crate) behavior: EnemyBehavior,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LevelRecord {
    Tile(TileSpec),
    Decoration(DecorationSpec),
    Player,
    Enemy(EnemySpec),
}

/// Fully resolved level: every animation name has been looked up and every
/// weapon reference bound to its template.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LevelBlueprint {
    pub(crate) records: Vec<LevelRecord>,
    pub(crate) player: PlayerConfig,
    pub(crate) hand_animation: Animation,
}

impl LevelBlueprint {
    pub(crate) fn count(&self, predicate: impl Fn(&LevelRecord) -> bool) -> usize {
        self.records.iter().filter(|record| predicate(record)).count()
    }
}

#[derive(Debug, Clone)]
struct Token<'a> {
    text: &'a str,
    line: usize,
}

struct TokenStream<'a> {
    tokens: Vec<Token<'a>>,
    cursor: usize,
}

impl<'a> TokenStream<'a> {
    fn new(source: &'a str) -> Self {
        let tokens = source
            .lines()
            .enumerate()
            .flat_map(|(index, line)| {
                let content = line.split('#').next().unwrap_or_default();
                content.split_whitespace().map(move |text| Token {
                    text,
                    line: index + 1,
                })
            })
            .collect();
        Self { tokens, cursor: 0 }
    }

    fn next(&mut self) -> Option<Token<'a>> {
        let token = self.tokens.get(self.cursor).cloned();
        if token.is_some() {
            self.cursor += 1;
        }
        token
    }

    fn last_line(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|index| self.tokens.get(index))
            .map_or(1, |token| token.line)
    }

    fn text(&mut self, expected: &'static str) -> Result<Token<'a>, LevelError> {
        self.next().ok_or(LevelError::UnexpectedEnd {
            line: self.last_line(),
            expected,
        })
    }

    fn int(&mut self, field: &'static str) -> Result<i32, LevelError> {
        let token = self.text(field)?;
        token.text.parse::<i32>().map_err(|_| LevelError::InvalidNumber {
            line: token.line,
            field,
            value: token.text.to_string(),
        })
    }

    fn float(&mut self, field: &'static str) -> Result<f32, LevelError> {
        let token = self.text(field)?;
        match token.text.parse::<f32>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(LevelError::InvalidNumber {
                line: token.line,
                field,
                value: token.text.to_string(),
            }),
        }
    }

    fn vec2(&mut self, field_x: &'static str, field_y: &'static str) -> Result<Vec2, LevelError> {
        Ok(Vec2::new(self.float(field_x)?, self.float(field_y)?))
    }

    fn boolean(&mut self, field: &'static str) -> Result<bool, LevelError> {
        let token = self.text(field)?;
        match token.text {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(LevelError::InvalidBool {
                line: token.line,
                field,
                value: other.to_string(),
            }),
        }
    }
}

struct RawWeapon {
    line: usize,
    template: WeaponTemplate,
}

struct RawPlayer {
    line: usize,
    config: PlayerConfig,
}

enum RawRecord {
    Tile(TileSpec),
    Decoration(DecorationSpec),
    Player,
    Enemy { line: usize, weapon: String, spec: EnemySpec },
}

pub(crate) fn load_level(
    path: &Path,
    assets: &dyn Assets,
    config: &SimConfig,
) -> Result<LevelBlueprint, LevelError> {
    let source = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&source, assets, config)
}

pub(crate) fn parse_level(
    source: &str,
    assets: &dyn Assets,
    config: &SimConfig,
) -> Result<LevelBlueprint, LevelError> {
    let mut tokens = TokenStream::new(source);
    let mut weapons = HashMap::<String, RawWeapon>::new();
    let mut records = Vec::<RawRecord>::new();
    let mut player: Option<(RawPlayer, String)> = None;
    let mut first_character_line: Option<usize> = None;

    while let Some(kind) = tokens.next() {
        let line = kind.line;
        match kind.text {
            "Tile" => {
                let animation = animation(&mut tokens, assets)?;
                let pos = grid_pos(&mut tokens, config)?;
                // Box position tokens are recomputed from the transform.
                tokens.vec2("bbX", "bbY")?;
                let box_offset = tokens.vec2("offX", "offY")?;
                let box_size = tokens.vec2("w", "h")?;
                let block_move = tokens.boolean("blockMove")?;
                let block_vision = tokens.boolean("blockVision")?;
                records.push(RawRecord::Tile(TileSpec {
                    animation,
                    pos,
                    box_offset,
                    box_size,
                    block_move,
                    block_vision,
                }));
            }
            "Decoration" => {
                let animation = animation(&mut tokens, assets)?;
                let pos = grid_pos(&mut tokens, config)?;
                records.push(RawRecord::Decoration(DecorationSpec { animation, pos }));
            }
            "Weapon" => {
                let name = tokens.text("weapon name")?.text.to_string();
                let animation = animation(&mut tokens, assets)?;
                let box_offset = tokens.vec2("offX", "offY")?;
                let box_size = tokens.vec2("w", "h")?;
                let damage = tokens.int("damage")?;
                let lifespan_ticks = tokens.int("lifespanTicks")?;
                if lifespan_ticks < 0 {
                    return Err(LevelError::InvalidLifespan {
                        line,
                        name,
                        ticks: lifespan_ticks,
                    });
                }
                if let Some(first) = weapons.get(&name) {
                    return Err(LevelError::DuplicateWeapon {
                        line,
                        name,
                        first_line: first.line,
                    });
                }
                weapons.insert(
                    name.clone(),
                    RawWeapon {
                        line,
                        template: WeaponTemplate {
                            name,
                            animation,
                            box_offset,
                            box_size,
                            damage,
                            lifespan_ticks,
                        },
                    },
                );
            }
            "Player" => {
                if player.is_some() {
                    return Err(LevelError::DuplicatePlayer { line });
                }
                first_character_line.get_or_insert(line);
                let (sprite, animation) = sprite(&mut tokens, assets)?;
                let pos = grid_pos(&mut tokens, config)?;
                let box_offset = tokens.vec2("offX", "offY")?;
                let box_size = tokens.vec2("w", "h")?;
                let speed = tokens.float("speed")?;
                let health = tokens.int("health")?;
                let weapon = tokens.text("weapon")?.text.to_string();
                let speed = if speed == 0.0 { config.player_step } else { speed };
                player = Some((
                    RawPlayer {
                        line,
                        config: PlayerConfig {
                            sprite,
                            animation,
                            pos,
                            box_offset,
                            box_size,
                            speed,
                            health,
                            weapon: placeholder_weapon(),
                        },
                    },
                    weapon,
                ));
                records.push(RawRecord::Player);
            }
            "Enemy" => {
                first_character_line.get_or_insert(line);
                let (sprite, animation) = sprite(&mut tokens, assets)?;
                let pos = grid_pos(&mut tokens, config)?;
                let box_offset = tokens.vec2("offX", "offY")?;
                let box_size = tokens.vec2("w", "h")?;
                let block_move = tokens.boolean("blockMove")?;
                let block_vision = tokens.boolean("blockVision")?;
                let health = tokens.int("health")?;
                let weapon = tokens.text("weapon")?.text.to_string();
                let behavior = behavior(&mut tokens, config)?;
                records.push(RawRecord::Enemy {
                    line,
                    weapon,
                    spec: EnemySpec {
                        sprite,
                        animation,
                        pos,
                        box_offset,
                        box_size,
                        block_move,
                        block_vision,
                        health,
                        weapon: placeholder_weapon(),
                        behavior,
                    },
                });
            }
            other => {
                return Err(LevelError::UnknownRecord {
                    line,
                    kind: other.to_string(),
                })
            }
        }
    }

    let Some((mut raw_player, player_weapon)) = player else {
        return Err(LevelError::MissingPlayer);
    };
    let swung = resolve_weapon(&weapons, &player_weapon, raw_player.line)?;
    // The player's weapon is swung and must expire on its own.
    if swung.template.lifespan_ticks == 0 {
        return Err(LevelError::InvalidLifespan {
            line: swung.line,
            name: player_weapon,
            ticks: 0,
        });
    }
    raw_player.config.weapon = swung.template.clone();

    let hand_animation = assets
        .animation(&config.hand_animation)
        .map_err(|source| LevelError::Asset {
            line: first_character_line.unwrap_or(raw_player.line),
            source,
        })?;

    let records = records
        .into_iter()
        .map(|record| {
            Ok(match record {
                RawRecord::Tile(spec) => LevelRecord::Tile(spec),
                RawRecord::Decoration(spec) => LevelRecord::Decoration(spec),
                RawRecord::Player => LevelRecord::Player,
                RawRecord::Enemy {
                    line,
                    weapon,
                    mut spec,
                } => {
                    spec.weapon = resolve_weapon(&weapons, &weapon, line)?.template.clone();
                    LevelRecord::Enemy(spec)
                }
            })
        })
        .collect::<Result<Vec<_>, LevelError>>()?;

    Ok(LevelBlueprint {
        records,
        player: raw_player.config,
        hand_animation,
    })
}

fn animation(tokens: &mut TokenStream<'_>, assets: &dyn Assets) -> Result<Animation, LevelError> {
    let token = tokens.text("animation name")?;
    assets.animation(token.text).map_err(|source| LevelError::Asset {
        line: token.line,
        source,
    })
}

fn sprite(
    tokens: &mut TokenStream<'_>,
    assets: &dyn Assets,
) -> Result<(String, Animation), LevelError> {
    let token = tokens.text("animation name")?;
    let animation = assets.animation(token.text).map_err(|source| LevelError::Asset {
        line: token.line,
        source,
    })?;
    Ok((token.text.to_string(), animation))
}

fn grid_pos(tokens: &mut TokenStream<'_>, config: &SimConfig) -> Result<Vec2, LevelError> {
    let grid_x = tokens.int("gridX")?;
    let grid_y = tokens.int("gridY")?;
    Ok(config.grid_to_pixel(grid_x, grid_y))
}

fn behavior(tokens: &mut TokenStream<'_>, config: &SimConfig) -> Result<EnemyBehavior, LevelError> {
    let directive = tokens.text("behaviour")?;
    match directive.text {
        "Follow" => Ok(EnemyBehavior::Follow {
            speed: tokens.float("follow speed")?,
        }),
        "Patrol" => {
            let speed = tokens.float("patrol speed")?;
            let count = tokens.int("waypoint count")?;
            if count <= 0 {
                return Err(LevelError::InvalidPatrol {
                    line: directive.line,
                });
            }
            let waypoints = (0..count)
                .map(|_| grid_pos(tokens, config))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(EnemyBehavior::Patrol { speed, waypoints })
        }
        other => Err(LevelError::UnknownDirective {
            line: directive.line,
            directive: other.to_string(),
        }),
    }
}

fn resolve_weapon<'w>(
    weapons: &'w HashMap<String, RawWeapon>,
    name: &str,
    line: usize,
) -> Result<&'w RawWeapon, LevelError> {
    weapons.get(name).ok_or_else(|| LevelError::UnknownWeapon {
            line,
            name: name.to_string(),
        })
}

fn placeholder_weapon() -> WeaponTemplate {
    WeaponTemplate {
        name: String::new(),
        animation: Animation::default(),
        box_offset: Vec2::ZERO,
        box_size: Vec2::ZERO,
        damage: 0,
        lifespan_ticks: 0,
    }
}
