use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::{Action, ActionPhase, ActionSource, Vec2};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read action script '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("action script line {line}: {message}")]
    Malformed { line: usize, message: String },
}

/// Replays actions from a text script of `<tick> <START|END> <NAME> [x y]`
/// lines. Blank lines and `#` comments are skipped.
#[derive(Debug, Default)]
pub(crate) struct ScriptedActions {
    by_tick: BTreeMap<u64, Vec<Action>>,
}

impl ScriptedActions {
    pub(crate) fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub(crate) fn parse(raw: &str) -> Result<Self, ScriptError> {
        let mut by_tick = BTreeMap::<u64, Vec<Action>>::new();
        for (index, line) in raw.lines().enumerate() {
            let line_number = index + 1;
            let content = line.split('#').next().unwrap_or_default().trim();
            if content.is_empty() {
                continue;
            }
            let malformed = |message: String| ScriptError::Malformed {
                line: line_number,
                message,
            };

            let fields = content.split_whitespace().collect::<Vec<_>>();
            let (tick, phase, name, cursor) = match fields.as_slice() {
                [tick, phase, name] => (*tick, *phase, *name, None),
                [tick, phase, name, x, y] => (*tick, *phase, *name, Some((*x, *y))),
                _ => {
                    return Err(malformed(format!(
                        "expected '<tick> <START|END> <NAME> [x y]', got {} fields",
                        fields.len()
                    )))
                }
            };

            let tick = tick
                .parse::<u64>()
                .map_err(|_| malformed(format!("invalid tick '{tick}'")))?;
            let phase = ActionPhase::from_token(phase)
                .ok_or_else(|| malformed(format!("invalid phase '{phase}'")))?;
            let action = match cursor {
                None => Action::new(name, phase),
                Some((x, y)) => {
                    let x = parse_coordinate(x).ok_or_else(|| malformed(format!("invalid x '{x}'")))?;
                    let y = parse_coordinate(y).ok_or_else(|| malformed(format!("invalid y '{y}'")))?;
                    Action::at(name, phase, Vec2::new(x, y))
                }
            };
            by_tick.entry(tick).or_default().push(action);
        }
        Ok(Self { by_tick })
    }

    pub(crate) fn len(&self) -> usize {
        self.by_tick.values().map(Vec::len).sum()
    }
}

fn parse_coordinate(raw: &str) -> Option<f32> {
    raw.parse::<f32>().ok().filter(|value| value.is_finite())
}

impl ActionSource for ScriptedActions {
    fn actions_for_tick(&mut self, tick: u64) -> Vec<Action> {
        self.by_tick.remove(&tick).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actions_are_grouped_by_tick_in_file_order() {
        let mut script = ScriptedActions::parse(
            "# warm up\n\
             0 START RIGHT\n\
             0 START ATTACK\n\
             \n\
             30 END RIGHT   # stop\n\
             31 START LEFT_CLICK 288 288.5\n",
        )
        .expect("script");
        assert_eq!(script.len(), 4);

        let first = script.actions_for_tick(0);
        assert_eq!(
            first.iter().map(|action| action.name.as_str()).collect::<Vec<_>>(),
            vec!["RIGHT", "ATTACK"]
        );
        assert!(script.actions_for_tick(0).is_empty());
        assert!(script.actions_for_tick(1).is_empty());
        assert_eq!(script.actions_for_tick(30)[0].phase, ActionPhase::End);
        assert_eq!(
            script.actions_for_tick(31)[0].pos,
            Some(Vec2::new(288.0, 288.5))
        );
    }

    #[test]
    fn malformed_lines_report_line_number() {
        let err = ScriptedActions::parse("0 START UP\nsoon START UP\n").expect_err("bad tick");
        assert!(matches!(err, ScriptError::Malformed { line: 2, .. }));

        let err = ScriptedActions::parse("1 PRESS UP").expect_err("bad phase");
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }));

        let err = ScriptedActions::parse("1 START CLICK 3").expect_err("half cursor");
        assert!(matches!(err, ScriptError::Malformed { line: 1, .. }));
    }

    #[test]
    fn unknown_names_pass_through_to_the_scene() {
        let mut script = ScriptedActions::parse("2 START JUMP").expect("script");
        assert_eq!(script.actions_for_tick(2)[0].name, "JUMP");
    }
}
