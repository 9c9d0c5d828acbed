use crate::geometry::Vec2;

/// Named actions the simulation understands. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Up,
    Down,
    Left,
    Right,
    Attack,
    Pause,
    Quit,
    ToggleTexture,
    ToggleCollision,
    ToggleGrid,
    LeftClick,
    RightClick,
    MouseMove,
}

impl InputAction {
    pub const ALL: [InputAction; 13] = [
        InputAction::Up,
        InputAction::Down,
        InputAction::Left,
        InputAction::Right,
        InputAction::Attack,
        InputAction::Pause,
        InputAction::Quit,
        InputAction::ToggleTexture,
        InputAction::ToggleCollision,
        InputAction::ToggleGrid,
        InputAction::LeftClick,
        InputAction::RightClick,
        InputAction::MouseMove,
    ];

    pub const fn token(self) -> &'static str {
        match self {
            InputAction::Up => "UP",
            InputAction::Down => "DOWN",
            InputAction::Left => "LEFT",
            InputAction::Right => "RIGHT",
            InputAction::Attack => "ATTACK",
            InputAction::Pause => "PAUSE",
            InputAction::Quit => "QUIT",
            InputAction::ToggleTexture => "TOGGLE_TEXTURE",
            InputAction::ToggleCollision => "TOGGLE_COLLISION",
            InputAction::ToggleGrid => "TOGGLE_GRID",
            InputAction::LeftClick => "LEFT_CLICK",
            InputAction::RightClick => "RIGHT_CLICK",
            InputAction::MouseMove => "MOUSE_MOVE",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.token() == token)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionPhase {
    Start,
    End,
}

impl ActionPhase {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "START" => Some(ActionPhase::Start),
            "END" => Some(ActionPhase::End),
            _ => None,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            ActionPhase::Start => "START",
            ActionPhase::End => "END",
        }
    }
}

/// One raw input transition, already translated into an action name.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub phase: ActionPhase,
    pub pos: Option<Vec2>,
}

impl Action {
    pub fn new(name: impl Into<String>, phase: ActionPhase) -> Self {
        Self {
            name: name.into(),
            phase,
            pos: None,
        }
    }

    pub fn at(name: impl Into<String>, phase: ActionPhase, pos: Vec2) -> Self {
        Self {
            name: name.into(),
            phase,
            pos: Some(pos),
        }
    }

    pub fn known(&self) -> Option<InputAction> {
        InputAction::from_token(&self.name)
    }
}

/// Supplies the actions to route before each tick.
pub trait ActionSource {
    fn actions_for_tick(&mut self, tick: u64) -> Vec<Action>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoActions;

impl ActionSource for NoActions {
    fn actions_for_tick(&mut self, _tick: u64) -> Vec<Action> {
        Vec::new()
    }
}
