//! Named input actions on top of raw keyboard and mouse state.
//!
//! Every frame `dispatch_input_actions` reads the bindings of the
//! `InputMappingContext`, folds them into one value per action and emits
//! `ActionEvent`s with press/hold/release phases, so gameplay systems never
//! look at key codes.

use std::collections::{HashMap, HashSet};

use bevy::input::mouse::AccumulatedMouseMotion;
use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputAction {
    Jump,
    Move,
    Look,
    DrawAdd,
    DrawRemove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TriggerEvent {
    /// First frame the action is active.
    Started,
    /// Every frame the action is active, including the first.
    Triggered,
    /// First frame after the action stopped being active.
    Completed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActionValue {
    Button(bool),
    Axis2d(Vec2),
}

impl ActionValue {
    pub fn is_active(&self) -> bool {
        match *self {
            Self::Button(pressed) => pressed,
            Self::Axis2d(v) => v != Vec2::ZERO,
        }
    }

    pub fn axis2d(&self) -> Vec2 {
        match *self {
            Self::Button(pressed) => Vec2::new(if pressed { 1.0 } else { 0.0 }, 0.0),
            Self::Axis2d(v) => v,
        }
    }

    fn merge(self, other: ActionValue) -> ActionValue {
        match (self, other) {
            (Self::Button(a), Self::Button(b)) => Self::Button(a || b),
            (a, b) => Self::Axis2d(a.axis2d() + b.axis2d()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputBinding {
    Key(KeyCode),
    Mouse(MouseButton),
    /// Four keys composed into a 2D axis: `up`/`down` drive Y, `left`/`right` drive X.
    KeyAxis { up: KeyCode, down: KeyCode, left: KeyCode, right: KeyCode },
    MouseMotion,
}

/// Raw device state for one frame.
pub struct RawInput<'a> {
    pub keys: &'a ButtonInput<KeyCode>,
    pub mouse: &'a ButtonInput<MouseButton>,
    pub mouse_delta: Vec2,
}

impl InputBinding {
    fn read(&self, raw: &RawInput, context: &InputMappingContext) -> ActionValue {
        match *self {
            Self::Key(key) => ActionValue::Button(raw.keys.pressed(key)),
            Self::Mouse(button) => ActionValue::Button(raw.mouse.pressed(button)),
            Self::KeyAxis { up, down, left, right } => {
                let axis = |pos: KeyCode, neg: KeyCode| {
                    raw.keys.pressed(pos) as i32 as f32 - raw.keys.pressed(neg) as i32 as f32
                };
                ActionValue::Axis2d(Vec2::new(axis(right, left), axis(up, down)))
            }
            Self::MouseMotion => {
                let pitch_sign = if context.invert_pitch { 1.0 } else { -1.0 };
                let d = raw.mouse_delta * context.look_sensitivity;
                ActionValue::Axis2d(Vec2::new(d.x, d.y * pitch_sign))
            }
        }
    }
}

/// Bindings from devices to actions, plus look tuning.
#[derive(Resource, Clone, Debug)]
pub struct InputMappingContext {
    pub bindings: Vec<(InputAction, InputBinding)>,
    /// Radians per pixel of mouse motion.
    pub look_sensitivity: f32,
    pub invert_pitch: bool,
}

impl Default for InputMappingContext {
    fn default() -> Self {
        Self {
            bindings: vec![
                (InputAction::Jump, InputBinding::Key(KeyCode::Space)),
                (
                    InputAction::Move,
                    InputBinding::KeyAxis { up: KeyCode::KeyW, down: KeyCode::KeyS, left: KeyCode::KeyA, right: KeyCode::KeyD },
                ),
                (
                    InputAction::Move,
                    InputBinding::KeyAxis {
                        up: KeyCode::ArrowUp,
                        down: KeyCode::ArrowDown,
                        left: KeyCode::ArrowLeft,
                        right: KeyCode::ArrowRight,
                    },
                ),
                (InputAction::Look, InputBinding::MouseMotion),
                (InputAction::DrawAdd, InputBinding::Mouse(MouseButton::Left)),
                (InputAction::DrawRemove, InputBinding::Mouse(MouseButton::Right)),
            ],
            look_sensitivity: 0.003,
            invert_pitch: false,
        }
    }
}

impl InputMappingContext {
    /// One folded value per bound action.
    pub fn resolve(&self, raw: &RawInput) -> HashMap<InputAction, ActionValue> {
        let mut values: HashMap<InputAction, ActionValue> = HashMap::new();
        for (action, binding) in &self.bindings {
            let value = binding.read(raw, self);
            values
                .entry(*action)
                .and_modify(|v| *v = v.merge(value))
                .or_insert(value);
        }
        values
    }
}

#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct ActionEvent {
    pub action: InputAction,
    pub trigger: TriggerEvent,
    pub value: ActionValue,
}

/// Actions active on the previous frame.
#[derive(Resource, Default, Debug)]
pub struct ActionStates {
    active: HashSet<InputAction>,
}

impl ActionStates {
    pub fn is_active(&self, action: InputAction) -> bool { self.active.contains(&action) }

    /// Phase transitions for this frame's values.
    pub fn advance(&mut self, values: &HashMap<InputAction, ActionValue>) -> Vec<ActionEvent> {
        let mut events = Vec::new();
        for (&action, &value) in values {
            let was_active = self.active.contains(&action);
            if value.is_active() {
                if !was_active {
                    events.push(ActionEvent { action, trigger: TriggerEvent::Started, value });
                    self.active.insert(action);
                }
                events.push(ActionEvent { action, trigger: TriggerEvent::Triggered, value });
            } else if was_active {
                events.push(ActionEvent { action, trigger: TriggerEvent::Completed, value });
                self.active.remove(&action);
            }
        }
        events
    }
}

pub fn dispatch_input_actions(
    context: Option<Res<InputMappingContext>>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    mut states: ResMut<ActionStates>,
    mut events: EventWriter<ActionEvent>,
    mut reported_missing: Local<bool>,
) {
    let Some(context) = context else {
        if !*reported_missing {
            error!("no InputMappingContext resource; player input is disabled");
            *reported_missing = true;
        }
        return;
    };
    let raw = RawInput { keys: &keys, mouse: &mouse, mouse_delta: motion.delta };
    let values = context.resolve(&raw);
    events.write_batch(states.advance(&values));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(context: &InputMappingContext, states: &mut ActionStates, keys: &ButtonInput<KeyCode>, mouse: &ButtonInput<MouseButton>, delta: Vec2) -> Vec<ActionEvent> {
        let raw = RawInput { keys, mouse, mouse_delta: delta };
        states.advance(&context.resolve(&raw))
    }

    fn triggers_for(events: &[ActionEvent], action: InputAction) -> Vec<TriggerEvent> {
        events.iter().filter(|e| e.action == action).map(|e| e.trigger).collect()
    }

    #[test]
    fn button_press_hold_release() {
        let context = InputMappingContext::default();
        let mut states = ActionStates::default();
        let keys = ButtonInput::<KeyCode>::default();
        let mut mouse = ButtonInput::<MouseButton>::default();

        mouse.press(MouseButton::Left);
        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        assert_eq!(triggers_for(&events, InputAction::DrawAdd), vec![TriggerEvent::Started, TriggerEvent::Triggered]);

        mouse.clear();
        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        assert_eq!(triggers_for(&events, InputAction::DrawAdd), vec![TriggerEvent::Triggered]);

        mouse.release(MouseButton::Left);
        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        assert_eq!(triggers_for(&events, InputAction::DrawAdd), vec![TriggerEvent::Completed]);
        assert!(!states.is_active(InputAction::DrawAdd));
    }

    #[test]
    fn move_axis_combines_keys() {
        let context = InputMappingContext::default();
        let mut states = ActionStates::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keys.press(KeyCode::KeyW);
        keys.press(KeyCode::KeyA);
        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        let triggered = events
            .iter()
            .find(|e| e.action == InputAction::Move && e.trigger == TriggerEvent::Triggered)
            .unwrap();
        assert_eq!(triggered.value, ActionValue::Axis2d(Vec2::new(-1.0, 1.0)));
    }

    #[test]
    fn opposite_keys_cancel() {
        let context = InputMappingContext::default();
        let mut states = ActionStates::default();
        let mut keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        keys.press(KeyCode::KeyA);
        keys.press(KeyCode::KeyD);
        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        assert!(triggers_for(&events, InputAction::Move).is_empty());
    }

    #[test]
    fn mouse_motion_scaled_and_pitch_flipped() {
        let context = InputMappingContext { look_sensitivity: 0.5, ..default() };
        let mut states = ActionStates::default();
        let keys = ButtonInput::<KeyCode>::default();
        let mouse = ButtonInput::<MouseButton>::default();

        let events = frame(&context, &mut states, &keys, &mouse, Vec2::new(4.0, 2.0));
        let look = events.iter().find(|e| e.action == InputAction::Look).unwrap();
        assert_eq!(look.value, ActionValue::Axis2d(Vec2::new(2.0, -1.0)));

        let events = frame(&context, &mut states, &keys, &mouse, Vec2::ZERO);
        assert_eq!(triggers_for(&events, InputAction::Look), vec![TriggerEvent::Completed]);
    }

    #[test]
    fn unbound_actions_never_fire() {
        let context = InputMappingContext { bindings: vec![(InputAction::Jump, InputBinding::Key(KeyCode::Space))], ..default() };
        let mut states = ActionStates::default();
        let keys = ButtonInput::<KeyCode>::default();
        let mut mouse = ButtonInput::<MouseButton>::default();
        mouse.press(MouseButton::Left);
        assert!(frame(&context, &mut states, &keys, &mouse, Vec2::ZERO).is_empty());
    }
    fn input_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<ActionEvent>()
            .init_resource::<ActionStates>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<AccumulatedMouseMotion>()
            .add_systems(Update, dispatch_input_actions);
        app.world_mut().resource_mut::<ButtonInput<MouseButton>>().press(MouseButton::Left);
        app
    }

    #[test]
    fn missing_context_emits_nothing() {
        let mut app = input_app();
        app.update();
        app.update();
        assert!(app.world().resource::<Events<ActionEvent>>().is_empty());
        assert!(!app.world().resource::<ActionStates>().is_active(InputAction::DrawAdd));
    }

    #[test]
    fn inserted_context_starts_dispatching() {
        let mut app = input_app();
        app.update();
        app.insert_resource(InputMappingContext::default());
        app.update();

        let events = app.world().resource::<Events<ActionEvent>>();
        let mut cursor = events.get_cursor();
        let sent: Vec<_> = cursor.read(events).copied().collect();
        assert_eq!(triggers_for(&sent, InputAction::DrawAdd), vec![TriggerEvent::Started, TriggerEvent::Triggered]);
    }
}
