use egui::{Pos2, PointerButton, Rect, TouchId, TouchPhase, Vec2};

/// Raw input in device (screen) coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse button was pressed
    PointerDown {
        position: Pos2,
        button: PointerButton,
    },
    /// Mouse moved, with or without a button held
    PointerMove {
        position: Pos2,
    },
    /// Mouse button was released
    PointerUp,
    /// A touch began; `touches` lists the active touch points
    TouchStart {
        touches: Vec<Pos2>,
    },
    TouchMove {
        touches: Vec<Pos2>,
    },
    TouchEnd,
}

/// Input after normalization, in surface-local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeInput {
    Begin(Pos2),
    Continue(Pos2),
    End,
}

/// Maps device coordinates onto the surface and folds mouse and touch
/// input into one representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputMapper {
    surface_offset: Vec2,
}

impl InputMapper {
    pub fn new(surface_offset: Vec2) -> Self {
        Self { surface_offset }
    }

    /// Update where the surface sits on screen
    pub fn set_surface_offset(&mut self, offset: Vec2) {
        self.surface_offset = offset;
    }

    pub fn surface_offset(&self) -> Vec2 {
        self.surface_offset
    }

    pub fn to_surface(&self, device: Pos2) -> Pos2 {
        device - self.surface_offset
    }

    /// Normalize a raw event. Touch events use their first touch point.
    pub fn normalize(&self, event: &InputEvent) -> Option<StrokeInput> {
        match event {
            InputEvent::PointerDown { position, button: PointerButton::Primary } => {
                Some(StrokeInput::Begin(self.to_surface(*position)))
            }
            InputEvent::PointerDown { .. } => None,
            InputEvent::PointerMove { position } => Some(StrokeInput::Continue(self.to_surface(*position))),
            InputEvent::TouchStart { touches } => {
                touches.first().map(|touch| StrokeInput::Begin(self.to_surface(*touch)))
            }
            InputEvent::TouchMove { touches } => {
                touches.first().map(|touch| StrokeInput::Continue(self.to_surface(*touch)))
            }
            InputEvent::PointerUp | InputEvent::TouchEnd => Some(StrokeInput::End),
        }
    }
}

/// Converts one frame of egui events into [`InputEvent`]s for the canvas.
///
/// egui also synthesizes pointer events from touches, so while a touch is
/// being tracked (or the frame carries touch events) pointer events are skipped.
#[derive(Debug, Default)]
pub struct InputCollector {
    active_touch: Option<TouchId>,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// `canvas` is the on-screen rect of the surface; presses are only
    /// accepted inside it and while the canvas is the hovered widget.
    pub fn collect(&mut self, events: &[egui::Event], canvas: Rect, canvas_hovered: bool) -> Vec<InputEvent> {
        let has_touch = events.iter().any(|event| matches!(event, egui::Event::Touch { .. }));
        let mut collected = Vec::new();

        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => match phase {
                    TouchPhase::Start if self.active_touch.is_none() && canvas.contains(*pos) => {
                        self.active_touch = Some(*id);
                        collected.push(InputEvent::TouchStart { touches: vec![*pos] });
                    }
                    TouchPhase::Move if self.active_touch == Some(*id) => {
                        collected.push(InputEvent::TouchMove { touches: vec![*pos] });
                    }
                    TouchPhase::End | TouchPhase::Cancel if self.active_touch == Some(*id) => {
                        self.active_touch = None;
                        collected.push(InputEvent::TouchEnd);
                    }
                    _ => {}
                },
                _ if has_touch || self.active_touch.is_some() => {}
                egui::Event::PointerButton { pos, button, pressed: true, .. } => {
                    if canvas_hovered && canvas.contains(*pos) {
                        collected.push(InputEvent::PointerDown {
                            position: *pos,
                            button: *button,
                        });
                    }
                }
                egui::Event::PointerButton {
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } => {
                    collected.push(InputEvent::PointerUp);
                }
                egui::Event::PointerMoved(pos) => {
                    collected.push(InputEvent::PointerMove { position: *pos });
                }
                _ => {}
            }
        }

        collected
    }
}
