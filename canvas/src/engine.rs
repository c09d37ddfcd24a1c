use crate::consts::{CANVAS_HEIGHT, CANVAS_WIDTH, MIN_ANNOTATION_SIZE, NAME_PREFIX};
use crate::doc::{Annotation, AnnotationId, AnnotationStore, Color};
use crate::geom::{Bounds, Point};
use crate::hit::{Hit, HitPart, hit_test};
use crate::input::{Button, InputState, Mode, UiState};
use crate::scene::NodeHandle;
use crate::sync::{self, SyncError, SyncOp, SyncOutcome};
use crate::transform::{ResizeSession, Transformer};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A remote call to perform; report its outcome through
    /// [`EngineCore::confirm_sync`] or [`EngineCore::reject_sync`].
    Persist(SyncOp),
    SelectionChanged(Option<AnnotationId>),
    ModeChanged(Mode),
    RenderNeeded,
}

/// Rejected user commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("select mode needs at least one annotation")]
    NothingToSelect,
    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// Canvas dimensions and the size threshold shared by drawing and resizing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub width: f64,
    pub height: f64,
    pub min_size: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { width: CANVAS_WIDTH, height: CANVAS_HEIGHT, min_size: MIN_ANNOTATION_SIZE }
    }
}

/// Interaction core: the annotation store plus the mode and gesture state
/// machines. Free of any browser or network dependency.
#[derive(Debug)]
pub struct EngineCore {
    pub doc: AnnotationStore,
    pub ui: UiState,
    pub input: InputState,
    config: EngineConfig,
    transformer: Transformer,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            doc: AnnotationStore::new(),
            ui: UiState::default(),
            input: InputState::default(),
            config,
            transformer: Transformer::new(config.min_size),
        }
    }

    // --- Data inputs ---

    /// Hydrate the store from a server listing. Resets selection and any gesture.
    pub fn load_snapshot(&mut self, annotations: Vec<Annotation>) -> Vec<Action> {
        self.doc.load_snapshot(annotations, self.config.min_size);
        self.input = InputState::Idle;
        let mut actions = self.set_selection(None);
        self.settle_mode(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Mode ---

    /// Switch interaction mode from the toolbar.
    ///
    /// Any gesture in progress is abandoned. Entering draw clears the selection.
    ///
    /// # Errors
    ///
    /// Returns `NothingToSelect` when asked for select mode on an empty store.
    pub fn set_mode(&mut self, mode: Mode) -> Result<Vec<Action>, EngineError> {
        if mode == Mode::Select && self.doc.is_empty() {
            return Err(EngineError::NothingToSelect);
        }
        let mut actions = Vec::new();
        if !self.input.is_idle() {
            self.input = InputState::Idle;
            actions.push(Action::RenderNeeded);
        }
        if mode == Mode::Draw {
            actions.extend(self.set_selection(None));
        }
        if self.ui.mode != mode {
            self.ui.mode = mode;
            actions.push(Action::ModeChanged(mode));
        }
        Ok(actions)
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary || !self.input.is_idle() || !self.on_canvas(pt) {
            return Vec::new();
        }
        match self.ui.mode {
            Mode::Draw => self.begin_draw(pt),
            Mode::Select => self.begin_select(pt),
        }
    }

    pub fn on_pointer_move(&mut self, pt: Point) -> Vec<Action> {
        let clamped = self.clamp_to_canvas(pt);
        match &mut self.input {
            InputState::Idle => Vec::new(),
            InputState::Drawing { anchor, draft } => {
                draft.set_bounds(Bounds::from_corners(*anchor, clamped));
                vec![Action::RenderNeeded]
            }
            InputState::Dragging { start, orig, current, .. } => {
                *current = orig.translated(pt.delta_from(*start));
                vec![Action::RenderNeeded]
            }
            InputState::Resizing(session) => {
                if session.update(pt, &self.transformer) {
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn on_pointer_up(&mut self, pt: Point, button: Button) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        match std::mem::take(&mut self.input) {
            InputState::Idle => Vec::new(),
            InputState::Drawing { anchor, mut draft } => {
                draft.set_bounds(Bounds::from_corners(anchor, self.clamp_to_canvas(pt)));
                self.commit_draft(draft)
            }
            InputState::Dragging { id, start, orig, .. } => {
                let moved = orig.translated(pt.delta_from(start));
                if moved == orig {
                    return Vec::new();
                }
                self.commit_update(&id, |a| a.set_bounds(moved))
            }
            InputState::Resizing(mut session) => {
                session.update(pt, &self.transformer);
                let resized = session.finish(&self.transformer);
                if resized == session.orig {
                    return vec![Action::RenderNeeded];
                }
                self.commit_update(&session.id, |a| a.set_bounds(resized))
            }
        }
    }

    // --- Commands ---

    /// Recolor the selected annotation: opaque stroke, translucent fill.
    ///
    /// No-op without a selection.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColor` unless `color` is `#rgb` or `#rrggbb`.
    pub fn set_color(&mut self, color: &str) -> Result<Vec<Action>, EngineError> {
        let Some(id) = self.ui.selected_id.clone() else {
            return Ok(Vec::new());
        };
        let parsed = Color::parse(color).ok_or_else(|| EngineError::InvalidColor(color.to_owned()))?;
        Ok(self.commit_update(&id, |a| a.recolor(&parsed)))
    }

    /// Delete the selected annotation locally and emit the remote delete.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        let Some(id) = self.ui.selected_id.clone() else {
            return Vec::new();
        };
        if self.input.target() == Some(&id) {
            self.input = InputState::Idle;
        }
        let mut actions = self.set_selection(None);
        if self.doc.remove(&id).is_some() {
            actions.push(Action::Persist(SyncOp::Delete { id }));
            self.settle_mode(&mut actions);
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Drop the current selection.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        self.set_selection(None)
    }

    // --- Sync results ---

    /// Report a successful remote call for `op`, with the record the server returned.
    pub fn confirm_sync(&mut self, op: &SyncOp, server: Option<Annotation>) -> Vec<Action> {
        match sync::confirm(&mut self.doc, op, server, self.config.min_size) {
            SyncOutcome::Reconciled => vec![Action::RenderNeeded],
            SyncOutcome::RolledBack | SyncOutcome::Logged | SyncOutcome::Ignored => Vec::new(),
        }
    }

    /// Report a failed remote call for `op`; applies the kind's failure policy.
    pub fn reject_sync(&mut self, op: &SyncOp, err: &SyncError) -> Vec<Action> {
        if sync::reject(&mut self.doc, op, err) != SyncOutcome::RolledBack {
            return Vec::new();
        }
        let id = op.id();
        if self.input.target() == Some(id) {
            self.input = InputState::Idle;
        }
        let mut actions = Vec::new();
        if self.ui.selected_id.as_ref() == Some(id) {
            actions.extend(self.set_selection(None));
        }
        self.settle_mode(&mut actions);
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.ui.mode
    }

    /// The currently selected annotation, if any.
    #[must_use]
    pub fn selection(&self) -> Option<&AnnotationId> {
        self.ui.selected_id.as_ref()
    }

    /// Look up a committed annotation by id.
    #[must_use]
    pub fn annotation(&self, id: &AnnotationId) -> Option<&Annotation> {
        self.doc.get(id)
    }

    /// Committed annotations in draw order.
    pub fn annotations(&self) -> impl DoubleEndedIterator<Item = &Annotation> {
        self.doc.iter()
    }

    /// The in-progress annotation while a draw gesture is active.
    #[must_use]
    pub fn draft(&self) -> Option<&Annotation> {
        match &self.input {
            InputState::Drawing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Box to render for `id`, including any drag or resize preview.
    #[must_use]
    pub fn preview_bounds(&self, id: &AnnotationId) -> Option<Bounds> {
        match &self.input {
            InputState::Dragging { id: target, current, .. } if target == id => Some(*current),
            InputState::Resizing(session) if &session.id == id => Some(session.preview()),
            _ => self.doc.get(id).map(Annotation::bounds),
        }
    }

    /// Render handle for `id`.
    #[must_use]
    pub fn handle(&self, id: &AnnotationId) -> Option<NodeHandle> {
        self.doc.handle(id)
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// A canvas point where a press would land on `id`'s body rather than a
    /// handle or an overlapping annotation. Tries the center first.
    #[must_use]
    pub fn grab_point(&self, id: &AnnotationId) -> Option<Point> {
        const STEPS: i32 = 8;
        let b = self.doc.get(id)?.bounds();
        let at = |i: i32, j: i32| {
            Point::new(
                b.x + b.width * f64::from(i) / f64::from(STEPS),
                b.y + b.height * f64::from(j) / f64::from(STEPS),
            )
        };
        std::iter::once(at(STEPS / 2, STEPS / 2))
            .chain((0..=STEPS).flat_map(|i| (0..=STEPS).map(move |j| (i, j))).map(|(i, j)| at(i, j)))
            .filter(|pt| self.on_canvas(*pt))
            .find(|pt| {
                matches!(
                    hit_test(*pt, &self.doc, self.ui.selected_id.as_ref()),
                    Some(Hit { id: ref hit, part: HitPart::Body }) if hit == id
                )
            })
    }

    // --- Internals ---

    fn on_canvas(&self, pt: Point) -> bool {
        (0.0..=self.config.width).contains(&pt.x) && (0.0..=self.config.height).contains(&pt.y)
    }

    /// Drawn rectangles never extend past the canvas edges.
    fn clamp_to_canvas(&self, pt: Point) -> Point {
        Point::new(pt.x.clamp(0.0, self.config.width), pt.y.clamp(0.0, self.config.height))
    }

    fn begin_draw(&mut self, pt: Point) -> Vec<Action> {
        if hit_test(pt, &self.doc, None).is_some() {
            return Vec::new();
        }
        let name = format!("{NAME_PREFIX} {}", self.doc.len() + 1);
        let draft = Annotation::drafted(AnnotationId::generate(), pt, Some(name));
        self.input = InputState::Drawing { anchor: pt, draft };
        vec![Action::RenderNeeded]
    }

    fn begin_select(&mut self, pt: Point) -> Vec<Action> {
        match hit_test(pt, &self.doc, self.ui.selected_id.as_ref()) {
            Some(Hit { id, part: HitPart::ResizeHandle(anchor) }) => {
                let Some(orig) = self.doc.get(&id).map(Annotation::bounds) else {
                    return Vec::new();
                };
                self.input = InputState::Resizing(ResizeSession::begin(id, anchor, pt, orig));
                Vec::new()
            }
            Some(Hit { id, part: HitPart::Body }) => {
                let Some(orig) = self.doc.get(&id).map(Annotation::bounds) else {
                    return Vec::new();
                };
                let actions = self.set_selection(Some(id.clone()));
                self.input = InputState::Dragging { id, start: pt, orig, current: orig };
                actions
            }
            None => self.set_selection(None),
        }
    }

    fn commit_draft(&mut self, draft: Annotation) -> Vec<Action> {
        if !draft.is_committable(self.config.min_size) {
            return vec![Action::RenderNeeded];
        }
        let id = draft.id.clone();
        if !self.doc.insert(draft.clone()) {
            return vec![Action::RenderNeeded];
        }
        let Some(revision) = self.doc.revision(&id) else {
            return vec![Action::RenderNeeded];
        };
        vec![Action::Persist(SyncOp::Create { record: draft, revision }), Action::RenderNeeded]
    }

    fn commit_update<F>(&mut self, id: &AnnotationId, edit: F) -> Vec<Action>
    where
        F: FnOnce(&mut Annotation),
    {
        let Some(mut record) = self.doc.get(id).cloned() else {
            return Vec::new();
        };
        edit(&mut record);
        let Some(revision) = self.doc.replace(record.clone()) else {
            return Vec::new();
        };
        vec![Action::Persist(SyncOp::Update { record, revision }), Action::RenderNeeded]
    }

    fn set_selection(&mut self, id: Option<AnnotationId>) -> Vec<Action> {
        if self.ui.selected_id == id {
            return Vec::new();
        }
        self.ui.selected_id.clone_from(&id);
        vec![Action::SelectionChanged(id)]
    }

    /// Leave select mode once there is nothing left to select.
    fn settle_mode(&mut self, actions: &mut Vec<Action>) {
        if self.ui.mode == Mode::Select && self.doc.is_empty() {
            self.ui.mode = Mode::Draw;
            actions.push(Action::ModeChanged(Mode::Draw));
        }
    }
}
