#![forbid(unsafe_code)]

//! Per-component local state.
//!
//! A component receives a [`Hooks`] scope each time its fiber is processed.
//! Every [`Hooks::use_state`] call claims the next position; the state at
//! that position is seeded from the cell the same position held in the
//! previously committed render, folded through the updates queued on it.
//!
//! Positions are call order, so a component must call its hooks
//! unconditionally and in the same order on every render. Violations are
//! reported by [`Hooks::finish`] rather than silently misaligning slots.
//!
//! Setters enqueue into the cell they were created with and raise the
//! shared [`UpdateSignal`]; the renderer answers the signal with a fresh
//! pass from the committed root, where the queued updates are applied.

use std::any::{Any, type_name};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

type Updater = Rc<dyn Fn(&dyn Any) -> Option<Box<dyn Any>>>;

/// Hook misuse detected while rendering a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The component called a different number of hooks than last render.
    CountMismatch {
        /// Hooks called in the previous committed render.
        expected: usize,
        /// Hooks called in this render.
        actual: usize,
    },
    /// The state at a position changed type between renders.
    TypeMismatch {
        /// Hook position.
        index: usize,
        /// Type requested in this render.
        expected: &'static str,
        /// Type stored by the previous render.
        found: &'static str,
    },
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountMismatch { expected, actual } => write!(
                f,
                "hook count changed between renders: expected {expected}, got {actual}"
            ),
            Self::TypeMismatch {
                index,
                expected,
                found,
            } => write!(
                f,
                "hook {index} changed type between renders: expected {expected}, found {found}"
            ),
        }
    }
}

impl std::error::Error for HookError {}

/// Raised by setters to ask the renderer for a new pass.
///
/// Clones share one counter. The renderer drains it between units of work.
#[derive(Debug, Clone, Default)]
pub struct UpdateSignal(Rc<Cell<usize>>);

impl UpdateSignal {
    /// New signal with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one update request.
    pub fn request(&self) {
        self.0.set(self.0.get().saturating_add(1));
    }

    /// Number of requests since the last [`take`](Self::take).
    #[must_use]
    pub fn pending(&self) -> usize {
        self.0.get()
    }

    /// Whether any request is pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending() > 0
    }

    /// Drain pending requests, returning how many there were.
    pub fn take(&self) -> usize {
        self.0.replace(0)
    }
}

/// One state slot of one component render.
pub struct HookCell {
    state: Box<dyn Any>,
    type_name: &'static str,
    queue: RefCell<Vec<Updater>>,
}

impl HookCell {
    fn new<T: 'static>(state: T) -> Self {
        Self {
            state: Box::new(state),
            type_name: type_name::<T>(),
            queue: RefCell::new(Vec::new()),
        }
    }

    /// Stored state, if it has type `T`.
    #[must_use]
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.state.downcast_ref()
    }

    /// Name of the stored state type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Number of queued updates.
    #[must_use]
    pub fn pending_updates(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether any update is queued.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending_updates() > 0
    }

    fn enqueue(&self, updater: Updater) {
        self.queue.borrow_mut().push(updater);
    }

    /// Fold the queued updates over the stored state.
    ///
    /// The queue is left intact: a pass that is superseded before commit
    /// must not lose updates.
    fn resolve<T: Clone + 'static>(&self, index: usize) -> Result<T, HookError> {
        let mismatch = || HookError::TypeMismatch {
            index,
            expected: type_name::<T>(),
            found: self.type_name,
        };
        let mut value = self.state.downcast_ref::<T>().cloned().ok_or_else(mismatch)?;
        // Snapshot so an updater may call a setter on this same cell.
        let queue: Vec<Updater> = self.queue.borrow().clone();
        for updater in queue {
            let next = updater(&value).ok_or_else(mismatch)?;
            value = *next.downcast::<T>().map_err(|_| mismatch())?;
        }
        Ok(value)
    }
}

impl fmt::Debug for HookCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCell")
            .field("type_name", &self.type_name)
            .field("pending", &self.pending_updates())
            .finish()
    }
}

/// State setter returned by [`Hooks::use_state`].
pub struct Setter<T> {
    cell: Rc<HookCell>,
    signal: UpdateSignal,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            signal: self.signal.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter")
            .field("cell", &self.cell)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + 'static> Setter<T> {
    /// Replace the state on the next render.
    pub fn set(&self, value: T) {
        self.update(move |_| value.clone());
    }

    /// Derive the next state from the previous one on the next render.
    pub fn update(&self, f: impl Fn(&T) -> T + 'static) {
        let updater: Updater = Rc::new(move |prev: &dyn Any| {
            prev.downcast_ref::<T>()
                .map(|p| Box::new(f(p)) as Box<dyn Any>)
        });
        self.cell.enqueue(updater);
        self.signal.request();
    }
}

/// Hook scope for one component invocation.
pub struct Hooks<'a> {
    previous: Option<&'a [Rc<HookCell>]>,
    cells: Vec<Rc<HookCell>>,
    signal: &'a UpdateSignal,
    error: Option<HookError>,
}

impl<'a> Hooks<'a> {
    /// Scope seeded from the previous render's cells, if the fiber has one.
    #[must_use]
    pub fn new(previous: Option<&'a [Rc<HookCell>]>, signal: &'a UpdateSignal) -> Self {
        Self {
            previous,
            cells: Vec::new(),
            signal,
            error: None,
        }
    }

    /// Local state: current value and a setter.
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, Setter<T>) {
        self.use_state_with(move || initial)
    }

    /// Like [`use_state`](Self::use_state), computing the initial value
    /// only when there is no previous state.
    pub fn use_state_with<T: Clone + 'static>(
        &mut self,
        init: impl FnOnce() -> T,
    ) -> (T, Setter<T>) {
        let index = self.cells.len();
        let value = match self.previous.and_then(|cells| cells.get(index)) {
            Some(old) => match old.resolve::<T>(index) {
                Ok(value) => value,
                Err(err) => {
                    self.error.get_or_insert(err);
                    init()
                }
            },
            None => init(),
        };
        let cell = Rc::new(HookCell::new(value.clone()));
        self.cells.push(Rc::clone(&cell));
        let setter = Setter {
            cell,
            signal: self.signal.clone(),
            _marker: PhantomData,
        };
        (value, setter)
    }

    /// Hooks called so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.cells.len()
    }

    /// Close the scope and hand back the new cells.
    ///
    /// With `check_count`, a component that had previous cells must have
    /// called exactly as many hooks this time.
    pub fn finish(self, check_count: bool) -> Result<Vec<Rc<HookCell>>, HookError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if check_count
            && let Some(previous) = self.previous
            && previous.len() != self.cells.len()
        {
            return Err(HookError::CountMismatch {
                expected: previous.len(),
                actual: self.cells.len(),
            });
        }
        Ok(self.cells)
    }
}

impl fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("previous", &self.previous.map(<[_]>::len))
            .field("calls", &self.cells.len())
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render_counter(
        previous: Option<&[Rc<HookCell>]>,
        signal: &UpdateSignal,
    ) -> (i32, Setter<i32>, Vec<Rc<HookCell>>) {
        let mut hooks = Hooks::new(previous, signal);
        let (count, set) = hooks.use_state(0);
        let cells = hooks.finish(true).expect("hooks");
        (count, set, cells)
    }

    #[test]
    fn initial_value_without_previous() {
        let signal = UpdateSignal::new();
        let (count, _, cells) = render_counter(None, &signal);
        assert_eq!(count, 0);
        assert_eq!(cells.len(), 1);
        assert!(!signal.is_pending());
    }

    #[test]
    fn updates_fold_in_enqueue_order() {
        let signal = UpdateSignal::new();
        let (_, set, first) = render_counter(None, &signal);
        set.update(|c| c + 1);
        set.update(|c| c * 10);
        set.set(7);
        set.update(|c| c + 1);
        assert_eq!(signal.take(), 4);

        let (count, _, _) = render_counter(Some(&first), &signal);
        assert_eq!(count, 8);
    }

    #[test]
    fn queue_survives_a_discarded_render() {
        let signal = UpdateSignal::new();
        let (_, set, first) = render_counter(None, &signal);
        set.update(|c| c + 1);

        // A pass that reads the queue and is then thrown away.
        let _ = render_counter(Some(&first), &signal);
        let (count, _, _) = render_counter(Some(&first), &signal);
        assert_eq!(count, 1);
        assert_eq!(first[0].pending_updates(), 1);
    }

    #[test]
    fn state_persists_across_renders() {
        let signal = UpdateSignal::new();
        let (_, set, first) = render_counter(None, &signal);
        set.update(|c| c + 1);
        let (count, set, second) = render_counter(Some(&first), &signal);
        assert_eq!(count, 1);
        set.update(|c| c + 1);
        let (count, _, _) = render_counter(Some(&second), &signal);
        assert_eq!(count, 2);
    }

    #[test]
    fn count_mismatch_is_reported() {
        let signal = UpdateSignal::new();
        let (_, _, first) = render_counter(None, &signal);

        let mut hooks = Hooks::new(Some(&first), &signal);
        let _ = hooks.use_state(0);
        let _ = hooks.use_state(String::new());
        assert_eq!(
            hooks.finish(true).unwrap_err(),
            HookError::CountMismatch {
                expected: 1,
                actual: 2
            }
        );

        let mut hooks = Hooks::new(Some(&first), &signal);
        let _ = hooks.use_state(0);
        let _ = hooks.use_state(String::new());
        assert!(hooks.finish(false).is_ok());
    }

    #[test]
    fn type_mismatch_is_reported() {
        let signal = UpdateSignal::new();
        let (_, _, first) = render_counter(None, &signal);

        let mut hooks = Hooks::new(Some(&first), &signal);
        let (value, _) = hooks.use_state(String::from("x"));
        assert_eq!(value, "x");
        let err = hooks.finish(true).unwrap_err();
        assert!(matches!(err, HookError::TypeMismatch { index: 0, .. }));
    }

    #[test]
    fn lazy_init_skipped_when_previous_exists() {
        let signal = UpdateSignal::new();
        let (_, _, first) = render_counter(None, &signal);
        let mut hooks = Hooks::new(Some(&first), &signal);
        let (value, _) = hooks.use_state_with(|| -> i32 { panic!("init must not run") });
        assert_eq!(value, 0);
    }

    #[test]
    fn updater_may_call_setter_on_same_cell() {
        let signal = UpdateSignal::new();
        let (_, set, first) = render_counter(None, &signal);
        let inner = set.clone();
        set.update(move |c| {
            inner.set(100);
            c + 1
        });
        let (count, _, _) = render_counter(Some(&first), &signal);
        assert_eq!(count, 1);
        assert_eq!(first[0].pending_updates(), 2);
    }

    #[test]
    fn cell_reports_type_and_state() {
        let signal = UpdateSignal::new();
        let (_, _, cells) = render_counter(None, &signal);
        assert_eq!(cells[0].state::<i32>(), Some(&0));
        assert_eq!(cells[0].state::<u8>(), None);
        assert_eq!(cells[0].type_name(), "i32");
    }
}
