use crate::domain::calendar::CalendarState;
use crate::domain::models::Task;
use crate::domain::reorder::{append_to_column, move_to_target, ordered_ids, renumber};
use crate::domain::time::{format_day_key, is_past_date};
use crate::infrastructure::task_store::TaskStore;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragState {
    dragged_task_id: Option<String>,
    dragged_over_task_id: Option<String>,
    dragged_over_column: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget<'a> {
    Task(&'a str),
    Column(&'a str),
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReorderOutcome {
    pub day_key: String,
    pub ordered_ids: Vec<String>,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Default)]
pub struct DragDropEngine {
    state: DragState,
}

impl DragDropEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dragged_task_id(&self) -> Option<&str> {
        self.state.dragged_task_id.as_deref()
    }

    pub fn dragged_over_task_id(&self) -> Option<&str> {
        self.state.dragged_over_task_id.as_deref()
    }

    pub fn dragged_over_column(&self) -> Option<&str> {
        self.state.dragged_over_column.as_deref()
    }

    pub fn begin_drag(&mut self, calendar: &CalendarState, task_id: &str) -> bool {
        if editable_day(calendar).is_none() {
            return false;
        }
        self.state.dragged_task_id = Some(task_id.to_string());
        debug!(task_id, "drag started");
        true
    }

    pub fn drag_over(&mut self, calendar: &CalendarState, target: DragTarget<'_>) {
        if editable_day(calendar).is_none() {
            return;
        }
        match target {
            DragTarget::Task(task_id) => {
                self.state.dragged_over_task_id = Some(task_id.to_string());
            }
            DragTarget::Column(column) => {
                self.state.dragged_over_column = Some(column.to_string());
            }
        }
    }

    pub fn drag_leave(&mut self) {
        self.state.dragged_over_task_id = None;
    }

    pub fn column_drag_leave(&mut self) {
        self.state.dragged_over_column = None;
    }

    pub fn end_drag(&mut self) {
        self.state = DragState::default();
    }

    pub fn drop(
        &mut self,
        calendar: &CalendarState,
        store: &dyn TaskStore,
        target_task_id: Option<&str>,
        target_column: Option<&str>,
    ) -> Option<ReorderOutcome> {
        let day = editable_day(calendar)?;
        let Some(source_id) = self.state.dragged_task_id.clone() else {
            self.end_drag();
            return None;
        };
        let day_key = format_day_key(day);

        let mut tasks = match store.get_tasks_for_date(&day_key) {
            Ok(tasks) => tasks,
            Err(error) => {
                warn!(error = %error, day_key = %day_key, "failed to load tasks for drop");
                self.end_drag();
                return None;
            }
        };

        let committed = match (target_task_id, target_column) {
            (Some(target_id), _) => drop_on_task(&mut tasks, &source_id, target_id),
            (None, Some(column)) => drop_on_column(store, &day_key, &mut tasks, &source_id, column),
            (None, None) => false,
        };
        self.end_drag();
        if !committed {
            debug!(source_id = %source_id, "drop aborted");
            return None;
        }

        let ordered_ids = ordered_ids(&tasks);
        if let Err(error) = store.reorder_tasks(&day_key, &ordered_ids) {
            warn!(error = %error, day_key = %day_key, "failed to persist task order");
        }
        info!(source_id = %source_id, day_key = %day_key, "tasks reordered");
        Some(ReorderOutcome {
            day_key,
            ordered_ids,
            tasks,
        })
    }
}

fn drop_on_task(tasks: &mut Vec<Task>, source_id: &str, target_id: &str) -> bool {
    if source_id == target_id || !move_to_target(tasks, source_id, target_id) {
        return false;
    }
    renumber(tasks);
    true
}

fn drop_on_column(
    store: &dyn TaskStore,
    day_key: &str,
    tasks: &mut [Task],
    source_id: &str,
    column: &str,
) -> bool {
    if !append_to_column(tasks, source_id, column) {
        return false;
    }
    if let Some(moved) = tasks.iter().find(|task| task.id == source_id) {
        if let Err(error) = store.update_task(day_key, moved) {
            warn!(error = %error, task_id = %source_id, "failed to persist column move");
        }
    }
    true
}

fn editable_day(calendar: &CalendarState) -> Option<NaiveDate> {
    calendar
        .selected_date()
        .filter(|day| !is_past_date(*day, calendar.today()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::task_store::InMemoryTaskStore;

    const DAY: &str = "2026-02-16";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 16).expect("valid date")
    }

    fn sample_task(id: &str, column: &str, order: i64) -> Task {
        Task {
            id: id.to_string(),
            time: "09:00".to_string(),
            end_time: None,
            title: format!("Task {id}"),
            completed: false,
            order,
            column: column.to_string(),
        }
    }

    fn seeded_store() -> InMemoryTaskStore {
        let store = InMemoryTaskStore::default();
        for (index, (id, column)) in [("a", "todo"), ("b", "todo"), ("c", "doing"), ("d", "done")]
            .into_iter()
            .enumerate()
        {
            store
                .add_task(DAY, &sample_task(id, column, index as i64))
                .expect("add task");
        }
        store
    }

    fn stored_ids(store: &InMemoryTaskStore) -> Vec<String> {
        ordered_ids(&store.get_tasks_for_date(DAY).expect("get tasks"))
    }

    #[test]
    fn drop_on_task_moves_before_target_and_renumbers() {
        let store = seeded_store();
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        assert!(engine.begin_drag(&calendar, "d"));
        engine.drag_over(&calendar, DragTarget::Task("b"));
        assert_eq!(engine.dragged_over_task_id(), Some("b"));

        let outcome = engine
            .drop(&calendar, &store, Some("b"), None)
            .expect("drop commits");
        assert_eq!(outcome.day_key, DAY);
        assert_eq!(outcome.ordered_ids, vec!["a", "d", "b", "c"]);
        assert_eq!(
            outcome.tasks.iter().map(|task| task.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
        assert_eq!(stored_ids(&store), vec!["a", "d", "b", "c"]);
        assert_eq!(engine.dragged_task_id(), None);
        assert_eq!(engine.dragged_over_task_id(), None);
    }

    #[test]
    fn drop_on_column_appends_and_moves_column() {
        let store = seeded_store();
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        engine.begin_drag(&calendar, "a");
        engine.drag_over(&calendar, DragTarget::Column("done"));
        assert_eq!(engine.dragged_over_column(), Some("done"));
        let outcome = engine
            .drop(&calendar, &store, None, Some("done"))
            .expect("drop commits");

        let moved = outcome
            .tasks
            .iter()
            .find(|task| task.id == "a")
            .expect("moved task");
        assert_eq!(moved.column, "done");
        assert_eq!(moved.order, 1);
        assert_eq!(outcome.ordered_ids, vec!["a", "b", "c", "d"]);

        let stored = store.get_tasks_for_date(DAY).expect("get tasks");
        let stored_moved = stored.iter().find(|task| task.id == "a").expect("stored task");
        assert_eq!(stored_moved.column, "done");
    }

    #[test]
    fn stale_ids_abort_and_clear_state() {
        let store = seeded_store();
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        engine.begin_drag(&calendar, "ghost");
        assert!(engine.drop(&calendar, &store, Some("b"), None).is_none());
        assert_eq!(engine.dragged_task_id(), None);

        engine.begin_drag(&calendar, "a");
        assert!(engine.drop(&calendar, &store, Some("ghost"), None).is_none());
        assert_eq!(stored_ids(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn unknown_source_dropped_on_column_leaves_store_untouched() {
        let store = seeded_store();
        let before = store.get_tasks_for_date(DAY).expect("get tasks");
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        assert!(engine.begin_drag(&calendar, "ghost"));
        engine.drag_over(&calendar, DragTarget::Column("done"));
        assert!(engine.drop(&calendar, &store, None, Some("done")).is_none());

        assert_eq!(engine.dragged_task_id(), None);
        assert_eq!(engine.dragged_over_column(), None);
        assert_eq!(store.get_tasks_for_date(DAY).expect("get tasks"), before);
    }

    #[test]
    fn drop_without_any_target_clears_drag() {
        let store = seeded_store();
        let before = store.get_tasks_for_date(DAY).expect("get tasks");
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        assert!(engine.begin_drag(&calendar, "a"));
        engine.drag_over(&calendar, DragTarget::Column("doing"));
        assert!(engine.drop(&calendar, &store, None, None).is_none());

        assert_eq!(engine.dragged_task_id(), None);
        assert_eq!(engine.dragged_over_task_id(), None);
        assert_eq!(engine.dragged_over_column(), None);
        assert_eq!(store.get_tasks_for_date(DAY).expect("get tasks"), before);
    }

    #[test]
    fn dropping_on_itself_changes_nothing() {
        let store = seeded_store();
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();
        engine.begin_drag(&calendar, "b");
        assert!(engine.drop(&calendar, &store, Some("b"), None).is_none());
        assert_eq!(stored_ids(&store), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn past_or_missing_day_is_read_only() {
        let store = seeded_store();
        let mut calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();

        calendar.select_date(NaiveDate::from_ymd_opt(2026, 2, 15).expect("valid date"));
        assert!(!engine.begin_drag(&calendar, "a"));
        assert!(engine.drop(&calendar, &store, Some("b"), None).is_none());

        calendar.clear_selection();
        assert!(!engine.begin_drag(&calendar, "a"));
        engine.drag_over(&calendar, DragTarget::Column("done"));
        assert_eq!(engine.dragged_over_column(), None);
    }

    #[test]
    fn leave_clears_hover_targets() {
        let calendar = CalendarState::new(today());
        let mut engine = DragDropEngine::new();
        engine.begin_drag(&calendar, "a");
        engine.drag_over(&calendar, DragTarget::Task("b"));
        engine.drag_over(&calendar, DragTarget::Column("doing"));
        engine.drag_leave();
        engine.column_drag_leave();
        assert_eq!(engine.dragged_over_task_id(), None);
        assert_eq!(engine.dragged_over_column(), None);
        assert_eq!(engine.dragged_task_id(), Some("a"));
    }
}
