use crate::domain::models::Task;

/// Moves `source_id` to the index currently held by `target_id`.
///
/// Returns `false` (leaving `tasks` untouched) when either id is missing.
pub fn move_to_target(tasks: &mut Vec<Task>, source_id: &str, target_id: &str) -> bool {
    let Some(source_index) = tasks.iter().position(|task| task.id == source_id) else {
        return false;
    };
    let Some(target_index) = tasks.iter().position(|task| task.id == target_id) else {
        return false;
    };

    let moved = tasks.remove(source_index);
    tasks.insert(target_index.min(tasks.len()), moved);
    true
}

pub fn renumber(tasks: &mut [Task]) {
    for (index, task) in tasks.iter_mut().enumerate() {
        task.order = index as i64;
    }
}

pub fn append_to_column(tasks: &mut [Task], source_id: &str, column: &str) -> bool {
    let column_len = tasks.iter().filter(|task| task.column == column).count();
    let Some(source) = tasks.iter_mut().find(|task| task.id == source_id) else {
        return false;
    };
    source.order = column_len as i64;
    source.column = column.to_string();
    true
}

pub fn ordered_ids(tasks: &[Task]) -> Vec<String> {
    tasks.iter().map(|task| task.id.clone()).collect()
}
