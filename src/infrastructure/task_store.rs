use crate::domain::models::Task;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::open_connection;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub trait TaskStore: Send + Sync {
    /// Tasks for the day, ascending by `order`, ties in insertion order.
    fn get_tasks_for_date(&self, day_key: &str) -> Result<Vec<Task>, InfraError>;
    /// Sets each listed task's `order` to its index in `ordered_ids`. Unknown ids are ignored.
    fn reorder_tasks(&self, day_key: &str, ordered_ids: &[String]) -> Result<(), InfraError>;
    fn add_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError>;
    fn update_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError>;
    fn delete_task(&self, day_key: &str, task_id: &str) -> Result<bool, InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    days: Mutex<HashMap<String, Vec<Task>>>,
}

impl InMemoryTaskStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<Task>>>, InfraError> {
        self.days
            .lock()
            .map_err(|error| InfraError::poisoned("task store", error))
    }
}

impl TaskStore for InMemoryTaskStore {
    fn get_tasks_for_date(&self, day_key: &str) -> Result<Vec<Task>, InfraError> {
        let days = self.lock()?;
        let mut tasks = days.get(day_key).cloned().unwrap_or_default();
        tasks.sort_by_key(|task| task.order);
        Ok(tasks)
    }

    fn reorder_tasks(&self, day_key: &str, ordered_ids: &[String]) -> Result<(), InfraError> {
        let mut days = self.lock()?;
        let Some(tasks) = days.get_mut(day_key) else {
            return Ok(());
        };
        for (index, task_id) in ordered_ids.iter().enumerate() {
            if let Some(task) = tasks.iter_mut().find(|task| &task.id == task_id) {
                task.order = index as i64;
            }
        }
        Ok(())
    }

    fn add_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError> {
        task.validate().map_err(InfraError::InvalidTask)?;
        let mut days = self.lock()?;
        if days.values().flatten().any(|existing| existing.id == task.id) {
            return Err(InfraError::InvalidTask(format!(
                "task already exists: {}",
                task.id
            )));
        }
        days.entry(day_key.to_string()).or_default().push(task.clone());
        Ok(())
    }

    fn update_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError> {
        task.validate().map_err(InfraError::InvalidTask)?;
        let mut days = self.lock()?;
        let existing = days
            .get_mut(day_key)
            .and_then(|tasks| tasks.iter_mut().find(|existing| existing.id == task.id))
            .ok_or_else(|| InfraError::InvalidTask(format!("task not found: {}", task.id)))?;
        *existing = task.clone();
        Ok(())
    }

    fn delete_task(&self, day_key: &str, task_id: &str) -> Result<bool, InfraError> {
        let mut days = self.lock()?;
        let Some(tasks) = days.get_mut(day_key) else {
            return Ok(false);
        };
        let before = tasks.len();
        tasks.retain(|task| task.id != task_id);
        Ok(tasks.len() != before)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db_path: PathBuf,
}

impl SqliteTaskStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        open_connection(&self.db_path)
    }
}

impl TaskStore for SqliteTaskStore {
    fn get_tasks_for_date(&self, day_key: &str) -> Result<Vec<Task>, InfraError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, time, end_time, title, completed, sort_order, column_id
             FROM tasks
             WHERE date_key = ?1
             ORDER BY sort_order ASC, rowid ASC",
        )?;
        let rows = statement.query_map(params![day_key], |row| {
            Ok(Task {
                id: row.get(0)?,
                time: row.get(1)?,
                end_time: row.get(2)?,
                title: row.get(3)?,
                completed: row.get(4)?,
                order: row.get(5)?,
                column: row.get(6)?,
            })
        })?;
        let tasks = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    fn reorder_tasks(&self, day_key: &str, ordered_ids: &[String]) -> Result<(), InfraError> {
        let mut connection = self.connect()?;
        let transaction = connection.transaction()?;
        {
            let mut statement = transaction
                .prepare("UPDATE tasks SET sort_order = ?1 WHERE id = ?2 AND date_key = ?3")?;
            for (index, task_id) in ordered_ids.iter().enumerate() {
                statement.execute(params![index as i64, task_id, day_key])?;
            }
        }
        transaction.commit()?;
        Ok(())
    }

    fn add_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError> {
        task.validate().map_err(InfraError::InvalidTask)?;
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO tasks (id, date_key, time, end_time, title, completed, sort_order, column_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                task.id,
                day_key,
                task.time,
                task.end_time,
                task.title,
                task.completed,
                task.order,
                task.column
            ],
        )?;
        Ok(())
    }

    fn update_task(&self, day_key: &str, task: &Task) -> Result<(), InfraError> {
        task.validate().map_err(InfraError::InvalidTask)?;
        let connection = self.connect()?;
        let changed = connection.execute(
            "UPDATE tasks
             SET time = ?1, end_time = ?2, title = ?3, completed = ?4, sort_order = ?5, column_id = ?6
             WHERE id = ?7 AND date_key = ?8",
            params![
                task.time,
                task.end_time,
                task.title,
                task.completed,
                task.order,
                task.column,
                task.id,
                day_key
            ],
        )?;
        if changed == 0 {
            return Err(InfraError::InvalidTask(format!("task not found: {}", task.id)));
        }
        Ok(())
    }

    fn delete_task(&self, day_key: &str, task_id: &str) -> Result<bool, InfraError> {
        let connection = self.connect()?;
        let changed = connection.execute(
            "DELETE FROM tasks WHERE id = ?1 AND date_key = ?2",
            params![task_id, day_key],
        )?;
        Ok(changed > 0)
    }
}
