//! Todo entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use todo_core::domain::Priority;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "todos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub completed: bool,
    pub due_date: Option<DateTimeWithTimeZone>,
    /// 1 = high, 2 = medium, 3 = low; enforced by a CHECK constraint.
    pub priority: i16,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain Todo.
impl From<Model> for todo_core::domain::Todo {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            completed: model.completed,
            due_date: model.due_date.map(Into::into),
            priority: Priority::try_from(model.priority).unwrap_or_default(),
            created_at: model.created_at.into(),
        }
    }
}

/// Conversion from Domain Todo to SeaORM ActiveModel.
impl From<todo_core::domain::Todo> for ActiveModel {
    fn from(todo: todo_core::domain::Todo) -> Self {
        Self {
            id: Set(todo.id),
            title: Set(todo.title),
            description: Set(todo.description),
            completed: Set(todo.completed),
            due_date: Set(todo.due_date.map(Into::into)),
            priority: Set(todo.priority.value()),
            created_at: Set(todo.created_at.into()),
        }
    }
}
