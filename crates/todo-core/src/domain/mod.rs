//! Domain entities - the core business objects.

mod todo;
mod user;
mod validation;

pub use todo::{
    DESCRIPTION_MAX_LEN, InvalidPriority, NewTodo, Priority, TITLE_MAX_LEN, TITLE_MIN_LEN, Todo,
    TodoFields, TodoFilter, TodoUpdate,
};
pub use user::{
    PASSWORD_MIN_LEN, Registration, RegistrationFields, USERNAME_MIN_LEN, User, normalize_email,
};
pub use validation::ValidationErrors;
