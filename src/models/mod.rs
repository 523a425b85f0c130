pub mod task;
pub mod token;
pub mod user;

pub use task::{Task, TaskChangesInput, TaskInput, TaskView};
pub use token::{SessionToken, TokenView};
pub use user::{User, UserChangesInput, UserInput, UserView};
