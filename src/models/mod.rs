pub mod task;
pub mod user;

pub use task::{
    PatchError, Task, TaskFilter, TaskInput, TaskOrder, TaskPatch, TaskQuery, TaskState,
    TaskUpdate,
};
pub use user::{NewUser, ProfileChanges, PublicUser, UpdateProfileRequest, User};
