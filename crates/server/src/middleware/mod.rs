pub mod auth;
pub mod model_loaders;

pub use auth::require_session;
pub use model_loaders::{
    load_module_middleware, load_note_middleware, load_project_middleware, load_task_middleware,
    load_upload_middleware,
};
