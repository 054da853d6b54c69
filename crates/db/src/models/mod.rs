pub mod chat_message;
pub mod module;
pub mod note;
pub mod project;
pub mod project_member;
pub mod session;
pub mod task;
pub mod upload;
pub mod user;
pub mod workspace_chat;
