use db::models::{module::Module, project::Project, task::Task, workspace_chat::ChatRole};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::services::completion::TurnMessage;

/// Trailing window of prior conversation turns included in a module-scoped
/// completion request. Enforced server-side regardless of what the client
/// submits.
pub const HISTORY_LIMIT: usize = 10;

/// A prior conversation turn as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub message: String,
}

/// Render the system instruction for the module-scoped coding assistant.
///
/// Deterministic: the output depends only on the module/task snapshot passed
/// in, so identical state produces byte-identical instructions.
pub fn module_instruction(project: &Project, module: &Module, tasks: &[Task]) -> String {
    let checklist = tasks
        .iter()
        .map(|t| {
            format!(
                "- [{}] {} ({})",
                if t.completed { "x" } else { " " },
                t.description,
                t.category
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI coding assistant helping build the \"{module_name}\" module for the {project_name} project.\n\
         \n\
         Project: {project_name}\n\
         Module: {module_name}\n\
         Description: {description}\n\
         Current Progress: {progress}%\n\
         Status: {status}\n\
         \n\
         Tasks for this module:\n\
         {checklist}\n\
         \n\
         You are helping the developer build this module through conversational development - they describe what they want and you help implement it.\n\
         \n\
         Guidelines:\n\
         1. Be helpful, concise, and provide working code\n\
         2. Break down complex tasks into manageable steps\n\
         3. Suggest improvements and catch potential issues\n\
         4. Reference the task list when relevant to track progress\n\
         5. Provide complete, runnable code snippets\n\
         \n\
         Remember: You're pair programming, not lecturing. Keep responses focused and actionable.",
        module_name = module.name,
        project_name = project.name,
        description = module.description.as_deref().unwrap_or("No description provided"),
        progress = module.progress,
        status = module.status,
    )
}

/// Fixed instruction for the general workspace assistant. Not data-dependent;
/// the caller owns conversation continuity by resubmitting its history.
pub fn general_instruction() -> &'static str {
    "You are a helpful assistant for a team collaboration workspace. Team members ask you \
     about their project work, planning, and day-to-day engineering questions. Be concise \
     and practical, and say so plainly when you don't know something."
}

/// Assemble the ordered turn sequence for a completion call: the trailing
/// `HISTORY_LIMIT` prior turns followed by the new user message.
pub fn bounded_turns(history: &[ChatTurn], message: &str) -> Vec<TurnMessage> {
    let start = history.len().saturating_sub(HISTORY_LIMIT);
    let mut turns: Vec<TurnMessage> = history[start..]
        .iter()
        .map(|turn| TurnMessage {
            role: turn.role.to_string(),
            content: turn.message.clone(),
        })
        .collect();
    turns.push(TurnMessage {
        role: ChatRole::User.to_string(),
        content: message.to_string(),
    });
    turns
}

/// Turn sequence for the general assistant: the client-supplied history is
/// passed through unbounded, then the new user message.
pub fn open_turns(history: &[ChatTurn], message: &str) -> Vec<TurnMessage> {
    let mut turns: Vec<TurnMessage> = history
        .iter()
        .map(|turn| TurnMessage {
            role: turn.role.to_string(),
            content: turn.message.clone(),
        })
        .collect();
    turns.push(TurnMessage {
        role: ChatRole::User.to_string(),
        content: message.to_string(),
    });
    turns
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use db::models::module::ModuleStatus;
    use uuid::Uuid;

    use super::*;

    fn fixed_project() -> Project {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Project {
            id: Uuid::from_u128(1),
            name: "Atlas Platform".to_string(),
            description: None,
            phase: "consensus".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn fixed_module() -> Module {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        Module {
            id: Uuid::from_u128(2),
            project_id: Uuid::from_u128(1),
            assignee_id: None,
            name: "Data Ingestion".to_string(),
            description: Some("File upload and parsing".to_string()),
            status: ModuleStatus::InProgress,
            progress: 30,
            created_at: at,
            updated_at: at,
        }
    }

    fn fixed_tasks() -> Vec<Task> {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        vec![
            Task {
                id: Uuid::from_u128(10),
                module_id: Uuid::from_u128(2),
                description: "Implement CSV parser".to_string(),
                category: "Backend".to_string(),
                completed: true,
                verified_by_id: Some(Uuid::from_u128(3)),
                completed_at: Some(at),
                created_at: at,
                updated_at: at,
            },
            Task {
                id: Uuid::from_u128(11),
                module_id: Uuid::from_u128(2),
                description: "Implement JSON parser".to_string(),
                category: "Backend".to_string(),
                completed: false,
                verified_by_id: None,
                completed_at: None,
                created_at: at,
                updated_at: at,
            },
        ]
    }

    #[test]
    fn instruction_embeds_module_state_and_checklist() {
        let instruction = module_instruction(&fixed_project(), &fixed_module(), &fixed_tasks());
        assert!(instruction.contains("Project: Atlas Platform"));
        assert!(instruction.contains("Module: Data Ingestion"));
        assert!(instruction.contains("Current Progress: 30%"));
        assert!(instruction.contains("Status: in-progress"));
        assert!(instruction.contains("- [x] Implement CSV parser (Backend)"));
        assert!(instruction.contains("- [ ] Implement JSON parser (Backend)"));
    }

    #[test]
    fn instruction_is_deterministic_for_identical_snapshots() {
        let first = module_instruction(&fixed_project(), &fixed_module(), &fixed_tasks());
        let second = module_instruction(&fixed_project(), &fixed_module(), &fixed_tasks());
        assert_eq!(first, second);
    }

    #[test]
    fn missing_description_renders_placeholder() {
        let mut module = fixed_module();
        module.description = None;
        let instruction = module_instruction(&fixed_project(), &module, &[]);
        assert!(instruction.contains("Description: No description provided"));
    }

    #[test]
    fn history_is_bounded_to_the_trailing_window() {
        let history: Vec<ChatTurn> = (0..25)
            .map(|i| ChatTurn {
                role: if i % 2 == 0 {
                    ChatRole::User
                } else {
                    ChatRole::Assistant
                },
                message: format!("turn {i}"),
            })
            .collect();

        let turns = bounded_turns(&history, "latest question");
        assert_eq!(turns.len(), HISTORY_LIMIT + 1);
        // Oldest surviving turn is #15 of 0..25.
        assert_eq!(turns[0].content, "turn 15");
        let last = turns.last().unwrap();
        assert_eq!(last.role, "user");
        assert_eq!(last.content, "latest question");
    }

    #[test]
    fn short_history_passes_through_in_order() {
        let history = vec![
            ChatTurn {
                role: ChatRole::User,
                message: "hello".to_string(),
            },
            ChatTurn {
                role: ChatRole::Assistant,
                message: "hi there".to_string(),
            },
        ];
        let turns = bounded_turns(&history, "next");
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[1].role, "assistant");
        assert_eq!(turns[2].content, "next");
    }
}
