use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{Conversation, Message, Role};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: String,
}

impl Conversation {
    pub fn to_response(&self) -> ConversationResponse {
        ConversationResponse {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            title: self.title.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}

impl Message {
    pub fn to_response(&self) -> MessageResponse {
        MessageResponse {
            id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            role: self.role,
            content: self.content.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
