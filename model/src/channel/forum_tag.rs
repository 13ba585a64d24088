use serde::{Deserialize, Serialize};

use crate::Snowflake;

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(from = "ForumTagFields")]
pub struct ForumTag {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Snowflake>,
    pub name: String,
    pub moderated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji_id: Option<Snowflake>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji_name: Option<String>,
}

// Accepts Discord's flat emoji fields as well as the nested `emoji` object found in older documents
#[derive(Deserialize)]
struct ForumTagFields {
    id: Option<Snowflake>,
    name: String,
    #[serde(default)]
    moderated: bool,
    #[serde(alias = "emojiId")]
    emoji_id: Option<Snowflake>,
    #[serde(alias = "emojiName")]
    emoji_name: Option<String>,
    emoji: Option<TagEmoji>,
}

#[derive(Deserialize)]
struct TagEmoji {
    id: Option<Snowflake>,
    name: Option<String>,
}

impl From<ForumTagFields> for ForumTag {
    fn from(fields: ForumTagFields) -> Self {
        let (nested_id, nested_name) = match fields.emoji {
            Some(emoji) => (emoji.id, emoji.name),
            None => (None, None),
        };

        ForumTag {
            id: fields.id,
            name: fields.name,
            moderated: fields.moderated,
            emoji_id: fields.emoji_id.or(nested_id),
            emoji_name: fields.emoji_name.or(nested_name),
        }
    }
}

impl ForumTag {
    /// The tag as a creation payload: Discord assigns tag ids itself.
    pub fn without_id(&self) -> ForumTag {
        ForumTag {
            id: None,
            ..self.clone()
        }
    }
}
