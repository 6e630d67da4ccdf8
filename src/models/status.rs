use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Presence state shown to other users.
///
/// `default_status` is the state a user returns to when a new session
/// starts; `online_status` is the state currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, DbEnum)]
#[db_enum(existing_type_path = "crate::schema::sql_types::OnlineStatus")]
#[serde(rename_all = "lowercase")]
pub enum OnlineStatus {
    Online,
    Busy,
    Idle,
    Dnd,
    Offline,
}

impl OnlineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnlineStatus::Online => "online",
            OnlineStatus::Busy => "busy",
            OnlineStatus::Idle => "idle",
            OnlineStatus::Dnd => "dnd",
            OnlineStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_status_serde_lowercase() {
        let json = serde_json::to_string(&OnlineStatus::Dnd).unwrap();
        assert_eq!(json, "\"dnd\"");

        let status: OnlineStatus = serde_json::from_str("\"busy\"").unwrap();
        assert_eq!(status, OnlineStatus::Busy);
    }

    #[test]
    fn test_online_status_display_matches_serde() {
        for status in [
            OnlineStatus::Online,
            OnlineStatus::Busy,
            OnlineStatus::Idle,
            OnlineStatus::Dnd,
            OnlineStatus::Offline,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.to_string());
        }
    }
}
