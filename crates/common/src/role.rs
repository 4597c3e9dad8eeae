//! Caller role model: ADMIN, SUPERVISOR, READER.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role carried by the opaque caller identity the engine consumes.
///
/// Issuance of this identity (login, refresh, password flows) is an
/// external collaborator; this engine only consumes the role to gate
/// generate/simulate behind supervisor-or-higher access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Reader,
    Supervisor,
    Admin,
}

impl Role {
    /// Ordinal used for `>=` comparisons; higher is more privileged.
    pub fn level(&self) -> u8 {
        match self {
            Role::Reader => 0,
            Role::Supervisor => 1,
            Role::Admin => 2,
        }
    }

    /// Generate/simulate require supervisor-or-higher.
    pub fn can_generate(&self) -> bool {
        self.level() >= Role::Supervisor.level()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Reader => write!(f, "READER"),
            Role::Supervisor => write!(f, "SUPERVISOR"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "READER" => Ok(Role::Reader),
            "SUPERVISOR" => Ok(Role::Supervisor),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller identity the engine consumes. Opaque beyond these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub caller_id: String,
    pub display_name: String,
    pub role: Role,
}
