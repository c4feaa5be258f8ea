use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /users`.
#[derive(Clone, Debug, Serialize)]
pub struct SignupRequest<'a> {
    pub user: &'a Credentials,
}

/// Response of `GET /me`. The API answers with an empty object when no session is active,
/// so `id` stays optional.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
}

impl CurrentUser {
    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
}
