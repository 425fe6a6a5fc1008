use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAuthData {
    pub google_id_token: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshData {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRolesData {
    pub roles: Vec<String>,
}
