use serde::{Deserialize, Deserializer, Serialize};

// ─── Personal sign-in ─────────────────────────────────────────────────────

/// Response of the daily personal sign-in call.
///
/// The call is idempotent: signing in twice on the same day returns
/// `is_sign = true` and no bonus instead of an error.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSignResult {
    /// `true` when the account had already signed in today.
    pub is_sign: bool,
    /// Bonus space granted by this call, in MiB.
    #[serde(default)]
    pub netdisk_bonus: u64,
}

// ─── Family groups ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyInfo {
    #[serde(deserialize_with = "string_or_number")]
    pub family_id: String,
    /// Display name the user gave the group.
    #[serde(default)]
    pub remark_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyListResponse {
    #[serde(default)]
    pub family_info_resp: Option<Vec<FamilyInfo>>,
}

/// Response of one family sign-in call.
///
/// `sign_status` is absent on some error payloads; only results that carry
/// the field and report `false` count as a fresh sign-in.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilySignResult {
    #[serde(default)]
    pub sign_status: Option<bool>,
    #[serde(default)]
    pub bonus_space: u64,
}

impl FamilySignResult {
    pub fn is_fresh(&self) -> bool {
        self.sign_status == Some(false)
    }
}

// ─── Capacity ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityInfo {
    /// Total capacity in bytes.
    pub total_size: u64,
    #[serde(default)]
    pub used_size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSizeInfo {
    pub cloud_capacity_info: CapacityInfo,
    pub family_capacity_info: CapacityInfo,
}

// ─── Login ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub access_token: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Str(String),
        Num(i64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Str(s) => s,
        Id::Num(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_id_accepts_numbers() {
        let info: FamilyInfo =
            serde_json::from_str(r#"{"familyId": 3004, "remarkName": "home"}"#).unwrap();
        assert_eq!(info.family_id, "3004");
        assert_eq!(info.remark_name.as_deref(), Some("home"));
    }

    #[test]
    fn family_list_tolerates_missing_groups() {
        let resp: FamilyListResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.family_info_resp.is_none());
    }

    #[test]
    fn family_sign_without_status_is_not_fresh() {
        let res: FamilySignResult = serde_json::from_str(r#"{"bonusSpace": 50}"#).unwrap();
        assert_eq!(res.sign_status, None);
        assert!(!res.is_fresh());

        let res: FamilySignResult =
            serde_json::from_str(r#"{"signStatus": false, "bonusSpace": 50}"#).unwrap();
        assert!(res.is_fresh());
    }

    #[test]
    fn parse_user_size_info() {
        let json = r#"{
            "cloudCapacityInfo": {"totalSize": 1073741824, "usedSize": 10},
            "familyCapacityInfo": {"totalSize": 2147483648}
        }"#;
        let info: UserSizeInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.cloud_capacity_info.total_size, 1 << 30);
        assert_eq!(info.family_capacity_info.total_size, 2 << 30);
        assert_eq!(info.family_capacity_info.used_size, 0);
    }
}
