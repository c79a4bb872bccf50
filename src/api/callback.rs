//! Event callback registration and the event payload pushed to the callback URL.

use serde::{Deserialize, Serialize};

use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::Result;
use crate::transport::request::StandardRequest;
use crate::transport::response::{Envelope, OapiEnvelope, ResponseContract};

/// Callback event tags.
///
/// Contact / organization tags have named variants; any other tag the
/// platform sends or accepts (`bpms_*`, `chat_*`, ...) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContactEventType {
    /// URL verification pushed while registering a callback
    CheckUrl,
    UserAddOrg,
    UserModifyOrg,
    UserLeaveOrg,
    OrgAdminAdd,
    OrgAdminRemove,
    OrgDeptCreate,
    OrgDeptModify,
    OrgDeptRemove,
    OrgRemove,
    OrgChange,
    LabelUserChange,
    LabelConfAdd,
    LabelConfDel,
    LabelConfModify,
    Other(String),
}

impl ContactEventType {
    pub fn as_str(&self) -> &str {
        match self {
            ContactEventType::CheckUrl => "check_url",
            ContactEventType::UserAddOrg => "user_add_org",
            ContactEventType::UserModifyOrg => "user_modify_org",
            ContactEventType::UserLeaveOrg => "user_leave_org",
            ContactEventType::OrgAdminAdd => "org_admin_add",
            ContactEventType::OrgAdminRemove => "org_admin_remove",
            ContactEventType::OrgDeptCreate => "org_dept_create",
            ContactEventType::OrgDeptModify => "org_dept_modify",
            ContactEventType::OrgDeptRemove => "org_dept_remove",
            ContactEventType::OrgRemove => "org_remove",
            ContactEventType::OrgChange => "org_change",
            ContactEventType::LabelUserChange => "label_user_change",
            ContactEventType::LabelConfAdd => "label_conf_add",
            ContactEventType::LabelConfDel => "label_conf_del",
            ContactEventType::LabelConfModify => "label_conf_modify",
            ContactEventType::Other(tag) => tag,
        }
    }
}

impl From<String> for ContactEventType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "check_url" => ContactEventType::CheckUrl,
            "user_add_org" => ContactEventType::UserAddOrg,
            "user_modify_org" => ContactEventType::UserModifyOrg,
            "user_leave_org" => ContactEventType::UserLeaveOrg,
            "org_admin_add" => ContactEventType::OrgAdminAdd,
            "org_admin_remove" => ContactEventType::OrgAdminRemove,
            "org_dept_create" => ContactEventType::OrgDeptCreate,
            "org_dept_modify" => ContactEventType::OrgDeptModify,
            "org_dept_remove" => ContactEventType::OrgDeptRemove,
            "org_remove" => ContactEventType::OrgRemove,
            "org_change" => ContactEventType::OrgChange,
            "label_user_change" => ContactEventType::LabelUserChange,
            "label_conf_add" => ContactEventType::LabelConfAdd,
            "label_conf_del" => ContactEventType::LabelConfDel,
            "label_conf_modify" => ContactEventType::LabelConfModify,
            _ => ContactEventType::Other(tag),
        }
    }
}

impl From<&str> for ContactEventType {
    fn from(tag: &str) -> Self {
        ContactEventType::from(tag.to_owned())
    }
}

impl From<ContactEventType> for String {
    fn from(event: ContactEventType) -> Self {
        match event {
            ContactEventType::Other(tag) => tag,
            named => named.as_str().to_owned(),
        }
    }
}

impl AsRef<str> for ContactEventType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Decrypted event pushed to the registered URL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactEvent {
    #[serde(rename = "EventType")]
    pub event_type: ContactEventType,
    #[serde(rename = "TimeStamp")]
    pub timestamp: i64,
    #[serde(rename = "UserId", default)]
    pub user_ids: Vec<String>,
    #[serde(rename = "DeptId", default)]
    pub dept_ids: Vec<String>,
    #[serde(rename = "CorpId", default)]
    pub corp_id: String,
}

/// Currently registered callback
#[derive(Debug, Default, Deserialize)]
pub struct Callback {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub aes_key: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "call_back_tag", default)]
    pub callbacks: Vec<ContactEventType>,
}

impl ResponseContract for Callback {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Serialize)]
struct CallbackRegistration<'a> {
    call_back_tag: Vec<&'a str>,
    token: &'a str,
    aes_key: &'a str,
    url: &'a str,
}

impl<C: CredentialCache> DingTalkClient<C> {
    /// Accepts named [`ContactEventType`]s as well as raw tag strings
    pub async fn register_callback<T>(&self, callbacks: &[T], token: &str, aes_key: &str, url: &str) -> Result<()>
    where
        T: AsRef<str> + Sync,
    {
        self.save_callback("call_back/register_call_back", callbacks, token, aes_key, url).await
    }

    pub async fn update_callback<T>(&self, callbacks: &[T], token: &str, aes_key: &str, url: &str) -> Result<()>
    where
        T: AsRef<str> + Sync,
    {
        self.save_callback("call_back/update_call_back", callbacks, token, aes_key, url).await
    }

    pub async fn delete_callback(&self) -> Result<()> {
        self.refresh_access_token().await?;
        let mut data = OapiEnvelope::default();
        self.dispatch(StandardRequest::new("call_back/delete_call_back"), &mut data).await
    }

    pub async fn list_callback(&self) -> Result<Callback> {
        self.refresh_access_token().await?;
        let mut data = Callback::default();
        self.dispatch(StandardRequest::new("call_back/get_call_back"), &mut data).await?;
        Ok(data)
    }

    async fn save_callback<T>(&self, path: &str, callbacks: &[T], token: &str, aes_key: &str, url: &str) -> Result<()>
    where
        T: AsRef<str> + Sync,
    {
        self.refresh_access_token().await?;
        let body = CallbackRegistration {
            call_back_tag: callbacks.iter().map(|tag| tag.as_ref()).collect(),
            token,
            aes_key,
            url,
        };
        let request = StandardRequest::new(path).json(&body)?;
        let mut data = OapiEnvelope::default();
        self.dispatch(request, &mut data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contact_event_decodes_platform_field_names() {
        let event: ContactEvent = serde_json::from_value(json!({
            "EventType": "user_leave_org",
            "TimeStamp": 1500000000123i64,
            "UserId": ["u1", "u2"],
            "CorpId": "ding123"
        }))
        .unwrap();

        assert_eq!(event.event_type, ContactEventType::UserLeaveOrg);
        assert_eq!(event.user_ids, vec!["u1", "u2"]);
        assert!(event.dept_ids.is_empty());
    }

    #[test]
    fn url_check_and_unnamed_events_decode() {
        let check: ContactEvent =
            serde_json::from_str(r#"{"EventType":"check_url","TimeStamp":1,"CorpId":"c"}"#).unwrap();
        assert_eq!(check.event_type, ContactEventType::CheckUrl);
        assert_eq!(check.corp_id, "c");

        let bpms: ContactEvent =
            serde_json::from_str(r#"{"EventType":"bpms_task_change","TimeStamp":2}"#).unwrap();
        assert_eq!(bpms.event_type, ContactEventType::Other("bpms_task_change".into()));
        assert_eq!(bpms.event_type.as_str(), "bpms_task_change");
    }

    #[test]
    fn tags_serialize_back_to_platform_names() {
        let tags = vec![
            ContactEventType::OrgDeptCreate,
            ContactEventType::from("chat_add_member"),
            ContactEventType::CheckUrl,
        ];
        assert_eq!(
            serde_json::to_value(&tags).unwrap(),
            json!(["org_dept_create", "chat_add_member", "check_url"])
        );
        assert_eq!(ContactEventType::from("label_conf_del"), ContactEventType::LabelConfDel);
    }

    #[test]
    fn registration_body_uses_platform_keys() {
        let body = CallbackRegistration {
            call_back_tag: vec!["org_dept_create", "bpms_instance_change"],
            token: "tk",
            aes_key: "key",
            url: "https://example.com/cb",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "call_back_tag": ["org_dept_create", "bpms_instance_change"],
                "token": "tk",
                "aes_key": "key",
                "url": "https://example.com/cb"
            })
        );
    }
}
