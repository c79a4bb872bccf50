//! Departments, users, chats and external contacts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::credential_cache::CredentialCache;
use crate::client::DingTalkClient;
use crate::error::{Error, Result};
use crate::transport::request::{LegacyRequest, StandardRequest};
use crate::transport::response::{Envelope, OapiEnvelope, ResponseContract, TaobaoEnvelope};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Role {
    pub id: i64,
    pub name: String,
    #[serde(rename = "groupName")]
    pub group_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    pub ding_id: String,
    #[serde(rename = "unionid")]
    pub union_id: String,
    pub open_id: String,
    #[serde(rename = "userid")]
    pub user_id: String,
    pub name: String,
    pub active: bool,
    /// Country code of `mobile`
    pub state_code: String,
    pub mobile: String,
    pub tel: String,
    pub is_hide: bool,
    pub avatar: String,
    pub workplace: String,
    pub email: String,
    pub org_email: String,
    pub position: String,
    pub remark: String,
    pub is_admin: bool,
    pub is_boss: bool,
    pub is_senior: bool,
    #[serde(rename = "department")]
    pub departments: Vec<i64>,
    /// Raw `{deptId:bool}` mapping as sent by the platform
    pub is_leader_in_depts: String,
    pub order_in_depts: String,
    pub extattr: Value,
    pub roles: Vec<Role>,
}

impl ResponseContract for User {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserList {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    pub userlist: Vec<User>,
}

impl ResponseContract for UserList {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Department {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    pub id: i64,
    pub name: String,
    #[serde(rename = "parentid")]
    pub parent_id: i64,
    pub order: i64,
    pub dept_perimits: String,
    pub user_perimits: String,
    pub outer_dept: bool,
    pub outer_permit_depts: String,
    pub outer_permit_users: String,
    pub org_dept_owner: String,
    pub dept_manager_userid_list: String,
}

impl ResponseContract for Department {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DepartmentList {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(rename = "department")]
    pub departments: Vec<Department>,
}

impl ResponseContract for DepartmentList {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    #[serde(flatten)]
    pub envelope: OapiEnvelope,
    #[serde(rename = "userid")]
    pub user_id: String,
    #[serde(rename = "deviceId")]
    pub device_id: String,
    pub is_sys: bool,
    pub sys_level: i64,
}

impl ResponseContract for UserInfo {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UseridResponse {
    #[serde(flatten)]
    envelope: OapiEnvelope,
    userid: String,
}

impl ResponseContract for UseridResponse {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChatCreated {
    #[serde(flatten)]
    envelope: OapiEnvelope,
    chatid: String,
}

impl ResponseContract for ChatCreated {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

/// External (non-employee) contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalUser {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub mobile: String,
    /// Employee in charge of this contact
    #[serde(rename = "follower_userid")]
    pub follower: String,
    #[serde(rename = "label_ids")]
    pub labels: Vec<i64>,
    pub state_code: String,
    #[serde(rename = "company_name", skip_serializing_if = "String::is_empty")]
    pub company: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remark: String,
    #[serde(rename = "share_userids", skip_serializing_if = "Vec::is_empty")]
    pub shared_users: Vec<String>,
    #[serde(rename = "share_deptids", skip_serializing_if = "Vec::is_empty")]
    pub shared_depts: Vec<i64>,
}

/// Shape of an external contact inside `dingtalk.corp.ext.list` results
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ListedExternalUser {
    user_id: String,
    name: String,
    mobile: String,
    follower_user_id: String,
    label_ids: Vec<i64>,
    state_code: String,
    company_name: String,
    title: String,
    email: String,
    address: String,
    remark: String,
    share_user_ids: Vec<String>,
    share_dept_ids: Vec<i64>,
}

impl From<ListedExternalUser> for ExternalUser {
    fn from(u: ListedExternalUser) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            mobile: u.mobile,
            follower: u.follower_user_id,
            labels: u.label_ids,
            state_code: u.state_code,
            company: u.company_name,
            title: u.title,
            email: u.email,
            address: u.address,
            remark: u.remark,
            shared_users: u.share_user_ids,
            shared_depts: u.share_dept_ids,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExternalUserLabel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExternalUserLabelGroup {
    pub color: i64,
    pub name: String,
    pub labels: Vec<ExternalUserLabel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtAddResponse {
    #[serde(flatten)]
    envelope: TaobaoEnvelope,
    dingtalk_corp_ext_add_response: ExtAddResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtAddResult {
    userid: String,
}

impl ResponseContract for ExtAddResponse {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

/// Legacy list calls answer with a JSON document encoded as a string
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmbeddedResult {
    #[serde(flatten)]
    envelope: TaobaoEnvelope,
    result: String,
}

impl ResponseContract for EmbeddedResult {
    fn envelope(&self) -> &dyn Envelope {
        &self.envelope
    }
}

impl<C: CredentialCache> DingTalkClient<C> {
    pub async fn department_list(&self) -> Result<DepartmentList> {
        self.refresh_access_token().await?;
        let mut data = DepartmentList::default();
        self.dispatch(StandardRequest::new("department/list"), &mut data).await?;
        Ok(data)
    }

    pub async fn department_detail(&self, id: i64) -> Result<Department> {
        self.refresh_access_token().await?;
        let mut data = Department::default();
        self.dispatch(StandardRequest::new("department/get").param("id", id), &mut data).await?;
        Ok(data)
    }

    /// Members of one department
    pub async fn user_list(&self, department_id: i64) -> Result<UserList> {
        self.refresh_access_token().await?;
        let mut data = UserList::default();
        let request = StandardRequest::new("user/list").param("department_id", department_id);
        self.dispatch(request, &mut data).await?;
        Ok(data)
    }

    pub async fn user_detail(&self, user_id: &str) -> Result<User> {
        self.refresh_access_token().await?;
        let mut data = User::default();
        self.dispatch(StandardRequest::new("user/get").param("userid", user_id), &mut data).await?;
        Ok(data)
    }

    /// Exchanges a login-free auth code for the user identity
    pub async fn user_info_by_code(&self, code: &str) -> Result<UserInfo> {
        self.refresh_access_token().await?;
        let mut data = UserInfo::default();
        self.dispatch(StandardRequest::new("user/getuserinfo").param("code", code), &mut data).await?;
        Ok(data)
    }

    pub async fn userid_by_unionid(&self, union_id: &str) -> Result<String> {
        self.refresh_access_token().await?;
        let mut data = UseridResponse::default();
        let request = StandardRequest::new("user/getUseridByUnionid").param("unionid", union_id);
        self.dispatch(request, &mut data).await?;
        Ok(data.userid)
    }

    /// Creates a group chat and returns its id
    pub async fn create_chat(&self, name: &str, owner: &str, user_ids: &[String]) -> Result<String> {
        self.refresh_access_token().await?;
        let body = serde_json::json!({
            "name": name,
            "owner": owner,
            "useridlist": user_ids,
        });
        let mut data = ChatCreated::default();
        self.dispatch(StandardRequest::new("chat/create").json(&body)?, &mut data).await?;
        Ok(data.chatid)
    }

    /// Adds an external contact; the assigned id is written back into `user`
    pub async fn create_external_user(&self, user: &mut ExternalUser) -> Result<String> {
        self.refresh_access_token().await?;
        let contact = serde_json::to_string(user).map_err(Error::Encode)?;
        let mut data = ExtAddResponse::default();
        self.dispatch(LegacyRequest::new("dingtalk.corp.ext.add").param("contact", contact), &mut data)
            .await?;
        user.user_id = data.dingtalk_corp_ext_add_response.userid;
        Ok(user.user_id.clone())
    }

    pub async fn external_user_list(&self, offset: u32, size: u32) -> Result<Vec<ExternalUser>> {
        let listed: Vec<ListedExternalUser> = self.legacy_list("dingtalk.corp.ext.list", offset, size).await?;
        Ok(listed.into_iter().map(ExternalUser::from).collect())
    }

    pub async fn external_user_label_groups(&self, offset: u32, size: u32) -> Result<Vec<ExternalUserLabelGroup>> {
        self.legacy_list("dingtalk.corp.ext.listlabelgroups", offset, size).await
    }

    async fn legacy_list<T: serde::de::DeserializeOwned>(&self, method: &str, offset: u32, size: u32) -> Result<Vec<T>> {
        self.refresh_access_token().await?;
        let request = LegacyRequest::new(method).param("size", size).param("offset", offset);
        let mut data = EmbeddedResult::default();
        self.dispatch(request, &mut data).await?;
        serde_json::from_str(&data.result).map_err(Error::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_decodes_mixed_case_platform_keys() {
        let user: User = serde_json::from_value(json!({
            "errcode": 0,
            "errmsg": "ok",
            "userid": "manager4220",
            "unionid": "uid",
            "name": "Alice",
            "isAdmin": true,
            "department": [1, 2],
            "roles": [{"id": 149507744, "name": "Boss", "groupName": "Default"}]
        }))
        .unwrap();

        assert_eq!(user.user_id, "manager4220");
        assert!(user.is_admin);
        assert_eq!(user.departments, vec![1, 2]);
        assert_eq!(user.roles[0].group_name, "Default");
        assert!(user.check_error().is_ok());
    }

    #[test]
    fn external_user_add_payload_omits_empty_optionals() {
        let user = ExternalUser {
            name: "Bob".into(),
            mobile: "13800000000".into(),
            follower: "u1".into(),
            labels: vec![1],
            state_code: "86".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["follower_userid"], "u1");
        assert_eq!(v["label_ids"], json!([1]));
        assert!(v.get("company_name").is_none());
        assert!(v.get("share_userids").is_none());
    }

    #[test]
    fn listed_external_user_maps_camel_case_keys() {
        let listed: Vec<ListedExternalUser> = serde_json::from_str(
            r#"[{"userId":"e1","name":"Bob","followerUserId":"u1","labelIds":[3],"companyName":"ACME","shareDeptIds":[7]}]"#,
        )
        .unwrap();
        let user = ExternalUser::from(listed.into_iter().next().unwrap());

        assert_eq!(user.user_id, "e1");
        assert_eq!(user.follower, "u1");
        assert_eq!(user.labels, vec![3]);
        assert_eq!(user.company, "ACME");
        assert_eq!(user.shared_depts, vec![7]);
    }
}
