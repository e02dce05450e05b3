//! Notion-backed plan store.
//!
//! Plans live as pages of one database. The properties used are:
//!
//! | Property | Type |
//! |---|---|
//! | `Name` | title |
//! | `Plan ID` | rich text |
//! | `Week Start` | date |
//! | `Status`, `Goal` | select |
//! | `Week Focus`, `Plan`, `Summary` | rich text |
//! | `Planned Load`, `Actual Load` | number |
//! | `Generated by AI` | checkbox |
//! | `Last Updated` | date (with time) |

use std::{fmt, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Method, Request, StatusCode, Uri};
use serde_json::{Map, Value, json};
use tracing::debug;

use coach_primitives::calendar::parse_date;
use coach_primitives::{NewWeekPlan, PlanId, PlanStatus, TrainingGoal, WeekPlan, WeekPlanUpdate};

use crate::http_client::{
    DEFAULT_TIMEOUT, HttpReply, HyperClient, build_https_client, sanitize_base_url, send,
};
use crate::services::{PlanStore, ServiceError, ServiceResult};

const SERVICE: &str = "Notion";
const NOTION_VERSION: &str = "2022-06-28";

/// Maximum length of one rich-text segment accepted by Notion.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Block types whose rich text contributes to the athlete state.
const TEXT_BLOCKS: [&str; 9] = [
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "bulleted_list_item",
    "numbered_list_item",
    "to_do",
    "quote",
    "callout",
];

/// Connection settings for the Notion plan database.
#[derive(Clone)]
pub struct NotionConfig {
    api_key: String,
    plans_db_id: String,
    athlete_state_page_id: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionConfig")
            .field("plans_db_id", &self.plans_db_id)
            .field("athlete_state_page_id", &self.athlete_state_page_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl NotionConfig {
    /// Creates settings for the given integration token and plans database.
    #[must_use]
    pub fn new(api_key: impl Into<String>, plans_db_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            plans_db_id: plans_db_id.into(),
            athlete_state_page_id: None,
            base_url: "https://api.notion.com/v1/".to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the page whose blocks hold the athlete state notes.
    #[must_use]
    pub fn with_athlete_state_page(mut self, page_id: Option<String>) -> Self {
        self.athlete_state_page_id = page_id.filter(|id| !id.trim().is_empty());
        self
    }

    /// Overrides the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] if the URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> ServiceResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())
            .map_err(|reason| ServiceError::configuration(SERVICE, reason))?;
        Ok(self)
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Plan store backed by a Notion database.
pub struct NotionPlanStore {
    client: HyperClient,
    config: NotionConfig,
}

impl fmt::Debug for NotionPlanStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotionPlanStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotionPlanStore {
    /// Creates a store from settings.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Configuration`] when the token or database id
    /// is empty.
    pub fn new(config: NotionConfig) -> ServiceResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ServiceError::configuration(SERVICE, "API key is empty"));
        }
        if config.plans_db_id.trim().is_empty() {
            return Err(ServiceError::configuration(SERVICE, "plans database id is empty"));
        }
        Ok(Self {
            client: build_https_client(),
            config,
        })
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ServiceResult<HttpReply> {
        let uri = format!("{}{path}", self.config.base_url)
            .parse::<Uri>()
            .map_err(|err| ServiceError::configuration(SERVICE, format!("invalid URL: {err}")))?;
        debug!(service = SERVICE, %method, %uri, "request");

        let payload = match body {
            Some(value) => Body::from(
                serde_json::to_vec(value).map_err(|err| ServiceError::decode(SERVICE, err))?,
            ),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .header("Notion-Version", NOTION_VERSION)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .map_err(|err| ServiceError::transport(SERVICE, err))?;

        send(&self.client, request, self.config.timeout)
            .await
            .map_err(|err| ServiceError::transport(SERVICE, err))
    }

    async fn call_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> ServiceResult<Value> {
        let reply = self.call(method, path, body).await?;
        if reply.status == StatusCode::NOT_FOUND {
            return Err(ServiceError::NotFound {
                service: SERVICE,
                what: path.to_owned(),
            });
        }
        if !reply.status.is_success() {
            return Err(ServiceError::Status {
                service: SERVICE,
                status: reply.status.as_u16(),
                body: reply.body_text(),
            });
        }
        serde_json::from_slice(&reply.body).map_err(|err| ServiceError::decode(SERVICE, err))
    }
}

#[async_trait]
impl PlanStore for NotionPlanStore {
    async fn plan_by_id(&self, id: &PlanId) -> ServiceResult<Option<WeekPlan>> {
        let query = json!({
            "filter": {"property": "Plan ID", "rich_text": {"equals": id.to_string()}},
            "sorts": [{"timestamp": "last_edited_time", "direction": "descending"}],
            "page_size": 1
        });
        let response = self
            .call_json(
                Method::POST,
                &format!("databases/{}/query", self.config.plans_db_id),
                Some(&query),
            )
            .await?;

        response
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
            .map(page_to_plan)
            .transpose()
    }

    async fn create_plan(&self, plan: NewWeekPlan) -> ServiceResult<WeekPlan> {
        let body = json!({
            "parent": {"database_id": self.config.plans_db_id},
            "properties": new_plan_properties(&plan),
        });
        let page = self.call_json(Method::POST, "pages", Some(&body)).await?;
        let created = page_to_plan(&page)?;
        debug!(service = SERVICE, plan_id = %created.plan_id, record = %created.id, "plan created");
        Ok(created)
    }

    async fn update_plan(
        &self,
        record_id: &str,
        update: WeekPlanUpdate,
    ) -> ServiceResult<WeekPlan> {
        let body = json!({"properties": update_properties(&update)});
        let page = self
            .call_json(Method::PATCH, &format!("pages/{record_id}"), Some(&body))
            .await?;
        page_to_plan(&page)
    }

    async fn athlete_state(&self) -> ServiceResult<Option<String>> {
        let Some(page_id) = self.config.athlete_state_page_id.as_deref() else {
            return Ok(None);
        };
        let response = self
            .call_json(
                Method::GET,
                &format!("blocks/{page_id}/children?page_size=100"),
                None,
            )
            .await?;
        let blocks = response
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(blocks_to_text(blocks))
    }
}

/// Splits text into rich-text segments of at most [`RICH_TEXT_LIMIT`] characters.
#[must_use]
pub fn rich_text(content: &str) -> Value {
    let chars = content.chars().collect::<Vec<_>>();
    let segments = chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| json!({"type": "text", "text": {"content": chunk.iter().collect::<String>()}}))
        .collect::<Vec<_>>();
    Value::Array(segments)
}

fn plain_text(segments: Option<&Value>) -> String {
    segments
        .and_then(Value::as_array)
        .map(|segments| {
            segments
                .iter()
                .filter_map(|segment| {
                    segment
                        .get("plain_text")
                        .or_else(|| segment.pointer("/text/content"))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn new_plan_properties(plan: &NewWeekPlan) -> Value {
    let mut properties = Map::new();
    properties.insert("Name".into(), json!({"title": rich_text(&plan.title)}));
    properties.insert("Plan ID".into(), json!({"rich_text": rich_text(&plan.plan_id.to_string())}));
    properties.insert("Week Start".into(), json!({"date": {"start": plan.week_start.to_string()}}));
    properties.insert("Status".into(), json!({"select": {"name": plan.status.as_str()}}));
    properties.insert("Goal".into(), json!({"select": {"name": plan.goal.as_str()}}));
    properties.insert("Plan".into(), json!({"rich_text": rich_text(&plan.plan)}));
    properties.insert("Generated by AI".into(), json!({"checkbox": plan.generated_by_ai}));
    properties.insert(
        "Last Updated".into(),
        json!({"date": {"start": plan.last_updated.to_rfc3339()}}),
    );
    if let Some(focus) = &plan.week_focus {
        properties.insert("Week Focus".into(), json!({"rich_text": rich_text(focus)}));
    }
    if let Some(summary) = &plan.summary {
        properties.insert("Summary".into(), json!({"rich_text": rich_text(summary)}));
    }
    if let Some(load) = plan.planned_load {
        properties.insert("Planned Load".into(), json!({"number": load}));
    }
    Value::Object(properties)
}

fn update_properties(update: &WeekPlanUpdate) -> Value {
    let mut properties = Map::new();
    properties.insert("Name".into(), json!({"title": rich_text(&update.title)}));
    properties.insert("Plan".into(), json!({"rich_text": rich_text(&update.plan)}));
    properties.insert(
        "Last Updated".into(),
        json!({"date": {"start": update.last_updated.to_rfc3339()}}),
    );
    if let Some(focus) = &update.week_focus {
        properties.insert("Week Focus".into(), json!({"rich_text": rich_text(focus)}));
    }
    if let Some(summary) = &update.summary {
        properties.insert("Summary".into(), json!({"rich_text": rich_text(summary)}));
    }
    if let Some(load) = update.planned_load {
        properties.insert("Planned Load".into(), json!({"number": load}));
    }
    Value::Object(properties)
}

fn page_to_plan(page: &Value) -> ServiceResult<WeekPlan> {
    let missing = |what: &str| ServiceError::decode(SERVICE, format!("page is missing {what}"));
    let id = page
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("id"))?;
    let properties = page.get("properties").ok_or_else(|| missing("properties"))?;
    let text = |name: &str| {
        let value = plain_text(properties.pointer(&format!("/{name}/rich_text")));
        (!value.is_empty()).then_some(value)
    };
    let select = |name: &str| {
        properties
            .pointer(&format!("/{name}/select/name"))
            .and_then(Value::as_str)
    };
    let date = |name: &str| {
        properties
            .pointer(&format!("/{name}/date/start"))
            .and_then(Value::as_str)
    };
    let number = |name: &str| {
        properties
            .pointer(&format!("/{name}/number"))
            .and_then(Value::as_f64)
    };

    let plan_id = text("Plan ID")
        .ok_or_else(|| missing("Plan ID"))?
        .parse::<PlanId>()
        .map_err(|err| ServiceError::decode(SERVICE, err))?;
    let week_start = date("Week Start")
        .map(parse_date)
        .transpose()
        .map_err(|err| ServiceError::decode(SERVICE, err))?
        .ok_or_else(|| missing("Week Start"))?;
    let status = select("Status")
        .ok_or_else(|| missing("Status"))?
        .parse::<PlanStatus>()
        .map_err(|err| ServiceError::decode(SERVICE, err))?;
    let goal = select("Goal")
        .ok_or_else(|| missing("Goal"))?
        .parse::<TrainingGoal>()
        .map_err(|err| ServiceError::decode(SERVICE, err))?;
    let last_updated = date("Last Updated")
        .or_else(|| page.get("last_edited_time").and_then(Value::as_str))
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map_or_else(Utc::now, |stamp| stamp.with_timezone(&Utc));

    Ok(WeekPlan {
        id: id.to_owned(),
        plan_id,
        title: plain_text(properties.pointer("/Name/title")),
        week_start,
        status,
        goal,
        week_focus: text("Week Focus"),
        plan: text("Plan").unwrap_or_default(),
        summary: text("Summary"),
        planned_load: number("Planned Load"),
        actual_load: number("Actual Load"),
        generated_by_ai: properties
            .pointer("/Generated by AI/checkbox")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        last_updated,
    })
}

fn blocks_to_text(blocks: &[Value]) -> Option<String> {
    let lines = blocks
        .iter()
        .filter_map(|block| {
            let kind = block.get("type").and_then(Value::as_str)?;
            if !TEXT_BLOCKS.contains(&kind) {
                return None;
            }
            let text = plain_text(block.pointer(&format!("/{kind}/rich_text")));
            if text.trim().is_empty() {
                return None;
            }
            Some(match kind {
                "bulleted_list_item" | "numbered_list_item" | "to_do" => format!("- {text}"),
                "heading_1" | "heading_2" | "heading_3" => format!("## {text}"),
                _ => text,
            })
        })
        .collect::<Vec<_>>();

    (!lines.is_empty()).then(|| lines.join("\n"))
}
