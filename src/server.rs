use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::analysis::StrengthAnalyzer;
use crate::chat::EncouragementCoach;
use crate::config::Config;
use crate::error::KudosError;
use crate::llm::LlmClient;
use crate::milestone::generate_milestones;
use crate::response::{ToolMetadata, ToolResponse};
use crate::stats::{DatedRecord, milestone_stats};
use crate::store::events::EventPatch;
use crate::store::records::EntryPatch;
use crate::store::{Session, StoreClient};
use crate::tools::auth::{LoginRequest, SignUpRequest};
use crate::tools::chat::CoachRequest;
use crate::tools::diary::{
    AttachImageRequest, DeleteEntryRequest, EditEntryRequest, EntriesRequest, RecordEntryRequest,
};
use crate::tools::parse_date;
use crate::tools::success::{DeleteWinRequest, EditWinRequest, LogWinRequest, WinsRequest};

#[derive(Clone)]
pub struct KudosServer {
    store: Option<Arc<StoreClient>>,
    analyzer: Option<Arc<StrengthAnalyzer>>,
    coach: Option<Arc<EncouragementCoach>>,
    session: Arc<RwLock<Option<Session>>>,
    tool_router: ToolRouter<Self>,
}

/// Serialize a tool payload, mapping failure into the envelope error path.
fn json<T: Serialize>(value: &T) -> Result<String, KudosError> {
    serde_json::to_string(value).map_err(|e| KudosError::Other(format!("serialize payload: {e}")))
}

/// Finish a tool call: wrap the outcome in the uniform envelope. Failures are
/// logged here and reported through the payload, never as transport errors.
fn respond(tool: &str, start: Instant, result: Result<String, KudosError>) -> CallToolResult {
    let metadata = ToolMetadata {
        tool_name: tool.to_string(),
        duration_seconds: start.elapsed().as_secs_f64(),
    };
    let response = match result {
        Ok(content) => ToolResponse::success(content, metadata),
        Err(e) => {
            tracing::warn!("{tool} failed: {e}");
            ToolResponse::error(e.user_message(), metadata)
        }
    };
    response.into_call_tool_result()
}

#[tool_router]
impl KudosServer {
    pub fn new(config: Config) -> Self {
        let store = config.storage.map(|c| Arc::new(StoreClient::new(c)));
        let llm = config.llm.map(|c| Arc::new(LlmClient::new(c)));

        // Analysis and coaching need both collaborators.
        let (analyzer, coach) = match (&store, &llm) {
            (Some(store), Some(llm)) => (
                Some(Arc::new(StrengthAnalyzer::new(store.clone(), llm.clone()))),
                Some(Arc::new(EncouragementCoach::new(store.clone(), llm.clone()))),
            ),
            _ => (None, None),
        };

        Self {
            store,
            analyzer,
            coach,
            session: Arc::new(RwLock::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    fn store(&self) -> Result<&Arc<StoreClient>, KudosError> {
        self.store.as_ref().ok_or_else(|| {
            KudosError::Other(
                "storage collaborator not configured (set STORAGE_URL / STORAGE_ANON_KEY)"
                    .to_string(),
            )
        })
    }

    fn analyzer(&self) -> Result<&Arc<StrengthAnalyzer>, KudosError> {
        self.analyzer.as_ref().ok_or_else(|| {
            KudosError::Other("LLM collaborator not configured (set LLM_API_KEY)".to_string())
        })
    }

    fn encouragement_coach(&self) -> Result<&Arc<EncouragementCoach>, KudosError> {
        self.coach.as_ref().ok_or_else(|| {
            KudosError::Other("LLM collaborator not configured (set LLM_API_KEY)".to_string())
        })
    }

    async fn current_session(&self) -> Result<Session, KudosError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(KudosError::AuthRequired)
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[tool(
        name = "signup",
        description = "Create a new account. Signs you in directly when the provider auto-confirms, otherwise email confirmation is required before `login`."
    )]
    async fn signup(
        &self,
        Parameters(req): Parameters<SignUpRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let store = self.store()?;
            match store.sign_up(&req.email, &req.password).await? {
                Some(session) => {
                    let user_id = session.user_id.clone();
                    *self.session.write().await = Some(session);
                    Ok(format!("account created and signed in as {user_id}"))
                }
                None => Ok(format!(
                    "account created for {} — confirm the email, then call `login`",
                    req.email
                )),
            }
        }
        .await;

        Ok(respond("signup", start, result))
    }

    #[tool(
        name = "login",
        description = "Sign in with email and password. The session is held server-side for subsequent calls."
    )]
    async fn login(
        &self,
        Parameters(req): Parameters<LoginRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let store = self.store()?;
            let session = store.sign_in(&req.email, &req.password).await?;
            let user_id = session.user_id.clone();
            *self.session.write().await = Some(session);
            Ok(format!("signed in as {user_id}"))
        }
        .await;

        Ok(respond("login", start, result))
    }

    #[tool(
        name = "logout",
        description = "Sign out and drop the held session. Token revocation is best-effort."
    )]
    async fn logout(&self) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let Some(session) = self.session.write().await.take() else {
                return Ok("not signed in".to_string());
            };
            // The local session is gone either way; a failed revoke only logs.
            if let Ok(store) = self.store() {
                if let Err(e) = store.sign_out(&session).await {
                    tracing::warn!("token revocation failed: {e}");
                }
            }
            Ok("signed out".to_string())
        }
        .await;

        Ok(respond("logout", start, result))
    }

    #[tool(
        name = "whoami",
        description = "Show the signed-in user.",
        annotations(read_only_hint = true)
    )]
    async fn whoami(&self) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let user = self.store()?.current_user(&session).await?;
            json(&serde_json::json!({"id": user.id, "email": user.email}))
        }
        .await;

        Ok(respond("whoami", start, result))
    }

    #[tool(
        name = "record",
        description = "Record a diary entry for a date (default: today). Returns the stored entry."
    )]
    async fn record(
        &self,
        Parameters(req): Parameters<RecordEntryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let date = match req.date.as_deref() {
            Some(s) => parse_date(s).map_err(|msg| McpError::invalid_params(msg, None))?,
            None => Self::today(),
        };
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let entry = self
                .store()?
                .create_entry(&session, &req.content, date, None)
                .await?;
            json(&entry)
        }
        .await;

        Ok(respond("record", start, result))
    }

    #[tool(
        name = "entries",
        description = "List diary entries for a single date (default: today) or an inclusive date range (`start` + `end`).",
        annotations(read_only_hint = true)
    )]
    async fn entries(
        &self,
        Parameters(req): Parameters<EntriesRequest>,
    ) -> Result<CallToolResult, McpError> {
        enum Selection {
            Day(NaiveDate),
            Range(NaiveDate, NaiveDate),
        }

        let selection = match (req.start.as_deref(), req.end.as_deref()) {
            (Some(start), Some(end)) => {
                let start = parse_date(start).map_err(|msg| McpError::invalid_params(msg, None))?;
                let end = parse_date(end).map_err(|msg| McpError::invalid_params(msg, None))?;
                if start > end {
                    return Err(McpError::invalid_params("start is after end", None));
                }
                Selection::Range(start, end)
            }
            (None, None) => {
                let date = match req.date.as_deref() {
                    Some(s) => parse_date(s).map_err(|msg| McpError::invalid_params(msg, None))?,
                    None => Self::today(),
                };
                Selection::Day(date)
            }
            _ => {
                return Err(McpError::invalid_params(
                    "start and end must be given together",
                    None,
                ));
            }
        };
        let start_time = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let store = self.store()?;
            let rows = match selection {
                Selection::Day(date) => store.entries_for_date(&session, date).await?,
                Selection::Range(from, to) => store.entries_in_range(&session, from, to).await?,
            };
            json(&rows)
        }
        .await;

        Ok(respond("entries", start_time, result))
    }

    #[tool(
        name = "edit_entry",
        description = "Edit a diary entry you own: replace its text and/or detach its image. Returns the updated entry."
    )]
    async fn edit_entry(
        &self,
        Parameters(req): Parameters<EditEntryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let patch = EntryPatch {
            content: req.content,
            image_url: if req.clear_image.unwrap_or(false) {
                Some(None)
            } else {
                None
            },
        };
        if patch.content.is_none() && patch.image_url.is_none() {
            return Err(McpError::invalid_params(
                "nothing to change: give content and/or clear_image",
                None,
            ));
        }
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let entry = self.store()?.update_entry(&session, &req.id, &patch).await?;
            json(&entry)
        }
        .await;

        Ok(respond("edit_entry", start, result))
    }

    #[tool(
        name = "delete_entry",
        description = "Delete a diary entry you own. Its attached image (if any) is removed as well."
    )]
    async fn delete_entry(
        &self,
        Parameters(req): Parameters<DeleteEntryRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            self.store()?.delete_entry(&session, &req.id).await?;
            Ok(format!("deleted entry {}", req.id))
        }
        .await;

        Ok(respond("delete_entry", start, result))
    }

    #[tool(
        name = "attach_image",
        description = "Attach a local image file (jpg, jpeg, png or gif, max 5 MiB) to a diary entry you own. Returns the updated entry."
    )]
    async fn attach_image(
        &self,
        Parameters(req): Parameters<AttachImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let store = self.store()?;

            let filename = std::path::Path::new(&req.file_path)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    KudosError::Validation(format!("not a file path: {}", req.file_path))
                })?
                .to_string();
            let bytes = tokio::fs::read(&req.file_path).await.map_err(|e| {
                KudosError::Validation(format!("cannot read {}: {e}", req.file_path))
            })?;

            let url = store.upload_image(&session, &filename, bytes).await?;
            let patch = EntryPatch {
                content: None,
                image_url: Some(Some(url)),
            };
            let entry = store.update_entry(&session, &req.entry_id, &patch).await?;
            json(&entry)
        }
        .await;

        Ok(respond("attach_image", start, result))
    }

    #[tool(
        name = "log_win",
        description = "Log a success event, optionally tagged with a category. When the cumulative count reaches an analysis tier (25/50/100), the strength analysis runs in the same call and its result is included."
    )]
    async fn log_win(
        &self,
        Parameters(req): Parameters<LogWinRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let event = self
                .store()?
                .add_event(&session, &req.content, req.category.as_deref())
                .await?;

            let mut payload = serde_json::json!({ "event": event });

            // The save already succeeded; a failed auto-analysis only logs.
            if let Some(analyzer) = &self.analyzer {
                match analyzer.auto_analyze(&session).await {
                    Ok(Some(analysis)) => {
                        payload["analysis"] = serde_json::to_value(&analysis)
                            .map_err(|e| KudosError::Other(format!("serialize payload: {e}")))?;
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!("auto-analysis failed: {e}"),
                }
            }

            json(&payload)
        }
        .await;

        Ok(respond("log_win", start, result))
    }

    #[tool(
        name = "wins",
        description = "List your success events, newest first. Pass `limit` to cap the count.",
        annotations(read_only_hint = true)
    )]
    async fn wins(
        &self,
        Parameters(req): Parameters<WinsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let store = self.store()?;
            let events = match req.limit {
                Some(limit) => store.recent_events(&session, limit).await?,
                None => store.events_for_user(&session).await?,
            };
            json(&events)
        }
        .await;

        Ok(respond("wins", start, result))
    }

    #[tool(
        name = "edit_win",
        description = "Edit a success event you own: replace its text, retag it, or untag it. Returns the updated event."
    )]
    async fn edit_win(
        &self,
        Parameters(req): Parameters<EditWinRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.category.is_some() && req.clear_category.unwrap_or(false) {
            return Err(McpError::invalid_params(
                "category and clear_category are mutually exclusive",
                None,
            ));
        }
        let patch = EventPatch {
            content: req.content,
            category: if req.clear_category.unwrap_or(false) {
                Some(None)
            } else {
                req.category.map(Some)
            },
        };
        if patch.content.is_none() && patch.category.is_none() {
            return Err(McpError::invalid_params(
                "nothing to change: give content, category, or clear_category",
                None,
            ));
        }
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let event = self.store()?.update_event(&session, &req.id, &patch).await?;
            json(&event)
        }
        .await;

        Ok(respond("edit_win", start, result))
    }

    #[tool(
        name = "delete_win",
        description = "Delete a success event you own."
    )]
    async fn delete_win(
        &self,
        Parameters(req): Parameters<DeleteWinRequest>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            self.store()?.delete_event(&session, &req.id).await?;
            Ok(format!("deleted event {}", req.id))
        }
        .await;

        Ok(respond("delete_win", start, result))
    }

    #[tool(
        name = "milestones",
        description = "Compute journal statistics (weekly/monthly counts, streak, monthly average, most active category and weekday) and the earned milestones.",
        annotations(read_only_hint = true)
    )]
    async fn milestones(&self) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let store = self.store()?;
            let today = Self::today();

            let (entries, analysis) = futures_util::try_join!(
                store.all_entries(&session, today),
                store.latest_analysis(&session),
            )?;

            let dated: Vec<DatedRecord> = entries.iter().map(DatedRecord::from).collect();
            let categories = analysis.as_ref().map(|a| &a.categories);
            let stats = milestone_stats(&dated, categories, today);
            let milestones = generate_milestones(&stats, today);

            json(&serde_json::json!({ "stats": stats, "milestones": milestones }))
        }
        .await;

        Ok(respond("milestones", start, result))
    }

    #[tool(
        name = "analyze",
        description = "Run the strength analysis now, at the deepest tier your event count qualifies for (25+: preliminary, 50+: interim, 100+: full). Needs at least 25 events."
    )]
    async fn analyze(&self) -> Result<CallToolResult, McpError> {
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            let analysis = self.analyzer()?.analyze(&session).await?;
            json(&analysis)
        }
        .await;

        Ok(respond("analyze", start, result))
    }

    #[tool(
        name = "coach",
        description = "Talk through what's on your mind. The reply is grounded in your recent success events and latest strength analysis.",
        annotations(read_only_hint = true)
    )]
    async fn coach(
        &self,
        Parameters(req): Parameters<CoachRequest>,
    ) -> Result<CallToolResult, McpError> {
        if req.message.trim().is_empty() {
            return Err(McpError::invalid_params("message must not be empty", None));
        }
        let start = Instant::now();

        let result = async {
            let session = self.current_session().await?;
            // The coach degrades internally; this only fails when signed out
            // or unconfigured.
            Ok(self.encouragement_coach()?.reply(&session, &req.message).await)
        }
        .await;

        Ok(respond("coach", start, result))
    }
}

#[tool_handler]
impl ServerHandler for KudosServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "kudos".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(
                "Kudos: a personal success journal.\n\n\
                 Workflow:\n\
                 1. `signup` once, then `login` — the session is held for the rest of the run.\n\
                 2. `record` diary entries (one per day or more); `entries` lists them by date or range.\n\
                 3. `log_win` captures success events with an optional category tag; `wins` lists them.\n\
                 4. At 25/50/100 events a strength analysis runs automatically inside `log_win`;\n\
                    `analyze` re-runs it on demand.\n\
                 5. `milestones` computes streaks, counts, and earned milestones.\n\
                 6. `coach` gives encouragement grounded in your own history.\n\n\
                 Images: `attach_image` uploads a local file and links it to an entry.\n\
                 All responses are a JSON envelope with `status`, `content`, and `metadata`."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
