use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_REPO: &str = "uadaf";
pub const ACCESS_KEY_HEADER: &str = "x-access-key";
pub const ATTACHMENT_TYPE_HEADER: &str = "x-attachment-content-type";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub adder: String,
    pub authors: Vec<String>,
    pub dtype: String,
    pub content: String,
    pub date: i64,
    pub edited_by: String,
    pub edited_at: i64,
    pub attachments: Vec<String>,
    pub is_old: bool,
}

#[derive(Deserialize)]
pub struct AddQuote {
    pub resolver: String,
    pub adder: String,
    pub authors: String,
    pub content: String,
    pub dtype: Option<String>,
    pub attachments: Option<String>,
}

#[derive(Deserialize)]
pub struct AttachQuote {
    pub resolver: String,
    pub id: i64,
    pub attachment: String,
}

#[derive(Deserialize)]
pub struct EditQuote {
    pub resolver: String,
    pub id: i64,
    pub edited_by: String,
    pub new_content: String,
}

#[derive(Deserialize)]
pub struct NewRepo {
    pub name: String,
}

#[derive(Deserialize)]
pub struct Scope {
    pub resolver: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub resolver: String,
    pub adder: Option<String>,
    pub authors: Option<String>,
    pub content: Option<String>,
}

struct StoredAttachment {
    content_type: String,
    data: Vec<u8>,
}

#[derive(Default)]
pub struct Store {
    repos: HashMap<String, Vec<Quote>>,
    attachments: HashMap<String, StoredAttachment>,
}

#[derive(Clone)]
pub struct AppState {
    access_key: Arc<str>,
    store: Arc<RwLock<Store>>,
}

type ApiError = (StatusCode, String);
type ApiResult<T> = Result<T, ApiError>;

pub fn app(access_key: &str) -> Router {
    let mut store = Store::default();
    store.repos.insert(DEFAULT_REPO.to_string(), Vec::new());
    let state = AppState {
        access_key: Arc::from(access_key),
        store: Arc::new(RwLock::new(store)),
    };
    Router::new()
        .route("/", put(add_quote))
        .route("/attach", put(attach))
        .route("/edit", post(edit_quote))
        .route("/fix_ids", post(fix_ids))
        .route("/repo", put(add_repo))
        .route("/all", get(all_quotes))
        .route("/total", get(total))
        .route("/search", get(search))
        .route("/random/{count}", get(random_quotes))
        .route(
            "/attachments",
            put(upload_attachment).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/attachments/{id}",
            get(download_attachment).delete(delete_attachment),
        )
        .route("/{id}", get(quote_by_id))
        .route("/{from}/{to}", get(quotes_by_range))
        .with_state(state)
}

pub async fn run(listener: TcpListener, access_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(access_key)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> ApiResult<()> {
    match headers.get(ACCESS_KEY_HEADER).and_then(|v| v.to_str().ok()) {
        Some(key) if key == &*state.access_key => Ok(()),
        _ => Err((StatusCode::FORBIDDEN, "invalid access key".to_string())),
    }
}

fn repo<'a>(store: &'a Store, name: &str) -> ApiResult<&'a Vec<Quote>> {
    store
        .repos
        .get(name)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown repo {name}")))
}

fn repo_mut<'a>(store: &'a mut Store, name: &str) -> ApiResult<&'a mut Vec<Quote>> {
    store
        .repos
        .get_mut(name)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown repo {name}")))
}

fn quote_not_found(id: i64) -> ApiError {
    (StatusCode::NOT_FOUND, format!("no quote {id}"))
}

fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(';')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

async fn add_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AddQuote>,
) -> ApiResult<(StatusCode, Json<Quote>)> {
    authorize(&state, &headers)?;
    let dtype = input.dtype.unwrap_or_else(|| "text".to_string());
    if dtype != "text" && dtype != "dialog" {
        return Err((StatusCode::BAD_REQUEST, format!("unknown dtype {dtype}")));
    }
    let mut store = state.store.write().await;
    let quotes = repo_mut(&mut store, &input.resolver)?;
    let quote = Quote {
        id: quotes.iter().map(|q| q.id).max().unwrap_or(0) + 1,
        adder: input.adder,
        authors: split_list(&input.authors),
        dtype,
        content: input.content,
        date: now(),
        edited_by: String::new(),
        edited_at: 0,
        attachments: input.attachments.as_deref().map(split_list).unwrap_or_default(),
        is_old: false,
    };
    quotes.push(quote.clone());
    tracing::info!(repo = %input.resolver, id = quote.id, "quote added");
    Ok((StatusCode::CREATED, Json(quote)))
}

async fn attach(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AttachQuote>,
) -> ApiResult<Json<Quote>> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    let quotes = repo_mut(&mut store, &input.resolver)?;
    let quote = quotes
        .iter_mut()
        .find(|q| q.id == input.id)
        .ok_or_else(|| quote_not_found(input.id))?;
    quote.attachments.push(input.attachment);
    tracing::info!(repo = %input.resolver, id = input.id, "attachment linked");
    Ok(Json(quote.clone()))
}

async fn edit_quote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<EditQuote>,
) -> ApiResult<Json<Quote>> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    let quotes = repo_mut(&mut store, &input.resolver)?;
    let quote = quotes
        .iter_mut()
        .find(|q| q.id == input.id)
        .ok_or_else(|| quote_not_found(input.id))?;
    quote.content = input.new_content;
    quote.edited_by = input.edited_by;
    quote.edited_at = now();
    tracing::info!(repo = %input.resolver, id = input.id, "quote edited");
    Ok(Json(quote.clone()))
}

async fn fix_ids(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(scope): Json<Scope>,
) -> ApiResult<StatusCode> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    let quotes = repo_mut(&mut store, &scope.resolver)?;
    quotes.sort_by_key(|q| q.id);
    for (index, quote) in quotes.iter_mut().enumerate() {
        quote.id = index as i64 + 1;
    }
    tracing::info!(repo = %scope.resolver, count = quotes.len(), "ids renumbered");
    Ok(StatusCode::NO_CONTENT)
}

async fn add_repo(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewRepo>,
) -> ApiResult<StatusCode> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    if store.repos.contains_key(&input.name) {
        return Err((StatusCode::CONFLICT, format!("repo {} exists", input.name)));
    }
    tracing::info!(repo = %input.name, "repo created");
    store.repos.insert(input.name, Vec::new());
    Ok(StatusCode::CREATED)
}

async fn quote_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(scope): Query<Scope>,
) -> ApiResult<Json<Quote>> {
    let store = state.store.read().await;
    repo(&store, &scope.resolver)?
        .iter()
        .find(|q| q.id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| quote_not_found(id))
}

async fn quotes_by_range(
    State(state): State<AppState>,
    Path((from, to)): Path<(i64, i64)>,
    Query(scope): Query<Scope>,
) -> ApiResult<Json<Vec<Quote>>> {
    let store = state.store.read().await;
    let mut quotes: Vec<Quote> = repo(&store, &scope.resolver)?
        .iter()
        .filter(|q| (from..=to).contains(&q.id))
        .cloned()
        .collect();
    quotes.sort_by_key(|q| q.id);
    Ok(Json(quotes))
}

async fn random_quotes(
    State(state): State<AppState>,
    Path(count): Path<usize>,
    Query(scope): Query<Scope>,
) -> ApiResult<Json<Vec<Quote>>> {
    let store = state.store.read().await;
    let quotes = repo(&store, &scope.resolver)?;
    let sample = {
        let mut rng = rand::thread_rng();
        quotes.choose_multiple(&mut rng, count).cloned().collect()
    };
    Ok(Json(sample))
}

async fn all_quotes(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> ApiResult<Json<Vec<Quote>>> {
    let store = state.store.read().await;
    Ok(Json(repo(&store, &scope.resolver)?.clone()))
}

async fn total(State(state): State<AppState>, Query(scope): Query<Scope>) -> ApiResult<String> {
    let store = state.store.read().await;
    Ok(repo(&store, &scope.resolver)?.len().to_string())
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Quote>>> {
    let store = state.store.read().await;
    let authors = params.authors.as_deref().map(split_list).unwrap_or_default();
    let found = repo(&store, &params.resolver)?
        .iter()
        .filter(|q| params.adder.as_ref().is_none_or(|adder| &q.adder == adder))
        .filter(|q| authors.iter().all(|a| q.authors.contains(a)))
        .filter(|q| {
            params
                .content
                .as_ref()
                .is_none_or(|content| q.content.contains(content.as_str()))
        })
        .cloned()
        .collect();
    Ok(Json(found))
}

async fn upload_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, String)> {
    authorize(&state, &headers)?;
    let content_type = headers
        .get(ATTACHMENT_TYPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("missing {ATTACHMENT_TYPE_HEADER} header"),
            )
        })?
        .to_string();
    let id = Uuid::new_v4().to_string();
    tracing::info!(%id, %content_type, size = body.len(), "attachment stored");
    state.store.write().await.attachments.insert(
        id.clone(),
        StoredAttachment {
            content_type,
            data: body.to_vec(),
        },
    );
    Ok((StatusCode::CREATED, id))
}

async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    let store = state.store.read().await;
    let attachment = store.attachments.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok((
        [(ATTACHMENT_TYPE_HEADER, attachment.content_type.clone())],
        attachment.data.clone(),
    )
        .into_response())
}

async fn delete_attachment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    authorize(&state, &headers)?;
    let mut store = state.store.write().await;
    store
        .attachments
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or((StatusCode::NOT_FOUND, format!("no attachment {id}")))
}
