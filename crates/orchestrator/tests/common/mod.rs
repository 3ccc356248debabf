#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use deploy_core::{FileArtifact, Job, NotificationPayload, RepositoryHandle};
use github::{GitHubError, PagesActivation, PagesHost, RemoteFile, RepositoryStore};
use openrouter::{ChatMessage, CompletionService, OpenRouterError};
use orchestrator::{
    EvaluationSink, OrchestratorError, Services, SiteProbe, TaskOrchestrator, WorkflowConfig,
};

pub const OWNER: &str = "Octo";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    CreateRepository(String),
    GetRepository(String),
    CreateFile(String),
    UpdateFile { path: String, sha: String },
}

#[derive(Default)]
struct StoreState {
    /// repo name -> path -> (blob sha, content)
    repos: HashMap<String, HashMap<String, (String, String)>>,
    commits: u32,
    calls: Vec<StoreCall>,
    default_branch: Option<String>,
    head_branches: Vec<String>,
    /// Status returned by every `get_file` when set.
    read_failure: Option<u16>,
}

/// In-memory repository host.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(self, name: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .repos
            .insert(name.to_string(), HashMap::new());
        self
    }

    pub fn with_file(self, repo: &str, path: &str, content: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let files = state.repos.entry(repo.to_string()).or_default();
            files.insert(
                path.to_string(),
                (format!("blob-{}", path), content.to_string()),
            );
        }
        self
    }

    pub fn with_default_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().default_branch = Some(branch.to_string());
        self
    }

    /// Every file read fails with an API error of the given status.
    pub fn failing_reads(self, status: u16) -> Self {
        self.state.lock().unwrap().read_failure = Some(status);
        self
    }

    pub fn repository_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().unwrap().repos.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn file(&self, repo: &str, path: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .repos
            .get(repo)
            .and_then(|files| files.get(path))
            .map(|(_, content)| content.clone())
    }

    pub fn file_paths(&self, repo: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut paths: Vec<String> = state
            .repos
            .get(repo)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Branches passed to `latest_commit`, in call order.
    pub fn head_branches(&self) -> Vec<String> {
        self.state.lock().unwrap().head_branches.clone()
    }

    fn handle(state: &StoreState, name: &str) -> RepositoryHandle {
        RepositoryHandle {
            owner: OWNER.to_string(),
            name: name.to_string(),
            default_branch: state
                .default_branch
                .clone()
                .unwrap_or_else(|| "main".to_string()),
            html_url: format!("https://github.com/{}/{}", OWNER, name),
        }
    }

    fn commit(state: &mut StoreState) -> String {
        state.commits += 1;
        format!("commit-{}", state.commits)
    }
}

#[async_trait]
impl RepositoryStore for FakeStore {
    async fn create_repository(
        &self,
        name: &str,
        _description: &str,
    ) -> github::Result<RepositoryHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::CreateRepository(name.to_string()));
        if state.repos.contains_key(name) {
            return Err(GitHubError::AlreadyExists(name.to_string()));
        }
        state.repos.insert(name.to_string(), HashMap::new());
        Ok(Self::handle(&state, name))
    }

    async fn get_repository(&self, name: &str) -> github::Result<RepositoryHandle> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::GetRepository(name.to_string()));
        if state.repos.contains_key(name) {
            Ok(Self::handle(&state, name))
        } else {
            Err(GitHubError::RepoNotFound {
                owner: OWNER.to_string(),
                repo: name.to_string(),
            })
        }
    }

    async fn get_file(
        &self,
        repo: &RepositoryHandle,
        path: &str,
    ) -> github::Result<Option<RemoteFile>> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.read_failure {
            return Err(GitHubError::Api {
                status,
                message: "Server Error".to_string(),
            });
        }
        Ok(state
            .repos
            .get(&repo.name)
            .and_then(|files| files.get(path))
            .map(|(sha, content)| RemoteFile {
                path: path.to_string(),
                sha: sha.clone(),
                content: content.clone(),
            }))
    }

    async fn create_file(
        &self,
        repo: &RepositoryHandle,
        artifact: &FileArtifact,
    ) -> github::Result<String> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(StoreCall::CreateFile(artifact.path.clone()));
        let sha = Self::commit(&mut state);
        let files = state
            .repos
            .get_mut(&repo.name)
            .ok_or_else(|| GitHubError::NotFound(repo.name.clone()))?;
        if files.contains_key(&artifact.path) {
            return Err(GitHubError::Api {
                status: 422,
                message: "\"sha\" wasn't supplied.".to_string(),
            });
        }
        files.insert(
            artifact.path.clone(),
            (format!("blob-{}", sha), artifact.content.clone()),
        );
        Ok(sha)
    }

    async fn update_file(
        &self,
        repo: &RepositoryHandle,
        artifact: &FileArtifact,
        sha: &str,
    ) -> github::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::UpdateFile {
            path: artifact.path.clone(),
            sha: sha.to_string(),
        });
        let commit = Self::commit(&mut state);
        let files = state
            .repos
            .get_mut(&repo.name)
            .ok_or_else(|| GitHubError::NotFound(repo.name.clone()))?;
        let current = files.get(&artifact.path).map(|(blob, _)| blob.as_str() == sha);
        if current != Some(true) {
            return Err(GitHubError::Conflict(artifact.path.clone()));
        }
        files.insert(
            artifact.path.clone(),
            (format!("blob-{}", commit), artifact.content.clone()),
        );
        Ok(commit)
    }

    async fn latest_commit(&self, _repo: &RepositoryHandle, branch: &str) -> github::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.head_branches.push(branch.to_string());
        Ok(format!("commit-{}", state.commits))
    }
}

/// Pages host that answers from a script, then reports success.
#[derive(Default)]
pub struct FakePages {
    script: Mutex<VecDeque<GitHubError>>,
    pub calls: AtomicU32,
    branches: Mutex<Vec<String>>,
}

impl FakePages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_with(errors: Vec<GitHubError>) -> Self {
        Self {
            script: Mutex::new(errors.into()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Branches Pages was asked to serve from.
    pub fn branches(&self) -> Vec<String> {
        self.branches.lock().unwrap().clone()
    }
}

#[async_trait]
impl PagesHost for FakePages {
    async fn enable_pages(
        &self,
        _repo: &RepositoryHandle,
        branch: &str,
        _path: &str,
    ) -> github::Result<PagesActivation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.branches.lock().unwrap().push(branch.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(error) => Err(error),
            None => Ok(PagesActivation::Enabled),
        }
    }
}

/// Model that records every prompt and returns a canned completion.
pub struct FakeModel {
    response: Result<String, String>,
    prompts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl FakeModel {
    pub fn returning(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Vec<ChatMessage>> {
        self.prompts.lock().unwrap().clone()
    }

    /// Text of the last user message sent.
    pub fn last_user_prompt(&self) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .and_then(|messages| messages.last())
            .map(|message| message.content.clone())
    }
}

#[async_trait]
impl CompletionService for FakeModel {
    async fn complete(&self, messages: Vec<ChatMessage>) -> openrouter::Result<String> {
        self.prompts.lock().unwrap().push(messages);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(OpenRouterError::Api {
                message: message.clone(),
                status_code: Some(500),
            }),
        }
    }
}

/// Site probe that fails a fixed number of times before answering 200.
pub struct FakeProbe {
    failures: u32,
    pub calls: AtomicU32,
    urls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn live() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn never_live() -> Self {
        Self::failing_times(u32::MAX)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SiteProbe for FakeProbe {
    async fn probe(&self, url: &str) -> orchestrator::Result<u16> {
        self.urls.lock().unwrap().push(url.to_string());
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            Ok(404)
        } else {
            Ok(200)
        }
    }
}

/// Evaluation endpoint that records what it receives.
pub struct FakeSink {
    failures: u32,
    pub calls: AtomicU32,
    payloads: Mutex<Vec<(String, NotificationPayload)>>,
}

impl FakeSink {
    pub fn accepting() -> Self {
        Self::failing_times(0)
    }

    pub fn failing_times(failures: u32) -> Self {
        Self {
            failures,
            calls: AtomicU32::new(0),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<(String, NotificationPayload)> {
        self.payloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvaluationSink for FakeSink {
    async fn deliver(&self, url: &str, payload: &NotificationPayload) -> orchestrator::Result<()> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(OrchestratorError::Delivery("HTTP 503".to_string()));
        }
        self.payloads
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub pages: Arc<FakePages>,
    pub model: Arc<FakeModel>,
    pub probe: Arc<FakeProbe>,
    pub sink: Arc<FakeSink>,
}

impl Harness {
    pub fn new(store: FakeStore, model: FakeModel) -> Self {
        Self {
            store: Arc::new(store),
            pages: Arc::new(FakePages::new()),
            model: Arc::new(model),
            probe: Arc::new(FakeProbe::live()),
            sink: Arc::new(FakeSink::accepting()),
        }
    }

    pub fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    pub fn with_sink(mut self, sink: FakeSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    pub fn services(&self) -> Services {
        Services {
            store: self.store.clone(),
            pages: self.pages.clone(),
            model: self.model.clone(),
            probe: self.probe.clone(),
            sink: self.sink.clone(),
        }
    }

    pub fn orchestrator(&self) -> TaskOrchestrator {
        TaskOrchestrator::new(self.services(), fast_config())
    }
}

pub fn fast_config() -> WorkflowConfig {
    WorkflowConfig::default().with_backoff_unit(Duration::from_millis(1))
}

pub fn job(task: &str, round: u32, brief: &str) -> Job {
    Job {
        task_id: task.to_string(),
        round,
        brief: brief.to_string(),
        checks: vec!["Page has a calculator".to_string()],
        email: "student@example.com".to_string(),
        nonce: format!("nonce-{}", round),
        evaluation_url: "https://evaluator.example.com/notify".to_string(),
        attachments: Vec::new(),
    }
}
