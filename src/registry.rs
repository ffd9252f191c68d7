//! Backend registry
//!
//! Maps HTTP route names to the stdio backends they front. Built once at startup,
//! either from a JSON definition file or from the built-in default set, and read-only
//! afterwards.

use std::{
    collections::{BTreeMap, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Routes served by the HTTP front itself.
pub const RESERVED_ROUTES: [&str; 2] = ["health", "servers"];

const SEMANTIC_SCHOLAR_DIR: &str = "semanticscholar-MCP-Server";
const SEMANTIC_SCHOLAR_REPO: &str = "https://github.com/JackKuo666/semanticscholar-MCP-Server.git";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendDescriptor {
    pub name: String,
    pub route: String,
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub description: Option<String>,
}

impl BackendDescriptor {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            route: name.clone(),
            name,
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            description: None,
        }
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Static prerequisite check used by the health route. Never spawns anything.
    pub fn is_available(&self) -> bool {
        let dir_present = self
            .working_dir
            .as_deref()
            .map_or(true, |dir| dir.is_dir());

        let command_present = if self.command.contains(std::path::MAIN_SEPARATOR)
            || self.command.contains('/')
        {
            let command = Path::new(&self.command);
            match (command.is_relative(), self.working_dir.as_deref()) {
                (true, Some(dir)) => dir.join(command).exists(),
                _ => command.exists(),
            }
        } else {
            true
        };

        dir_present && command_present
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read backends file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("backends file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("at least one backend must be configured")]
    Empty,
    #[error("backend route `{0}` must match [A-Za-z0-9][A-Za-z0-9_-]*")]
    InvalidRoute(String),
    #[error("backend route `{0}` is reserved")]
    ReservedRoute(String),
    #[error("backend route `{0}` is configured more than once")]
    DuplicateRoute(String),
    #[error("backend name `{0}` is configured more than once")]
    DuplicateName(String),
    #[error("backend `{0}` has an empty command")]
    EmptyCommand(String),
}

#[derive(Debug, Deserialize)]
struct BackendsFile {
    backends: Vec<BackendEntry>,
}

#[derive(Debug, Deserialize)]
struct BackendEntry {
    name: String,
    route: Option<String>,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    working_dir: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BackendRegistry {
    backends: Vec<BackendDescriptor>,
}

impl BackendRegistry {
    pub fn new(backends: Vec<BackendDescriptor>) -> Result<Self, RegistryError> {
        if backends.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut routes = HashSet::new();
        let mut names = HashSet::new();
        for backend in &backends {
            if !route_pattern().is_match(&backend.route) {
                return Err(RegistryError::InvalidRoute(backend.route.clone()));
            }
            if RESERVED_ROUTES.contains(&backend.route.as_str()) {
                return Err(RegistryError::ReservedRoute(backend.route.clone()));
            }
            if !routes.insert(backend.route.as_str()) {
                return Err(RegistryError::DuplicateRoute(backend.route.clone()));
            }
            if !names.insert(backend.name.as_str()) {
                return Err(RegistryError::DuplicateName(backend.name.clone()));
            }
            if backend.command.trim().is_empty() {
                return Err(RegistryError::EmptyCommand(backend.name.clone()));
            }
        }

        Ok(Self { backends })
    }

    pub fn from_file(path: &Path, home: Option<&Path>) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: BackendsFile =
            serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let backends = file
            .backends
            .into_iter()
            .map(|entry| BackendDescriptor {
                route: entry.route.unwrap_or_else(|| entry.name.clone()),
                name: entry.name,
                command: entry.command,
                args: entry.args,
                working_dir: entry.working_dir.map(|dir| expand_home(&dir, home)),
                description: entry.description,
            })
            .collect();

        Self::new(backends)
    }

    /// The semantic scholar and arXiv backends the bridge ships with.
    pub fn with_defaults(home: Option<&Path>) -> Self {
        let semantic_scholar_dir = home
            .unwrap_or_else(|| Path::new("."))
            .join(SEMANTIC_SCHOLAR_DIR);

        if !semantic_scholar_dir.is_dir() {
            warn!(
                path = %semantic_scholar_dir.display(),
                hint = %format!("git clone {SEMANTIC_SCHOLAR_REPO}"),
                "semantic scholar backend directory not found"
            );
        }

        Self {
            backends: vec![
                BackendDescriptor::new("semantic_scholar", "python")
                    .with_route("semantic-scholar")
                    .with_args(["semantic_scholar_server.py"])
                    .with_working_dir(semantic_scholar_dir)
                    .with_description("Semantic Scholar paper database - 200M+ papers"),
                BackendDescriptor::new("arxiv", "uv")
                    .with_args(["tool", "run", "arxiv-mcp-server"])
                    .with_description("ArXiv preprint repository"),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.backends.iter()
    }

    /// Availability of every backend keyed by backend name.
    pub fn availability(&self) -> BTreeMap<String, bool> {
        self.backends
            .iter()
            .map(|backend| (backend.name.clone(), backend.is_available()))
            .collect()
    }
}

#[cfg(test)]
impl BackendRegistry {
    fn get(&self, route: &str) -> Option<&BackendDescriptor> {
        self.backends.iter().find(|backend| backend.route == route)
    }

    fn len(&self) -> usize {
        self.backends.len()
    }
}

fn route_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid route regex"))
}

fn expand_home(dir: &str, home: Option<&Path>) -> PathBuf {
    match (dir.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if dir == "~" => home.map_or_else(|| PathBuf::from(dir), Path::to_path_buf),
        _ => PathBuf::from(dir),
    }
}
