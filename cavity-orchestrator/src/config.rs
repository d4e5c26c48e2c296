//! Orchestrator configuration
//!
//! Everything is read from environment variables once at startup. Unset
//! variables fall back to values suited to a local checkout.

use std::path::PathBuf;

use crate::lifecycle::ArtifactLayout;
use crate::supervisor::SolverCommand;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Postgres connection string; `None` selects the in-memory store
    pub database_url: Option<String>,

    /// Solver executable
    pub solver_program: String,

    /// Arguments placed before the parameter flags
    pub solver_args: Vec<String>,

    /// Working directory for the solver, if different from ours
    pub solver_workdir: Option<PathBuf>,

    /// Directory result videos are written to and served from
    pub output_dir: PathBuf,

    /// URL path the output directory is mounted under
    pub result_url_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            database_url: None,
            solver_program: "python".to_string(),
            solver_args: vec!["fluid_solver/main.py".to_string()],
            solver_workdir: None,
            output_dir: PathBuf::from("client/public/videos"),
            result_url_prefix: "/videos".to_string(),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - DATABASE_URL (unset: in-memory store)
    /// - ORCHESTRATOR_BIND_ADDR (default: 0.0.0.0:8080)
    /// - SOLVER_PROGRAM (default: python)
    /// - SOLVER_ARGS (whitespace separated, default: fluid_solver/main.py)
    /// - SOLVER_WORKDIR
    /// - OUTPUT_DIR (default: client/public/videos)
    /// - RESULT_URL_PREFIX (default: /videos)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output_dir = var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        // The solver may run in another directory, so the path it gets must not be relative
        let output_dir = std::path::absolute(&output_dir).map_err(|e| {
            anyhow::anyhow!("cannot resolve OUTPUT_DIR {}: {}", output_dir.display(), e)
        })?;

        let config = Self {
            bind_addr: var("ORCHESTRATOR_BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: var("DATABASE_URL"),
            solver_program: var("SOLVER_PROGRAM").unwrap_or(defaults.solver_program),
            solver_args: var("SOLVER_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.solver_args),
            solver_workdir: var("SOLVER_WORKDIR").map(PathBuf::from),
            output_dir,
            result_url_prefix: var("RESULT_URL_PREFIX").unwrap_or(defaults.result_url_prefix),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.solver_program.is_empty() {
            anyhow::bail!("solver_program cannot be empty");
        }

        if !self.result_url_prefix.starts_with('/') {
            anyhow::bail!("result_url_prefix must start with '/'");
        }

        if self.result_url_prefix.trim_end_matches('/').is_empty() {
            anyhow::bail!("result_url_prefix cannot be the root path");
        }

        Ok(())
    }

    pub fn solver_command(&self) -> SolverCommand {
        SolverCommand {
            program: self.solver_program.clone(),
            args: self.solver_args.clone(),
            working_dir: self.solver_workdir.clone(),
        }
    }

    pub fn artifact_layout(&self) -> ArtifactLayout {
        ArtifactLayout {
            output_dir: self.output_dir.clone(),
            url_prefix: self.result_url_prefix.clone(),
        }
    }
}
