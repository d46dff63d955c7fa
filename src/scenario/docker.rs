//! Local stand-in for the orchestration platform, driving the `docker` CLI.
//!
//! Every container of a pod is started detached with the pod's host-path
//! volumes bind-mounted, so they run concurrently exactly like they would in
//! a pod. The runner then waits for each one, collects its logs and removes
//! it.

use std::process::{Command, Output};

use anyhow::{anyhow, Context, Result};

use super::pod::{Container, PodManifest};
use super::{ContainerLog, PodLogs, ScenarioRunner};

/// Runs pods as plain Docker containers.
#[derive(Debug, Clone)]
pub struct DockerRunner {
    docker: String,
    /// Extra environment passed to every container (`-e KEY=VALUE`).
    env: Vec<(String, String)>,
}

impl Default for DockerRunner {
    fn default() -> Self {
        DockerRunner {
            docker: "docker".to_string(),
            env: Vec::new(),
        }
    }
}

impl DockerRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different docker-compatible CLI (for example `podman`).
    pub fn with_cli(mut self, cli: impl Into<String>) -> Self {
        self.docker = cli.into();
        self
    }

    pub fn cli(&self) -> &str {
        &self.docker
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// `true` when `docker info` succeeds.
    pub fn is_available(&self) -> bool {
        Command::new(&self.docker)
            .arg("info")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn docker(&self, args: &[String]) -> Result<Output> {
        let output = Command::new(&self.docker)
            .args(args)
            .output()
            .with_context(|| format!("failed to run `{} {}`", self.docker, args.join(" ")))?;
        if !output.status.success() {
            return Err(anyhow!(
                "`{} {}` exited with {}: {}",
                self.docker,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Ok(output)
    }

    fn collect(&self, name: &str) -> Result<ContainerLog> {
        let waited = self.docker(&["wait".to_string(), name.to_string()])?;
        let exit_code = String::from_utf8_lossy(&waited.stdout)
            .trim()
            .parse::<i64>()
            .with_context(|| format!("unexpected `docker wait` output for {name}"))?;

        let logs = self.docker(&["logs".to_string(), name.to_string()])?;
        let mut output = String::from_utf8_lossy(&logs.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&logs.stderr));

        tracing::debug!(container = name, exit_code, "container finished");
        Ok(ContainerLog {
            name: name.to_string(),
            exit_code,
            output,
        })
    }

    fn remove(&self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        let mut args = vec!["rm".to_string(), "-f".to_string()];
        args.extend(names.iter().cloned());
        if let Err(e) = self.docker(&args) {
            tracing::warn!("failed to remove containers: {e:#}");
        }
    }

    fn start_and_collect(&self, pod: &PodManifest, started: &mut Vec<String>) -> Result<PodLogs> {
        for container in &pod.spec.containers {
            tracing::info!(container = %container.name, "starting container");
            self.docker(&docker_run_args(pod, container, &self.env))?;
            started.push(container_name(pod, container));
        }

        let mut logs = PodLogs::default();
        for (container, name) in pod.spec.containers.iter().zip(started.iter()) {
            let mut log = self.collect(name)?;
            log.name = container.name.clone();
            logs.containers.push(log);
        }
        Ok(logs)
    }
}

impl ScenarioRunner for DockerRunner {
    fn run_pod(&mut self, pod: &PodManifest) -> Result<PodLogs> {
        let mut started = Vec::new();
        let result = self.start_and_collect(pod, &mut started);
        self.remove(&started);
        result
    }
}

/// Docker container name used for `container` of `pod`.
pub fn container_name(pod: &PodManifest, container: &Container) -> String {
    format!("{}-{}", pod.name(), container.name)
}

/// `docker run` arguments starting `container` of `pod` detached, with its
/// host-path volume mounts bound and `env` exported.
pub fn docker_run_args(
    pod: &PodManifest,
    container: &Container,
    env: &[(String, String)],
) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "-d".to_string(),
        "--name".to_string(),
        container_name(pod, container),
    ];
    for (key, value) in env {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    for (host, mount, read_only) in container.host_binds(pod) {
        args.push("-v".to_string());
        if read_only {
            args.push(format!("{host}:{mount}:ro"));
        } else {
            args.push(format!("{host}:{mount}"));
        }
    }
    args.push(container.image.clone());
    args.extend(container.args.iter().cloned());
    args
}
