//! End-to-end host-dir scenario, expressed as data.
//!
//! A [`HostDirScenario`] is a pod manifest plus the output one of its
//! containers must produce. Running the pod is the job of a
//! [`ScenarioRunner`] supplied by the orchestration platform (or by
//! [`docker::DockerRunner`] for local runs); [`verify_scenario`] only
//! inspects what the runner hands back.

pub mod docker;
pub mod pod;

use rand::Rng;

use crate::errors::ScenarioError;
use crate::fs_op::MARKER_CONTENT;
use pod::{Container, HostPathVolumeSource, PodManifest, PodSpec, Volume, VolumeMount};

pub const WRITER_CONTAINER: &str = "test-container-1";
pub const READER_CONTAINER: &str = "test-container-2";
pub const HOSTDIR_VOLUME: &str = "test-volume";
pub const TEST_FILE_NAME: &str = "hostdir-test-file";
pub const DEFAULT_PROBE_IMAGE: &str = "hostdir-mount-tester:0.1";
pub const DEFAULT_VOLUME_PATH: &str = "/home";

/// Output captured from one container after it ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLog {
    pub name: String,
    pub exit_code: i64,
    pub output: String,
}

/// Per-container logs of a finished pod, in spec order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodLogs {
    pub containers: Vec<ContainerLog>,
}

/// The orchestration collaborator: runs every container of a pod to
/// completion and returns their logs.
pub trait ScenarioRunner {
    fn run_pod(&mut self, pod: &PodManifest) -> anyhow::Result<PodLogs>;
}

/// A named pod plus the lines one of its containers must print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostDirScenario {
    pub name: String,
    pub pod: PodManifest,
    /// Index into `pod.spec.containers` whose output is checked.
    pub observed_container: usize,
    pub expected_output: Vec<String>,
}

impl HostDirScenario {
    /// Two containers sharing `host_path` at `volume_path`: the first writes
    /// the marker file, the second polls for it and must print its content.
    pub fn read_write(volume_path: &str, host_path: &str, image: &str) -> Self {
        let file_path = container_file_path(volume_path);
        let mount = VolumeMount {
            name: HOSTDIR_VOLUME.to_string(),
            mount_path: volume_path.to_string(),
            read_only: false,
        };
        let container = |name: &str, arg: String| Container {
            name: name.to_string(),
            image: image.to_string(),
            args: vec![arg],
            volume_mounts: vec![mount.clone()],
        };

        let spec = PodSpec {
            containers: vec![
                container(WRITER_CONTAINER, format!("--write_new_file={file_path}")),
                container(READER_CONTAINER, format!("--file_content={file_path}")),
            ],
            volumes: vec![Volume {
                name: HOSTDIR_VOLUME.to_string(),
                host_path: Some(HostPathVolumeSource {
                    path: host_path.to_string(),
                }),
            }],
        };

        HostDirScenario {
            name: "hostdir r/w".to_string(),
            pod: PodManifest::new(random_pod_name(), spec),
            observed_container: 1,
            expected_output: vec![format!(
                "content of file {:?}: {}",
                file_path,
                MARKER_CONTENT.trim_end()
            )],
        }
    }
}

/// Path of the shared test file as seen from inside a container.
pub fn container_file_path(volume_path: &str) -> String {
    format!("{}/{}", volume_path.trim_end_matches('/'), TEST_FILE_NAME)
}

/// `pod-` followed by 16 random hex digits.
pub fn random_pod_name() -> String {
    let suffix: u64 = rand::rng().random();
    format!("pod-{suffix:016x}")
}

/// Run the scenario's pod through `runner` and check the observed container
/// exited cleanly and printed every expected line.
pub fn verify_scenario<R>(
    runner: &mut R,
    scenario: &HostDirScenario,
) -> Result<(), ScenarioError>
where
    R: ScenarioRunner + ?Sized,
{
    let pod_name = scenario.pod.name().to_string();
    tracing::info!(scenario = %scenario.name, pod = %pod_name, "running scenario");

    let logs = runner
        .run_pod(&scenario.pod)
        .map_err(|source| ScenarioError::Runner {
            pod: pod_name.clone(),
            source,
        })?;

    let observed = scenario
        .pod
        .spec
        .containers
        .get(scenario.observed_container)
        .and_then(|c| logs.containers.iter().find(|l| l.name == c.name))
        .ok_or(ScenarioError::MissingContainer {
            pod: pod_name,
            index: scenario.observed_container,
        })?;

    if observed.exit_code != 0 {
        return Err(ScenarioError::ContainerFailed {
            container: observed.name.clone(),
            exit_code: observed.exit_code,
            output: observed.output.clone(),
        });
    }

    if let Some(missing) = scenario
        .expected_output
        .iter()
        .find(|expected| !observed.output.contains(expected.as_str()))
    {
        return Err(ScenarioError::MissingOutput {
            container: observed.name.clone(),
            expected: missing.clone(),
            output: observed.output.clone(),
        });
    }

    tracing::info!(scenario = %scenario.name, "scenario passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns canned logs regardless of the pod.
    struct CannedRunner(anyhow::Result<PodLogs>);

    impl ScenarioRunner for CannedRunner {
        fn run_pod(&mut self, _pod: &PodManifest) -> anyhow::Result<PodLogs> {
            match &self.0 {
                Ok(logs) => Ok(logs.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn logs(reader_exit: i64, reader_output: &str) -> PodLogs {
        PodLogs {
            containers: vec![
                ContainerLog {
                    name: WRITER_CONTAINER.into(),
                    exit_code: 0,
                    output: String::new(),
                },
                ContainerLog {
                    name: READER_CONTAINER.into(),
                    exit_code: reader_exit,
                    output: reader_output.into(),
                },
            ],
        }
    }

    #[test]
    fn read_write_scenario_matches_expected_layout() {
        let s = HostDirScenario::read_write("/home", "/tmp/host", DEFAULT_PROBE_IMAGE);
        let c = &s.pod.spec.containers;
        assert_eq!(c.len(), 2);
        assert_eq!(c[0].args, vec!["--write_new_file=/home/hostdir-test-file"]);
        assert_eq!(c[1].args, vec!["--file_content=/home/hostdir-test-file"]);
        assert!(c.iter().all(|c| c.volume_mounts[0].mount_path == "/home"));
        assert_eq!(
            s.pod.volume(HOSTDIR_VOLUME).unwrap().host_path.as_ref().unwrap().path,
            "/tmp/host"
        );
        assert_eq!(
            s.expected_output,
            vec!["content of file \"/home/hostdir-test-file\": hostdir-mount-tester new file"]
        );
        assert!(s.pod.name().starts_with("pod-"));
        assert_eq!(s.pod.name().len(), "pod-".len() + 16);
    }

    #[test]
    fn trailing_slash_in_volume_path() {
        assert_eq!(container_file_path("/mnt/"), "/mnt/hostdir-test-file");
    }

    #[test]
    fn pod_names_are_unique() {
        assert_ne!(random_pod_name(), random_pod_name());
    }

    #[test]
    fn passes_when_reader_prints_marker() {
        let s = HostDirScenario::read_write("/home", "/tmp/host", DEFAULT_PROBE_IMAGE);
        let out = "content of file \"/home/hostdir-test-file\": hostdir-mount-tester new file\n\n";
        verify_scenario(&mut CannedRunner(Ok(logs(0, out))), &s).unwrap();
    }

    #[test]
    fn fails_when_reader_saw_nothing() {
        let s = HostDirScenario::read_write("/home", "/tmp/host", DEFAULT_PROBE_IMAGE);
        let out = "content of file \"/home/hostdir-test-file\": \n";
        let err = verify_scenario(&mut CannedRunner(Ok(logs(0, out))), &s).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingOutput { .. }), "{err}");
    }

    #[test]
    fn fails_when_reader_exits_nonzero() {
        let s = HostDirScenario::read_write("/home", "/tmp/host", DEFAULT_PROBE_IMAGE);
        let err = verify_scenario(&mut CannedRunner(Ok(logs(1, ""))), &s).unwrap_err();
        assert!(matches!(err, ScenarioError::ContainerFailed { exit_code: 1, .. }));
    }

    #[test]
    fn missing_container_and_runner_errors() {
        let s = HostDirScenario::read_write("/home", "/tmp/host", DEFAULT_PROBE_IMAGE);
        let err = verify_scenario(&mut CannedRunner(Ok(PodLogs::default())), &s).unwrap_err();
        assert!(matches!(err, ScenarioError::MissingContainer { index: 1, .. }));

        let mut runner = CannedRunner(Err(anyhow::anyhow!("boom")));
        let err = verify_scenario(&mut runner, &s).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
