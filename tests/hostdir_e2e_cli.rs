use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

use hostdir_mount_tester::scenario::pod::PodManifest;

#[test]
fn manifest_prints_two_container_pod() {
    let mut cmd = cargo_bin_cmd!("hostdir-e2e");
    let output = cmd
        .args(["manifest", "--host-path", "/srv/shared", "--volume-path", "/data"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let pod = PodManifest::from_json(&String::from_utf8_lossy(&output)).expect("valid manifest");
    assert_eq!(pod.kind, "Pod");
    assert_eq!(pod.spec.containers.len(), 2);
    assert_eq!(
        pod.spec.containers[0].args,
        vec!["--write_new_file=/data/hostdir-test-file"]
    );
    assert_eq!(
        pod.spec.containers[1].args,
        vec!["--file_content=/data/hostdir-test-file"]
    );
    assert_eq!(
        pod.volume("test-volume")
            .and_then(|v| v.host_path.as_ref())
            .map(|h| h.path.as_str()),
        Some("/srv/shared")
    );
}

#[test]
fn unknown_subcommand_is_rejected() {
    cargo_bin_cmd!("hostdir-e2e")
        .arg("deploy")
        .assert()
        .failure()
        .stderr(predicate::str::contains("deploy"));
}

#[test]
fn build_runs_the_requested_cli() -> Result<(), Box<dyn std::error::Error>> {
    let temp = assert_fs::TempDir::new()?;
    let binary = temp.path().join("mt-hostdir");
    std::fs::write(&binary, b"\x7fELF fake")?;

    cargo_bin_cmd!("hostdir-e2e")
        .args(["build", "--cli", "hostdir-no-such-container-cli", "--binary"])
        .arg(&binary)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Failed to run hostdir-no-such-container-cli build",
        ));
    Ok(())
}
