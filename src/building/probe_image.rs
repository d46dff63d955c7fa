use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

static BUILD_CTX_SEQ: AtomicU64 = AtomicU64::new(0);

/// Base image the probe binary is copied into. Needs a libc compatible with
/// the host toolchain's output.
pub const BASE_IMAGE: &str = "debian:bookworm-slim";

/// Name of the probe binary inside the image (and of the cargo target).
pub const PROBE_BINARY: &str = "mt-hostdir";

/// Render the Dockerfile for an image whose entrypoint is `binary_name`.
pub fn render_dockerfile(binary_name: &str) -> String {
    format!(
        "FROM {BASE_IMAGE}\n\
         COPY {binary_name} /{binary_name}\n\
         ENTRYPOINT [\"/{binary_name}\"]\n"
    )
}

/// Create a fresh, uniquely named build context directory under the system
/// temp dir.
pub fn fresh_build_context() -> Result<PathBuf> {
    let mut build_ctx = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_nanos();
    build_ctx.push(format!(
        "hostdir_build_ctx_{}_{}_{}",
        std::process::id(),
        stamp,
        BUILD_CTX_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    if build_ctx.exists() {
        let _ = fs::remove_dir_all(&build_ctx);
    }
    fs::create_dir_all(&build_ctx)?;
    Ok(build_ctx)
}

/// Lay out a build context in `build_ctx`: the probe binary plus a generated
/// Dockerfile.
pub fn prepare_build_context(binary: &Path, build_ctx: &Path) -> Result<()> {
    if !binary.is_file() {
        return Err(anyhow!("probe binary not found at {}", binary.display()));
    }
    fs::copy(binary, build_ctx.join(PROBE_BINARY)).with_context(|| {
        format!(
            "failed to copy {} into build context {}",
            binary.display(),
            build_ctx.display()
        )
    })?;
    fs::write(build_ctx.join("Dockerfile"), render_dockerfile(PROBE_BINARY))
        .context("failed to write Dockerfile")?;
    Ok(())
}

/// Build the probe image `tag` from an already compiled `binary`, using the
/// docker-compatible `cli` (`docker`, `podman`, ...).
///
/// The temporary build context is removed whether or not the build
/// succeeded.
pub fn build_probe_image(cli: &str, binary: &Path, tag: &str) -> Result<()> {
    let build_ctx = fresh_build_context()?;
    let result = prepare_build_context(binary, &build_ctx).and_then(|()| {
        tracing::info!(cli, tag, context = %build_ctx.display(), "building probe image");
        let status = Command::new(cli)
            .arg("build")
            .arg("-t")
            .arg(tag)
            .arg(&build_ctx)
            .status()
            .with_context(|| format!("Failed to run {cli} build"))?;
        if !status.success() {
            return Err(anyhow!("{cli} build for {tag} failed with {status}"));
        }
        Ok(())
    });
    let _ = fs::remove_dir_all(&build_ctx);
    result
}

/// Locate the probe binary next to the currently running executable (both
/// end up in the same cargo target directory).
pub fn sibling_probe_binary() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot resolve current executable")?;
    let dir = exe
        .parent()
        .ok_or_else(|| anyhow!("executable {} has no parent directory", exe.display()))?;
    Ok(dir.join(format!("{PROBE_BINARY}{}", std::env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn dockerfile_uses_binary_as_entrypoint() {
        let df = render_dockerfile("mt-hostdir");
        let lines: Vec<&str> = df.lines().collect();
        assert_eq!(
            lines,
            vec![
                "FROM debian:bookworm-slim",
                "COPY mt-hostdir /mt-hostdir",
                "ENTRYPOINT [\"/mt-hostdir\"]",
            ]
        );
    }

    #[test]
    fn build_context_contains_binary_and_dockerfile() {
        let src = tempdir().unwrap();
        let bin = src.path().join("probe");
        fs::write(&bin, b"\x7fELF fake").unwrap();

        let ctx = tempdir().unwrap();
        prepare_build_context(&bin, ctx.path()).unwrap();
        assert_eq!(fs::read(ctx.path().join(PROBE_BINARY)).unwrap(), b"\x7fELF fake");
        assert!(fs::read_to_string(ctx.path().join("Dockerfile"))
            .unwrap()
            .contains("ENTRYPOINT"));
    }

    #[test]
    fn missing_binary_is_an_error() {
        let ctx = tempdir().unwrap();
        let err = prepare_build_context(&ctx.path().join("nope"), ctx.path()).unwrap_err();
        assert!(err.to_string().contains("probe binary not found"));
    }

    #[test]
    fn fresh_contexts_are_distinct() {
        let a = fresh_build_context().unwrap();
        let b = fresh_build_context().unwrap();
        assert_ne!(a, b);
        let _ = fs::remove_dir_all(a);
        let _ = fs::remove_dir_all(b);
    }

    #[test]
    fn build_uses_the_given_cli() {
        let src = tempdir().unwrap();
        let bin = src.path().join("probe");
        fs::write(&bin, b"\x7fELF fake").unwrap();

        let cli = "hostdir-no-such-container-cli";
        let err = build_probe_image(cli, &bin, "hostdir-test:never").unwrap_err();
        assert!(format!("{err:#}").contains(cli), "{err:#}");
    }
}
