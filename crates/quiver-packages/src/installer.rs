//! Installing, listing and removing packages under an install root.
//!
//! Each package occupies `<root>/<toolId>/`: the extracted archive contents
//! plus a `package-info.json` install record. Reinstalling a `toolId`
//! replaces its directory entirely.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::archive::{archive_digest, extract_archive};
use crate::best_effort::read_json;
use crate::error::{PackageError, PackageResult};
use crate::manifest::{MANIFEST_FILE_NAME, Manifest, ensure_path_safe_tool_id};
use crate::record::{PackageInfo, PackageSource};
use crate::schema::{JsonSchemaValidator, SchemaValidator};
use crate::scratch::ScratchDir;
use crate::test_case::TestCase;
use crate::validate::{ManifestValidator, TestCaseValidator};
use crate::validation::ValidationResult;

/// File name used for a downloaded archive inside its scratch directory.
const DOWNLOAD_FILE_NAME: &str = "download.tpkg";

/// Limits applied to URL installs.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Bound on the whole download, connection included.
    pub timeout: Duration,
    /// Largest archive accepted, in bytes.
    pub max_bytes: u64,
    /// `User-Agent` header for downloads.
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_bytes: 104_857_600,
            user_agent: concat!("quiver/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Result of an install attempt.
#[derive(Debug, Clone)]
pub struct InstallOutcome {
    /// Accumulated errors and warnings.
    pub validation: ValidationResult,
    /// The persisted record, on success.
    pub package: Option<PackageInfo>,
}

impl InstallOutcome {
    fn failed(validation: ValidationResult) -> Self {
        Self {
            validation,
            package: None,
        }
    }
}

/// Manages packages under one install root.
///
/// Assumes exclusive use of the root; concurrent installers targeting the
/// same root are not coordinated.
#[derive(Debug, Clone)]
pub struct PackageInstaller {
    root: PathBuf,
    manifests: ManifestValidator,
    test_cases: TestCaseValidator,
    fetch: FetchSettings,
}

impl PackageInstaller {
    /// Create an installer over `root` with default validators and limits.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_schema_validator(root, Arc::new(JsonSchemaValidator))
    }

    /// Create an installer using the given schema capability.
    #[must_use]
    pub fn with_schema_validator(
        root: impl Into<PathBuf>,
        schemas: Arc<dyn SchemaValidator>,
    ) -> Self {
        Self {
            root: root.into(),
            manifests: ManifestValidator::new(Arc::clone(&schemas)),
            test_cases: TestCaseValidator::new(schemas),
            fetch: FetchSettings::default(),
        }
    }

    /// Replace the URL-install limits.
    #[must_use]
    pub fn with_fetch_settings(mut self, fetch: FetchSettings) -> Self {
        self.fetch = fetch;
        self
    }

    /// The install root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `tool_id` is (or would be) installed.
    #[must_use]
    pub fn install_dir(&self, tool_id: &str) -> PathBuf {
        self.root.join(tool_id)
    }

    /// Install a local archive.
    #[must_use]
    pub fn install_from_path(&self, archive: &Path, validate: bool) -> InstallOutcome {
        let source = PackageSource::Local(archive.display().to_string());
        self.settle(self.install_archive(archive, source, validate))
    }

    /// Download an archive and install it.
    ///
    /// The download lands in a scratch directory that is removed afterwards
    /// whatever the outcome.
    pub async fn install_from_url(&self, url: &str, validate: bool) -> InstallOutcome {
        let result = async {
            let parsed = Url::parse(url).map_err(|e| PackageError::Download {
                url: url.to_string(),
                message: format!("invalid URL: {e}"),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(PackageError::Download {
                    url: url.to_string(),
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }

            let scratch = ScratchDir::new("download")?;
            let bytes = self.download(&parsed).await?;
            let archive = scratch.path().join(DOWNLOAD_FILE_NAME);
            std::fs::write(&archive, &bytes).map_err(|e| PackageError::io(&archive, e))?;
            debug!(url, bytes = bytes.len(), "downloaded package");

            self.install_archive(&archive, PackageSource::Url(url.to_string()), validate)
        }
        .await;
        self.settle(result)
    }

    fn settle(&self, result: PackageResult<InstallOutcome>) -> InstallOutcome {
        result.unwrap_or_else(|e| {
            warn!(root = %self.root.display(), error = %e, "install failed");
            InstallOutcome::failed(ValidationResult::failure(e.to_string()))
        })
    }

    fn install_archive(
        &self,
        archive: &Path,
        source: PackageSource,
        validate: bool,
    ) -> PackageResult<InstallOutcome> {
        let bytes = std::fs::read(archive).map_err(|e| PackageError::io(archive, e))?;
        let digest = archive_digest(&bytes);

        let scratch = ScratchDir::new("extract")?;
        extract_archive(&bytes, scratch.path())?;

        let manifest_path = scratch.path().join(MANIFEST_FILE_NAME);
        if !manifest_path.is_file() {
            return Ok(InstallOutcome::failed(ValidationResult::failure(format!(
                "package has no {MANIFEST_FILE_NAME} at its root"
            ))));
        }
        let manifest = Manifest::from_path(&manifest_path)?;

        let mut validation = ValidationResult::new();
        if validate {
            validation = self.manifests.validate(&manifest);
            if !validation.is_valid {
                return Ok(InstallOutcome::failed(validation));
            }
        }
        ensure_path_safe_tool_id(&manifest.tool_id)?;

        std::fs::create_dir_all(&self.root).map_err(|e| PackageError::io(&self.root, e))?;
        let install_path = self.install_dir(&manifest.tool_id);
        if install_path.exists() {
            debug!(path = %install_path.display(), "removing previous install");
            std::fs::remove_dir_all(&install_path)
                .map_err(|e| PackageError::io(&install_path, e))?;
        }

        place_package(scratch.path(), &install_path)?;

        let package = PackageInfo {
            tool_id: manifest.tool_id.clone(),
            version: manifest.version.clone(),
            name: manifest.name.clone(),
            description: manifest.description.clone(),
            install_path,
            installed_at: Utc::now(),
            capabilities: manifest.capabilities.clone(),
            source: Some(source),
            archive_digest: Some(digest),
        };
        package.save()?;

        info!(
            tool_id = %package.tool_id,
            version = %package.version,
            path = %package.install_path.display(),
            "package installed"
        );
        Ok(InstallOutcome {
            validation,
            package: Some(package),
        })
    }

    async fn download(&self, url: &Url) -> PackageResult<Vec<u8>> {
        let download_error = |message: String| PackageError::Download {
            url: url.to_string(),
            message,
        };

        let client = reqwest::Client::builder()
            .user_agent(self.fetch.user_agent.as_str())
            .build()
            .map_err(|e| download_error(format!("failed to build HTTP client: {e}")))?;

        let fetch = async {
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| download_error(e.to_string()))?;
            if !response.status().is_success() {
                return Err(download_error(format!("HTTP {}", response.status())));
            }
            if let Some(len) = response.content_length()
                && len > self.fetch.max_bytes
            {
                return Err(PackageError::PackageTooLarge {
                    size: len,
                    limit: self.fetch.max_bytes,
                });
            }
            download_with_limit(response, self.fetch.max_bytes).await
        };

        tokio::time::timeout(self.fetch.timeout, fetch)
            .await
            .map_err(|_| {
                download_error(format!(
                    "timed out after {}s",
                    self.fetch.timeout.as_secs_f64()
                ))
            })?
    }

    /// Every readable install record under the root, sorted by tool id.
    ///
    /// Directories without a readable record are skipped.
    #[must_use]
    pub fn list_installed(&self) -> Vec<PackageInfo> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(root = %self.root.display(), error = %e, "install root not readable");
                return Vec::new();
            },
        };

        let mut packages: Vec<PackageInfo> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| read_json(&PackageInfo::path_in(&entry.path())).into_option())
            .collect();
        packages.sort_by(|a, b| a.tool_id.cmp(&b.tool_id));
        packages
    }

    /// The install record of `tool_id`, if installed and readable.
    #[must_use]
    pub fn package_info(&self, tool_id: &str) -> Option<PackageInfo> {
        ensure_path_safe_tool_id(tool_id).ok()?;
        read_json(&PackageInfo::path_in(&self.install_dir(tool_id))).into_option()
    }

    /// The installed manifest of `tool_id`.
    ///
    /// `None` means "not installed": absent and unparseable manifests are
    /// treated alike.
    #[must_use]
    pub fn load_manifest(&self, tool_id: &str) -> Option<Manifest> {
        ensure_path_safe_tool_id(tool_id).ok()?;
        read_json(&self.install_dir(tool_id).join(MANIFEST_FILE_NAME)).into_option()
    }

    /// The installed test cases declared by `manifest`.
    ///
    /// Files that are missing, unparseable or structurally invalid are skipped.
    #[must_use]
    pub fn load_test_cases(&self, manifest: &Manifest) -> Vec<TestCase> {
        if ensure_path_safe_tool_id(&manifest.tool_id).is_err() {
            return Vec::new();
        }
        let dir = self.install_dir(&manifest.tool_id);
        manifest
            .test_paths()
            .iter()
            .filter(|relative| crate::validate::is_package_relative(relative))
            .filter_map(|relative| {
                read_json::<TestCase>(&dir.join(relative))
                    .and_check(|tc| {
                        let result = self.test_cases.validate(tc);
                        if result.is_valid {
                            Ok(())
                        } else {
                            Err(format!("{relative}: {}", result.errors.join("; ")))
                        }
                    })
                    .into_option()
            })
            .collect()
    }

    /// Remove an installed package.
    ///
    /// Returns `false` if it was not installed or could not be removed.
    #[must_use]
    pub fn uninstall(&self, tool_id: &str) -> bool {
        if ensure_path_safe_tool_id(tool_id).is_err() {
            return false;
        }
        let dir = self.install_dir(tool_id);
        if !dir.is_dir() {
            return false;
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(tool_id, "package uninstalled");
                true
            },
            Err(e) => {
                warn!(tool_id, path = %dir.display(), error = %e, "failed to uninstall");
                false
            },
        }
    }
}

async fn download_with_limit(response: reqwest::Response, max_size: u64) -> PackageResult<Vec<u8>> {
    use futures::StreamExt;

    let url = response.url().to_string();
    let capacity =
        usize::try_from(response.content_length().unwrap_or(0).min(max_size)).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| PackageError::Download {
            url: url.clone(),
            message: format!("download error: {e}"),
        })?;
        bytes.extend_from_slice(&chunk);
        let current_size = u64::try_from(bytes.len()).unwrap_or(u64::MAX);
        if current_size > max_size {
            return Err(PackageError::PackageTooLarge {
                size: current_size,
                limit: max_size,
            });
        }
    }

    Ok(bytes)
}

/// Copy an extracted package into its install directory. A partial copy is
/// removed on failure.
fn place_package(src: &Path, dst: &Path) -> PackageResult<()> {
    let copied = copy_tree(src, dst);
    if copied.is_err()
        && let Err(e) = std::fs::remove_dir_all(dst)
    {
        debug!(path = %dst.display(), error = %e, "failed to remove partial install");
    }
    copied
}

/// Recursively copy `src` into `dst`, refusing symlinks.
fn copy_tree(src: &Path, dst: &Path) -> PackageResult<()> {
    std::fs::create_dir_all(dst).map_err(|e| PackageError::io(dst, e))?;

    for entry in std::fs::read_dir(src).map_err(|e| PackageError::io(src, e))? {
        let entry = entry.map_err(|e| PackageError::io(src, e))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| PackageError::io(&src_path, e))?;

        if file_type.is_symlink() {
            return Err(PackageError::Archive {
                message: format!("package contains a symlink at {}", src_path.display()),
            });
        }
        if file_type.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).map_err(|e| PackageError::io(&src_path, e))?;
        }
    }
    Ok(())
}
