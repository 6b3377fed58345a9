//! `install` command.

use std::env;
use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use uniget::config::ConfigFile;
use uniget::manager::{ArchiveKind, MaterializeReport, MaterializeRequest, PackageMaterializer};
use uniget::package::{InclusionPolicy, PathFilter};
use uniget::source::{parse_requirement, Repository};

use crate::error::CliError;

/// Archive layout as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Identifier-keyed `.unitypackage` (gzip tar)
    Unitypackage,
    /// Flat source archive (zip)
    Source,
}

impl From<KindArg> for ArchiveKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Unitypackage => ArchiveKind::UnityPackage,
            KindArg::Source => ArchiveKind::Source,
        }
    }
}

/// Arguments for `uniget install`.
#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Package archive to materialize
    #[arg(required_unless_present = "github", conflicts_with = "github")]
    pub archive: Option<PathBuf>,

    /// Install the highest cached release of OWNER/REPO instead of an archive path
    #[arg(long, value_name = "OWNER/REPO", requires = "project")]
    pub github: Option<Repository>,

    /// Version range for --github (e.g. "^1.2")
    #[arg(long, default_value = "*", value_name = "REQ")]
    pub range: String,

    /// Release asset name for --github (defaults to the project identifier)
    #[arg(long, value_name = "NAME")]
    pub source_name: Option<String>,

    /// Project identifier (defaults to the archive name up to the first '.')
    #[arg(long)]
    pub project: Option<String>,

    /// Destination project root (defaults to install.dest_dir, then the current directory)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Archive layout (inferred from the extension when omitted)
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,

    /// Include files marked as extra
    #[arg(long)]
    pub extra: bool,

    /// Include files marked as merged
    #[arg(long)]
    pub merged: bool,

    /// Only materialize paths matching this regex (repeatable)
    #[arg(long = "include", value_name = "REGEX")]
    pub includes: Vec<String>,

    /// Skip paths matching this regex; `$sample$` skips sample folders (repeatable)
    #[arg(long = "exclude", value_name = "REGEX")]
    pub excludes: Vec<String>,
}

/// Run the install command.
pub fn run(args: InstallArgs, config: &ConfigFile) -> Result<(), CliError> {
    let request = build_request(&args, config)?;
    tracing::debug!(?request, "Resolved install request");

    let materializer = PackageMaterializer::new(config.to_materializer_config());
    let report = materializer.materialize(&request)?;

    print_report(&request, &report);
    Ok(())
}

fn build_request(args: &InstallArgs, config: &ConfigFile) -> Result<MaterializeRequest, CliError> {
    let archive = archive_path(args, config)?;
    let kind = match args.kind {
        Some(kind) => kind.into(),
        None => ArchiveKind::from_path(&archive)
            .ok_or_else(|| CliError::UnknownArchive(archive.display().to_string()))?,
    };
    let project = match &args.project {
        Some(id) => id.clone(),
        None => project_id_from_archive(&archive)
            .ok_or_else(|| CliError::UnknownArchive(archive.display().to_string()))?,
    };
    let dest = args
        .dest
        .clone()
        .or_else(|| config.dest_dir.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    let filter = PathFilter::new(&args.includes, &args.excludes)?;

    Ok(MaterializeRequest::with_kind(&archive, kind, project, dest)
        .with_inclusion(InclusionPolicy::new(args.extra, args.merged))
        .with_filter(filter))
}

/// Archive given on the command line, or the cached release picked by `--github`.
fn archive_path(args: &InstallArgs, config: &ConfigFile) -> Result<PathBuf, CliError> {
    if let Some(archive) = &args.archive {
        return Ok(archive.clone());
    }
    let (Some(repo), Some(project)) = (&args.github, &args.project) else {
        return Err(CliError::MissingArchive);
    };

    let cache = config
        .package_cache()
        .ok_or_else(|| CliError::Config("no cache directory; set cache.directory".to_string()))?;
    let kind = args.kind.map(ArchiveKind::from).unwrap_or(ArchiveKind::UnityPackage);
    let requirement = parse_requirement(&args.range)?;
    let source_name = args.source_name.as_deref().unwrap_or(project);

    let (version, path) = cache.resolve(
        &repo.owner,
        &repo.repo,
        source_name,
        kind.extension(),
        &requirement,
    )?;
    tracing::info!(repo = %repo, version = %version, "Using cached release");
    Ok(path)
}

/// Archive filename up to the first `.` (e.g. `Foo.1.0.0.unitypackage` → `Foo`).
fn project_id_from_archive(archive: &Path) -> Option<String> {
    let name = archive.file_name()?.to_str()?;
    let id = name.split('.').next()?;
    (!id.is_empty()).then(|| id.to_string())
}

fn print_report(request: &MaterializeRequest, report: &MaterializeReport) {
    println!(
        "Installed {} into {}",
        request.project_id,
        request.dest_root.display()
    );
    println!("  Copied:      {}", report.files_copied);
    println!("  Up to date:  {}", report.files_up_to_date);
    if report.files_excluded > 0 {
        println!("  Excluded:    {} (use --extra/--merged)", report.files_excluded);
    }
    if report.files_filtered > 0 {
        println!("  Filtered:    {}", report.files_filtered);
    }
    if report.manifest_missing {
        println!(
            "  Warning: archive has no {}.unitypackage.json",
            request.project_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(archive: &str) -> InstallArgs {
        InstallArgs {
            archive: Some(PathBuf::from(archive)),
            github: None,
            range: "*".to_string(),
            source_name: None,
            project: None,
            dest: Some(PathBuf::from("/project")),
            kind: None,
            extra: false,
            merged: true,
            includes: vec![],
            excludes: vec!["$sample$".to_string()],
        }
    }

    #[test]
    fn test_project_id_from_archive() {
        assert_eq!(
            project_id_from_archive(Path::new("/dl/Foo.1.0.0.unitypackage")),
            Some("Foo".to_string())
        );
        assert_eq!(project_id_from_archive(Path::new(".hidden")), None);
    }

    #[test]
    fn test_build_request_infers_kind_and_project() {
        let request = build_request(&args("Foo.zip"), &ConfigFile::default()).unwrap();
        assert_eq!(request.kind, ArchiveKind::Source);
        assert_eq!(request.project_id, "Foo");
        assert_eq!(request.inclusion, InclusionPolicy::new(false, true));
        assert!(!request.filter.is_allow_all());
    }

    #[test]
    fn test_build_request_uses_configured_dest() {
        let mut install = args("Foo.unitypackage");
        install.dest = None;
        let config = ConfigFile {
            dest_dir: Some(PathBuf::from("/configured")),
            ..Default::default()
        };
        let request = build_request(&install, &config).unwrap();
        assert_eq!(request.dest_root, PathBuf::from("/configured"));
    }

    #[test]
    fn test_unknown_extension_requires_kind() {
        let err = build_request(&args("Foo.rar"), &ConfigFile::default()).unwrap_err();
        assert!(matches!(err, CliError::UnknownArchive(_)));

        let mut explicit = args("Foo.rar");
        explicit.kind = Some(KindArg::Unitypackage);
        assert!(build_request(&explicit, &ConfigFile::default()).is_ok());
    }

    fn github_args(range: &str) -> InstallArgs {
        InstallArgs {
            archive: None,
            github: Some("SaladLab/Foo".parse().unwrap()),
            range: range.to_string(),
            project: Some("Foo".to_string()),
            ..args("unused")
        }
    }

    fn cached(temp: &TempDir, name: &str) -> ConfigFile {
        std::fs::write(temp.path().join(name), b"x").unwrap();
        ConfigFile {
            cache_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[test]
    fn test_github_install_uses_highest_cached_release() {
        let temp = TempDir::new().unwrap();
        cached(&temp, "github~SaladLab~Foo~Foo~1.0.0.unitypackage");
        let config = cached(&temp, "github~SaladLab~Foo~Foo~1.3.0.unitypackage");
        cached(&temp, "github~SaladLab~Foo~Foo~2.0.0.unitypackage");

        let request = build_request(&github_args("^1"), &config).unwrap();

        assert_eq!(
            request.archive_path,
            temp.path().join("github~SaladLab~Foo~Foo~1.3.0.unitypackage")
        );
        assert_eq!(request.kind, ArchiveKind::UnityPackage);
        assert_eq!(request.project_id, "Foo");
    }

    #[test]
    fn test_github_install_with_source_name_and_kind() {
        let temp = TempDir::new().unwrap();
        let config = cached(&temp, "github~SaladLab~Foo~Foo-src~0.4.1.zip");

        let mut install = github_args("*");
        install.source_name = Some("Foo-src".to_string());
        install.kind = Some(KindArg::Source);
        let request = build_request(&install, &config).unwrap();

        assert_eq!(request.kind, ArchiveKind::Source);
        assert!(request.archive_path.ends_with("github~SaladLab~Foo~Foo-src~0.4.1.zip"));
    }

    #[test]
    fn test_github_install_without_cached_release() {
        let temp = TempDir::new().unwrap();
        let config = cached(&temp, "github~SaladLab~Foo~Foo~1.0.0.unitypackage");

        let err = build_request(&github_args(">=2"), &config).unwrap_err();
        assert!(matches!(err, CliError::Source(_)));

        let err = build_request(&github_args("not a range"), &config).unwrap_err();
        assert!(matches!(err, CliError::Source(_)));
    }

    #[test]
    fn test_missing_archive_and_repository() {
        let mut install = args("unused");
        install.archive = None;
        let err = build_request(&install, &ConfigFile::default()).unwrap_err();
        assert!(matches!(err, CliError::MissingArchive));
    }
}
