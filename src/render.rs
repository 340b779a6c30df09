use crate::{
    errors::{FileOperation, IoError},
    substitute::{unresolved_tokens, Substitutor},
    transactions::{Active, RollbackOperation, Transaction},
    utils::{is_safe_segment, to_slash_path},
    variables::VariableMap,
    vfs::{VirtualEntry, VirtualFS},
};
use colored::Colorize;
use kakine::RuleSet;
use miette::Diagnostic;
use std::{
    fs,
    io::Write,
    path::{Component, Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error, Diagnostic)]
pub enum RenderError {
    #[error("Source not found: '{path}'")]
    #[diagnostic(
        code(stencil::render::source_not_found),
        help("Make sure the template path exists and is readable UTF-8 text")
    )]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Write failed: '{}'", .0.path.display())]
    #[diagnostic(code(stencil::render::write_failed))]
    WriteFailed(#[source] IoError),

    #[error("Path collision: '{first}' and '{second}' both render to '{destination}'")]
    #[diagnostic(
        code(stencil::render::path_collision),
        help("Use variable values that keep rendered paths distinct, or ignore one of the entries")
    )]
    PathCollision {
        first: PathBuf,
        second: PathBuf,
        destination: PathBuf,
    },

    #[error("Invalid output path: '{template_path}' renders segment '{segment}'")]
    #[diagnostic(
        code(stencil::render::invalid_output_path),
        help("Substituted path segments must be non-empty and must not be '.', '..' or absolute")
    )]
    InvalidOutputPath {
        template_path: PathBuf,
        segment: String,
    },

    #[error("Invalid ignore rules in '{path}'")]
    #[diagnostic(code(stencil::render::ignore_rules), help("Review ignore file"))]
    IgnoreRules {
        path: PathBuf,
        #[source]
        source: kakine::errors::ParseError,
    },

    #[error("unable to strip prefix from directory")]
    #[diagnostic(code(stencil::render::strip_prefix))]
    StripPrefix {
        path: PathBuf,
        dir: PathBuf,
        source: std::path::StripPrefixError,
    },
}

/// Render one template file into one output file.
#[derive(Debug, Clone)]
pub struct FileRenderRequest {
    pub template: PathBuf,
    pub output: PathBuf,
    pub variables: VariableMap,
    /// Substitute variables in the output path as well as in the content.
    pub transform_file_path: bool,
}

/// Render a template directory tree into an output directory.
#[derive(Debug, Clone)]
pub struct DirectoryRenderRequest {
    pub template: PathBuf,
    pub output: PathBuf,
    pub variables: VariableMap,
    /// gitignore-style file; paths it excludes are neither rendered nor created.
    pub ignore_file: Option<PathBuf>,
    /// Substitute variables in output file and directory names.
    pub transform_file_path: bool,
}

/// What a render wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub files: usize,
    pub directories: usize,
}

/// Substitutes every normal component of `path`. Root, prefix and `.`/`..` components are
/// kept as they are.
fn render_path_segments(path: &Path, substitutor: &Substitutor) -> Result<PathBuf, RenderError> {
    let mut result = PathBuf::new();

    for component in path.components() {
        let Component::Normal(segment) = component else {
            result.push(component.as_os_str());
            continue;
        };

        let rendered = substitutor.substitute(&segment.to_string_lossy());

        if !is_safe_segment(&rendered) {
            return Err(RenderError::InvalidOutputPath {
                template_path: path.to_path_buf(),
                segment: rendered,
            });
        }

        result.push(rendered);
    }

    Ok(result)
}

fn report_unresolved(path: &Path, rendered: &str) {
    let names = unresolved_tokens(rendered);

    if !names.is_empty() {
        log::debug!(
            "'{}' still contains unresolved token(s): {}",
            path.display(),
            names.join(", ")
        );
    }
}

/// Reads a template file and returns its substituted contents and permissions.
fn render_contents(
    path: &Path,
    substitutor: &Substitutor,
) -> Result<(String, fs::Permissions), RenderError> {
    let source_not_found = |error| RenderError::SourceNotFound {
        path: path.to_path_buf(),
        source: Some(error),
    };

    let permissions = fs::metadata(path).map_err(source_not_found)?.permissions();
    let contents = fs::read_to_string(path).map_err(source_not_found)?;

    let rendered = substitutor.substitute(&contents);
    report_unresolved(path, &rendered);

    Ok((rendered, permissions))
}

/// Loads the ignore file of a directory render. No file means no rules.
pub fn load_ignore_rules(path: Option<&Path>) -> Result<RuleSet, RenderError> {
    let Some(path) = path else {
        return Ok(RuleSet::new());
    };

    let content = fs::read_to_string(path).map_err(|error| RenderError::SourceNotFound {
        path: path.to_path_buf(),
        source: Some(error),
    })?;

    let rules = RuleSet::parse(&content).map_err(|error| RenderError::IgnoreRules {
        path: path.to_path_buf(),
        source: error,
    })?;

    log::debug!(
        "Loaded {} ignore rule(s) from '{}'",
        rules.len(),
        path.display()
    );

    Ok(rules)
}

/// Walks `template_root` depth-first in file-name order and stages every entry that is not
/// ignored into a [`VirtualFS`]. Ignored directories are not descended into.
///
/// Nothing is written; a failing read aborts the whole plan.
pub fn plan_directory(
    template_root: &Path,
    variables: &VariableMap,
    rules: &RuleSet,
    transform_file_path: bool,
) -> Result<VirtualFS, RenderError> {
    if !template_root.is_dir() {
        return Err(RenderError::SourceNotFound {
            path: template_root.to_path_buf(),
            source: None,
        });
    }

    let substitutor = Substitutor::new(variables);
    let mut vfs = VirtualFS::new();

    let mut walker = WalkDir::new(template_root)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(e) => e,
            Err(error) => {
                let path = error.path().unwrap_or(template_root).to_path_buf();

                return Err(RenderError::SourceNotFound {
                    path,
                    source: Some(error.into()),
                });
            }
        };

        let full_path = entry.path();
        let relative = match full_path.strip_prefix(template_root) {
            Ok(r) => r.to_path_buf(),
            Err(error) => Err(RenderError::StripPrefix {
                path: full_path.to_path_buf(),
                dir: template_root.to_path_buf(),
                source: error,
            })?,
        };

        let is_dir = entry.file_type().is_dir();

        let deciding_rule = rules.deciding_rule(&to_slash_path(&relative), is_dir);

        if let Some(rule) = deciding_rule.filter(|rule| !rule.negated) {
            log::debug!("ignoring {} (rule '{}')", relative.display(), rule.source);
            if is_dir {
                walker.skip_current_dir();
            }
            continue;
        }

        let destination = if transform_file_path {
            render_path_segments(&relative, &substitutor)?
        } else {
            relative.clone()
        };

        if is_dir {
            vfs.push(VirtualEntry::directory(relative, destination));
        } else {
            let (contents, permissions) = render_contents(full_path, &substitutor)?;

            let mut file = VirtualEntry::file(relative, destination, contents);
            file.permissions = Some(permissions);
            vfs.push(file);
        }
    }

    if let Some((first, second)) = vfs.find_collision() {
        return Err(RenderError::PathCollision {
            first: first.source.clone(),
            second: second.source.clone(),
            destination: second.destination.clone(),
        });
    }

    Ok(vfs)
}

/// Writes a staged [`VirtualFS`] below `destination_root`, directories first.
fn apply_vfs(
    vfs: &VirtualFS,
    destination_root: &Path,
    trx: &mut Transaction<Active>,
) -> Result<RenderSummary, RenderError> {
    let mut summary = RenderSummary::default();

    create_directory(trx, destination_root)?;

    for entry in vfs.distinct_directories() {
        create_directory(trx, &destination_root.join(&entry.destination))?;
        summary.directories += 1;
    }

    for entry in vfs.files() {
        let contents = entry.content.as_deref().unwrap_or_default();

        write_file(
            trx,
            &destination_root.join(&entry.destination),
            contents,
            entry.permissions.clone(),
        )?;
        summary.files += 1;
    }

    Ok(summary)
}

/// Renders a single template file.
///
/// # Errors
///
/// - [`RenderError::SourceNotFound`] if the template cannot be read; nothing is written.
/// - [`RenderError::InvalidOutputPath`] if a transformed path segment is not usable.
/// - [`RenderError::WriteFailed`] if the output cannot be written; any directory created
///   for it is removed again.
pub fn render_file(request: &FileRenderRequest) -> Result<RenderSummary, RenderError> {
    log::info!(
        "Rendering file '{}' into '{}'",
        request.template.display(),
        request.output.display()
    );

    let substitutor = Substitutor::new(&request.variables);

    let (contents, permissions) = render_contents(&request.template, &substitutor)?;

    let destination = if request.transform_file_path {
        render_path_segments(&request.output, &substitutor)?
    } else {
        request.output.clone()
    };

    let mut trx = Transaction::<Active>::new();

    write_file(&mut trx, &destination, &contents, Some(permissions))?;

    trx.commit();

    Ok(RenderSummary {
        files: 1,
        directories: 0,
    })
}

/// Renders a whole template tree.
///
/// The tree is staged completely before the first write, so unreadable sources, invalid
/// ignore rules and path collisions leave the output untouched. A write failure rolls
/// back everything this render created or overwrote.
///
/// # Errors
///
/// - [`RenderError::SourceNotFound`] if the template root, the ignore file or any template
///   file cannot be read.
/// - [`RenderError::IgnoreRules`] if the ignore file has an invalid pattern.
/// - [`RenderError::PathCollision`] if two entries render to the same output path.
/// - [`RenderError::InvalidOutputPath`] if a transformed path segment is not usable.
/// - [`RenderError::WriteFailed`] if a directory or file cannot be written.
pub fn render_directory(request: &DirectoryRenderRequest) -> Result<RenderSummary, RenderError> {
    log::info!(
        "Rendering directory '{}' into '{}'",
        request.template.display(),
        request.output.display()
    );

    let rules = load_ignore_rules(request.ignore_file.as_deref())?;

    let vfs = plan_directory(
        &request.template,
        &request.variables,
        &rules,
        request.transform_file_path,
    )?;

    let mut trx = Transaction::<Active>::new();

    let summary = apply_vfs(&vfs, &request.output, &mut trx)?;

    trx.commit();

    log::info!(
        "Rendered {} file(s) and {} directories",
        summary.files,
        summary.directories
    );

    Ok(summary)
}

/// Creates all missing directories of `path` and registers each one it created for
/// rollback, outermost first so rollback removes the innermost first.
fn create_directory(trx: &mut Transaction<Active>, path: &Path) -> Result<(), RenderError> {
    let missing: Vec<PathBuf> = path
        .ancestors()
        .take_while(|p| !p.as_os_str().is_empty() && !p.exists())
        .map(Path::to_path_buf)
        .collect();

    if missing.is_empty() {
        if path.exists() && !path.is_dir() {
            let error = std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "path exists and is not a directory",
            );
            return Err(RenderError::WriteFailed(IoError::new(
                FileOperation::Mkdir,
                path.into(),
                error,
            )));
        }

        return Ok(());
    }

    fs::create_dir_all(path).map_err(|error| {
        RenderError::WriteFailed(IoError::new(FileOperation::Mkdir, path.into(), error))
    })?;

    for dir in missing.into_iter().rev() {
        trx.add_operation(RollbackOperation::RemoveDir(dir));
    }

    Ok(())
}

/// Writes `contents` to `path` through a temporary file in the same directory that is then
/// renamed into place, so a failed write never leaves a half-written file behind.
///
/// The previous contents of an overwritten file are kept on the [`Transaction`] so a
/// rollback can put them back.
fn write_file(
    trx: &mut Transaction<Active>,
    path: &Path,
    contents: &str,
    permissions: Option<fs::Permissions>,
) -> Result<(), RenderError> {
    let write_failed = |operation, error| {
        RenderError::WriteFailed(IoError::new(operation, path.to_path_buf(), error))
    };

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    create_directory(trx, parent)?;

    let previous = if path.is_file() {
        let contents = fs::read(path).map_err(|error| write_failed(FileOperation::Read, error))?;
        let permissions = fs::metadata(path)
            .map_err(|error| write_failed(FileOperation::Read, error))?
            .permissions();
        Some((contents, permissions))
    } else {
        None
    };

    let mut staged = tempfile::NamedTempFile::new_in(parent)
        .map_err(|error| write_failed(FileOperation::Write, error))?;

    staged
        .write_all(contents.as_bytes())
        .map_err(|error| write_failed(FileOperation::Write, error))?;

    if let Some(permissions) = permissions {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|error| write_failed(FileOperation::Write, error))?;
    }

    staged
        .persist(path)
        .map_err(|error| write_failed(FileOperation::Write, error.error))?;

    let label = match previous {
        Some((contents, permissions)) => {
            trx.add_operation(RollbackOperation::RestoreFile {
                path: path.to_path_buf(),
                contents,
                permissions,
            });
            "overwrite".yellow()
        }
        None => {
            trx.add_operation(RollbackOperation::RemoveFile(path.to_path_buf()));
            "create".green()
        }
    };

    println!("{} {}", label, path.display());

    Ok(())
}
