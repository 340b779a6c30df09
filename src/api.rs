use crate::{
    preview::preview_as_tree,
    render::{self, DirectoryRenderRequest, FileRenderRequest, RenderSummary},
    variables::{self, VariableMap},
};
use std::path::Path;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum StencilError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Variables(#[from] variables::VariablesError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Render(#[from] render::RenderError),
}

/// Renders a single template file to `output` using the variables stored in `variables`.
///
/// # Errors
///
/// Returns a [`StencilError`] if:
///
/// - The variables file is missing or is not a flat map of strings.
/// - The template file cannot be read.
/// - A transformed output path is not usable.
/// - The output file or one of its parent directories cannot be written.
pub fn render_template_file(
    template: &Path,
    output: &Path,
    variables: &Path,
    transform_file_path: bool,
) -> Result<RenderSummary, StencilError> {
    let variables = VariableMap::from_file(variables)?;

    let request = FileRenderRequest {
        template: template.to_path_buf(),
        output: output.to_path_buf(),
        variables,
        transform_file_path,
    };

    Ok(render::render_file(&request)?)
}

/// Renders every file and directory below `template` into `output`, skipping whatever
/// `gitignore` excludes. With `dry_run` the result is only printed as a tree.
///
/// # Errors
///
/// Returns a [`StencilError`] if:
///
/// - The variables file is missing or is not a flat map of strings.
/// - The template directory, the ignore file or a template file cannot be read.
/// - The ignore file contains an invalid pattern.
/// - Two template entries render to the same output path.
/// - A directory or file cannot be written. Everything written so far is rolled back.
pub fn render_template_directory(
    template: &Path,
    output: &Path,
    variables: &Path,
    gitignore: Option<&Path>,
    transform_file_path: bool,
    dry_run: bool,
) -> Result<RenderSummary, StencilError> {
    let variables = VariableMap::from_file(variables)?;

    if dry_run {
        log::debug!("dry run, nothing will be written");

        let rules = render::load_ignore_rules(gitignore)?;
        let vfs = render::plan_directory(template, &variables, &rules, transform_file_path)?;

        preview_as_tree(&vfs, output);

        return Ok(RenderSummary {
            files: vfs.files().count(),
            directories: vfs.distinct_directories().len(),
        });
    }

    let request = DirectoryRenderRequest {
        template: template.to_path_buf(),
        output: output.to_path_buf(),
        variables,
        ignore_file: gitignore.map(Path::to_path_buf),
        transform_file_path,
    };

    Ok(render::render_directory(&request)?)
}
