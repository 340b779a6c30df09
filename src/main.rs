use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use std::path::PathBuf;

fn transform_file_path_arg() -> Arg {
    Arg::new("transform-file-path")
        .long("transform-file-path")
        .alias("transformFilePath")
        .help("Apply variables to output file and directory names as well")
        .action(ArgAction::SetTrue)
}

fn path_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("dir")
                .about("Recursively render template content starting in a directory")
                .arg(path_arg("template", "The directory of the template content"))
                .arg(path_arg(
                    "output",
                    "The directory where the rendered content should be placed",
                ))
                .arg(path_arg(
                    "variables",
                    "A JSON (or .toml) file with a flat object of template variables",
                ))
                .arg(
                    Arg::new("gitignore")
                        .long("gitignore")
                        .value_name("FILE")
                        .help("A gitignore-style file filtering out template content")
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(transform_file_path_arg())
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Print what would be rendered without writing anything")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("file")
                .about("Render a single template file")
                .arg(path_arg("template", "The template file"))
                .arg(path_arg(
                    "output",
                    "The file path where the rendered content should be placed",
                ))
                .arg(path_arg(
                    "variables",
                    "A JSON (or .toml) file with a flat object of template variables",
                ))
                .arg(transform_file_path_arg()),
        )
        .get_matches();

    let is_verbose = matches.get_flag("verbose");

    init_logger(is_verbose);

    match matches.subcommand() {
        Some(("dir", args)) => handle_dir(args)?,
        Some(("file", args)) => handle_file(args)?,
        _ => unreachable!(),
    }

    Ok(())
}

fn init_logger(is_verbose: bool) {
    let level = if is_verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    // RUST_LOG still wins over the flag
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn handle_dir(args: &ArgMatches) -> Result<(), stencil::StencilError> {
    let template = args
        .get_one::<PathBuf>("template")
        .expect("template required");
    let output = args.get_one::<PathBuf>("output").expect("output required");
    let variables = args
        .get_one::<PathBuf>("variables")
        .expect("variables required");
    let gitignore = args.get_one::<PathBuf>("gitignore");

    let summary = stencil::api::render_template_directory(
        template,
        output,
        variables,
        gitignore.map(PathBuf::as_path),
        args.get_flag("transform-file-path"),
        args.get_flag("dry-run"),
    )?;

    log::debug!(
        "{} file(s), {} directories",
        summary.files,
        summary.directories
    );

    Ok(())
}

fn handle_file(args: &ArgMatches) -> Result<(), stencil::StencilError> {
    let template = args
        .get_one::<PathBuf>("template")
        .expect("template required");
    let output = args.get_one::<PathBuf>("output").expect("output required");
    let variables = args
        .get_one::<PathBuf>("variables")
        .expect("variables required");

    stencil::api::render_template_file(
        template,
        output,
        variables,
        args.get_flag("transform-file-path"),
    )?;

    Ok(())
}
