//! Command dispatch and handlers

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::DrawSummary;
use crate::application::IoResultExt;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Complexity, RoutingReport, TreeConvert};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::svg::SvgCanvas;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| InfraError::io("print help", e))?;
        return Ok(());
    };

    match command {
        Commands::Draw {
            complexity,
            output,
            stdout,
            input,
        } => {
            cmd_draw(
                cli,
                complexity.as_deref(),
                output.as_deref(),
                *stdout,
                input.as_deref(),
            )
            .await
        }
        Commands::Tree { complexity, input } => {
            cmd_tree(cli, complexity.as_deref(), input.as_deref()).await
        }
        Commands::Routing { complexity } => cmd_routing(cli, complexity).await,
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

fn project_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.project_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = project_dir(cli)?;
    let settings = Settings::load(Some(dir.as_path()))?;
    Ok(settings.with_cli_overrides(cli.profile, cli.base_url.clone()))
}

fn build_container(cli: &Cli, input: Option<&Path>) -> CliResult<ServiceContainer> {
    let settings = load_settings(cli)?;
    match input {
        Some(path) => Ok(ServiceContainer::from_file(settings, path)),
        None => Ok(ServiceContainer::new(settings)?),
    }
}

/// Complexity from the argument, or derived from the input file name.
fn resolve_complexity(raw: Option<&str>, input: Option<&Path>) -> CliResult<Complexity> {
    match (raw, input) {
        (Some(raw), _) => Ok(Complexity::parse(raw)?),
        (None, Some(path)) => {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(Complexity::parse(&stem).or_else(|_| Complexity::parse("file"))?)
        }
        (None, None) => Err(CliError::Usage("a complexity is required".to_string())),
    }
}

#[instrument(level = "debug", skip(cli))]
async fn cmd_draw(
    cli: &Cli,
    complexity: Option<&str>,
    output: Option<&Path>,
    to_stdout: bool,
    input: Option<&Path>,
) -> CliResult<()> {
    let complexity = resolve_complexity(complexity, input)?;
    let container = build_container(cli, input)?;
    let renderer = container.renderer();

    let mut canvas = SvgCanvas::new();
    let result = renderer.draw(&complexity, &mut canvas).await;
    let svg = canvas.to_svg();

    // The surface holds the error message on failure; it is written either way.
    if to_stdout {
        output::info(&svg.trim_end());
    } else {
        let path = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| container.settings.output.clone());
        debug!("writing {}", path.display());
        container
            .fs
            .ensure_parent(&path)
            .with_path_context("create output directory", &path)?;
        container
            .fs
            .write(&path, &svg)
            .with_path_context("write diagram", &path)?;
        if let Ok(summary) = &result {
            output::success(&format!("{} ({})", path.display(), describe(summary)));
        }
    }

    result?;
    Ok(())
}

fn describe(summary: &DrawSummary) -> String {
    format!(
        "{} nodes, {} links, depth {}",
        summary.nodes, summary.links, summary.depth
    )
}

#[instrument(level = "debug", skip(cli))]
async fn cmd_tree(cli: &Cli, complexity: Option<&str>, input: Option<&Path>) -> CliResult<()> {
    let complexity = resolve_complexity(complexity, input)?;
    let container = build_container(cli, input)?;
    let arena = container.bom_service().fetch_hierarchy(&complexity).await?;
    output::info(&arena.to_tree_string());
    Ok(())
}

#[instrument(level = "debug", skip(cli))]
async fn cmd_routing(cli: &Cli, complexity: &str) -> CliResult<()> {
    let complexity = Complexity::parse(complexity)?;
    let container = build_container(cli, None)?;
    let report = container.routing_service().fetch(&complexity).await?;
    output::header(&format!("Routing for {}", report.routing_data.item_no));
    output::info(&format_routing_table(&report));
    Ok(())
}

/// Render a routing report as an aligned text table.
pub fn format_routing_table(report: &RoutingReport) -> String {
    let mut header = vec![
        "Level".to_string(),
        "Item".to_string(),
        "Description".to_string(),
        "Type".to_string(),
    ];
    header.extend(report.work_centers.iter().map(|wc| wc.wc_no.clone()));
    header.push("Total".to_string());

    let mut lines: Vec<Vec<String>> = vec![header];
    for row in report.rows() {
        let mut line = vec![
            row.level.to_string(),
            format!("{}{}", "  ".repeat(row.level as usize), row.item_no),
            row.description,
            row.item_type,
        ];
        line.extend(row.minutes.iter().map(u32::to_string));
        line.push(row.total_time.to_string());
        lines.push(line);
    }

    let columns = lines[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            lines
                .iter()
                .map(|line| line[col].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut table = lines
        .iter()
        .map(|line| {
            line.iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, width))| {
                    // text columns left aligned, numbers right aligned
                    if (1..=3).contains(&col) {
                        format!("{:<width$}", cell, width = width)
                    } else {
                        format!("{:>width$}", cell, width = width)
                    }
                })
                .join("  ")
                .trim_end()
                .to_string()
        })
        .join("\n");

    if !report.work_centers.is_empty() {
        let legend = report
            .work_centers
            .iter()
            .map(|wc| format!("{} = {}", wc.wc_no, wc.name))
            .join(", ");
        table.push_str(&format!("\n\nWork centers: {}", legend));
    }
    table.push_str(&format!("\nTotal minutes: {}", report.total_minutes()));
    table
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let dir = project_dir(cli)?;
            match global_config_path() {
                Some(path) => output::action("global", &mark_exists(&path)),
                None => output::action("global", &"(no config directory)"),
            }
            output::action("local", &mark_exists(&local_config_path(&dir)));
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                local_config_path(&project_dir(cli)?)
            };
            write_config_template(&RealFileSystem, &path, *force)?;
            output::success(&format!("Created {}", path.display()));
            Ok(())
        }
    }
}

fn write_config_template(fs: &dyn FileSystem, path: &Path, force: bool) -> CliResult<()> {
    if fs.exists(path) && !force {
        return Err(CliError::Usage(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    fs.ensure_parent(path)
        .with_path_context("create config directory", path)?;
    fs.write(path, &Settings::template())
        .with_path_context("write config template", path)?;
    Ok(())
}

fn mark_exists(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found)", path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RoutingNode, WorkCenter};
    use crate::exitcode;
    use std::collections::BTreeMap;

    /// Filesystem whose writes always fail.
    struct ReadOnlyFileSystem;

    impl FileSystem for ReadOnlyFileSystem {
        fn write(&self, _path: &Path, _content: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn ensure_parent(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    fn report() -> RoutingReport {
        let part = RoutingNode {
            item_no: "P0001".to_string(),
            description: "Bolt".to_string(),
            item_type: "P".to_string(),
            level: 1,
            work_centers: BTreeMap::from([("WC02".to_string(), 5)]),
            total_time: 5,
            children: vec![],
        };
        RoutingReport {
            work_centers: vec![
                WorkCenter { wc_no: "WC01".to_string(), name: "Assembly".to_string() },
                WorkCenter { wc_no: "WC02".to_string(), name: "Machining".to_string() },
            ],
            routing_data: RoutingNode {
                item_no: "A0001".to_string(),
                description: "Frame".to_string(),
                item_type: "A".to_string(),
                level: 0,
                work_centers: BTreeMap::from([("WC01".to_string(), 30)]),
                total_time: 30,
                children: vec![part],
            },
        }
    }

    #[test]
    fn given_report_when_formatting_then_one_line_per_item_plus_header() {
        let table = format_routing_table(&report());
        let lines: Vec<&str> = table.lines().collect();

        assert!(lines[0].starts_with("Level  Item"));
        assert!(lines[0].ends_with("WC01  WC02  Total"));
        assert!(lines[1].contains("A0001"));
        assert!(lines[2].contains("  P0001"));
        assert!(lines[2].ends_with("   0     5      5"));
        assert!(table.contains("WC01 = Assembly, WC02 = Machining"));
        assert!(table.ends_with("Total minutes: 35"));
    }

    #[test]
    fn given_input_file_without_complexity_then_uses_file_stem() {
        let c = resolve_complexity(None, Some(Path::new("/tmp/complex.json"))).unwrap();
        assert_eq!(c.as_str(), "complex");
    }

    #[test]
    fn given_no_complexity_and_no_input_then_usage_error() {
        let err = resolve_complexity(None, None).unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }

    #[test]
    fn given_unwritable_config_path_when_init_then_io_error_names_path() {
        let path = Path::new("/ro/.bomviz.toml");

        let err = write_config_template(&ReadOnlyFileSystem, path, false).unwrap_err();

        assert_eq!(err.exit_code(), exitcode::IOERR);
        assert!(err.to_string().contains("write config template: /ro/.bomviz.toml"), "{err}");
    }
}
