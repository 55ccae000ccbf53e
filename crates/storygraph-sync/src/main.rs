use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use storygraph_sync::{GraphEditor, SyncState};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Command::new("storygraph")
        .version(storygraph_sync::VERSION)
        .about("Story graph synchronization engine")
        .arg_required_else_help(true)
        .arg(
            Arg::new("project")
                .long("project")
                .default_value(".")
                .help("Project root directory"),
        )
        .subcommand(
            Command::new("check")
                .about("Parse the project's scripts and report problems")
                .arg(
                    Arg::new("scripts")
                        .long("scripts")
                        .default_value("scripts")
                        .help("Scripts directory, relative to the project root"),
                ),
        )
        .subcommand(
            Command::new("layout")
                .about("Recompute node positions and save the layout file"),
        )
        .subcommand(
            Command::new("sync")
                .about("Push every node's dialogue into its script file")
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Suppress per-item progress output"),
                ),
        )
        .subcommand(
            Command::new("rebuild")
                .about("Rebuild the graph and layout file from the scripts")
                .arg(
                    Arg::new("scripts")
                        .long("scripts")
                        .default_value("scripts")
                        .help("Scripts directory, relative to the project root"),
                ),
        );

    let matches = cli.get_matches();
    let project = PathBuf::from(matches.get_one::<String>("project").unwrap());

    match matches.subcommand() {
        Some(("check", args)) => {
            let scripts = project.join(args.get_one::<String>("scripts").unwrap());
            let editor = GraphEditor::new(&project);
            let plan = editor.plan_rebuild_from_scripts(&scripts);

            println!("Scenes: {}", plan.nodes.len());
            println!("Connections: {}", plan.edges.len());
            match &plan.entry {
                Some(entry) => println!("Entry: {}", entry),
                None => println!("Entry: (none)"),
            }
            if plan.issues.is_empty() {
                println!("No problems found");
            } else {
                println!("Problems:");
                for issue in &plan.issues {
                    println!("  {}", issue);
                }
            }
            std::process::exit(if plan.issues.is_empty() { 0 } else { 1 });
        }
        Some(("layout", _)) => {
            let mut editor = GraphEditor::new(&project);
            report_load(&mut editor);

            if let Err(e) = editor.run_auto_layout() {
                eprintln!("Layout failed: {}", e);
                std::process::exit(1);
            }
            println!("Positioned {} nodes", editor.model().node_count());
        }
        Some(("sync", args)) => {
            let quiet = args.get_flag("quiet");
            let mut editor = GraphEditor::new(&project);
            report_load(&mut editor);

            let (tx, mut rx) = mpsc::unbounded_channel();
            let handle = match editor.start_sync_to_scripts(tx) {
                Ok(handle) => handle,
                Err(e) => {
                    eprintln!("Sync failed to start: {}", e);
                    std::process::exit(1);
                }
            };

            while let Some(progress) = rx.recv().await {
                if !quiet {
                    println!("  {}/{}", progress.completed, progress.total);
                }
            }

            match handle.await {
                Ok(report) => {
                    println!("Synced: {}", report.synced);
                    println!("Skipped: {}", report.skipped);
                    for error in &report.errors {
                        println!("  {}", error);
                    }
                    std::process::exit(if report.state == SyncState::Completed { 0 } else { 1 });
                }
                Err(e) => {
                    eprintln!("Sync worker failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(("rebuild", args)) => {
            let scripts = project.join(args.get_one::<String>("scripts").unwrap());
            let mut editor = GraphEditor::new(&project);

            let plan = editor.plan_rebuild_from_scripts(&scripts);
            match editor.apply_rebuild(&plan) {
                Ok(issues) => {
                    println!("Rebuilt {} nodes", editor.model().node_count());
                    for issue in &issues {
                        println!("  {}", issue);
                    }
                }
                Err(e) => {
                    eprintln!("Rebuild failed: {}", e);
                    std::process::exit(1);
                }
            }
        }
        _ => {}
    }
}

fn report_load(editor: &mut GraphEditor) {
    match editor.load() {
        Ok(issues) => {
            for issue in &issues {
                println!("  {}", issue);
            }
        }
        Err(e) => {
            eprintln!("Failed to load layout: {}", e);
            std::process::exit(1);
        }
    }
}
