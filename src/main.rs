//! Terminal front end: one command per line, rendered after every action.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use habit_tagger::config::DEFAULT_CONFIG_FILE;
use habit_tagger::data::FileDecoder;
use habit_tagger::keybindings::{Action, KeyBindings};
use habit_tagger::state::CurrentImage;
use habit_tagger::{AppConfig, CsvStore, FolderOutcome, ImageView, Session};

/// Tag the Habit: keyboard-driven single-label image annotation.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (classes, store file, display sizes)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Image folder to open at startup
    folder: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match AppConfig::load_from_path(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\nCONFIGURATION ERROR\n{}\n", e);
            return ExitCode::FAILURE;
        }
    };

    // The store path is relative to the folder holding the config file.
    let base = args
        .config
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let store = CsvStore::new(config.annotations_path(base));
    println!("Saving path: {}", store.path().display());

    let mut session = match Session::open(config, store, FileDecoder) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("\nANNOTATION STORE ERROR\n{}\n", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(folder) = &args.folder {
        open_folder(&mut session, folder);
    }

    match run(&mut session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Application error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(session: &mut Session<FileDecoder>) -> io::Result<()> {
    let bindings = KeyBindings::new(session.config().class_count());
    print_help(session, &bindings);
    render(session);

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let Some(action) = bindings.parse(&line) else {
            if !line.trim().is_empty() {
                println!("Unknown command, '{}' for help", bindings.help);
            }
            continue;
        };

        match action {
            Action::Quit => break,
            Action::Help => {
                print_help(session, &bindings);
                continue;
            }
            Action::OpenFolder(folder) => open_folder(session, &folder),
            Action::Save => match session.save() {
                Ok(()) => println!("Saved {}", session.store().path().display()),
                Err(e) => println!("Error: {}", e),
            },
            _ if session.is_empty() => println!("No images loaded"),
            Action::SelectClass(index) => report(session.select_class(index).map(drop)),
            Action::Next => report(session.next().map(drop)),
            Action::Previous => report(session.previous().map(drop)),
        }
        render(session);
    }

    if session.is_dirty() {
        log::warn!("Exiting with unsaved annotations");
    }
    Ok(())
}

fn open_folder(session: &mut Session<FileDecoder>, folder: &Path) {
    match session.open_folder(folder) {
        Ok(FolderOutcome::Loaded { count }) => {
            let shown = session.image_set().map_or(folder, |set| set.folder());
            println!("Opened {} images from {}", count, shown.display());
        }
        Ok(FolderOutcome::NoImages) => println!("Warning: No images found in this folder"),
        Err(e) => println!("Error: {}", e),
    }
}

fn report(result: Result<(), habit_tagger::SessionError>) {
    if let Err(e) = result {
        println!("Error: {}", e);
    }
}

fn print_help(session: &Session<FileDecoder>, bindings: &KeyBindings) {
    println!("Classes:");
    for (i, name) in session.config().classes().iter().enumerate() {
        if let Some(key) = bindings.key_for_class_index(i) {
            println!("  {}. {}", key, name);
        }
    }
    println!("Keyboard shortcuts:");
    for line in bindings.help_lines() {
        println!("  {}", line);
    }
}

fn render(session: &Session<FileDecoder>) {
    match session.current_view() {
        Some(view) => render_view(session, &view),
        None => println!("No images loaded"),
    }

    let stats: Vec<String> = session
        .labeled_statistics()
        .into_iter()
        .map(|(name, count)| format!("{}: {}", name, count))
        .collect();
    println!("Statistics: {}", stats.join(", "));
}

fn render_view(session: &Session<FileDecoder>, view: &ImageView<'_>) {
    println!();
    println!("{}", view.progress);
    println!("{}", view.caption());

    if let CurrentImage::Decoded(img) = view.image {
        match img.original.placeholder() {
            Some(text) => println!("[Original Size] {}", text.replace('\n', " ")),
            None => println!("[Original Size] shown natively"),
        }
        println!(
            "[Longest side = {}px] {:?}",
            session.config().resized_image_size(),
            img.preview.mode
        );
    }

    let selection = view
        .selection
        .and_then(|i| session.config().class_name(i).map(|name| (i, name)));
    match selection {
        Some((i, name)) => println!("Class: {}. {}", i + 1, name),
        None => println!("Class: (none)"),
    }
}
