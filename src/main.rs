use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use log::error;
use repcoach::{
    AppConfig, FileSessionWriter, RepCoachError, SessionController,
    pose::{JsonlPoseSource, PoseSource},
    runner::run_session,
    session::Overlay,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count reps from a stream of pose frames, one JSON object per line
    Track {
        /// Frame file, reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Curl, Push-up or Squat
        #[arg(short, long)]
        mode: Option<String>,

        /// Target number of reps
        #[arg(short, long)]
        goal: Option<String>,

        /// Directory sessions are saved to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the configuration to the user config directory
        #[arg(short, long)]
        save: bool,
    },
}

fn track(
    config: AppConfig,
    input: Option<PathBuf>,
    mode: Option<String>,
    goal: Option<String>,
    output: Option<PathBuf>,
    stop: &AtomicBool,
) -> Result<(), RepCoachError> {
    let mode = mode.unwrap_or_else(|| config.default_mode.to_string());
    let goal = goal.unwrap_or_else(|| config.default_goal_reps.to_string());

    let settings = config.session_settings();
    let mut writer = FileSessionWriter::new(
        output.unwrap_or(config.recordings_dir),
        PathBuf::from("."),
    );
    let mut controller =
        SessionController::new(settings).starting_at(writer.next_free_session_no());
    controller.start_session(&mode, &goal, Timestamp::now())?;

    let source: Box<dyn PoseSource> = match input {
        Some(path) => Box::new(JsonlPoseSource::from_path(&path)?),
        None => Box::new(JsonlPoseSource::from_stdin()),
    };

    let mut last_countdown = None;
    let mut last_tip = String::new();
    let summary = run_session(source, &mut controller, &mut writer, stop, |frame| {
        if let Overlay::GetReady { remaining_s } = frame.overlay {
            if last_countdown != Some(remaining_s) {
                println!("Get Ready: {}", remaining_s);
                last_countdown = Some(remaining_s);
            }
        }
        if frame.rep_completed {
            println!("{} ({:.0}%)", frame.reps_label, frame.progress_pct);
        }
        if frame.tip_label != last_tip {
            println!("{}", frame.tip_label);
            last_tip = frame.tip_label.clone();
        }
    })?;

    if summary.goal_reached {
        println!("{} goal reached! Session saved.", controller.mode());
    }
    if let Some(dir) = summary.session_dir {
        println!("Session saved to {}", dir.display());
    }
    Ok(())
}

fn show_config(config: &AppConfig, save: bool) -> Result<(), RepCoachError> {
    let rendered = serde_json::to_string_pretty(config)
        .map_err(|e| RepCoachError::ConfigSerializeError { source: e })?;
    println!("{}", rendered);
    if save {
        let path = config.save()?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        println!("Stopping, saving session...");
        handler_stop.store(true, Ordering::SeqCst);
    })
    .expect("Could not set Ctrl-C handler");

    let config = AppConfig::from_local_file()
        .unwrap_or_else(|e| {
            error!("Could not load config file, using defaults: {}", e);
            None
        })
        .unwrap_or_default();

    let result = match cli.command {
        Commands::Track {
            input,
            mode,
            goal,
            output,
        } => track(config, input, mode, goal, output, &stop),
        Commands::Config { save } => show_config(&config, save),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
