//! Rubik's Cube
//!
//! Interactive N×N×N cube: drag to orbit the cube or turn a face, use the
//! keyboard for preset orbits, face turns, size and theme changes.

mod visualization;

use clap::{Parser, Subcommand};

use rubiks::config::DEFAULT_DURATION;
use rubiks::grid::{format_positions, generate_positions, CubeSize};
use rubiks::{ColorParseError, CubeConfig, MembershipPolicy, Session, Theme};

/// Renders an interactive Rubik's cube of any size.
#[derive(Parser)]
#[command(name = "rubiks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Cube size (N for an NxNxN cube).
    #[arg(short, long, default_value_t = 3, global = true)]
    size: usize,

    /// Duration of face turns and preset orbits, in milliseconds.
    #[arg(short, long, default_value_t = DEFAULT_DURATION, global = true)]
    duration: f32,

    /// Keep face membership fixed at generation instead of following moved pieces.
    #[arg(long, global = true)]
    frozen_membership: bool,

    /// Theme override such as `F=#00ff00` (keys P, L, R, D, U, B, F). Repeatable.
    #[arg(short, long = "color", value_name = "KEY=HEX", global = true)]
    colors: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the interactive 3D viewer.
    Display,
    /// Print the generated piece positions for the chosen size.
    Positions,
}

impl Cli {
    fn config(&self) -> Result<CubeConfig, ColorParseError> {
        let mut theme = Theme::default();
        for entry in &self.colors {
            theme.apply_entry(entry)?;
        }
        Ok(CubeConfig {
            size: self.size,
            turn_duration: self.duration,
            orbit_duration: self.duration,
            membership: if self.frozen_membership {
                MembershipPolicy::Frozen
            } else {
                MembershipPolicy::Retag
            },
            theme,
        })
    }
}

fn main() {
    env_logger::builder().format_timestamp(None).init();
    let cli = Cli::parse();

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid color: {}", e);
            std::process::exit(2);
        }
    };

    match cli.command {
        Some(Command::Positions) => run_positions(config.size),
        Some(Command::Display) | None => run_display(config),
    }
}

/// Opens the viewer for the configured cube.
fn run_display(config: CubeConfig) {
    match Session::new(config) {
        Ok(session) => {
            println!("Controls: drag to orbit or turn a face, arrows orbit, F/B/U/D/L/R turn (Shift reverses), 2-5 size, T theme, right click paints a sticker, C picks the paint color");
            visualization::display(session);
        }
        Err(e) => eprintln!("Failed to create cube: {}", e),
    }
}

/// Prints the grid of generated positions with face counts.
fn run_positions(size: usize) {
    match CubeSize::new(size) {
        Ok(size) => {
            let positions = generate_positions(size);
            let surface = positions.iter().filter(|p| !p.faces.is_empty()).count();
            println!("{} cells, {} on the surface", positions.len(), surface);
            print!("{}", format_positions(&positions, size));
        }
        Err(e) => eprintln!("{}", e),
    }
}
