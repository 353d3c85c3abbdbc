// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use ambimix::{
    audio,
    config::{self, catalog},
    mixer::display::LogDisplay,
    presets::Preset,
};
use clap::{crate_version, Parser, Subcommand};

const SYSTEMD_SERVICE: &str = r#"
[Unit]
Description=ambient sound mixer

[Service]
Type=simple
Restart=on-failure
EnvironmentFile=-/etc/default/ambimix
ExecStart=/usr/local/bin/ambimix start "$AMBIMIX_CONFIG"

[Install]
WantedBy=multi-user.target
Alias=ambimix.service
"#;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "An ambient sound mixer."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will start the mixer and read commands from the configured controller.
    Start {
        /// The path to the mixer config.
        config_path: String,
    },
    /// Lists and verifies the sounds and built-in presets in a catalog.
    Sounds {
        /// The path to the catalog.
        catalog_path: String,
    },
    /// Lists the saved presets of a mixer.
    Presets {
        /// The path to the mixer config.
        config_path: String,
        /// Print the presets as catalog YAML instead.
        #[arg(long)]
        yaml: bool,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Prints a systemd service definition to stdout.
    Systemd {},
}

fn preset_display(preset: &Preset) -> String {
    let sounds = preset
        .sounds()
        .iter()
        .map(|(id, volume)| format!("{}={}", id, volume))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({})", preset.name(), sounds)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            let mut controller = config::init_mixer_and_controller(
                &PathBuf::from(config_path),
                Arc::new(LogDisplay {}),
            )?;
            controller.join().await?;
        }
        Commands::Sounds { catalog_path } => {
            let sounds = config::parse_catalog(&PathBuf::from(&catalog_path))?;

            if sounds.is_empty() {
                println!("No sounds found in {}.", catalog_path);
                return Ok(());
            }

            println!("Sounds (count: {}):", sounds.len());
            for sound in sounds.list() {
                let icon = match sound.icon() {
                    Some(icon) => format!(" [{}]", icon),
                    None => String::new(),
                };
                let missing = if sound.file().exists() {
                    ""
                } else {
                    " (missing file)"
                };
                println!("- {}{}{}", sound, icon, missing);
            }

            println!("\nPresets:");
            for (key, preset) in sounds.default_presets() {
                println!("- {}: {}", key, preset_display(preset));
            }
        }
        Commands::Presets { config_path, yaml } => {
            let path = PathBuf::from(config_path);
            let mixer_config = config::mixer::Mixer::deserialize(&path)?;
            let presets = config::open_presets(&mixer_config, &path)?;

            if yaml {
                print!("{}", catalog::export_presets(presets.list())?);
                return Ok(());
            }
            if presets.is_empty() {
                println!("No saved presets.");
                return Ok(());
            }

            println!("Presets (count: {}):", presets.len());
            for preset in presets.list() {
                println!("- {}: {}", preset.id(), preset_display(preset));
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Systemd {} => {
            println!("{}", SYSTEMD_SERVICE);
        }
    }

    Ok(())
}
