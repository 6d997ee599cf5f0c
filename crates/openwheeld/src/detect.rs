//! One-shot interactive device detection (`--detect`).
//!
//! Enumerates input devices, lets the user pick the keyboard and pointer,
//! and rewrites the `[devices]` section of the config in place, leaving all
//! other sections untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use openwheel_engine::input::{enumerate_candidates, DeviceCandidate};

use crate::config::{self, default_file_contents, rewrite_devices_section};

/// Run the interactive flow against the given (or default) config path.
pub fn run(config_path: Option<&Path>) -> Result<()> {
    let candidates = enumerate_candidates();
    if candidates.is_empty() {
        bail!("no input devices found under /dev/input (are you running as root?)");
    }

    println!("Available input devices:");
    for (index, candidate) in candidates.iter().enumerate() {
        println!(
            "  {:2}: {}  [{}]{}{}",
            index + 1,
            candidate.path.display(),
            candidate.name,
            if candidate.keyboard_score.is_some() { "  (keyboard)" } else { "" },
            if candidate.pointer_score.is_some() { "  (pointer)" } else { "" },
        );
    }
    println!();

    let keyboard = pick("keyboard", &candidates)?;
    let pointer = pick("pointer", &candidates)?;

    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config::user_config_path()
            .context("cannot locate user config: $HOME is not set")?,
    };
    let content = fs::read_to_string(&path).unwrap_or_else(|_| default_file_contents());
    let rewritten = rewrite_devices_section(
        &content,
        &keyboard.display().to_string(),
        &pointer.display().to_string(),
    );
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(&path, rewritten).with_context(|| format!("writing {}", path.display()))?;

    println!("Saved device selection to {}", path.display());
    Ok(())
}

fn pick(role: &str, candidates: &[DeviceCandidate]) -> Result<PathBuf> {
    loop {
        print!("Select the {role} (1-{}): ", candidates.len());
        io::stdout().flush().ok();

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            bail!("stdin closed before a {role} was selected");
        }
        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=candidates.len()).contains(&choice) => {
                return Ok(candidates[choice - 1].path.clone());
            }
            _ => println!("Please enter a number between 1 and {}.", candidates.len()),
        }
    }
}
