//! Subcommand handlers
//!
//! Every handler opens the session from the state directory, performs one
//! operation, and prints a short report. Snapshot writes happen inside the
//! controller as each change is committed.

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use hotbar_core::prelude::*;
use hotbar_core::SessionState;
use hotbar_history::FileStore;
use hotbar_render::GridRenderer;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_STATE_DIR: &str = ".hotbar";

/// Dispatch the parsed command line
pub(crate) async fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let (name, args) = matches
        .subcommand()
        .context("no subcommand given; see `hotbar --help`")?;

    let controller = open_session(matches)?;
    match name {
        "palette" => palette(&controller, out),
        "show" => show(&controller, out),
        "add" => {
            let color = color_arg(args, "color")?;
            controller.dispatch(Action::AddColor(color.clone()))?;
            writeln!(out, "added {color}")?;
            show_slots(&controller.snapshot(), out)
        }
        "set" => {
            let index = slot_arg(args)?;
            let color = match args.get_one::<String>("color").map(String::as_str) {
                Some("-") | None => None,
                Some(name) => Some(ColorId::from(name.trim())),
            };
            controller.dispatch(Action::SetSlotColor { index, color })?;
            if let Some(weight) = args.get_one::<u32>("weight").copied() {
                controller.dispatch(Action::SetSlotWeight { index, weight })?;
            }
            show_slots(&controller.snapshot(), out)
        }
        "weight" => {
            let index = slot_arg(args)?;
            let weight = args.get_one::<u32>("weight").copied().context("missing weight")?;
            controller.dispatch(Action::SetSlotWeight { index, weight })?;
            show_slots(&controller.snapshot(), out)
        }
        "clear" => {
            if args.contains_id("slot") {
                controller.dispatch(Action::ClearSlot(slot_arg(args)?))?;
            } else {
                controller.dispatch(Action::ClearAll)?;
            }
            show_slots(&controller.snapshot(), out)
        }
        "mode" => {
            let mode = match args.get_one::<String>("mode").map(String::as_str) {
                Some("manual") => WeightMode::Manual,
                Some("unit") => WeightMode::UnitPerSlot,
                Some("count") => WeightMode::CountPerColor,
                other => bail!("unknown weight mode {other:?}"),
            };
            controller.dispatch(Action::SetWeightMode(mode))?;
            show_slots(&controller.snapshot(), out)
        }
        "subset" => {
            controller.dispatch(Action::SetSubset(colors_arg(args)))?;
            let state = controller.snapshot();
            writeln!(out, "subset: {}", join(&state.form.pool_selection))?;
            Ok(())
        }
        "lock" => {
            controller.dispatch(Action::SetLocks(colors_arg(args)))?;
            let state = controller.snapshot();
            writeln!(out, "locked: {}", join(&state.form.lock_selection))?;
            Ok(())
        }
        "generate" => {
            let current = controller.snapshot().form.dimensions;
            let dimensions = Dimensions::new(
                args.get_one::<u32>("width").copied().unwrap_or(current.width),
                args.get_one::<u32>("height").copied().unwrap_or(current.height),
                args.get_one::<u32>("block").copied().unwrap_or(current.block_size),
            );
            if dimensions != current {
                controller.dispatch(Action::SetDimensions(dimensions))?;
            }
            let entry = controller.generate().await?;
            describe_entry(&entry, out)
        }
        "randomize" => {
            let source = if args.get_flag("subset") {
                PoolSource::Subset
            } else {
                PoolSource::Palette
            };
            let entry = controller.randomize(source).await?;
            show_slots(&controller.snapshot(), out)?;
            describe_entry(&entry, out)
        }
        "history" => history(&controller.snapshot(), out),
        "pin" => {
            let id = id_arg(args, "id").context("missing result id")?;
            let state = match controller.toggle_pin(id)? {
                PinState::Pinned => "pinned",
                PinState::Unpinned => "unpinned",
            };
            writeln!(out, "{state} {id}")?;
            Ok(())
        }
        "restore" => {
            let id = id_arg(args, "id").context("missing result id")?;
            let entry = controller.restore(id)?;
            show_slots(&controller.snapshot(), out)?;
            describe_entry(&entry, out)
        }
        "export" => {
            let path = args
                .get_one::<PathBuf>("path")
                .context("missing output path")?;
            let entry = match id_arg(args, "id") {
                Some(id) => controller
                    .inspect(|state| state.history.resolve(id).cloned())
                    .with_context(|| format!("no cached result with id {id}"))?,
                None => controller
                    .inspect(|state| state.history.active().cloned())
                    .context("no active result; run `hotbar generate` first")?,
            };
            std::fs::write(path, entry.artifact().bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(
                out,
                "wrote result {} ({} bytes) to {}",
                entry.id(),
                entry.artifact().len(),
                path.display()
            )?;
            Ok(())
        }
        other => bail!("unknown command `{other}`"),
    }
}

fn open_session(matches: &ArgMatches) -> Result<SessionController> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => HotbarConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => HotbarConfig::new(),
    };
    let state_dir = matches
        .get_one::<PathBuf>("state-dir")
        .cloned()
        .or_else(|| config.state_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR));
    let store = FileStore::open(&state_dir)
        .with_context(|| format!("opening state directory {}", state_dir.display()))?;

    let seed = matches.get_one::<u64>("seed").copied();
    let renderer = match seed {
        Some(seed) => GridRenderer::with_seed(Palette::dyes(), seed),
        None => GridRenderer::new(Palette::dyes()),
    };
    tracing::debug!(state_dir = %state_dir.display(), ?seed, "opening session");

    let controller = SessionController::open(config, Arc::new(renderer), Arc::new(store));
    Ok(match seed {
        Some(seed) => controller.with_seed(seed),
        None => controller,
    })
}

fn slot_arg(args: &ArgMatches) -> Result<usize> {
    match args.get_one::<usize>("slot").copied() {
        Some(0) => bail!("slot numbers start at 1"),
        Some(slot) => Ok(slot - 1),
        None => bail!("missing slot number"),
    }
}

fn color_arg(args: &ArgMatches, name: &str) -> Result<ColorId> {
    args.get_one::<String>(name)
        .map(|raw| ColorId::from(raw.trim()))
        .with_context(|| format!("missing {name}"))
}

fn colors_arg(args: &ArgMatches) -> Vec<ColorId> {
    args.get_many::<String>("colors")
        .map(|values| values.map(|raw| ColorId::from(raw.trim())).collect())
        .unwrap_or_default()
}

fn id_arg(args: &ArgMatches, name: &str) -> Option<ResultId> {
    args.get_one::<u64>(name).copied().map(ResultId::from_raw)
}

fn join(colors: &[ColorId]) -> String {
    if colors.is_empty() {
        "(none)".to_string()
    } else {
        colors.iter().map(ColorId::as_str).collect::<Vec<_>>().join(", ")
    }
}

fn palette(controller: &SessionController, out: &mut impl Write) -> Result<()> {
    for (id, rgb) in controller.palette().iter() {
        writeln!(out, "{:<12} {}  {}", id.as_str(), rgb.hex(), rgb)?;
    }
    Ok(())
}

fn show(controller: &SessionController, out: &mut impl Write) -> Result<()> {
    let state = controller.snapshot();
    show_slots(&state, out)?;
    let form = &state.form;
    writeln!(
        out,
        "size:   {}x{} blocks at {}px",
        form.dimensions.width, form.dimensions.height, form.dimensions.block_size
    )?;
    writeln!(out, "subset: {}", join(&form.pool_selection))?;
    writeln!(out, "locked: {}", join(&form.lock_selection))?;
    match state.history.active() {
        Some(entry) => writeln!(out, "active: {}", entry.id())?,
        None => writeln!(out, "active: (none)")?,
    }
    Ok(())
}

fn show_slots(state: &SessionState, out: &mut impl Write) -> Result<()> {
    writeln!(out, "mode:   {:?}", state.form.weight_mode)?;
    for (number, slot) in (1..).zip(state.form.assignment.slots()) {
        match &slot.color {
            Some(color) => writeln!(out, "  {number}. {:<12} x{}", color.as_str(), slot.weight)?,
            None => writeln!(out, "  {number}. -")?,
        }
    }
    Ok(())
}

fn describe_entry(entry: &ResultEntry, out: &mut impl Write) -> Result<()> {
    writeln!(
        out,
        "result {} ({} bytes, {})",
        entry.id(),
        entry.artifact().len(),
        entry.created_at().format("%Y-%m-%d %H:%M:%S")
    )?;
    for line in entry.legend() {
        let rgb = line.rgb.map_or_else(|| "?".to_string(), |rgb| rgb.hex());
        writeln!(out, "  {:<12} {rgb}  weight {}", line.name.as_str(), line.total_weight)?;
    }
    Ok(())
}

fn history(state: &SessionState, out: &mut impl Write) -> Result<()> {
    let active = state.history.active_id();
    for (title, cache) in [("recent", state.history.recent()), ("pinned", state.history.pinned())] {
        writeln!(out, "{title} ({}/{}):", cache.len(), cache.capacity())?;
        for entry in cache.iter() {
            let marker = if Some(entry.id()) == active { '*' } else { ' ' };
            let pin = if state.history.is_pinned(entry.id()) { " [pinned]" } else { "" };
            let colors: Vec<ColorId> = entry.legend().iter().map(|l| l.name.clone()).collect();
            writeln!(out, " {marker} {}  {}{pin}", entry.id(), join(&colors))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    async fn hotbar(dir: &std::path::Path, args: &[&str]) -> Result<String> {
        let state_dir = dir.display().to_string();
        let argv = ["hotbar", "--state-dir", state_dir.as_str(), "--seed", "7"]
            .into_iter()
            .chain(args.iter().copied());
        let matches = cli().try_get_matches_from(argv)?;
        let mut out = Vec::new();
        run(&matches, &mut out).await?;
        Ok(String::from_utf8(out)?)
    }

    #[tokio::test]
    async fn edits_persist_between_invocations() {
        let dir = tempfile::tempdir().unwrap();
        hotbar(dir.path(), &["add", "red"]).await.unwrap();
        hotbar(dir.path(), &["set", "3", "blue"]).await.unwrap();

        let shown = hotbar(dir.path(), &["show"]).await.unwrap();
        assert!(shown.contains("1. red"));
        assert!(shown.contains("3. blue"));
        assert!(shown.contains("2. -"));
    }

    #[tokio::test]
    async fn slot_zero_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = hotbar(dir.path(), &["clear", "0"]).await.unwrap_err();
        assert_eq!(err.to_string(), "slot numbers start at 1");
    }

    #[tokio::test]
    async fn unknown_color_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = hotbar(dir.path(), &["add", "teal"]).await.unwrap_err();
        assert!(format!("{err:#}").contains("unknown color: 'teal'"));
    }

    #[tokio::test]
    async fn generate_then_export_active() {
        let dir = tempfile::tempdir().unwrap();
        hotbar(dir.path(), &["add", "lime"]).await.unwrap();
        let generated = hotbar(dir.path(), &["generate", "--width", "4", "--height", "2", "--block", "3"])
            .await
            .unwrap();
        assert!(generated.contains("lime"));

        let png = dir.path().join("out.png");
        let png_arg = png.display().to_string();
        hotbar(dir.path(), &["export", png_arg.as_str()]).await.unwrap();
        let bytes = std::fs::read(&png).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn pin_and_history_listing() {
        let dir = tempfile::tempdir().unwrap();
        hotbar(dir.path(), &["lock", "black"]).await.unwrap();
        let randomized = hotbar(dir.path(), &["randomize"]).await.unwrap();
        assert!(randomized.contains("1. black"));

        let listing = hotbar(dir.path(), &["history"]).await.unwrap();
        let id = listing
            .lines()
            .find_map(|line| line.trim_start().strip_prefix("* "))
            .and_then(|rest| rest.split_whitespace().next())
            .unwrap()
            .to_string();

        let pinned = hotbar(dir.path(), &["pin", id.as_str()]).await.unwrap();
        assert_eq!(pinned.trim(), format!("pinned {id}"));
        let listing = hotbar(dir.path(), &["history"]).await.unwrap();
        assert!(listing.contains("pinned (1/20):"));
        assert!(listing.contains("[pinned]"));
    }
}
