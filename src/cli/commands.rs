use crate::app::{render, AppState, RunStatus};
use crate::error::{TransferError, TransferResult};
use crate::excel;
use crate::picker::{pick, PromptPicker};
use crate::settings::SettingsStore;
use crate::transfer::{self, TransferReport};
use crate::types::Side;
use colored::Colorize;
use std::io;
use std::path::PathBuf;

fn print_view(state: &AppState) {
    let view = render(state);
    println!("   Source: {}", view.source_label.bright_blue());
    println!("   Target: {}", view.target_label.bright_blue());
    if view.begin_enabled {
        println!("   Begin:  {}", "ready".green().bold());
    } else {
        println!("   Begin:  {}", "disabled".yellow());
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> TransferResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TransferError::Parse(format!("Failed to encode JSON: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// Execute the status command
pub fn status(settings: PathBuf, json: bool) -> TransferResult<()> {
    let loaded = SettingsStore::new(&settings).load();
    let state = AppState::from_loaded(&loaded);

    if json {
        print_json(&render(&state))?;
    } else {
        println!("{}", "📦 Rack Transfer - Status".bold().green());
        println!("   Settings: {}", settings.display());
        println!();
        print_view(&state);
    }

    // An unreadable record is still an error after it has been shown
    loaded.map(|_| ())
}

/// Execute the select command
pub fn select(
    settings: PathBuf,
    side: Side,
    file: Option<PathBuf>,
    sheet: Option<String>,
) -> TransferResult<()> {
    let store = SettingsStore::new(&settings);
    println!(
        "{}",
        format!("📂 Rack Transfer - Choose {} file", side.title())
            .bold()
            .green()
    );

    let stdin = io::stdin();
    let mut picker = PromptPicker::new(file, sheet, stdin.lock(), io::stdout());
    match pick(side, &mut picker, &store)? {
        Some(saved) => {
            println!();
            println!("{}", "✅ Selection saved".bold().green());
            print_view(&AppState {
                settings: saved,
                ..AppState::default()
            });
        }
        None => println!("{}", "Selection cancelled - nothing changed".yellow()),
    }
    Ok(())
}

fn print_report(report: &TransferReport, verbose: bool) {
    let outcome = &report.outcome;
    println!("   Source: {}", report.source.label().bright_blue());
    println!("   Target: {}", report.target.label().bright_blue());
    println!();
    println!("   Rack IDs copied:       {}", outcome.copied.to_string().bold());
    println!("   Rows marked duplicate: {}", outcome.duplicated.to_string().bold());
    println!("   Rows skipped:          {}", outcome.skipped.total());
    if verbose {
        println!("      settled:          {}", outcome.skipped.settled);
        println!("      blank key:        {}", outcome.skipped.blank);
        println!("      no target match:  {}", outcome.skipped.unmatched);
        println!("      target populated: {}", outcome.skipped.target_populated);
        println!();
        for update in &outcome.target_updates {
            println!(
                "   target row {} col {} ← {}",
                update.row,
                update.column,
                update.value.cyan()
            );
        }
    }
    println!();
}

/// Execute the begin command
pub fn begin(
    settings: PathBuf,
    dry_run: bool,
    verbose: bool,
    json: bool,
    notify: bool,
) -> TransferResult<()> {
    let store = SettingsStore::new(&settings);
    if !json {
        println!("{}", "🚚 Rack Transfer - Copying Rack IDs".bold().green());
        if dry_run {
            println!(
                "{}",
                "📋 DRY RUN MODE - No changes will be written\n".yellow()
            );
        }
    }

    let loaded = store.load();
    let mut state = AppState::from_loaded(&loaded);
    let result = loaded.and_then(|settings| transfer::run(&settings, dry_run));
    state.last_run = Some(match &result {
        Ok(report) => RunStatus::Succeeded(report.clone()),
        Err(e) => RunStatus::Failed(e.to_string()),
    });
    if notify {
        notify_completion(&state);
    }

    let report = result?;
    if json {
        return print_json(&report);
    }
    print_report(&report, verbose);
    if let Some(message) = render(&state).message {
        println!("   {}", message.bold());
    }
    if dry_run {
        println!("{}", "📋 Dry run complete - no changes written".yellow());
    } else {
        println!("{}", "✅ Data transfer completed successfully.".bold().green());
    }
    Ok(())
}

#[cfg(feature = "dialog")]
fn notify_completion(state: &AppState) {
    let message = render(state).message.unwrap_or_default();
    match state.last_run {
        Some(RunStatus::Failed(_)) => crate::dialog::notify("Error", &message, true),
        _ => crate::dialog::notify(
            "Success",
            &format!("Data transfer completed successfully.\n{}", message),
            false,
        ),
    }
}

#[cfg(not(feature = "dialog"))]
fn notify_completion(state: &AppState) {
    if let Some(RunStatus::Failed(e)) = &state.last_run {
        tracing::error!("native dialogs disabled; run failed: {}", e);
    }
}

/// Execute the template command
pub fn template(output: PathBuf, kind: Side, sheet: String, force: bool) -> TransferResult<()> {
    excel::write_template(&output, kind, &sheet, force)?;
    println!(
        "{}",
        format!("✅ {} template written", kind.title()).bold().green()
    );
    println!("   File:    {}", output.display());
    println!("   Sheet:   {}", sheet);
    println!("   Columns: {}", kind.required_columns().join(", "));
    Ok(())
}
