//! Process selector: the operator's main menu.
//!
//! Maps a menu choice to a workflow and a target table, gives each run a
//! fresh [`RunContext`], and is the one place where workflow errors are
//! caught. After a failed run it lists the failed steps and offers cleanup.

use strum::IntoEnumIterator;
use tracing::{error, info, warn};

use crate::cleanup::offer_cleanup;
use crate::error::{RescueError, Result};
use crate::executor::Session;
use crate::gateway::{Notice, Prompt};
use crate::journal::Journal;
use crate::naming;
use crate::run_context::RunContext;
use crate::workflows::{self, RestoreChoice};

const MENU_HELP: &str = "Pick a recovery process by number. Every process asks for its target \
    table next and confirms again before anything destructive happens.";

/// How the menu loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Operator picked Quit
    Quit,
    /// `exit`, end of input or Ctrl-C
    Aborted,
}

/// What the menu should do after one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    Menu,
    Abort,
}

/// Show the menu until the operator quits or aborts.
pub fn run_menu(session: &mut Session<'_>, journal: Option<&Journal>) -> Result<SessionEnd> {
    let choices: Vec<RestoreChoice> = RestoreChoice::iter().collect();
    let mut options: Vec<String> = choices.iter().map(RestoreChoice::menu_label).collect();
    options.push("Quit".to_string());

    loop {
        let prompt = Prompt::new("What do you want to do?").with_help(MENU_HELP);
        let index = match session.gateway.choose(&prompt, &options) {
            Ok(index) => index,
            Err(RescueError::ReturnToMenu) => continue,
            Err(RescueError::OperatorAbort) => return Ok(SessionEnd::Aborted),
            Err(err) => return Err(err),
        };
        let Some(choice) = choices.get(index).copied() else {
            info!("operator quit");
            return Ok(SessionEnd::Quit);
        };

        if run_choice(session, choice, journal) == RunEnd::Abort {
            return Ok(SessionEnd::Aborted);
        }
    }
}

fn run_choice(session: &mut Session<'_>, choice: RestoreChoice, journal: Option<&Journal>) -> RunEnd {
    let table = match select_target(session, choice) {
        Ok(table) => table,
        Err(RescueError::ReturnToMenu) => return RunEnd::Menu,
        Err(RescueError::OperatorAbort) => return RunEnd::Abort,
        Err(err) => {
            warn!(workflow = %choice, error = %err, "no target selected");
            session.notify(Notice::Error, &err.to_string());
            return RunEnd::Menu;
        }
    };

    info!(workflow = %choice, table = %table, "workflow start");
    let mut ctx = RunContext::for_workflow(session.now(), choice.to_string(), &table);
    let result = workflows::run(session, &mut ctx, choice, &table);
    let end = handle_outcome(session, &ctx, result);

    if let Some(journal) = journal.filter(|_| !ctx.is_empty()) {
        match journal.save(&ctx) {
            Ok(path) => session.notify(
                Notice::Info,
                &format!("Run journal: {}", path.display()),
            ),
            Err(err) => {
                warn!(error = %err, "could not write run journal");
                session.notify(Notice::Warning, &format!("Could not write run journal: {}", err));
            }
        }
    }
    end
}

/// The single catch point for workflow errors.
fn handle_outcome(session: &mut Session<'_>, ctx: &RunContext, result: Result<()>) -> RunEnd {
    let err = match result {
        Ok(()) => {
            info!(run_id = ctx.run_id(), "workflow complete");
            return RunEnd::Menu;
        }
        Err(err) => err,
    };

    match &err {
        RescueError::OperatorAbort => {
            report_failed(session, ctx);
            return RunEnd::Abort;
        }
        RescueError::ReturnToMenu => info!(run_id = ctx.run_id(), "workflow left for menu"),
        other => {
            error!(run_id = ctx.run_id(), error = %other, "workflow stopped");
            session.notify(Notice::Error, &format!("Workflow stopped: {}", other));
        }
    }

    report_failed(session, ctx);
    if !ctx.has_failures() {
        return RunEnd::Menu;
    }
    match offer_cleanup(session, ctx) {
        Ok(_) | Err(RescueError::ReturnToMenu) => RunEnd::Menu,
        Err(RescueError::OperatorAbort) => RunEnd::Abort,
        Err(err) => {
            error!(error = %err, "cleanup prompt failed");
            session.notify(Notice::Error, &err.to_string());
            RunEnd::Menu
        }
    }
}

fn report_failed(session: &mut Session<'_>, ctx: &RunContext) {
    let failed: Vec<(String, String)> = ctx
        .failed_records()
        .map(|record| {
            (
                record.operation_name.clone(),
                record.error_message.clone().unwrap_or_default(),
            )
        })
        .collect();
    for (operation, message) in failed {
        error!(operation = %operation, error = %message, "step failed");
        session.notify(Notice::Error, &format!("Failed step: {} ({})", operation, message));
    }
}

/// Ask for the table a workflow runs against.
///
/// Manual restores get a brand-new name; everything else picks an existing
/// table other than the reserved one.
pub fn select_target(session: &mut Session<'_>, choice: RestoreChoice) -> Result<String> {
    let existing = session.store.list_tables()?;

    if choice.needs_new_table() {
        let prompt = Prompt::new("Name of the new table to restore into").with_help(
            "3 to 255 characters: letters, digits, '_', '.' and '-'. The table must not exist yet \
             and must not use the --dupe-, --orig- or --manual- suffixes.",
        );
        return session.gateway.text(&prompt, &|name: &str| {
            naming::validate_name(name)?;
            if naming::is_synthetic(name) {
                return Err(format!(
                    "{} uses a suffix reserved for temporary resources",
                    name
                ));
            }
            if existing.iter().any(|t| t == name) {
                return Err(format!("Table {} already exists", name));
            }
            Ok(())
        });
    }

    let reserved = session.settings.reserved_table.as_deref();
    let tables: Vec<String> = existing
        .into_iter()
        .filter(|t| Some(t.as_str()) != reserved)
        .collect();
    if tables.is_empty() {
        return Err(RescueError::validation("no tables available"));
    }
    let question = format!("Which table? ({})", choice.title());
    let index = session.gateway.choose(&Prompt::new(&question), &tables)?;
    Ok(tables[index].clone())
}
