//! Operator dialog: collect connection details and WHERE clauses, preview, confirm, delete.

pub mod prompt;

pub use prompt::Prompter;

use std::io::{BufRead, Write};

use futures::StreamExt;
use tracing::{info, warn};

use crate::core::config::CosmosConfig;
use crate::core::error::Result;
use crate::db::Predicate;
use crate::toolkit::deletion::{COUNT_UNKNOWN, DeletionManager};


#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Skip the deletion confirmations.
    pub assume_yes: bool,
    /// Run this clause once instead of prompting in a loop.
    pub predicate: Option<Predicate>,
}


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub queries: usize,
    pub documents_deleted: usize,
    pub aborted_runs: usize,
}


pub fn confirm_start<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<bool> {
    prompter.say(
        "Welcome to cosmos-purge, it executes DELETE queries against a Cosmos DB collection.",
    )?;
    prompter.say("WARNING: documents are really deleted, there is no soft-delete or undo.")?;
    prompter.say("")?;
    Ok(prompter.ask_bool("Are you sure you want to proceed?", true)?)
}

/// Asks for every connection setting, offering the current values as defaults.
pub fn prompt_connection<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    config: &mut CosmosConfig,
) -> Result<()> {
    prompter.say("Please first provide the connection details.")?;
    config.endpoint = prompter.ask_string("Endpoint", &config.endpoint)?;
    let key = prompter.ask_secret("Account key", config.account_key())?;
    config.set_account_key(key);
    config.database = prompter.ask_string("Database", &config.database)?;
    config.collection = prompter.ask_string("Collection", &config.collection)?;
    config.cross_partition =
        prompter.ask_bool("Enable cross partition querying", config.cross_partition)?;
    if config.cross_partition {
        config.partition_key_field = prompter
            .ask_string("Cross partition query partition key", &config.partition_key_field)?;
    }
    Ok(())
}

/// Reads clauses until one is confirmed. `None` for an empty clause.
fn ask_predicate<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>) -> Result<Option<Predicate>> {
    loop {
        let predicate = prompter.read_where_clause()?;
        if predicate.is_empty() {
            prompter.say("The WHERE clause is empty, nothing to run.")?;
            return Ok(None);
        }

        prompter.say("You entered the following query:")?;
        prompter.say("")?;
        prompter.say(format!("DELETE FROM c WHERE {}", predicate))?;
        prompter.say("")?;
        if prompter.ask_bool("Are you sure you want to execute this query?", true)? {
            return Ok(Some(predicate));
        }
    }
}


pub async fn run_session<R: BufRead, W: Write>(
    manager: &DeletionManager,
    prompter: &mut Prompter<R, W>,
    options: &SessionOptions,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();

    loop {
        let predicate = match &options.predicate {
            Some(predicate) if !predicate.is_empty() => Some(predicate.clone()),
            Some(_) => {
                prompter.say("The WHERE clause is empty, nothing to run.")?;
                None
            }
            None => ask_predicate(prompter)?,
        };

        if let Some(predicate) = predicate {
            summary.queries += 1;
            run_query(manager, prompter, options, &predicate, &mut summary).await?;
        }

        if options.predicate.is_some() || !prompter.ask_bool("Execute another query", false)? {
            break;
        }
    }

    info!("Session finished: {:?}", summary);
    Ok(summary)
}

async fn run_query<R: BufRead, W: Write>(
    manager: &DeletionManager,
    prompter: &mut Prompter<R, W>,
    options: &SessionOptions,
    predicate: &Predicate,
    summary: &mut SessionSummary,
) -> Result<()> {
    let count = manager.count(predicate).await;
    if count == COUNT_UNKNOWN {
        prompter.say("Your query has an unknown number of results (count unknown).")?;
    } else {
        prompter.say(format!("Your query has {} result(s).", count))?;
    }

    if count == 0 {
        return Ok(());
    }
    if !options.assume_yes
        && !prompter.ask_bool("Are you completely sure you want to delete these documents", false)?
    {
        return Ok(());
    }

    let mut run = manager.delete(predicate);
    while let Some(item) = run.next().await {
        match item {
            Ok(id) => prompter.say(format!("Deleted: {}", id))?,
            Err(e) => {
                warn!("Delete run for '{}' aborted: {}", predicate, e);
                prompter.say(format!("Delete run aborted: {}", e))?;
                summary.aborted_runs += 1;
                break;
            }
        }
    }

    let stats = run.stats();
    summary.documents_deleted += stats.documents_deleted;
    prompter.say("All done.")?;
    prompter.say(format!("Run stats: {}", stats))?;
    prompter.say("")?;
    Ok(())
}
