//! Grant Wizard CLI
//!
//! Walks the grant wizard non-interactively against a management server:
//! loads the catalogs, selects objects, builds one grantee row, prints the
//! statement preview and, with `--apply`, submits it.
//!
//! Usage:
//!   cargo run --features cli --bin grant-wizard -- \
//!     --config grant_wizard.yaml \
//!     --select public.accounts --select "public.add_tax(numeric)" \
//!     --grantee app_role \
//!     --privilege r --privilege a \
//!     --with-grant r
//!
//! Without `--config`, settings come from `GRANT_WIZARD_*` variables
//! (a `.env` file is read if present).

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc::{self, UnboundedReceiver};

use grant_wizard::{
    FinishOutcome, GrantWizard, HttpGrantService, PreviewState, PrivilegeEntry,
    PrivilegeGrantRow, StepOutcome, WizardConfig, WizardEvent,
};

/// Grant privileges on database objects
#[derive(Parser, Debug)]
#[command(name = "grant-wizard")]
struct Args {
    /// YAML configuration file
    #[arg(long, env = "GRANT_WIZARD_CONFIG")]
    config: Option<PathBuf>,

    /// List matching objects and exit
    #[arg(long)]
    list: Option<String>,

    /// Object to select, as schema.name (functions may include their arguments)
    #[arg(long = "select")]
    select: Vec<String>,

    /// Role receiving the privileges
    #[arg(long)]
    grantee: Option<String>,

    /// Privilege code to grant (repeatable)
    #[arg(long = "privilege")]
    privileges: Vec<String>,

    /// Privilege code to grant WITH GRANT OPTION (repeatable)
    #[arg(long = "with-grant")]
    with_grant: Vec<String>,

    /// Execute the statements instead of only printing them
    #[arg(long)]
    apply: bool,
}

fn print_notifications(rx: &mut UnboundedReceiver<WizardEvent>) {
    while let Ok(event) = rx.try_recv() {
        if let WizardEvent::Notify(note) = event {
            eprintln!("[{:?}] {}", note.level, note.message);
        }
    }
}

fn build_row(args: &Args) -> Result<PrivilegeGrantRow> {
    let Some(grantee) = &args.grantee else {
        bail!("--grantee is required");
    };
    let mut row = PrivilegeGrantRow::new(grantee.clone());
    for code in &args.privileges {
        let entry = PrivilegeEntry::new(code.as_str());
        row = if args.with_grant.contains(code) {
            row.grant(entry.with_grant_option())
        } else {
            row.grant(entry)
        };
    }
    for code in args.with_grant.iter().filter(|c| !args.privileges.contains(*c)) {
        row = row.grant(PrivilegeEntry::new(code.as_str()).with_grant_option());
    }
    Ok(row)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grant_wizard=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => WizardConfig::from_file(path)?,
        None => WizardConfig::from_env()?,
    };
    let service = HttpGrantService::from_config(&config)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let loaded = GrantWizard::load(&service, config.scope(), tx).await;
    print_notifications(&mut rx);
    let mut wizard = loaded.context("Failed to start grant wizard")?;

    if let Some(query) = &args.list {
        for obj in wizard.search(query) {
            println!("{:<18} {}.{}", obj.object_type.label(), obj.schema, obj.name_with_args());
        }
        return Ok(());
    }

    let mut selected = Vec::new();
    for wanted in &args.select {
        let found = wizard
            .objects()
            .iter()
            .find(|obj| {
                let qualified = format!("{}.{}", obj.schema, obj.name);
                let labelled = format!("{}.{}", obj.schema, obj.name_with_args());
                *wanted == qualified || *wanted == labelled
            })
            .cloned();
        match found {
            Some(obj) => selected.push(obj),
            None => bail!("No object named {}", wanted),
        }
    }
    wizard.set_selection(selected)?;

    if let StepOutcome::Blocked(blockers) = wizard.next_with(&service).await? {
        for b in blockers {
            eprintln!("{}", b.description);
        }
        bail!("Cannot continue past {}", wizard.stage());
    }

    let offered: Vec<String> = wizard
        .effective_privileges()
        .iter()
        .map(|c| format!("{} ({})", c.as_str(), c))
        .collect();
    println!("Grantable: {}", offered.join(", "));

    wizard.set_rows(vec![build_row(&args)?])?;
    if let StepOutcome::Blocked(blockers) = wizard.next_with(&service).await? {
        for b in blockers {
            eprintln!("{}", b.description);
        }
        bail!("Cannot continue past {}", wizard.stage());
    }
    print_notifications(&mut rx);

    match wizard.preview() {
        PreviewState::Ready(sql) => println!("{}", sql),
        PreviewState::Failed(reason) => bail!("Preview failed: {}", reason),
        other => bail!("Preview unavailable: {:?}", other),
    }

    if !args.apply {
        wizard.cancel();
        return Ok(());
    }

    let outcome = wizard.finish(&service).await;
    print_notifications(&mut rx);
    match outcome? {
        FinishOutcome::Completed => println!("Grants applied."),
        FinishOutcome::Blocked(blockers) => {
            for b in blockers {
                eprintln!("{}", b.description);
            }
            bail!("Submission blocked");
        }
    }
    Ok(())
}
