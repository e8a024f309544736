//! Command-line front end for `pw_core`.
//!
//! # Responsibility
//! - Expand Zen Coding selectors from the shell.
//! - Render or submit a settings page for a JSON-declared option, backed by
//!   a SQLite file or an in-memory database.

use clap::{Args, Parser, Subcommand};
use log::info;
use pw_core::{
    expand, framework_version, init_logging, open_db, open_db_in_memory, FieldsView,
    FormTemplates, ModelController, MultiModelController, Request, RequestOutcome,
    SchemaDefinition, SqliteOptionRepository, ZenArg,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "pw")]
#[command(about = "Settings page toolkit")]
struct Cli {
    /// Absolute directory for rotating log files; logging is off without it.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = pw_core::default_log_level().to_string())]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expands a selector such as `ul#nav>li.item*3`.
    Expand {
        selector: String,
        /// Innermost content; several values are spread over repetitions.
        text: Vec<String>,
    },
    /// Renders the settings page for an option.
    Render {
        #[command(flatten)]
        page: PageArgs,
        /// Query string of the page request, e.g. `_instance=2`.
        #[arg(long, default_value = "")]
        query: String,
    },
    /// Submits urlencoded form data, then renders the resulting page.
    Submit {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "")]
        query: String,
        /// Urlencoded body, e.g. `site[email]=a%40b.c`.
        #[arg(long)]
        body: String,
    },
    /// Prints the framework version.
    Version,
}

#[derive(Args)]
struct PageArgs {
    /// JSON option declaration.
    #[arg(long)]
    schema: PathBuf,
    /// SQLite file holding the options; in-memory when omitted.
    #[arg(long)]
    db: Option<PathBuf>,
    /// Treat the option as a multi-instance option.
    #[arg(long, default_value_t = false)]
    multi: bool,
    /// Use the `<li>` list layout.
    #[arg(long, default_value_t = false)]
    list_layout: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Some(log_dir) = &cli.log_dir {
        if let Err(err) = init_logging(&cli.log_level, log_dir) {
            eprintln!("pw: {err}");
            return ExitCode::FAILURE;
        }
    }

    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("pw: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, Box<dyn Error>> {
    match command {
        Commands::Expand { selector, text } => {
            let args: Vec<ZenArg> = match text.len() {
                0 => Vec::new(),
                1 => text.into_iter().map(ZenArg::text).collect(),
                _ => vec![ZenArg::list(text)],
            };
            expand(&selector, &args)
                .ok_or_else(|| format!("selector matched nothing: {selector}").into())
        }
        Commands::Render { page, query } => serve_page(&page, Request::from_query_string(&query)),
        Commands::Submit { page, query, body } => {
            serve_page(&page, Request::from_query_string(&query).with_body(&body))
        }
        Commands::Version => Ok(format!("pw_core {}", framework_version())),
    }
}

fn serve_page(page: &PageArgs, request: Request) -> Result<String, Box<dyn Error>> {
    let schema = SchemaDefinition::from_json(&std::fs::read_to_string(&page.schema)?)?;
    let conn = match &page.db {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let repo = SqliteOptionRepository::new(&conn);
    let view = FieldsView::new(if page.list_layout {
        FormTemplates::settings_list()
    } else {
        FormTemplates::default()
    });
    info!(
        "event=cli_page module=cli status=start name={} multi={}",
        schema.name, page.multi
    );

    let (outcome, markup) = if page.multi {
        let mut controller = MultiModelController::new(schema, repo)?;
        let outcome = controller.process_request(&request)?;
        (outcome, controller.render_settings_page(&view))
    } else {
        let mut controller = ModelController::new(schema, repo)?;
        let outcome = controller.process_request(&request)?;
        (outcome, controller.render_settings_page(&view))
    };

    Ok(match outcome {
        RequestOutcome::Redirect(location) => format!("Location: {location}\n\n{markup}"),
        _ => markup,
    })
}
