//! The command tree of the demo application.

use roost::{
    ArgType, Choices, Command, CommandError, CommandTree, DefinitionError, Derived, Opt, Processor,
};

/// Builds every command the demo exposes.
pub fn tree() -> Result<CommandTree, DefinitionError> {
    CommandTree::builder()
        .description("A demo of declarative commands, derived parameters and help output")
        .processor(
            Processor::new(|args| {
                let quiet: bool = args.get("quiet")?;
                let verbose: bool = args.get("verbose")?;
                tracing::debug!(quiet, verbose, "global options");
                Ok(())
            })
            .option(Opt::switch(["-q", "--quiet"]).help("Do not output any message"))
            .option(Opt::switch(["--verbose"]).help("Increase verbosity")),
        )
        .on_cmd_run(|meta| {
            tracing::info!(command = %meta.command_name(), "running");
            Ok(())
        })
        .command(foo())
        .command(
            Command::new("error", |_| -> anyhow::Result<()> {
                Err(CommandError::new("Something went wrong on purpose").into())
            })
            .help("Fail with a user-facing error"),
        )
        .command(
            Command::new("derived", |args| {
                let url: String = args.get("pg")?;
                Ok(format!("connecting to {}", url))
            })
            .help("Build a Postgres URL from bundled options")
            .derived("pg", pg_url("pg")),
        )
        .command(
            Command::new("dynamic", |args| {
                let src: String = args.get("src")?;
                let dst: String = args.get("dst")?;
                Ok(format!("copying {} -> {}", src, dst))
            })
            .help("Use the same option bundle twice")
            .derived("src", pg_url("src"))
            .derived("dst", pg_url("dst")),
        )
        .command(
            Command::new_async("async-main", |args| async move {
                let name: String = args.get("name")?;
                let greeting = futures::future::ready(format!("hello {}", name)).await;
                Ok::<_, anyhow::Error>(greeting)
            })
            .help("Run an async command")
            .option(Opt::positional("name").default("world").help("Who to greet")),
        )
        .group("sub", |g| {
            g.help("A sub command")
                .description("Commands sharing the --test switch")
                .propagate_options(true)
                .option(Opt::switch(["-t", "--test"]).help("Test mode"))
                .command(
                    Command::new("bar", |args| {
                        let test: bool = args.get("test")?;
                        let target: String = args.get("target")?;
                        Ok(format!("bar {} (test={})", target, test))
                    })
                    .help("Run bar command")
                    .option(Opt::positional("target").help("What to run bar on")),
                )
        })
        .build()
}

fn foo() -> Command {
    Command::new("foo", |args| {
        let foo1: i64 = args.get("foo1")?;
        let foo2: String = args.get("foo2")?;
        let mode: String = args.get("mode")?;
        let tags: Option<Vec<String>> = args.get("tags")?;
        let meta: Option<serde_json::Map<String, serde_json::Value>> = args.get("meta")?;
        let pick: Option<String> = args.get("pick")?;

        let mut parts = vec![
            format!("foo1={}", foo1),
            format!("foo2={}", foo2),
            format!("mode={}", mode),
        ];
        if let Some(tags) = tags {
            parts.push(format!("tags={}", tags.join(",")));
        }
        if let Some(meta) = meta {
            parts.push(format!("meta={}", serde_json::Value::Object(meta)));
        }
        if let Some(pick) = pick {
            parts.push(format!("pick={}", pick));
        }
        Ok(parts.join(" "))
    })
    .help("Run foo command")
    .description("Run foo command\n\nExercises every kind of argument type.")
    .option(Opt::positional("foo1").ty(ArgType::Int).help("Foo arguments"))
    .option(Opt::keyword(["-f", "--foo2"]).help("Foo2 arguments"))
    .option(
        Opt::keyword(["-m", "--mode"])
            .ty(ArgType::literal(["fast", "slow"]))
            .default("fast")
            .help("Execution mode"),
    )
    .option(
        Opt::keyword(["--tags"])
            .ty(ArgType::list_of(ArgType::Str))
            .optional()
            .help("Free-form tags"),
    )
    .option(
        Opt::keyword(["--meta"])
            .ty(ArgType::Dict)
            .optional()
            .help("JSON metadata"),
    )
    .option(
        Opt::keyword(["--pick"])
            .choices(Choices::producer(|| vec!["alpha", "beta", "gamma", "delta"]))
            .optional()
            .help("A value from a computed list"),
    )
    .option(
        Opt::keyword(["--password"])
            .ty(ArgType::Password)
            .default("hunter22")
            .help("Connection password"),
    )
}

/// A Postgres connection URL assembled from `--<prefix>-*` options.
fn pg_url(prefix: &str) -> Derived {
    let key = |field: &str| format!("{}_{}", prefix, field);
    let (host, port, user, db) = (key("host"), key("port"), key("user"), key("db"));
    let (host_key, port_key) = (host.clone(), port.clone());
    let (user_key, db_key) = (user.clone(), db.clone());

    Derived::new(format!("{}_url", prefix), move |args| {
        let host: String = args.get(&host_key)?;
        let port: i64 = args.get(&port_key)?;
        let user: String = args.get(&user_key)?;
        let db: String = args.get(&db_key)?;
        Ok(format!("postgresql://{}@{}:{}/{}", user, host, port, db))
    })
    .option(
        Opt::keyword([format!("--{}-host", prefix)])
            .arg_name(host)
            .default("localhost")
            .help("Database host"),
    )
    .option(
        Opt::keyword([format!("--{}-port", prefix)])
            .arg_name(port)
            .ty(ArgType::Int)
            .default(5432)
            .help("Database port"),
    )
    .option(
        Opt::keyword([format!("--{}-user", prefix)])
            .arg_name(user)
            .default("postgres")
            .help("Database user"),
    )
    .option(
        Opt::keyword([format!("--{}-db", prefix)])
            .arg_name(db)
            .default("postgres")
            .help("Database name"),
    )
    .build()
}
