use clap::{load_yaml, App, AppSettings, ArgMatches};
use log::{info, warn};
use serde_json::{json, Value};
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use zellij_docs::{
    airtable::{Connector, MemoryBase, Session, Tabular},
    binder::ModelContext,
    config::Settings,
    exporter::{
        export_tree, field_pattern, model_pattern,
        pdf::{model_report, project_report},
        project_pattern, TreeRoot,
    },
    front_end::parse,
    grouping::{display, index, list_groups, search, PatternSchema, SearchTarget},
    publish::{DirectoryPublisher, GitHubPublisher, Publisher},
    qa::{HttpEndpoint, JsonResponse, QaService},
    registry::{Database, Registry},
    serializer::Form,
    task::{FieldTask, ModelTask},
    Error as DocsError,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Settings and the database selected on the command line.
struct Context {
    settings: Settings,
    db: Option<String>,
    snapshot: Option<Arc<MemoryBase>>,
}

impl Context {
    fn new(matches: &ArgMatches) -> CliResult<Self> {
        let mut settings = Settings::load(matches.value_of("config"))?;
        settings.apply_env(std::env::vars())?;
        if let Some(output) = matches.value_of("output") {
            settings.output_dir = PathBuf::from(output);
        }
        let snapshot = match matches.value_of("snapshot") {
            Some(path) => Some(Arc::new(MemoryBase::load(path)?)),
            None => None,
        };
        Ok(Self {
            settings,
            db: matches.value_of("db").map(String::from),
            snapshot,
        })
    }

    fn registry(&self) -> CliResult<Registry> {
        Ok(Registry::open(&self.settings.registry)?)
    }

    fn database(&self) -> CliResult<Database> {
        if let Some(snapshot) = &self.snapshot {
            return Ok(Database::new(snapshot.base_id(), "snapshot", ""));
        }
        let api_key = self
            .db
            .as_deref()
            .ok_or_else(|| DocsError::InvalidArgument(String::from("no --db or --snapshot given")))?;
        Ok(self.registry()?.require(api_key)?)
    }

    fn session(&self) -> CliResult<Session> {
        if let Some(snapshot) = &self.snapshot {
            return Ok(Session::new(snapshot.clone()));
        }
        let db = self.database()?;
        Ok(db.session(&db.http_connector(&self.settings.api_root))?)
    }

    /// The base holding the canonical fields, when one is configured.
    fn field_base(&self) -> CliResult<Option<Arc<dyn Tabular>>> {
        if self.snapshot.is_some() {
            return Ok(None);
        }
        let db = self.database()?;
        match db.field_base() {
            Some(base) => Ok(Some(db.http_connector(&self.settings.api_root).open(base)?)),
            None => Ok(None),
        }
    }

    fn schemas(&self) -> CliResult<Vec<PatternSchema>> {
        if self.snapshot.is_none() {
            let schemas = self.registry()?.schemas(&self.database()?.api_key)?;
            if !schemas.is_empty() {
                return Ok(schemas);
            }
        }
        Ok(vec![PatternSchema::model(), PatternSchema::collection()])
    }

    fn schema(&self, name: &str) -> CliResult<PatternSchema> {
        self.schemas()?
            .into_iter()
            .find(|schema| schema.name == name)
            .ok_or_else(|| DocsError::not_found("schemas", name).into())
    }

    fn output_dir(&self) -> &PathBuf {
        &self.settings.output_dir
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_parse(matches: &ArgMatches) -> CliResult<()> {
    let path = parse(matches.value_of("PATH").unwrap_or_default())?;
    if let Some(root) = path.root() {
        println!("root\t{}", root);
    }
    for (i, token) in path.tokens().iter().enumerate() {
        println!("{}\t{}", i, token);
    }
    Ok(())
}

fn handle_sparql(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let task = FieldTask::new(&session, matches.value_of("FIELD").unwrap_or_default())?;
    let context = match (matches.value_of("model"), matches.value_of("collection")) {
        (Some(id), _) => Some(ModelContext::new("Model", id)),
        (None, Some(id)) => Some(ModelContext::new("Collection", id)),
        (None, None) => None,
    };
    let limit = match matches.value_of("limit") {
        Some(limit) => limit
            .parse()
            .map_err(|_| DocsError::InvalidArgument(format!("limit `{}` is not a number", limit)))?,
        None => ctx.settings.sparql_limit,
    };
    let export = task.sparql(matches.is_present("count"), context.as_ref(), limit)?;
    println!("{}", export.write_to(ctx.output_dir())?.display());
    if matches.is_present("upload") {
        let field_base = ctx.field_base()?;
        let record = task.upload_sparql(field_base.as_deref())?;
        info!("uploaded to {}", record.id);
    }
    Ok(())
}

fn handle_turtle(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let task = FieldTask::new(&session, matches.value_of("FIELD").unwrap_or_default())?;
    let base = matches
        .value_of("base")
        .unwrap_or(ctx.settings.example_base.as_str());
    let export = task.turtle(base)?;
    println!("{}", export.write_to(ctx.output_dir())?.display());
    Ok(())
}

fn model_task<'s>(ctx: &Context, session: &'s Session, matches: &ArgMatches) -> CliResult<ModelTask<'s>> {
    let schema = ctx.schema(matches.value_of("schema").unwrap_or("Model"))?;
    Ok(ModelTask::new(
        session,
        schema.tables()?,
        matches.value_of("item"),
        matches.value_of("field"),
    )?)
}

fn handle_x3ml(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let task = model_task(ctx, &session, matches)?;
    let form: Form = matches.value_of("form").unwrap_or("a").parse()?;
    let export = task.x3ml(form)?;
    println!("{}", export.write_to(ctx.output_dir())?.display());
    if matches.is_present("upload") {
        let field_base = ctx.field_base()?;
        let record = task.upload_x3ml(form, field_base.as_deref())?;
        info!("uploaded to {}", record.id);
    }
    Ok(())
}

fn handle_rs(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let task = model_task(ctx, &session, matches)?;
    let export = task.research_space(ctx.settings.sparql_limit)?;
    println!("{}", export.write_to(ctx.output_dir())?.display());
    Ok(())
}

fn handle_pattern(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let kind = matches.value_of("KIND").unwrap_or_default();
    let key = || {
        matches
            .value_of("KEY")
            .ok_or_else(|| DocsError::InvalidArgument(format!("a {} pattern needs a KEY", kind)))
    };
    let doc = match kind {
        "project" => project_pattern(&session)?,
        "field" => field_pattern(&session, &ctx.schema("Model")?, key()?)?,
        "model" => model_pattern(&session, &ctx.schema("Model")?, key()?)?,
        _ => model_pattern(&session, &ctx.schema("Collection")?, key()?)?,
    };
    print!("{}", doc.to_xml()?);
    Ok(())
}

fn handle_tree(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let schemas = ctx.schemas()?;
    let local = DirectoryPublisher::new(ctx.output_dir());
    let github = if matches.is_present("github") {
        let db = ctx.database()?;
        Some(GitHubPublisher::for_database(&db).ok_or_else(|| {
            DocsError::Config(format!("{} has no GitHub token and repository", db.name))
        })?)
    } else {
        None
    };
    let mut publishers: Vec<&dyn Publisher> = vec![&local];
    if let Some(github) = &github {
        publishers.push(github);
    }
    let schema;
    let root = match (matches.value_of("schema"), matches.value_of("item")) {
        (Some(name), Some(key)) => {
            schema = ctx.schema(name)?;
            TreeRoot::Item {
                schema: &schema,
                key,
            }
        }
        _ => TreeRoot::Project,
    };
    for path in export_tree(&session, &schemas, root, &publishers)? {
        println!("{}", path);
    }
    Ok(())
}

fn handle_report(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let (report, name) = match (matches.value_of("schema"), matches.value_of("item")) {
        (Some(name), Some(key)) => {
            let schema = ctx.schema(name)?;
            let report = model_report(&session, &schema, key, &ctx.settings.public_url)?;
            (report, String::from(key))
        }
        _ => (project_report(&session)?, String::from("project")),
    };
    fs::create_dir_all(ctx.output_dir())?;
    let path = ctx
        .output_dir()
        .join(format!("{}.pdf", name.replace(|c: char| !c.is_alphanumeric() && c != '_' && c != '-', "_")));
    fs::write(&path, report.to_pdf()?)?;
    println!("{}", path.display());
    Ok(())
}

fn handle_list(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let schema = ctx.schema(matches.value_of("SCHEMA").unwrap_or_default())?;
    print_json(&list_groups(&session, &schema)?)
}

fn handle_show(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let session = ctx.session()?;
    let schema = ctx.schema(matches.value_of("SCHEMA").unwrap_or_default())?;
    let key = matches.value_of("KEY").unwrap_or_default();
    let view = display(&session, &schema, key)?
        .ok_or_else(|| DocsError::not_found(&schema.high.table, key))?;
    let groups: Vec<Value> = view
        .groups
        .iter()
        .map(|(name, rows)| json!({"name": name, "rows": rows}))
        .collect();
    let categories: Vec<Value> = view
        .categories
        .iter()
        .map(|(name, fields)| json!({"name": name, "fields": fields}))
        .collect();
    print_json(&json!({
        "id": view.item.id,
        "header": view.item.header,
        "groups": groups,
        "categories": categories,
    }))
}

/// Every configured database with its schemas.
fn search_targets(ctx: &Context) -> CliResult<Vec<SearchTarget>> {
    let registry = ctx.registry()?;
    let mut targets = vec![];
    for database in registry.list()? {
        let mut schemas = registry.schemas(&database.api_key)?;
        if schemas.is_empty() {
            schemas = vec![PatternSchema::model(), PatternSchema::collection()];
        }
        targets.push(SearchTarget { database, schemas });
    }
    Ok(targets)
}

fn handle_search(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let api_root = ctx.settings.api_root.clone();
    let hits = search(
        &search_targets(ctx)?,
        |db| db.session(&db.http_connector(&api_root)),
        matches.value_of("NEEDLE").unwrap_or_default(),
    )?;
    print_json(&hits)
}

fn handle_index(ctx: &Context) -> CliResult<()> {
    let api_root = ctx.settings.api_root.clone();
    let index = index(&search_targets(ctx)?, |db| {
        db.session(&db.http_connector(&api_root))
    })?;
    print_json(&index)
}

fn qa_service(ctx: &Context) -> QaService {
    let api_root = ctx.settings.api_root.clone();
    let snapshot = ctx.snapshot.clone();
    QaService::new(
        &ctx.settings,
        move |db| match &snapshot {
            Some(base) => Ok(Session::new(base.clone())),
            None => db.session(&db.http_connector(&api_root)),
        },
        Box::new(HttpEndpoint::default()),
    )
}

fn print_response(response: JsonResponse) -> CliResult<()> {
    print_json(&response.body)?;
    if !response.is_ok() {
        warn!("HTTP {}", response.status);
        return Err(DocsError::Status(response.status, response.body.to_string()).into());
    }
    Ok(())
}

fn handle_count(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let db = ctx.database().ok();
    let field = matches.value_of("FIELD").unwrap_or_default();
    print_response(qa_service(ctx).count(db.as_ref(), field))
}

fn handle_sample(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let db = ctx.database().ok();
    let field = matches.value_of("FIELD").unwrap_or_default();
    print_response(qa_service(ctx).sample(db.as_ref(), field))
}

fn handle_db(ctx: &Context, matches: &ArgMatches) -> CliResult<()> {
    let registry = ctx.registry()?;
    if let Some(matches) = matches.subcommand_matches("add") {
        let optional = |name: &str| matches.value_of(name).map(String::from);
        let mut db = Database::new(
            matches.value_of("API_KEY").unwrap_or_default(),
            matches.value_of("NAME").unwrap_or_default(),
            matches.value_of("TOKEN").unwrap_or_default(),
        );
        db.account = matches.value_of("account").map(String::from).unwrap_or_default();
        db.sparql_endpoint = optional("sparql-endpoint");
        db.github_token = optional("github-token");
        db.github_repo = optional("github-repo");
        db.github_organization = optional("github-organization");
        db.field_base = optional("field-base");
        db.collection_base = optional("collection-base");
        registry.save(&db)?;
    } else if matches.subcommand_matches("list").is_some() {
        for db in registry.list()? {
            println!(
                "{}\t{}\t{}",
                db.api_key,
                db.name,
                db.sparql_endpoint().unwrap_or("-")
            );
        }
    } else if let Some(matches) = matches.subcommand_matches("remove") {
        let api_key = matches.value_of("API_KEY").unwrap_or_default();
        if !registry.remove(api_key)? {
            warn!("no database {}", api_key);
        }
    } else if let Some(matches) = matches.subcommand_matches("schema") {
        let yaml = fs::read_to_string(matches.value_of("FILE").unwrap_or_default())?;
        let schema = PatternSchema::from_yaml(&yaml)?;
        registry.save_schema(matches.value_of("API_KEY").unwrap_or_default(), &schema)?;
    }
    Ok(())
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml)
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .get_matches();
    init_logging(matches.occurrences_of("verbose"));
    let ctx = Context::new(&matches)?;
    match matches.subcommand() {
        ("parse", Some(matches)) => handle_parse(matches)?,
        ("sparql", Some(matches)) => handle_sparql(&ctx, matches)?,
        ("turtle", Some(matches)) => handle_turtle(&ctx, matches)?,
        ("x3ml", Some(matches)) => handle_x3ml(&ctx, matches)?,
        ("rs", Some(matches)) => handle_rs(&ctx, matches)?,
        ("pattern", Some(matches)) => handle_pattern(&ctx, matches)?,
        ("tree", Some(matches)) => handle_tree(&ctx, matches)?,
        ("report", Some(matches)) => handle_report(&ctx, matches)?,
        ("list", Some(matches)) => handle_list(&ctx, matches)?,
        ("show", Some(matches)) => handle_show(&ctx, matches)?,
        ("search", Some(matches)) => handle_search(&ctx, matches)?,
        ("index", Some(_)) => handle_index(&ctx)?,
        ("count", Some(matches)) => handle_count(&ctx, matches)?,
        ("sample", Some(matches)) => handle_sample(&ctx, matches)?,
        ("db", Some(matches)) => handle_db(&ctx, matches)?,
        _ => {}
    }
    Ok(())
}
