/* 📖 # How is forever-coolshell started?

Run it from the root of an unpacked archive and it serves the site on port 8080:

    forever-coolshell                      # same as `forever-coolshell serve`
    PORT=9000 forever-coolshell serve
    forever-coolshell --archive site.zip serve --port 9000
    forever-coolshell --embedded serve     # zip appended to this binary
    forever-coolshell search kernel        # print matches and exit

The site snapshot comes from `--site-dir` (default `.`), a zip given with
`--archive`, or a zip appended to the executable with `--embedded`.
`coolshell.toml` is looked up in the site directory in every case.

Port precedence is `--port`, then `PORT`, then `coolshell.toml`, then 8080.
Exit code 1 means the snapshot could not be opened, the server could not bind
or a search failed.
*/

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use coolshell_base::pal::http::HttpServerConfig;
use coolshell_base::tracing::init_tracing;
use coolshell_base::{CoolshellResult, FilePath, PalHandle, RealPal, ResultExt};
use coolshell_engine::{
    ArchiveService, ArticleSearch, CONFIG_FILE_NAME, Config, DirectorySnapshot, PortSource,
    SnapshotHandle, SnapshotStore, StoreHandle, ZipSnapshot, load_config,
};
use tracing::{error, info};

/// Serve the Forever CoolShell archive and search its articles.
#[derive(Parser)]
#[command(name = "forever-coolshell", version)]
struct Cli {
    /// Root of the unpacked site; `coolshell.toml` is read from here.
    #[arg(long, global = true, default_value = ".")]
    site_dir: PathBuf,

    /// Serve the site from this zip archive instead of the site directory.
    #[arg(long, global = true, conflicts_with = "embedded")]
    archive: Option<PathBuf>,

    /// Serve the site from the zip archive appended to this executable.
    #[arg(long, global = true)]
    embedded: bool,

    /// Configuration file, relative to the site directory.
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the archive over HTTP (the default).
    Serve {
        /// Port to listen on; overrides PORT and the configuration file.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Search the articles and print the matches, newest first.
    Search {
        /// Literal, case-sensitive text to look for.
        query: String,

        /// Print the results as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    if let Err(e) = init_tracing() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{:?}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> CoolshellResult<()> {
    let site_pal = PalHandle::new(RealPal::new(cli.site_dir.clone()));
    let config = load_config(&site_pal, &FilePath::from(cli.config.as_str()))?;
    let snapshot = open_snapshot(&cli, &site_pal)?;

    match cli.command {
        None => serve(&site_pal, config, snapshot, None),
        Some(Command::Serve { port }) => serve(&site_pal, config, snapshot, port),
        Some(Command::Search { query, json }) => search(&config, snapshot, &query, json),
    }
}

fn open_snapshot(cli: &Cli, site_pal: &PalHandle) -> CoolshellResult<SnapshotHandle> {
    if cli.embedded {
        info!("serving the archive embedded in the executable");
        return Ok(SnapshotHandle::new(ZipSnapshot::from_executable(site_pal)?));
    }
    if let Some(archive) = &cli.archive {
        info!(archive = %archive.display(), "serving zip archive");
        return Ok(SnapshotHandle::new(open_zip(archive)?));
    }
    info!(site_dir = %cli.site_dir.display(), "serving site directory");
    Ok(SnapshotHandle::new(DirectorySnapshot::new(site_pal.clone())))
}

fn open_zip(path: &Path) -> CoolshellResult<ZipSnapshot> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| coolshell_base::err!("Not a zip file path: {}", path.display()))?;
    let pal = PalHandle::new(RealPal::new(parent.to_path_buf()));
    ZipSnapshot::from_file(&pal, &FilePath::from(Path::new(name)))
}

fn log_banner(config: &Config) {
    info!("[{}]", config.title);
    info!("");
    info!("芝兰生于深谷，不以无人而不芳");
    info!("君子修身养德，不以穷困而改志");
    info!("");
    info!("感恩皓叔的无私分享，以及总在最需要的时刻愿意花时间给予指导和帮助。");
    info!("");
    info!("工具使用：");
    info!("    如果你需要改变端口，可以使用环境变量 PORT 来指定端口，例如：");
    info!("    PORT=8080 ./forever-coolshell ");
}

fn serve(
    site_pal: &PalHandle,
    mut config: Config,
    snapshot: SnapshotHandle,
    cli_port: Option<u16>,
) -> CoolshellResult<()> {
    log_banner(&config);
    let env_port = env::var("PORT").ok();
    match config.resolve_port(cli_port, env_port.as_deref()) {
        PortSource::Configured => info!("使用默认端口 {}", config.port),
        PortSource::Environment | PortSource::CommandLine => {
            info!("使用指定端口 {}", config.port)
        }
    }

    let store = StoreHandle::new(SnapshotStore::new(
        snapshot.clone(),
        config.articles_root.as_str(),
    ));
    let service = ArchiveService::new(snapshot, store, &config);
    let server_config = HttpServerConfig::new(config.host.clone())
        .with_port(config.port)
        .with_workers(config.workers);

    let handle = site_pal
        .start_http_server(Box::new(service), server_config)
        .with_context(|| format!("Failed to listen on {}:{}", config.host, config.port))?;
    info!(address = %handle.address(&config.host), "archive server is listening");
    handle.wait();
    Ok(())
}

fn search(config: &Config, snapshot: SnapshotHandle, query: &str, json: bool) -> CoolshellResult<()> {
    if query.is_empty() {
        coolshell_base::bail!("The search query must not be empty");
    }
    let store = SnapshotStore::new(snapshot, config.articles_root.as_str());
    let results = ArticleSearch::new(config.link_strip_segment.clone()).search(&store, query)?;

    if json {
        let text = serde_json::to_string_pretty(&results)
            .map_err(|e| coolshell_base::err!("JSON serialization error: {}", e))?;
        println!("{}", text);
        return Ok(());
    }

    for result in &results {
        let date = result.date.display_date().unwrap_or_else(|| "----------".to_string());
        println!("{}  {}  {}", date, result.link, result.description);
    }
    println!("{} matching articles", results.len());
    Ok(())
}
