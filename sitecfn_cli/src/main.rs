use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::{ArgAction, Args, Parser, Subcommand};
use rayon::prelude::*;
use sitecfn::{assets, deploy_script::render_deploy_script, SavedTemplate, Scope, Stack};
use tracing::{debug, info};

mod config;
mod logging;

use config::{find_closest_config, SiteConfig, CONFIG_FILE_NAME};

const TEMPLATE_FILE: &str = "template.json";
const ASSETS_DIR: &str = "assets";
const DEPLOY_SCRIPT: &str = "deploy.sh";

#[derive(Debug, Parser)]
#[command(name = "sitecfn", version, about = "Synthesize CloudFormation templates for static websites")]
struct Cli {
    /// -v for debug logs, -vv for trace logs
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write the template, the packaged assets and a deploy script
    Synth {
        #[command(flatten)]
        source: ConfigArgs,
        /// output directory. defaults to `out_dir` from the config,
        /// or `sitecfn.out` next to the config file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the template to stdout
    Print {
        #[command(flatten)]
        source: ConfigArgs,
    },
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// path to the site definition. searched for upwards from the
    /// current directory when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long, env = "SITECFN_REGION")]
    region: Option<String>,
}

impl ConfigArgs {
    fn load(&self) -> anyhow::Result<(PathBuf, SiteConfig)> {
        let path = match &self.config {
            Some(p) => p.clone(),
            None => {
                let currdir = std::env::current_dir().context("Failed to get current directory")?;
                find_closest_config(currdir.clone())
                    .ok_or_else(|| anyhow!("Failed to find {CONFIG_FILE_NAME} from {:?}", currdir))?
            }
        };
        let mut config = SiteConfig::load(&path)?;
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        debug!(config = ?path, region = %config.region, "loaded site config");
        Ok((path, config))
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{e}");
        std::process::exit(1);
    }
    let res = match cli.command {
        Command::Synth { source, out } => synth(&source, out),
        Command::Print { source } => print(&source),
    };
    if let Err(e) = res {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn build(source: &ConfigArgs) -> anyhow::Result<(PathBuf, SiteConfig, Stack, SavedTemplate)> {
    let (path, config) = source.load()?;
    let stack = config.build_stack()?;
    let template = stack.synth()?;
    Ok((path, config, stack, template))
}

fn print(source: &ConfigArgs) -> anyhow::Result<()> {
    let (_, _, _, template) = build(source)?;
    println!("{}", template.to_json_pretty()?);
    Ok(())
}

fn synth(source: &ConfigArgs, out: Option<PathBuf>) -> anyhow::Result<()> {
    let (path, config, stack, template) = build(source)?;
    let out_dir = match out.or_else(|| config.out_dir.clone()) {
        Some(o) => o,
        None => path.parent().unwrap_or_else(|| Path::new(".")).join("sitecfn.out"),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;

    let archives = stack
        .assets()
        .par_iter()
        .map(|asset| assets::package(asset, &out_dir))
        .collect::<Result<Vec<_>, _>>()?;
    for archive in &archives {
        debug!(archive = ?archive, "packaged asset");
    }

    let template_path = out_dir.join(TEMPLATE_FILE);
    std::fs::write(&template_path, template.to_json_pretty()?)
        .with_context(|| format!("Failed to write template {:?}", template_path))?;

    let script = render_deploy_script(stack.name(), stack.env(), TEMPLATE_FILE, ASSETS_DIR);
    let script_path = out_dir.join(DEPLOY_SCRIPT);
    std::fs::write(&script_path, script)
        .with_context(|| format!("Failed to write deploy script {:?}", script_path))?;
    make_executable(&script_path)?;

    info!(
        stack = stack.name(),
        resources = template.resources.len(),
        assets = archives.len(),
        out = ?out_dir,
        "synthesized"
    );
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .with_context(|| format!("Failed to read permissions of {:?}", path))?
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).with_context(|| format!("Failed to make {:?} executable", path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> anyhow::Result<()> {
    Ok(())
}
