use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use easylua::{
    class_template, merge_params, ClassMetadata, FieldResolver, LuaParam, ProjectConfig,
    ScriptDirectory, ScriptLinker,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "easylua.kdl";

#[derive(Parser)]
#[command(name = "easylua")]
#[command(about = "Annotated Lua class script tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to find scripts
#[derive(Args)]
struct ProjectArgs {
    /// KDL project config. Defaults to ./easylua.kdl when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra script roots (can specify multiple)
    #[arg(short, long)]
    root: Vec<PathBuf>,

    /// Script file extension, overriding the config
    #[arg(long)]
    extension: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one script and print its class header
    Parse {
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the flattened fields of a class, bases first
    Resolve {
        class: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Link every script into one bundle
    Link {
        #[command(flatten)]
        project: ProjectArgs,

        /// Bundle output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Create a new class script
    New {
        name: String,

        /// Directory to create the script in
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Script file extension
        #[arg(long, default_value = easylua::DEFAULT_EXTENSION)]
        extension: String,
    },

    /// Build the param list for a class, keeping values from a previous list
    Params {
        class: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Previously saved params (JSON)
        #[arg(short, long)]
        previous: Option<PathBuf>,

        /// Output path; prints to stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the editor control for each param
        #[arg(long)]
        controls: bool,
    },

    /// Load all scripts, instantiate a class, push params and call methods
    Run {
        class: String,

        #[command(flatten)]
        project: ProjectArgs,

        /// Params to push (JSON)
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Methods to call in order (can specify multiple)
        #[arg(long)]
        call: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, json } => parse(&file, json),
        Commands::Resolve {
            class,
            project,
            json,
        } => resolve(&class, &project, json),
        Commands::Link { project, output } => link(&project, &output),
        Commands::New {
            name,
            dir,
            extension,
        } => new_script(&name, &dir, &extension),
        Commands::Params {
            class,
            project,
            previous,
            output,
            controls,
        } => params(&class, &project, previous.as_deref(), output.as_deref(), controls),
        Commands::Run {
            class,
            project,
            params,
            call,
        } => run(&class, &project, params.as_deref(), &call),
    }
}

fn load_project(args: &ProjectArgs) -> Result<ProjectConfig> {
    let mut config = match &args.config {
        Some(path) => ProjectConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => ProjectConfig::from_file(DEFAULT_CONFIG)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG))?,
        None => ProjectConfig::default(),
    };

    config.roots.extend(args.root.iter().cloned());
    if let Some(extension) = &args.extension {
        config.extension = extension.clone();
    }
    if config.roots.is_empty() {
        config.roots.push(PathBuf::from("."));
    }
    Ok(config)
}

fn scan(config: &ProjectConfig) -> Result<ScriptDirectory> {
    let scripts = config
        .script_directory()
        .context("Failed to scan script roots")?;
    info!("Found {} scripts", scripts.len());
    Ok(scripts)
}

fn parse(file: &Path, json: bool) -> Result<()> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let meta = ClassMetadata::parse(&source)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    if json {
        let out = serde_json::json!({
            "class": meta.class_name(),
            "base": meta.base_class_name(),
            "fields": meta.fields(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match meta.base_class_name() {
        Some(base) => println!("class {} : {}", meta.class_name(), base),
        None => println!("class {}", meta.class_name()),
    }
    for field in meta.fields() {
        println!("  {}", field);
    }
    Ok(())
}

fn resolve(class: &str, project: &ProjectArgs, json: bool) -> Result<()> {
    let config = load_project(project)?;
    let scripts = scan(&config)?;
    let resolved = FieldResolver::new(&scripts)
        .resolve(class)
        .with_context(|| format!("Failed to resolve {}", class))?;

    if let Some(missing) = &resolved.missing {
        warn!("Base class {} not found, fields are incomplete", missing);
    }

    if json {
        let out = serde_json::json!({
            "class": class,
            "chain": resolved.chain,
            "missing": resolved.missing,
            "fields": resolved.fields,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", resolved.chain.join(" <- "));
    for field in &resolved.fields {
        println!("  {}", field);
    }
    Ok(())
}

fn link(project: &ProjectArgs, output: &Path) -> Result<()> {
    let config = load_project(project)?;
    let scripts = scan(&config)?;
    let (linker, plain) = link_scripts(&scripts)?;

    let linked = linker.linked_bundle();
    fs::write(output, &linked.bundle)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Linked {} classes into {}",
        linker.classes().len(),
        output.display()
    );
    if !plain.is_empty() {
        println!("Plain scripts (run before the bundle): {}", plain.join(", "));
    }
    Ok(())
}

/// Link every indexed script, skipping blank files.
/// Returns the linker and the names of the plain scripts.
fn link_scripts(scripts: &ScriptDirectory) -> Result<(ScriptLinker, Vec<String>)> {
    let mut linker = ScriptLinker::new();
    let mut plain = Vec::new();
    for name in scripts.class_names() {
        let source = scripts.read_source(name)?;
        if source.trim().is_empty() {
            warn!("Skipping blank script {}", name);
            continue;
        }

        let before = linker.classes().len();
        linker
            .add_script(&source)
            .with_context(|| format!("Failed to link {}", name))?;
        if linker.classes().len() == before {
            plain.push(name.clone());
        }
    }
    Ok((linker, plain))
}

fn new_script(name: &str, dir: &Path, extension: &str) -> Result<()> {
    let path = dir.join(format!("{}{}", name, extension));
    if path.exists() {
        bail!("{} already exists", path.display());
    }

    fs::create_dir_all(dir)?;
    fs::write(&path, class_template(name))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Created {}", path.display());
    Ok(())
}

fn read_params(path: &Path) -> Result<Vec<LuaParam>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid params in {}", path.display()))
}

fn params(
    class: &str,
    project: &ProjectArgs,
    previous: Option<&Path>,
    output: Option<&Path>,
    controls: bool,
) -> Result<()> {
    let config = load_project(project)?;
    let scripts = scan(&config)?;
    let resolved = FieldResolver::new(&scripts)
        .resolve(class)
        .with_context(|| format!("Failed to resolve {}", class))?;

    let previous = match previous {
        Some(path) => read_params(path)?,
        None => Vec::new(),
    };
    let params = merge_params(&previous, &resolved.fields);
    let json = serde_json::to_string_pretty(&params)?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {} params to {}", params.len(), path.display());
        }
        None => println!("{}", json),
    }

    if controls {
        let painters = config.painters();
        for control in painters.paint_all(&params) {
            println!("{:?}", control);
        }
    }
    Ok(())
}

#[cfg(feature = "lua")]
fn run(class: &str, project: &ProjectArgs, params: Option<&Path>, calls: &[String]) -> Result<()> {
    use easylua::{LuaHost, NoInstances};

    let config = load_project(project)?;
    let scripts = scan(&config)?;

    let (linker, _) = link_scripts(&scripts)?;

    let mut host = LuaHost::new()?;
    host.load_bundle(&linker.linked_bundle())
        .context("Failed to load scripts")?;

    let instance = host
        .new_instance(class, &[])
        .with_context(|| format!("Failed to create {}", class))?;

    if let Some(path) = params {
        let params = read_params(path)?;
        let pushed = host.push_params(instance, &params, &NoInstances)?;
        info!("Pushed {} params", pushed);
    }

    for method in calls {
        if host
            .call_method(instance, method, &[])
            .with_context(|| format!("{}:{} failed", class, method))?
        {
            println!("Called {}:{}", class, method);
        } else {
            warn!("{} has no method {}", class, method);
        }
    }
    Ok(())
}

#[cfg(not(feature = "lua"))]
fn run(_class: &str, _project: &ProjectArgs, _params: Option<&Path>, _calls: &[String]) -> Result<()> {
    bail!("easylua was built without the `lua` feature")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn write_scripts(dir: &Path, scripts: &[(&str, &str)]) -> ScriptDirectory {
        for (name, source) in scripts {
            fs::write(dir.join(format!("{}{}", name, easylua::DEFAULT_EXTENSION)), source).unwrap();
        }
        ScriptDirectory::scan([dir], easylua::DEFAULT_EXTENSION).unwrap()
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_arguments() {
        let cli = Cli::try_parse_from([
            "easylua", "run", "Enemy", "--root", "Lua", "--call", "start", "--call", "update",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                class,
                project,
                call,
                ..
            } => {
                assert_eq!(class, "Enemy");
                assert_eq!(project.root, vec![PathBuf::from("Lua")]);
                assert_eq!(call, vec!["start", "update"]);
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_link_skips_blank_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let scripts = write_scripts(
            dir.path(),
            &[
                ("A", "---@class A\nA = {}"),
                ("Blank", "  \n"),
                ("C", "---@class C\nC = {}"),
                ("helpers", "function clamp(x) return x end"),
            ],
        );

        let (linker, plain) = link_scripts(&scripts).unwrap();
        assert_eq!(linker.classes(), &["A".to_string(), "C".to_string()]);
        assert_eq!(plain, vec!["helpers".to_string()]);
    }

    #[test]
    fn test_link_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        write_scripts(dir.path(), &[("A", "---@class A\nA = {}"), ("Empty", "")]);
        let output = dir.path().join("bundle.lua");

        let project = ProjectArgs {
            config: None,
            root: vec![dir.path().to_path_buf()],
            extension: None,
        };
        link(&project, &output).unwrap();

        let bundle = fs::read_to_string(&output).unwrap();
        assert!(bundle.contains("RegClass(A,'A')"));
    }
}
