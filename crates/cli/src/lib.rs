use clap::{ArgGroup, Parser};
use saber_core::InjectionTargets;
use saber_core::logging::init_logging;
use saber_java::{WeaveConfig, WeaveReport, Weaver};
use std::error::Error;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "saber",
    version,
    about = "Widens injection targets in compiled classes so generated wiring can reach them",
    long_about = "Reads a jar or class directory, indexes it together with the classpath and boot \
                  classpath, makes every injectable field and method (and its declaring class) \
                  accessible, and writes the result to a jar or class directory."
)]
#[command(group(ArgGroup::new("input").required(true).args(["jar", "classes"])))]
pub struct Cli {
    /// Jar file to process
    #[arg(long, value_name = "JAR")]
    pub jar: Option<PathBuf>,

    /// Classes directory to process
    #[arg(long, value_name = "DIR")]
    pub classes: Option<PathBuf>,

    /// Classpath entries (jars or class directories)
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pub classpath: Vec<PathBuf>,

    /// Boot classpath entries; defaults to the JDK found via JAVA_HOME
    #[arg(long = "bootclasspath", value_name = "PATH", num_args = 1..)]
    pub boot_classpath: Vec<PathBuf>,

    /// Output jar file (.jar/.zip) or classes directory
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// JSON file listing the injection targets
    #[arg(long, value_name = "FILE")]
    pub targets: Option<PathBuf>,

    /// Output directory for generated sources
    #[arg(long, value_name = "DIR")]
    pub r#gen: Option<PathBuf>,

    /// Use verbose output
    #[arg(short, long)]
    pub info: bool,

    /// Use debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Print the full error chain on failure
    #[arg(long)]
    pub stacktrace: bool,

    /// Stop at the first class that cannot be processed
    #[arg(long)]
    pub fail_fast: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    pub fn log_level(&self) -> Level {
        if self.debug {
            Level::DEBUG
        } else if self.info {
            Level::INFO
        } else {
            Level::WARN
        }
    }

    pub fn weave_config(&self) -> WeaveConfig {
        WeaveConfig {
            input: self
                .jar
                .clone()
                .or_else(|| self.classes.clone())
                .unwrap_or_default(),
            output: self.output.clone(),
            classpath: self.classpath.clone(),
            boot_classpath: self.boot_classpath.clone(),
            abort_on_first_error: self.fail_fast,
        }
    }
}

/// Runs one weave as described by `cli`. Logging must already be set up.
pub fn execute(cli: &Cli) -> Result<WeaveReport, Box<dyn Error>> {
    tracing::debug!("{:?}", cli);

    let targets = match &cli.targets {
        Some(path) => InjectionTargets::load(path)?,
        None => {
            tracing::warn!("No injection targets given; classes are copied unchanged");
            InjectionTargets::default()
        }
    };
    tracing::info!("{} classes have injection targets", targets.len());

    if let Some(dir) = &cli.r#gen {
        std::fs::create_dir_all(dir)?;
    }

    let report = Weaver::new(cli.weave_config(), targets).run()?;
    Ok(report)
}

/// Parses the command line, sets up logging and weaves. Returns the process
/// exit code on failure.
pub fn main_with_exit_code() -> Result<(), i32> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_level(), cli.log_dir.as_deref());

    match execute(&cli) {
        Ok(report) if report.is_success() => Ok(()),
        Ok(report) => {
            for failure in &report.failures {
                tracing::error!("{}: {}", failure.path, failure.message);
            }
            tracing::error!("{} classes could not be processed", report.failures.len());
            Err(1)
        }
        Err(e) => {
            tracing::error!("{}", e);
            if cli.stacktrace {
                let mut source = e.source();
                while let Some(cause) = source {
                    tracing::error!("Caused by: {}", cause);
                    source = cause.source();
                }
                tracing::error!("{:?}", e);
            }
            Err(1)
        }
    }
}
