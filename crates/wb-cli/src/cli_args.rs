use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "wsdl-bind")]
#[command(about = "Resolve WSDL/XSD schema graphs into qualified type names")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Resolve(ResolveArgs),
    Scan(ScanArgs),
}

#[derive(Debug, Args, Default)]
pub(crate) struct SettingsArgs {
    #[arg(long = "config")]
    pub(crate) config: Option<String>,
    #[arg(long = "package-base")]
    pub(crate) package_base: Option<String>,
    #[arg(long = "insecure")]
    pub(crate) insecure: bool,
    #[arg(long = "preserve-case")]
    pub(crate) preserve_case: bool,
    #[arg(long = "max-depth")]
    pub(crate) max_depth: Option<usize>,
    #[arg(long = "truncate-depth")]
    pub(crate) truncate_depth: bool,
    #[arg(long = "strict")]
    pub(crate) strict: bool,
    #[arg(long = "dial-timeout")]
    pub(crate) dial_timeout_secs: Option<u64>,
}

#[derive(Debug, Args)]
pub(crate) struct ResolveArgs {
    pub(crate) location: String,
    #[arg(long = "out")]
    pub(crate) out: Option<String>,
    #[command(flatten)]
    pub(crate) settings: SettingsArgs,
}

#[derive(Debug, Args)]
pub(crate) struct ScanArgs {
    #[arg(long = "dir")]
    pub(crate) dir: String,
    #[command(flatten)]
    pub(crate) settings: SettingsArgs,
}
