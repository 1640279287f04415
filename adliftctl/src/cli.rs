use clap::{Command, Parser, Subcommand};
use clap_complete::{generate, Generator, Shell};

#[derive(Parser)]
#[command(name = "adliftctl")]
#[command(about = "Bid and campaign automation against the Amazon Ads API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify API connectivity with a small campaign sample
    #[command(name = "verify")]
    Verify(VerifyCommand),

    /// List campaigns
    #[command(name = "campaign:list")]
    CampaignList(CampaignListCommand),

    /// List ad groups
    #[command(name = "adgroup:list")]
    AdGroupList(AdGroupListCommand),

    /// List keywords
    #[command(name = "keyword:list")]
    KeywordList(KeywordListCommand),

    /// List negative keywords
    #[command(name = "negative:list")]
    NegativeKeywordList(NegativeKeywordListCommand),

    /// Create a performance report, wait for it and print the rows
    #[command(name = "report:fetch")]
    ReportFetch(ReportFetchCommand),

    /// Show shell completion script.
    #[command(name = "completion")]
    Completion(CompletionCommand),
}

#[derive(Parser, Debug)]
pub struct VerifyCommand {
    /// Number of sample campaigns to retrieve
    #[arg(long, default_value_t = 5)]
    pub sample_size: usize,
}

#[derive(Parser, Debug)]
pub struct CampaignListCommand {
    /// Only campaigns in this state (enabled, paused, archived)
    #[arg(long)]
    pub state: Option<String>,

    /// Bypass the entity cache
    #[arg(long, default_value = "false")]
    pub no_cache: bool,
}

#[derive(Parser, Debug)]
pub struct AdGroupListCommand {
    /// Restrict to one campaign
    #[arg(long)]
    pub campaign_id: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct KeywordListCommand {
    /// Restrict to one campaign
    #[arg(long)]
    pub campaign_id: Option<u64>,

    /// Restrict to one ad group
    #[arg(long)]
    pub ad_group_id: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct NegativeKeywordListCommand {
    /// Restrict to one campaign
    #[arg(long)]
    pub campaign_id: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct ReportFetchCommand {
    /// Report type: campaigns, keywords or targets
    #[arg(long)]
    pub report_type: String,

    /// Metric columns to request
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Report date (YYYY-MM-DD or YYYYMMDD), defaults to yesterday
    #[arg(long)]
    pub date: Option<String>,

    /// Report segment (only `query` on target reports is supported)
    #[arg(long)]
    pub segment: Option<String>,

    /// Write the rows to this CSV file instead of stdout
    #[arg(long)]
    pub output: Option<std::path::PathBuf>,
}

#[derive(Parser, Debug)]
pub struct CompletionCommand {
    /// The shell to generate completions for
    pub shell: Shell,
}

pub fn print_completions<G: Generator>(generator: G, cmd: &mut Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut std::io::stdout(),
    );
}
