//! Top-level CLI parser for the `csl` binary.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "csl", version, about = "Consilium - blinded clinical review engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Signed credential for doctor/admin operations
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Mint a signed credential (stand-in for the external authenticator)
    Mint {
        /// User id to embed (e.g. DOCTOR-1)
        #[arg(long)]
        user: String,
        /// Role to embed: doctor or admin
        #[arg(long)]
        role: String,
    },
    /// Resolve the supplied credential into an identity
    Whoami,
    /// Scan ingestion and reads
    Scan {
        #[command(subcommand)]
        action: ScanAction,
    },
    /// Doctor review workflow
    Review {
        #[command(subcommand)]
        action: ReviewAction,
    },
    /// Admin read paths
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Assistive AI output
    Ai {
        #[command(subcommand)]
        action: AiAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScanAction {
    /// Record a scan handed over by the external ingestion system
    Ingest {
        scan_id: String,
        /// User the scan originated from
        #[arg(long)]
        source_user: String,
        /// Opaque handle to the externally hosted image
        #[arg(long)]
        image_ref: Option<String>,
    },
    /// Read a scan
    Show { scan_id: String },
}

#[derive(Debug, Subcommand)]
pub enum ReviewAction {
    /// List the calling doctor's reviews
    My,
    /// Show the calling doctor's review of a scan
    Show { scan_id: String },
    /// Create or update the calling doctor's draft
    Draft {
        scan_id: String,
        /// Tier-1 condition (e.g. acne_vulgaris, normal)
        #[arg(long)]
        condition: Option<String>,
        /// Confidence: low, medium, or high
        #[arg(long)]
        confidence: Option<String>,
        /// Optional clinical notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// Submit the calling doctor's review (final, locks immediately)
    Submit { scan_id: String },
}

#[derive(Debug, Subcommand)]
pub enum AdminAction {
    /// List scans with quorum progress
    Scans,
    /// The per-scan bundle (reviews, AI output, final result)
    Final { scan_id: String },
    /// The compliance ledger for a scan, in append order
    Audit { scan_id: String },
}

#[derive(Debug, Subcommand)]
pub enum AiAction {
    /// Record the assistive output for a scan
    Record { scan_id: String, text: String },
}
