//! Command handlers: one per service operation, JSON output.

use anyhow::Context as _;
use serde_json::json;

use csl_config::CslConfig;
use csl_core::entities::DraftFields;
use csl_core::enums::Role;
use csl_core::identity::Identity;
use csl_db::service::ReviewService;

use crate::cli::{AdminAction, AiAction, Cli, Commands, ReviewAction, ScanAction};

pub async fn dispatch(cli: Cli, config: &CslConfig) -> anyhow::Result<()> {
    match cli.command {
        Commands::Mint { ref user, ref role } => {
            let role: Role = parse_wire("role", role)?;
            let secret = require_secret(config)?;
            let token = csl_auth::mint(user, role, secret, config.auth.token_ttl_secs);
            print_json(&json!({ "token": token }))
        }
        Commands::Whoami => {
            let identity = caller(&cli, config)?;
            print_json(&json!({ "identity": identity }))
        }
        Commands::Scan { ref action } => {
            let service = open_service(&cli, config).await?;
            match action {
                ScanAction::Ingest {
                    scan_id,
                    source_user,
                    image_ref,
                } => {
                    let scan = service
                        .ingest_scan(scan_id, source_user, image_ref.as_deref())
                        .await?;
                    print_json(&json!({ "scan": scan }))
                }
                ScanAction::Show { scan_id } => {
                    let identity = caller(&cli, config)?;
                    let scan = service.get_scan(&identity, scan_id).await?;
                    print_json(&json!({ "scan": scan }))
                }
            }
        }
        Commands::Review { ref action } => {
            let service = open_service(&cli, config).await?;
            let identity = caller(&cli, config)?;
            match action {
                ReviewAction::My => {
                    let reviews = service.my_reviews(&identity).await?;
                    print_json(&json!({ "reviews": reviews }))
                }
                ReviewAction::Show { scan_id } => {
                    let review = service.get_own_review(&identity, scan_id).await?;
                    print_json(&json!({ "review": review }))
                }
                ReviewAction::Draft {
                    scan_id,
                    condition,
                    confidence,
                    notes,
                } => {
                    let fields = DraftFields {
                        condition_tier1: condition
                            .as_deref()
                            .map(|s| parse_wire("condition", s))
                            .transpose()?,
                        confidence_level: confidence
                            .as_deref()
                            .map(|s| parse_wire("confidence", s))
                            .transpose()?,
                        notes: notes.clone(),
                    };
                    let review = service.save_draft(&identity, scan_id, fields).await?;
                    print_json(&json!({ "review": review }))
                }
                ReviewAction::Submit { scan_id } => {
                    let review = service.submit(&identity, scan_id).await?;
                    print_json(&json!({ "review": review }))
                }
            }
        }
        Commands::Admin { ref action } => {
            let service = open_service(&cli, config).await?;
            let identity = caller(&cli, config)?;
            match action {
                AdminAction::Scans => {
                    let scans = service.admin_scans(&identity).await?;
                    print_json(&json!({ "scans": scans }))
                }
                AdminAction::Final { scan_id } => {
                    let bundle = service.admin_final(&identity, scan_id).await?;
                    print_json(&bundle)
                }
                AdminAction::Audit { scan_id } => {
                    let audit = service.admin_audit(&identity, scan_id).await?;
                    print_json(&json!({ "audit": audit }))
                }
            }
        }
        Commands::Ai { ref action } => {
            let service = open_service(&cli, config).await?;
            match action {
                AiAction::Record { scan_id, text } => {
                    let output = service.record_ai_output(scan_id, text).await?;
                    print_json(&json!({ "ai": output }))
                }
            }
        }
    }
}

async fn open_service(cli: &Cli, config: &CslConfig) -> anyhow::Result<ReviewService> {
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    ReviewService::new_local(&db_path)
        .await
        .with_context(|| format!("failed to open database at '{db_path}'"))
}

/// Resolve the caller identity from the `--token` flag.
fn caller(cli: &Cli, config: &CslConfig) -> anyhow::Result<Identity> {
    let token = cli
        .token
        .as_deref()
        .context("no credential supplied — pass --token")?;
    let secret = require_secret(config)?;
    let claims = csl_auth::resolve(token, secret)?;
    Ok(claims.to_identity())
}

fn require_secret(config: &CslConfig) -> anyhow::Result<&str> {
    if config.auth.is_configured() {
        Ok(&config.auth.token_secret)
    } else {
        anyhow::bail!(
            "auth.token_secret is not configured (set CONSILIUM_AUTH__TOKEN_SECRET or .consilium/config.toml)"
        )
    }
}

/// Parse a snake_case wire value into a csl-core enum.
fn parse_wire<T: serde::de::DeserializeOwned>(kind: &str, s: &str) -> anyhow::Result<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("invalid {kind}: '{s}'"))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
