//! Finite State CLI binary.
//!
//! A command-line interface for the Finite State platform API.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use finitestate::cli::{Cli, Command, Credentials, Entity, PollArgs, UploadTargetArgs};
use finitestate::output::{
    ArtifactRow, AssetRow, AssetVersionRow, ComponentRow, FindingRow, NamedRow, ProductRow,
    SbomMatchRow,
};
use finitestate::{
    count_findings, create_new_asset_version_and_upload_binary,
    create_new_asset_version_and_upload_test_results, download_asset_version_report,
    download_product_report, download_sbom, get_findings, search_sbom, update_finding_statuses,
    Artifact, ArtifactQuery, Asset, AssetQuery, AssetVersion, AssetVersionQuery, AuthClient,
    BusinessUnit, ComponentQuery, FindingQuery, FindingStatusUpdate, FiniteStateClient,
    FiniteStateError, List, NewAssetVersion, Organization, PollPolicy, Product, ProductQuery,
    SbomSearch, SearchMethod, SoftwareComponent, TestType, TokenCache, User,
};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing::Level;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if matches!(e, FiniteStateError::ConfigMissing(_)) {
                eprintln!("Hint: Set CLIENT_ID, CLIENT_SECRET and ORGANIZATION_CONTEXT");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> finitestate::Result<()> {
    let token = fetch_token(&cli.credentials).await?;
    let config = cli.credentials.to_config()?;
    let client = FiniteStateClient::from_config(&config, &token)?;

    match cli.command {
        Command::Token => {
            println!("{token}");
            Ok(())
        }
        Command::List {
            entity,
            asset_version,
            asset,
            business_unit,
        } => handle_list(&client, entity, asset_version, asset, business_unit, cli.json).await,
        Command::Findings {
            asset_version,
            categories,
            status,
            severity,
            limit,
            count,
        } => {
            let query = FindingQuery {
                asset_version_id: asset_version,
                categories,
                status,
                severity,
                limit,
                ..Default::default()
            };
            if count {
                println!("{}", count_findings(&client, &query).await?);
                return Ok(());
            }
            let findings = get_findings(&client, &query).await?;
            output_list(&findings, cli.json, |item| FindingRow::from(item))
        }
        Command::SearchSbom {
            name,
            version,
            asset_version,
            contains,
            case_sensitive,
        } => {
            let search = SbomSearch {
                name,
                version,
                asset_version_id: asset_version,
                method: if contains {
                    SearchMethod::Contains
                } else {
                    SearchMethod::Exact
                },
                case_sensitive,
            };
            let matches = search_sbom(&client, &search).await?;
            output_list(&matches, cli.json, |item| SbomMatchRow::from(item))
        }
        Command::DownloadReport {
            target,
            report_type,
            subtype,
            output,
            poll,
        } => {
            let policy = poll_policy(&poll);
            let bytes = match (target.asset_version, target.product) {
                (Some(id), _) => {
                    download_asset_version_report(&client, &id, report_type, subtype, &output, &policy)
                        .await?
                }
                (None, Some(id)) => {
                    download_product_report(&client, &id, report_type, subtype, &output, &policy)
                        .await?
                }
                (None, None) => {
                    return Err(FiniteStateError::Validation(
                        "--asset-version or --product is required".to_string(),
                    ))
                }
            };
            eprintln!("Wrote {bytes} bytes to {}", output.display());
            Ok(())
        }
        Command::DownloadSbom {
            asset_version,
            sbom_type,
            subtype,
            output,
            poll,
        } => {
            let policy = poll_policy(&poll);
            let bytes =
                download_sbom(&client, sbom_type, subtype, &asset_version, &output, &policy).await?;
            eprintln!("Wrote {bytes} bytes to {}", output.display());
            Ok(())
        }
        Command::UploadBinary {
            target,
            file,
            chunk_size,
            quick_scan,
        } => {
            let key = create_new_asset_version_and_upload_binary(
                &client,
                &new_asset_version(target),
                &file,
                chunk_size,
                quick_scan,
            )
            .await?;
            println!("{key}");
            Ok(())
        }
        Command::UploadResults {
            target,
            file,
            test_type,
        } => {
            let key = create_new_asset_version_and_upload_test_results(
                &client,
                &new_asset_version(target),
                &TestType::from(test_type.as_str()),
                &file,
            )
            .await?;
            println!("{key}");
            Ok(())
        }
        Command::UpdateFindings {
            ids,
            user,
            status,
            justification,
            response,
            comment,
        } => {
            let update = FindingStatusUpdate {
                user_id: user,
                finding_ids: ids,
                status,
                justification,
                response,
                comment,
            };
            let updated = update_finding_statuses(&client, &update).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&updated)?);
            } else {
                println!("Updated {} findings", updated.len());
            }
            Ok(())
        }
    }
}

async fn fetch_token(credentials: &Credentials) -> finitestate::Result<String> {
    let config = credentials.to_config()?;
    let auth = AuthClient::new(&config)?;
    if credentials.no_cache {
        return auth.request_token().await;
    }
    let mut cache = TokenCache::new(&config.organization_context, Some(&config.client_id));
    cache.get_token(&auth).await
}

async fn handle_list(
    client: &FiniteStateClient,
    entity: Entity,
    asset_version: Option<String>,
    asset: Option<String>,
    business_unit: Option<String>,
    json: bool,
) -> finitestate::Result<()> {
    match entity {
        Entity::Asset => {
            let query = AssetQuery {
                business_unit_id: business_unit,
                ..Default::default()
            };
            let assets = Asset::list_all(client, &query).await?;
            output_list(&assets, json, |item| AssetRow::from(item))
        }
        Entity::AssetVersion => {
            let query = AssetVersionQuery {
                asset_id: asset,
                business_unit_id: business_unit,
                ..Default::default()
            };
            let versions = AssetVersion::list_all(client, &query).await?;
            output_list(&versions, json, |item| AssetVersionRow::from(item))
        }
        Entity::Artifact => {
            let query = ArtifactQuery {
                business_unit_id: business_unit,
                ..Default::default()
            };
            let artifacts = Artifact::list_all(client, &query).await?;
            output_list(&artifacts, json, |item| ArtifactRow::from(item))
        }
        Entity::Product => {
            let query = ProductQuery {
                business_unit_id: business_unit,
                ..Default::default()
            };
            let products = Product::list_all(client, &query).await?;
            output_list(&products, json, |item| ProductRow::from(item))
        }
        Entity::BusinessUnit => {
            let units = BusinessUnit::list_all(client, &()).await?;
            output_list(&units, json, |item| NamedRow::from(item))
        }
        Entity::User => {
            let users = User::list_all(client, &()).await?;
            output_list(&users, json, |item| NamedRow::from(item))
        }
        Entity::Organization => {
            let orgs = Organization::list_all(client, &()).await?;
            output_list(&orgs, json, |item| NamedRow::from(item))
        }
        Entity::Component => {
            let query = ComponentQuery {
                asset_version_id: asset_version,
                ..Default::default()
            };
            let components = SoftwareComponent::list_all(client, &query).await?;
            output_list(&components, json, |item| ComponentRow::from(item))
        }
    }
}

fn output_list<T, R, F>(items: &[T], json: bool, to_row: F) -> finitestate::Result<()>
where
    T: Serialize,
    R: Tabled,
    F: Fn(&T) -> R,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(to_row).collect();
        println!("{}", Table::new(rows));
        println!("\n{} items", items.len());
    }
    Ok(())
}

fn poll_policy(args: &PollArgs) -> PollPolicy {
    PollPolicy::every(Duration::from_secs(args.poll_interval))
        .with_max_duration(Duration::from_secs(args.timeout))
}

fn new_asset_version(target: UploadTargetArgs) -> NewAssetVersion {
    NewAssetVersion {
        business_unit_id: target.business_unit,
        created_by_user_id: target.created_by,
        product_id: target.product,
        artifact_description: target.artifact_description,
        ..NewAssetVersion::new(target.asset, target.version)
    }
}
