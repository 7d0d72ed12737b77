use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use secop_search_core::{
    DateWindow, EntityQuery, EntityRecord, HashedNgramEmbedder, PlanQuery, PlanRecord,
    ProcessQuery, ProcessRecord, SearchSession, SocrataClient, SupplierQuery, SupplierRecord,
    DEFAULT_PAGE_SIZE, SOCRATA_BASE_URL,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "secop-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Socrata resource root
    #[arg(long, default_value = SOCRATA_BASE_URL)]
    base_url: String,

    /// Application token for the datos.gov.co API (raises rate limits)
    #[arg(long, env = "SECOP_APP_TOKEN")]
    app_token: Option<String>,

    /// Records per page request
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Search SECOP II contracting processes, optionally ranking them
    /// against a free-text query.
    Processes {
        /// Start of the publication window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End of the publication window; defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Window length when no start date is given
        #[arg(long, default_value = "14")]
        days: i64,
        /// Keep only processes strictly above this base price
        #[arg(long, default_value = "0")]
        min_price: i64,
        /// Entity order: Nacional, Territorial, ...
        #[arg(long)]
        orden: Option<String>,
        /// Restrict to these entities (repeatable)
        #[arg(long = "entity")]
        entities: Vec<String>,
        /// Look up one process by id
        #[arg(long)]
        process_id: Option<String>,
        /// Free-text query ranked against process descriptions
        #[arg(long)]
        query: Option<String>,
        /// Number of ranked results to keep
        #[arg(long, default_value = "10")]
        top_k: usize,
    },
    /// Search annual-acquisition-plan headers by year.
    Plans {
        #[arg(long)]
        year: Option<i32>,
        /// Free-text query ranked against entity names
        #[arg(long)]
        query: Option<String>,
        #[arg(long, default_value = "10")]
        top_k: usize,
    },
    /// List bidders on contracting processes.
    Suppliers {
        /// Start of the publication window (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// End of the publication window; defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Window length when no start date is given
        #[arg(long, default_value = "30")]
        days: i64,
        /// Restrict to one contracting process
        #[arg(long)]
        process_id: Option<String>,
        /// Bidder name, matched token by token
        #[arg(long)]
        name: Option<String>,
    },
    /// Look up registered state entities.
    Entities {
        /// Entity names to look up (repeatable)
        #[arg(long = "name")]
        names: Vec<String>,
        /// Entity NITs to look up (repeatable)
        #[arg(long = "nit")]
        nits: Vec<String>,
    },
}

fn window(start: Option<NaiveDate>, end: Option<NaiveDate>, days: i64, today: NaiveDate) -> DateWindow {
    match (start, end) {
        (Some(start), Some(end)) => DateWindow::Range { start, end },
        (Some(start), None) => DateWindow::Since(start),
        _ => DateWindow::last_days(today, days),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let today = Utc::now().date_naive();

    let client = SocrataClient::new(&cli.base_url, cli.app_token.clone())
        .context("invalid Socrata base url")?;
    let mut session = SearchSession::new(client, HashedNgramEmbedder::default());

    info!(base_url = %cli.base_url, page_size = cli.page_size, "secop-search boot");

    match cli.command {
        Command::Processes {
            start,
            end,
            days,
            min_price,
            orden,
            entities,
            process_id,
            query,
            top_k,
        } => {
            let filter = ProcessQuery {
                window: Some(window(start, end, days, today)),
                min_price,
                entity_order: orden,
                entities: if entities.is_empty() { None } else { Some(entities) },
                process_id,
                sort: Some("fecha_de_publicacion_del DESC".to_string()),
                page_size: cli.page_size,
            };

            let soql = filter.build(today)?;
            let outcome = session.load::<ProcessRecord>(&soql).await;
            report_load("processes", outcome.corpus.len(), outcome.complete);

            match query {
                Some(text) => {
                    let hits = session.rank_corpus(&outcome.corpus, &text, top_k)?;
                    for hit in hits {
                        let row = &outcome.corpus.rows()[hit.index];
                        println!("score={:.4} id={} entidad={}", hit.score, row.process_id, row.entity);
                        println!("  {}", row.description);
                        if let Some(price) = row.base_price_value() {
                            println!("  precio_base={price:.2}");
                        }
                        if let (Some(amount), Some(unit)) = (&row.duration, &row.duration_unit) {
                            println!("  duracion={amount} {unit}");
                        }
                        if let Some(published) = &row.published_at {
                            println!("  publicado={published}");
                        }
                        if let Some(modality) = &row.modality {
                            println!("  modalidad={modality}");
                        }
                        if row.is_awarded() {
                            if let Some(supplier) = &row.awarded_supplier {
                                println!("  adjudicado_a={supplier}");
                            }
                        }
                        if let Some(url) = row.url() {
                            println!("  url={url}");
                        }
                    }
                }
                None => {
                    for row in outcome.corpus.rows() {
                        println!(
                            "id={} entidad={} precio_base={}",
                            row.process_id,
                            row.entity,
                            row.base_price.as_deref().unwrap_or("-"),
                        );
                    }
                }
            }
        }
        Command::Plans { year, query, top_k } => {
            let filter = PlanQuery {
                year,
                page_size: cli.page_size,
            };

            let soql = filter.build()?;
            let outcome = session.load::<PlanRecord>(&soql).await;
            report_load("plans", outcome.corpus.len(), outcome.complete);

            match query {
                Some(text) => {
                    let hits = session.rank_corpus(&outcome.corpus, &text, top_k)?;
                    for hit in hits {
                        let row = &outcome.corpus.rows()[hit.index];
                        println!(
                            "score={:.4} entidad={} presupuesto={}",
                            hit.score,
                            row.entity_name,
                            row.general_budget.as_deref().unwrap_or("-"),
                        );
                    }
                }
                None => {
                    for row in outcome.corpus.rows() {
                        println!(
                            "entidad={} anno={} presupuesto={}",
                            row.entity_name,
                            row.year.as_deref().unwrap_or("-"),
                            row.general_budget.as_deref().unwrap_or("-"),
                        );
                    }
                }
            }
        }
        Command::Suppliers {
            start,
            end,
            days,
            process_id,
            name,
        } => {
            let filter = SupplierQuery {
                process_id,
                bidder: name,
                page_size: cli.page_size,
                ..SupplierQuery::new(window(start, end, days, today))
            };

            let soql = filter.build(today)?;
            let outcome = session.load::<SupplierRecord>(&soql).await;
            report_load("suppliers", outcome.corpus.len(), outcome.complete);

            for row in outcome.corpus.rows() {
                println!(
                    "proveedor={} proceso={} publicado={}",
                    row.bidder,
                    row.procedure_id.as_deref().unwrap_or("-"),
                    row.published_at.as_deref().unwrap_or("-"),
                );
            }
        }
        Command::Entities { names, nits } => {
            let filter = EntityQuery {
                names: if names.is_empty() { None } else { Some(names) },
                nits: if nits.is_empty() { None } else { Some(nits) },
                sort: Some("nombre ASC".to_string()),
                page_size: cli.page_size,
            };

            let soql = filter.build()?;
            let outcome = session.load::<EntityRecord>(&soql).await;
            report_load("entities", outcome.corpus.len(), outcome.complete);

            for row in outcome.corpus.rows() {
                println!(
                    "nombre={} nit={} orden={} sector={}",
                    row.name,
                    row.nit.as_deref().unwrap_or("-"),
                    row.order.as_deref().unwrap_or("-"),
                    row.sector.as_deref().unwrap_or("-"),
                );
            }
        }
    }

    Ok(())
}

fn report_load(dataset: &str, rows: usize, complete: bool) {
    if !complete {
        warn!(dataset, "transport error mid-fetch, results are partial");
    }
    info!(dataset, rows, complete, "dataset loaded");
}
